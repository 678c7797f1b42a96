// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

use std::time::Duration;

use reqwest::header::{CACHE_CONTROL, PRAGMA};

use crate::sensor::client::{FetchError, SensorClient};

/// Fetches the sensor payload over HTTP.
pub struct HttpSensorClient {
    client: reqwest::Client,
}

impl HttpSensorClient {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self { client })
    }
}

impl SensorClient for HttpSensorClient {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        log::debug!("-> GET {url}");

        let response = self
            .client
            .get(url)
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache")
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        log::debug!("<- {status}");

        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        log::debug!("Read {} bytes", body.len());

        if body.is_empty() {
            return Err(FetchError::EmptyBody);
        }

        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    /// Answers a single request with `response` and hands back what was received.
    async fn serve_once(response: &'static str) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            let _ = tx.send(String::from_utf8_lossy(&request).into_owned());
        });

        (format!("http://{addr}/climate"), rx)
    }

    fn client() -> HttpSensorClient {
        HttpSensorClient::new(Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_returns_body_on_success() {
        let (url, request) = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 19\r\nConnection: close\r\n\r\n{\"temperature\":2.5}",
        )
        .await;

        let body = client().fetch(&url).await.unwrap();
        assert_eq!(body, b"{\"temperature\":2.5}");

        let request = request.await.unwrap().to_ascii_lowercase();
        assert!(request.starts_with("get /climate"));
        assert!(request.contains("cache-control: no-cache"));
    }

    #[tokio::test]
    async fn test_fetch_not_found_is_status_error() {
        let (url, _request) = serve_once(
            "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;

        assert_eq!(client().fetch(&url).await, Err(FetchError::HttpStatus(404)));
    }

    #[tokio::test]
    async fn test_fetch_server_error_is_status_error() {
        let (url, _request) = serve_once(
            "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 5\r\nConnection: close\r\n\r\noops!",
        )
        .await;

        assert_eq!(client().fetch(&url).await, Err(FetchError::HttpStatus(500)));
    }

    #[tokio::test]
    async fn test_fetch_empty_body() {
        let (url, _request) =
            serve_once("HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n").await;

        assert_eq!(client().fetch(&url).await, Err(FetchError::EmptyBody));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = client().fetch(&format!("http://{addr}/")).await;
        assert!(matches!(result, Err(FetchError::Network(_))));
    }
}
