// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

use std::future::Future;

/// Why a single fetch did not produce a payload.
///
/// All variants are equally retryable, the caller does not need to tell a
/// server error from a dropped connection.
#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum FetchError {
    /// Connection refused, DNS failure, timeout, broken body stream.
    #[error("network error: {0}")]
    Network(String),

    /// The server answered outside of the 2xx range.
    #[error("unexpected HTTP status {0}")]
    HttpStatus(u16),

    /// The server answered 2xx without a body.
    #[error("empty response body")]
    EmptyBody,
}

/// The sensor client trait that provides the raw sensor payload.
pub trait SensorClient {
    /// Issues exactly one request against `url` and returns the response body.
    ///
    /// Implementations must not retry and must not cache previous results.
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send;
}
