// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

use crate::sensor::client::{FetchError, SensorClient};

/// Serves a bundled reading instead of talking to a real sensor.
#[derive(Clone, Debug)]
pub struct DummySensorClient {
    body: Vec<u8>,
}

impl DummySensorClient {
    pub fn new() -> Self {
        let json_data = std::include_str!("./dummyreading.json");

        Self { body: json_data.as_bytes().to_vec() }
    }
}

impl Default for DummySensorClient {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorClient for DummySensorClient {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        log::debug!("Serving dummy reading for {url}");
        Ok(self.body.clone())
    }
}
