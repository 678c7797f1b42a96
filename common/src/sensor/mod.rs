// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

mod client;
mod dummyclient;

pub use client::FetchError;
pub use client::SensorClient;

pub use dummyclient::DummySensorClient;

#[cfg(feature = "http")]
mod httpclient;

#[cfg(feature = "http")]
pub use httpclient::HttpSensorClient;
