// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

//! Fetches climate sensor readings over HTTP and renders them into widgets.
//!
//! A [`Pipeline`] run fetches one payload with a [`SensorClient`], decodes it
//! into a [`SensorReading`], formats it and pushes the result to every widget
//! of a [`WidgetRenderTarget`]. The [`WorkScheduler`] decides when to run.

pub mod config;
pub mod format;
pub mod logger;
pub mod parser;
pub mod pipeline;
pub mod reading;
pub mod schedule;
pub mod sensor;
pub mod widget;

pub use config::WidgetConfig;
pub use format::{format, DisplayText};
pub use logger::{FileLogger, Logger, NoopLogger};
pub use parser::{parse, ParseError};
pub use pipeline::{FetchOutcome, Pipeline, PipelineError};
pub use reading::SensorReading;
pub use schedule::{Job, JobFuture, RetryPolicy, ScheduleDecision, WorkScheduler};
pub use sensor::{DummySensorClient, FetchError, SensorClient};
pub use widget::{RenderError, TapHandle, Trigger, WidgetId, WidgetRenderTarget, WidgetView};

#[cfg(feature = "http")]
pub use sensor::HttpSensorClient;

/// Convenience helper for passing the last of a value between threads. For example from the
/// pipeline running on the tokio runtime to the UI thread showing the widgets.
#[derive(Clone)]
pub struct ValueStore<T>(std::sync::Arc<std::sync::Mutex<Option<T>>>);

impl<T> Default for ValueStore<T> {
    fn default() -> Self {
        Self(Default::default())
    }
}

impl<T: Clone> ValueStore<T> {
    /// Sets `value` as the last value, replacing one that was not taken yet.
    pub fn set(&self, value: T) {
        let mut data = self.0.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let _ = data.insert(value);
    }

    /// Takes the stored value, leaving the store empty.
    pub fn get(&self) -> Option<T> {
        let mut data = self.0.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        data.take()
    }
}

#[test]
fn test_value_store_keeps_only_the_last_value() {
    let store = ValueStore::default();
    store.set(1);
    store.set(2);

    let other_thread = store.clone();
    assert_eq!(std::thread::spawn(move || other_thread.get()).join().unwrap(), Some(2));
    assert_eq!(store.get(), None);
}
