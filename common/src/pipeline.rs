// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

//! Fetch, decode, format and fan out one sensor reading.

use crate::format::{format, DisplayText};
use crate::logger::{Logger, NoopLogger};
use crate::parser::{parse, ParseError};
use crate::reading::SensorReading;
use crate::sensor::{FetchError, SensorClient};
use crate::widget::{TapHandle, WidgetId, WidgetRenderTarget, WidgetView};

/// Why a run did not produce a reading.
#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum PipelineError {
    #[error("no url configured")]
    Config,

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Decode(#[from] ParseError),
}

impl PipelineError {
    /// Retrying cannot fix a missing configuration, everything else is
    /// assumed to be transient.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, PipelineError::Config)
    }
}

/// Result of one pipeline run, consumed by the scheduler.
#[derive(Clone, Debug, PartialEq)]
pub enum FetchOutcome {
    Success(SensorReading),
    RetryableFailure(PipelineError),
    PermanentFailure(PipelineError),
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success(_))
    }
}

impl From<PipelineError> for FetchOutcome {
    fn from(error: PipelineError) -> Self {
        if error.is_retryable() {
            FetchOutcome::RetryableFailure(error)
        } else {
            FetchOutcome::PermanentFailure(error)
        }
    }
}

/// Turns a sensor URL into rendered widgets.
///
/// The pipeline holds no state between runs. Overlapping runs are allowed,
/// the last one to finish determines what the widgets show.
pub struct Pipeline<C, L = NoopLogger> {
    client: C,
    logger: L,
}

impl<C: SensorClient> Pipeline<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            logger: NoopLogger,
        }
    }
}

impl<C: SensorClient, L: Logger> Pipeline<C, L> {
    pub fn with_logger(client: C, logger: L) -> Self {
        Self { client, logger }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Performs exactly one fetch and renders the result to every widget in
    /// `targets`.
    ///
    /// Widgets are left untouched unless fetching and decoding succeeded.
    /// Render failures are logged and skipped; they never change the outcome.
    pub async fn run<R>(&self, url: &str, targets: &[WidgetId], renderer: &R) -> FetchOutcome
    where
        R: WidgetRenderTarget + ?Sized,
    {
        let reading = match self.fetch_reading(url).await {
            Ok(reading) => reading,
            Err(e) => {
                let outcome = FetchOutcome::from(e);
                log::warn!("Sensor update failed: {outcome:?}");
                self.logger.log(&format!("Fetch failed: {outcome:?}"));
                return outcome;
            }
        };

        if reading.is_empty() {
            log::warn!("Sensor payload carried none of temperature, humidity or co2");
            self.logger.log("Payload without known fields, rendering placeholders");
        }

        let text = format(&reading);
        log::info!(
            "Reading: {} {} {} for {} widget(s)",
            text.temperature,
            text.humidity,
            text.co2,
            targets.len()
        );

        self.render_all(&text, targets, renderer);

        FetchOutcome::Success(reading)
    }

    async fn fetch_reading(&self, url: &str) -> Result<SensorReading, PipelineError> {
        if url.trim().is_empty() {
            log::error!("No sensor URL configured!");
            return Err(PipelineError::Config);
        }

        let body = self.client.fetch(url).await?;

        Ok(parse(&body)?)
    }

    fn render_all<R>(&self, text: &DisplayText, targets: &[WidgetId], renderer: &R)
    where
        R: WidgetRenderTarget + ?Sized,
    {
        for &id in targets {
            let view = WidgetView {
                text: text.clone(),
                tap: TapHandle::new(id),
            };

            match renderer.render(id, &view) {
                Ok(()) => self.logger.log(&format!("Updated widgetId={}", id.0)),
                Err(e) => {
                    log::warn!("Skipping widget {id}: {e}");
                    self.logger.log(&format!("Render failed for widgetId={}: {e}", id.0));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::RenderError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct StubClient {
        response: Result<Vec<u8>, FetchError>,
        calls: AtomicUsize,
    }

    impl StubClient {
        fn body(body: &str) -> Self {
            Self {
                response: Ok(body.as_bytes().to_vec()),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(error: FetchError) -> Self {
            Self {
                response: Err(error),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl SensorClient for StubClient {
        async fn fetch(&self, _url: &str) -> Result<Vec<u8>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response.clone()
        }
    }

    #[derive(Default)]
    struct RecordingTarget {
        renders: Mutex<Vec<(WidgetId, WidgetView)>>,
        broken: Vec<WidgetId>,
    }

    impl RecordingTarget {
        fn broken(broken: Vec<WidgetId>) -> Self {
            Self {
                broken,
                ..Default::default()
            }
        }

        fn renders(&self) -> Vec<(WidgetId, WidgetView)> {
            self.renders.lock().unwrap().clone()
        }
    }

    impl WidgetRenderTarget for RecordingTarget {
        fn render(&self, id: WidgetId, view: &WidgetView) -> Result<(), RenderError> {
            if self.broken.contains(&id) {
                return Err(RenderError::Backend(id, "host gone".into()));
            }
            self.renders.lock().unwrap().push((id, view.clone()));
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemoryLogger(Mutex<Vec<String>>);

    impl Logger for MemoryLogger {
        fn log(&self, message: &str) {
            self.0.lock().unwrap().push(message.to_string());
        }
    }

    const A: WidgetId = WidgetId(1);
    const B: WidgetId = WidgetId(2);
    const C: WidgetId = WidgetId(3);
    const URL: &str = "http://sensor.local/climate";

    #[tokio::test]
    async fn test_blank_url_is_permanent_without_fetching() {
        let pipeline = Pipeline::new(StubClient::body("{}"));
        let target = RecordingTarget::default();

        for url in ["", "   "] {
            let outcome = pipeline.run(url, &[A], &target).await;
            assert_eq!(outcome, FetchOutcome::PermanentFailure(PipelineError::Config));
        }

        assert_eq!(pipeline.client().calls(), 0);
        assert!(target.renders().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_errors_are_retryable() {
        for error in [
            FetchError::HttpStatus(404),
            FetchError::HttpStatus(500),
            FetchError::EmptyBody,
            FetchError::Network("connection refused".into()),
        ] {
            let pipeline = Pipeline::new(StubClient::failing(error.clone()));
            let target = RecordingTarget::default();

            let outcome = pipeline.run(URL, &[A], &target).await;

            assert_eq!(outcome, FetchOutcome::RetryableFailure(PipelineError::Fetch(error)));
            assert_eq!(pipeline.client().calls(), 1);
            assert!(target.renders().is_empty());
        }
    }

    #[tokio::test]
    async fn test_decode_errors_are_retryable() {
        for body in ["<html>", "[1, 2]"] {
            let pipeline = Pipeline::new(StubClient::body(body));
            let target = RecordingTarget::default();

            let outcome = pipeline.run(URL, &[A], &target).await;

            assert!(matches!(
                outcome,
                FetchOutcome::RetryableFailure(PipelineError::Decode(_))
            ));
            assert!(target.renders().is_empty());
        }
    }

    #[tokio::test]
    async fn test_no_targets_is_success() {
        let pipeline = Pipeline::new(StubClient::body(r#"{"co2": 500}"#));
        let target = RecordingTarget::default();

        let outcome = pipeline.run(URL, &[], &target).await;

        assert_eq!(outcome, FetchOutcome::Success(SensorReading::new(None, None, Some(500))));
        assert!(target.renders().is_empty());
    }

    #[tokio::test]
    async fn test_payload_without_known_fields_renders_placeholders() {
        let logger = MemoryLogger::default();
        let pipeline = Pipeline::with_logger(StubClient::body(r#"{"pressure": 1013}"#), logger);
        let target = RecordingTarget::default();

        let outcome = pipeline.run(URL, &[A], &target).await;

        assert_eq!(outcome, FetchOutcome::Success(SensorReading::default()));
        assert_eq!(target.renders()[0].1.text, DisplayText::default());

        let messages = pipeline.logger.0.lock().unwrap();
        assert!(messages.iter().any(|m| m.starts_with("Payload without known fields")));
    }

    #[tokio::test]
    async fn test_fan_out_renders_same_text_with_own_tap_handle() {
        let pipeline = Pipeline::new(StubClient::body(
            r#"{"temperature": -3.2, "humidity": 101, "co2": 0}"#,
        ));
        let target = RecordingTarget::default();

        let outcome = pipeline.run(URL, &[A, B, C], &target).await;
        assert!(outcome.is_success());

        let renders = target.renders();
        assert_eq!(renders.len(), 3);
        for (id, view) in renders {
            assert_eq!(view.text.temperature, "-3.2°");
            assert_eq!(view.text.humidity, "101%");
            assert_eq!(view.text.co2, "0 ppm");
            assert_eq!(view.tap, TapHandle::new(id));
        }
    }

    #[tokio::test]
    async fn test_render_failure_does_not_stop_fan_out() {
        let logger = MemoryLogger::default();
        let pipeline = Pipeline::with_logger(StubClient::body(r#"{"temperature": 20}"#), logger);
        let target = RecordingTarget::broken(vec![B]);

        let outcome = pipeline.run(URL, &[A, B, C], &target).await;

        assert!(outcome.is_success());
        let rendered: Vec<_> = target.renders().into_iter().map(|(id, _)| id).collect();
        assert_eq!(rendered, vec![A, C]);

        let messages = pipeline.logger.0.lock().unwrap();
        assert!(messages.iter().any(|m| m.starts_with("Render failed for widgetId=2")));
    }

    #[tokio::test]
    async fn test_runs_are_idempotent() {
        let pipeline = Pipeline::new(StubClient::body(r#"{"temperature": 21.5, "humidity": 55}"#));
        let first = RecordingTarget::default();
        let second = RecordingTarget::default();

        let first_outcome = pipeline.run(URL, &[A, B], &first).await;
        let second_outcome = pipeline.run(URL, &[A, B], &second).await;

        assert_eq!(first_outcome, second_outcome);
        assert_eq!(first.renders(), second.renders());
        assert_eq!(pipeline.client().calls(), 2);
    }

    #[test]
    fn test_outcome_classification() {
        assert_eq!(
            FetchOutcome::from(PipelineError::Config),
            FetchOutcome::PermanentFailure(PipelineError::Config)
        );
        assert_eq!(
            FetchOutcome::from(PipelineError::Fetch(FetchError::EmptyBody)),
            FetchOutcome::RetryableFailure(PipelineError::Fetch(FetchError::EmptyBody))
        );
    }
}
