// src/session.rs
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::collector::{self, InputSurface, Row};
use crate::errors::{PredictError, Result};
use crate::models::DisplayModel;
use crate::normalizer::ResultNormalizer;
use crate::render::Renderer;
use crate::transport::PredictionTransport;

/// The outcome of one submission that reached the backend (or tried to).
#[derive(Debug, Clone, Serialize)]
pub struct Submission {
    pub id: Uuid,
    pub submitted_at: DateTime<Utc>,
    pub latency_ms: Option<u64>,
    pub model: DisplayModel,
}

/// Clears the in-flight flag however the submission ends.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runs collect → encode → transport → normalize → render for one form.
///
/// Only one submission may be outstanding. A second submit while the first is
/// pending is refused with [`PredictError::SubmissionInFlight`] and leaves the
/// display untouched.
pub struct PredictionSession {
    transport: Arc<dyn PredictionTransport>,
    renderer: Arc<dyn Renderer>,
    normalizer: ResultNormalizer,
    in_flight: AtomicBool,
}

impl PredictionSession {
    pub fn new(transport: Arc<dyn PredictionTransport>, renderer: Arc<dyn Renderer>) -> Self {
        Self {
            transport,
            renderer,
            normalizer: ResultNormalizer::new(),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Input errors come back as `Err` before any network call. Transport and
    /// backend failures are rendered as an error model and returned in `Ok`.
    pub async fn submit(&self, rows: &[Row], surface: &InputSurface) -> Result<Submission> {
        let payload = collector::encode(rows, surface)?;

        let _guard = InFlightGuard::acquire(&self.in_flight).ok_or_else(|| {
            log::warn!("Submission ignored: a prediction is already in progress");
            PredictError::SubmissionInFlight
        })?;

        let id = Uuid::new_v4();
        let submitted_at = Utc::now();
        log::info!("🎯 Submission {} ({:?}, {} row(s))", id, surface.kind(), payload.row_count());

        let (model, latency_ms) = match self.transport.predict(&payload).await {
            Ok((raw, latency_ms)) => (self.normalizer.normalize(&raw), Some(latency_ms)),
            Err(e) if e.is_input_error() => return Err(e),
            Err(e) => {
                log::error!("Prediction failed: {}", e);
                (self.normalizer.normalize_error(e.user_message()), None)
            }
        };

        self.renderer.render(&model);

        Ok(Submission {
            id,
            submitted_at,
            latency_ms,
            model,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EncodedPayload, HeadlineClass, RawResult};
    use crate::render::MemoryRenderer;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::Mutex;
    use tokio::sync::Notify;

    struct StubTransport {
        response: std::result::Result<Value, String>,
        seen: Mutex<Vec<EncodedPayload>>,
    }

    impl StubTransport {
        fn ok(value: Value) -> Self {
            Self {
                response: Ok(value),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                response: Err(message.to_string()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PredictionTransport for StubTransport {
        async fn predict(&self, payload: &EncodedPayload) -> Result<(RawResult, u64)> {
            self.seen.lock().unwrap().push(payload.clone());
            match &self.response {
                Ok(value) => Ok((RawResult::from(value.clone()), 3)),
                Err(message) => Err(PredictError::Backend(message.clone())),
            }
        }
    }

    fn rows() -> Vec<Row> {
        vec![
            Row::new(vec!["4.22".into(), "x".into()]),
            Row::new(vec!["1".into(), "2".into()]),
        ]
    }

    #[actix_rt::test]
    async fn success_is_normalized_and_rendered() {
        let transport = Arc::new(StubTransport::ok(json!({"predictions": [0.2, 0.9]})));
        let renderer = Arc::new(MemoryRenderer::new());
        let session = PredictionSession::new(transport.clone(), renderer.clone());

        let submission = session.submit(&rows(), &InputSurface::NumericGrid).await.unwrap();

        assert_eq!(submission.model.rows.len(), 2);
        assert_eq!(submission.latency_ms, Some(3));
        assert_eq!(
            transport.seen.lock().unwrap()[0],
            EncodedPayload::NumericMatrix(vec![vec![4.22, 0.0], vec![1.0, 2.0]])
        );
        assert_eq!(renderer.latest().unwrap().lines[1].text, "Row 2: 0.900 → Moderate to severe OSA");
        assert!(!session.is_busy());
    }

    #[actix_rt::test]
    async fn backend_errors_become_an_error_view() {
        let transport = Arc::new(StubTransport::failing("No input data provided"));
        let renderer = Arc::new(MemoryRenderer::new());
        let session = PredictionSession::new(transport, renderer.clone());

        let submission = session.submit(&rows(), &InputSurface::CsvGrid).await.unwrap();

        assert!(submission.model.is_error);
        assert_eq!(submission.model.subtitle, "No input data provided");
        assert_eq!(submission.model.headline_class, HeadlineClass::Unknown);
        assert!(renderer.latest().unwrap().is_error);
    }

    #[actix_rt::test]
    async fn empty_input_never_calls_the_backend() {
        let transport = Arc::new(StubTransport::ok(json!({})));
        let renderer = Arc::new(MemoryRenderer::new());
        let session = PredictionSession::new(transport.clone(), renderer.clone());

        let result = session.submit(&[], &InputSurface::TextArea(" \n ".into())).await;

        assert!(matches!(result, Err(PredictError::EmptyInput)));
        assert!(transport.seen.lock().unwrap().is_empty());
        assert!(renderer.latest().is_none());
    }

    struct SlowTransport {
        started: Notify,
        release: Notify,
    }

    #[async_trait]
    impl PredictionTransport for SlowTransport {
        async fn predict(&self, _payload: &EncodedPayload) -> Result<(RawResult, u64)> {
            self.started.notify_one();
            self.release.notified().await;
            Ok((RawResult::from(json!({"predicted_label": "1"})), 10))
        }
    }

    #[actix_rt::test]
    async fn overlapping_submissions_are_refused() {
        let transport = Arc::new(SlowTransport {
            started: Notify::new(),
            release: Notify::new(),
        });
        let renderer = Arc::new(MemoryRenderer::new());
        let session = PredictionSession::new(transport.clone(), renderer.clone());
        let rows = rows();

        let first = session.submit(&rows, &InputSurface::NumericGrid);
        let second = async {
            transport.started.notified().await;
            assert!(session.is_busy());
            let refused = session.submit(&rows, &InputSurface::NumericGrid).await;
            transport.release.notify_one();
            refused
        };

        let (first, second) = tokio::join!(first, second);

        assert!(matches!(second, Err(PredictError::SubmissionInFlight)));
        assert_eq!(first.unwrap().model.headline, "Abnormal");
        assert!(!session.is_busy());
    }
}
