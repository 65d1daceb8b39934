use log::info;
use shared::{AnalysisMode, DetectorKind, DetectorResult, ResultBundle};
use std::sync::Arc;

use crate::detector::Detector;
use crate::upload::UploadedImage;

/// Sends an image to the detectors a mode selects and collects their results.
#[derive(Clone)]
pub struct Dispatcher {
    tampered: Arc<dyn Detector>,
    generated: Arc<dyn Detector>,
}

impl Dispatcher {
    pub fn new(tampered: Arc<dyn Detector>, generated: Arc<dyn Detector>) -> Self {
        debug_assert_eq!(tampered.kind(), DetectorKind::Tampered);
        debug_assert_eq!(generated.kind(), DetectorKind::Generated);
        Self {
            tampered,
            generated,
        }
    }

    /// Runs the selected detectors concurrently and returns once every call has settled.
    pub async fn run(&self, mode: AnalysisMode, image: &UploadedImage) -> ResultBundle {
        info!(
            "Analyzing {} ({} bytes) with {:?}",
            image.file_name,
            image.size(),
            mode.detectors()
        );

        let (tampered, generated) = futures::join!(
            invoke(DetectorKind::Tampered, self.tampered.as_ref(), mode, image),
            invoke(DetectorKind::Generated, self.generated.as_ref(), mode, image),
        );

        let bundle = ResultBundle::new(image.file_name.clone(), mode, tampered, generated);
        info!(
            "Run {} for {} finished with {} failure(s)",
            bundle.run_id,
            bundle.file_name,
            bundle.failures().count()
        );
        bundle
    }
}

async fn invoke(
    slot: DetectorKind,
    detector: &dyn Detector,
    mode: AnalysisMode,
    image: &UploadedImage,
) -> Option<DetectorResult> {
    if !mode.includes(slot) {
        return None;
    }
    Some(DetectorResult::from(detector.detect(image).await))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::DetectorError;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use shared::{DetectorPayload, ManualSelection};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct MockDetector {
        kind: DetectorKind,
        delay: Duration,
        response: Result<Value, u16>,
        calls: AtomicUsize,
    }

    impl MockDetector {
        fn new(kind: DetectorKind, delay_ms: u64, response: Result<Value, u16>) -> Arc<Self> {
            Arc::new(Self {
                kind,
                delay: Duration::from_millis(delay_ms),
                response,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Detector for MockDetector {
        fn kind(&self) -> DetectorKind {
            self.kind
        }

        async fn detect(&self, _image: &UploadedImage) -> Result<DetectorPayload, DetectorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            match &self.response {
                Ok(value) => Ok(serde_json::from_value(value.clone()).unwrap()),
                Err(status) => Err(DetectorError::HttpStatus {
                    status: *status,
                    body: "unavailable".into(),
                }),
            }
        }
    }

    fn image() -> UploadedImage {
        UploadedImage::new(vec![1, 2, 3], "cat.jpg", Some("image/jpeg")).unwrap()
    }

    fn pair(
        tampered_ms: u64,
        generated_ms: u64,
    ) -> (Arc<MockDetector>, Arc<MockDetector>, Dispatcher) {
        let tampered = MockDetector::new(
            DetectorKind::Tampered,
            tampered_ms,
            Ok(json!({ "is_forged": false, "probability": 0.1 })),
        );
        let generated = MockDetector::new(
            DetectorKind::Generated,
            generated_ms,
            Ok(json!({ "final_prediction": "REAL", "p_synth": 0.2 })),
        );
        let dispatcher = Dispatcher::new(tampered.clone(), generated.clone());
        (tampered, generated, dispatcher)
    }

    #[tokio::test]
    async fn tampered_only_never_calls_generated() {
        let (tampered, generated, dispatcher) = pair(10, 10);
        let bundle = dispatcher
            .run(AnalysisMode::Manual(ManualSelection::TamperedOnly), &image())
            .await;

        assert_eq!(tampered.calls(), 1);
        assert_eq!(generated.calls(), 0);
        assert!(bundle.tampered.as_ref().is_some_and(DetectorResult::is_success));
        assert!(bundle.generated.is_none());
        assert_eq!(bundle.selection(), Some(ManualSelection::TamperedOnly));
    }

    #[tokio::test]
    async fn generated_only_never_calls_tampered() {
        let (tampered, generated, dispatcher) = pair(10, 10);
        let bundle = dispatcher
            .run(AnalysisMode::Manual(ManualSelection::GeneratedOnly), &image())
            .await;

        assert_eq!(tampered.calls(), 0);
        assert_eq!(generated.calls(), 1);
        assert!(bundle.tampered.is_none());
        assert!(bundle.generated.is_some());
    }

    #[tokio::test]
    async fn auto_and_both_call_each_detector_once() {
        for mode in [AnalysisMode::Auto, AnalysisMode::Manual(ManualSelection::Both)] {
            let (tampered, generated, dispatcher) = pair(5, 5);
            let bundle = dispatcher.run(mode, &image()).await;

            assert_eq!(tampered.calls(), 1);
            assert_eq!(generated.calls(), 1);
            assert_eq!(bundle.mode, mode);
            assert_eq!(bundle.file_name, "cat.jpg");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn detector_calls_overlap() {
        let (_, _, dispatcher) = pair(300, 500);
        let started = tokio::time::Instant::now();
        dispatcher.run(AnalysisMode::Auto, &image()).await;

        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(500), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(800), "{elapsed:?}");
    }

    #[tokio::test]
    async fn one_failure_does_not_abort_the_other() {
        let tampered = MockDetector::new(DetectorKind::Tampered, 5, Err(503));
        let generated = MockDetector::new(
            DetectorKind::Generated,
            20,
            Ok(json!({ "final_prediction": "AI", "p_synth": 0.93 })),
        );
        let dispatcher = Dispatcher::new(tampered.clone(), generated.clone());

        let bundle = dispatcher.run(AnalysisMode::Auto, &image()).await;

        assert_eq!(
            bundle.tampered,
            Some(DetectorResult::Failure("HTTP 503: unavailable".into()))
        );
        assert!(bundle.generated.as_ref().is_some_and(DetectorResult::is_success));
        assert_eq!(generated.calls(), 1);

        let verdict = shared::consolidate(&bundle);
        assert!(verdict.is_tampered_or_generated);
        assert_eq!(verdict.confidence, 0.93);
    }

    #[tokio::test]
    async fn each_run_gets_a_new_id() {
        let (_, _, dispatcher) = pair(1, 1);
        let first = dispatcher.run(AnalysisMode::Auto, &image()).await;
        let second = dispatcher.run(AnalysisMode::Auto, &image()).await;
        assert_ne!(first.run_id, second.run_id);
    }
}
