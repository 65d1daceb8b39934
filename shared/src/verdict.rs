//! Consolidated Auto-mode verdict built from the two detector payloads.
//!
//! Each rule fires independently. The boolean verdict is the OR of the fired rules and the
//! confidence is the largest candidate confidence among them, clamped to `[0, 1]`.

use serde::{Deserialize, Serialize};

use crate::{DetectorPayload, DetectorResult, ResultBundle};

pub const TAMPERED_REASON: &str = "Image shows signs of tampering";
pub const GENERATED_REASON: &str = "Image appears to be AI-generated";

/// `final_prediction` values (upper-cased) that mark an image as generated.
pub const GENERATED_LABELS: [&str; 4] = ["AI", "SYNTHETIC", "FAKE", "GENERATED"];

/// `p_synth` above this marks an image as generated regardless of `final_prediction`.
pub const SYNTH_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Verdict {
    pub is_tampered_or_generated: bool,
    pub confidence: f64,
    pub reasons: Vec<String>,
}

#[derive(Default)]
struct Tally {
    tampered: bool,
    generated: bool,
    confidence: f64,
    reasons: Vec<String>,
}

impl Tally {
    fn raise(&mut self, candidate: f64) {
        self.confidence = self.confidence.max(candidate);
    }

    fn reason(&mut self, reason: &str) {
        if !self.reasons.iter().any(|r| r == reason) {
            self.reasons.push(reason.to_string());
        }
    }

    fn tampered(&mut self, payload: &DetectorPayload) {
        if payload.flag("is_forged") {
            self.tampered = true;
            self.raise(payload.number("probability"));
            self.reason(TAMPERED_REASON);
        }
    }

    fn generated(&mut self, payload: &DetectorPayload) {
        let prediction = payload.text("final_prediction").unwrap_or_default().to_uppercase();
        let p_synth = payload.number("p_synth");

        if GENERATED_LABELS.contains(&prediction.as_str()) {
            self.generated = true;
            self.raise(p_synth);
            self.reason(GENERATED_REASON);
        }

        // Threshold applies even when the label says otherwise.
        if p_synth > SYNTH_THRESHOLD {
            self.generated = true;
            self.raise(p_synth);
            self.reason(GENERATED_REASON);
        }
    }

    fn finish(self) -> Verdict {
        Verdict {
            is_tampered_or_generated: self.tampered || self.generated,
            confidence: self.confidence.clamp(0.0, 1.0),
            reasons: self.reasons,
        }
    }
}

fn success(result: Option<&DetectorResult>) -> Option<&DetectorPayload> {
    result.and_then(DetectorResult::payload)
}

pub fn consolidate(bundle: &ResultBundle) -> Verdict {
    let mut tally = Tally::default();

    if let Some(payload) = success(bundle.tampered.as_ref()) {
        tally.tampered(payload);
    }
    if let Some(payload) = success(bundle.generated.as_ref()) {
        tally.generated(payload);
    }

    tally.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AnalysisMode;
    use serde_json::{json, Value};

    fn ok(value: Value) -> Option<DetectorResult> {
        match value {
            Value::Object(map) => Some(DetectorResult::Success(map.into())),
            _ => panic!("payload must be an object"),
        }
    }

    fn failed() -> Option<DetectorResult> {
        Some(DetectorResult::Failure("HTTP 500".into()))
    }

    fn auto(tampered: Option<DetectorResult>, generated: Option<DetectorResult>) -> ResultBundle {
        ResultBundle::new("photo.png", AnalysisMode::Auto, tampered, generated)
    }

    fn verdict(positive: bool, confidence: f64, reasons: &[&str]) -> Verdict {
        Verdict {
            is_tampered_or_generated: positive,
            confidence,
            reasons: reasons.iter().map(|r| r.to_string()).collect(),
        }
    }

    #[test]
    fn both_failed_is_negative() {
        assert_eq!(consolidate(&auto(failed(), failed())), verdict(false, 0.0, &[]));
    }

    #[test]
    fn absent_results_contribute_nothing() {
        assert_eq!(consolidate(&auto(None, None)), Verdict::default());
    }

    #[test]
    fn tampered_positive_with_generated_failure() {
        let bundle = auto(ok(json!({ "is_forged": true, "probability": 0.8 })), failed());
        assert_eq!(consolidate(&bundle), verdict(true, 0.8, &[TAMPERED_REASON]));
    }

    #[test]
    fn label_and_threshold_give_a_single_reason() {
        let bundle = auto(failed(), ok(json!({ "final_prediction": "AI", "p_synth": 0.93 })));
        assert_eq!(consolidate(&bundle), verdict(true, 0.93, &[GENERATED_REASON]));
    }

    #[test]
    fn threshold_fires_on_real_label() {
        let bundle = auto(None, ok(json!({ "final_prediction": "REAL", "p_synth": 0.6 })));
        assert_eq!(consolidate(&bundle), verdict(true, 0.6, &[GENERATED_REASON]));
    }

    #[test]
    fn real_image_below_threshold() {
        let bundle = auto(
            ok(json!({ "is_forged": false, "probability": 0.3 })),
            ok(json!({ "final_prediction": "REAL", "p_synth": 0.1 })),
        );
        assert_eq!(consolidate(&bundle), verdict(false, 0.0, &[]));
    }

    #[test]
    fn label_match_is_case_insensitive() {
        for label in ["ai", "Synthetic", "fake", "GENERATED"] {
            let bundle = auto(None, ok(json!({ "final_prediction": label, "p_synth": 0.2 })));
            assert_eq!(consolidate(&bundle), verdict(true, 0.2, &[GENERATED_REASON]), "{label}");
        }
    }

    #[test]
    fn label_without_probability_is_positive_with_zero_confidence() {
        let bundle = auto(None, ok(json!({ "final_prediction": "fake" })));
        assert_eq!(consolidate(&bundle), verdict(true, 0.0, &[GENERATED_REASON]));
    }

    #[test]
    fn confidence_is_max_across_sources() {
        let bundle = auto(
            ok(json!({ "is_forged": true, "probability": 0.7 })),
            ok(json!({ "final_prediction": "AI", "p_synth": 0.55 })),
        );
        assert_eq!(
            consolidate(&bundle),
            verdict(true, 0.7, &[TAMPERED_REASON, GENERATED_REASON])
        );
    }

    #[test]
    fn confidence_is_clamped() {
        let bundle = auto(ok(json!({ "is_forged": true, "probability": 1.7 })), None);
        assert_eq!(consolidate(&bundle).confidence, 1.0);

        let bundle = auto(ok(json!({ "is_forged": 1, "probability": -0.4 })), None);
        assert_eq!(consolidate(&bundle), verdict(true, 0.0, &[TAMPERED_REASON]));
    }

    #[test]
    fn malformed_fields_default_to_zero() {
        let bundle = auto(
            ok(json!({ "is_forged": true, "probability": "0.9" })),
            ok(json!({ "final_prediction": 42, "p_synth": null })),
        );
        assert_eq!(consolidate(&bundle), verdict(true, 0.0, &[TAMPERED_REASON]));
    }

    #[test]
    fn threshold_is_strict() {
        let bundle = auto(None, ok(json!({ "final_prediction": "REAL", "p_synth": 0.5 })));
        assert_eq!(consolidate(&bundle), verdict(false, 0.0, &[]));
    }

    #[test]
    fn consolidation_is_deterministic() {
        let bundle = auto(
            ok(json!({ "is_forged": true, "probability": 0.42, "model": "x" })),
            ok(json!({ "final_prediction": "REAL", "p_synth": 0.81 })),
        );
        let first = consolidate(&bundle);
        for _ in 0..10 {
            assert_eq!(consolidate(&bundle), first);
        }
        assert_eq!(first, verdict(true, 0.81, &[TAMPERED_REASON, GENERATED_REASON]));
    }
}
