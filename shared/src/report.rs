//! Display views over raw detector payloads.

use crate::DetectorPayload;

#[derive(Debug, Clone, PartialEq)]
pub struct TamperedReport {
    pub is_forged: Option<bool>,
    pub probability: Option<f64>,
    pub model: String,
}

impl From<&DetectorPayload> for TamperedReport {
    fn from(payload: &DetectorPayload) -> Self {
        Self {
            is_forged: payload.get("is_forged").map(|_| payload.flag("is_forged")),
            probability: payload.number_opt("probability"),
            model: payload.display("model"),
        }
    }
}

impl TamperedReport {
    pub fn forged_label(&self) -> Option<&'static str> {
        self.is_forged.map(|forged| if forged { "Yes" } else { "No" })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedReport {
    pub final_prediction: String,
    pub p_synth: Option<f64>,
    pub ai_by_model: String,
    pub ai_by_exif: String,
    pub ai_by_c2pa: String,
}

impl From<&DetectorPayload> for GeneratedReport {
    fn from(payload: &DetectorPayload) -> Self {
        Self {
            final_prediction: payload.display("final_prediction"),
            p_synth: payload.number_opt("p_synth"),
            ai_by_model: payload.display("ai_by_model"),
            ai_by_exif: payload.display("ai_by_exif"),
            ai_by_c2pa: payload.display("ai_by_c2pa"),
        }
    }
}

/// Fraction in `[0, 1]` for progress bars.
pub fn meter(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}
