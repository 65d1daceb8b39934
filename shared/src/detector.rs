use derive_more::{Deref, From};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum_macros::{Display, EnumIter};

/// The two remote forensics services an image can be sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
pub enum DetectorKind {
    #[strum(serialize = "tampered")]
    Tampered,
    #[strum(serialize = "generated")]
    Generated,
}

impl DetectorKind {
    pub fn label(&self) -> &'static str {
        match self {
            DetectorKind::Tampered => "AI-Tampered Detection",
            DetectorKind::Generated => "AI-Generated Detection",
        }
    }
}

/// Raw JSON object returned by a detector, kept exactly as received.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Deref, From)]
#[serde(transparent)]
pub struct DetectorPayload(Map<String, Value>);

impl DetectorPayload {
    /// Numeric field, or `None` when absent or not a number.
    pub fn number_opt(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(Value::as_f64)
    }

    /// Numeric field with absent and non-numeric values read as zero.
    pub fn number(&self, key: &str) -> f64 {
        self.number_opt(key).unwrap_or(0.0)
    }

    pub fn flag(&self, key: &str) -> bool {
        self.0.get(key).is_some_and(is_truthy)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Field rendered for captions: strings verbatim, other values as compact JSON.
    pub fn display(&self, key: &str) -> String {
        match self.0.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => "N/A".to_string(),
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Outcome of one detector invocation within an analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum DetectorResult {
    Success(DetectorPayload),
    Failure(String),
}

impl DetectorResult {
    pub fn payload(&self) -> Option<&DetectorPayload> {
        match self {
            DetectorResult::Success(payload) => Some(payload),
            DetectorResult::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            DetectorResult::Success(_) => None,
            DetectorResult::Failure(message) => Some(message),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, DetectorResult::Success(_))
    }
}

impl<E: std::fmt::Display> From<Result<DetectorPayload, E>> for DetectorResult {
    fn from(result: Result<DetectorPayload, E>) -> Self {
        match result {
            Ok(payload) => DetectorResult::Success(payload),
            Err(e) => DetectorResult::Failure(e.to_string()),
        }
    }
}
