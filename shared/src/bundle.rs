use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AnalysisMode, DetectorKind, DetectorResult, ManualSelection};

/// Paired outcome of one analysis run. A `None` slot means the detector was not selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultBundle {
    pub run_id: Uuid,
    pub file_name: String,
    pub mode: AnalysisMode,
    pub tampered: Option<DetectorResult>,
    pub generated: Option<DetectorResult>,
}

impl ResultBundle {
    pub fn new(
        file_name: impl Into<String>,
        mode: AnalysisMode,
        tampered: Option<DetectorResult>,
        generated: Option<DetectorResult>,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            file_name: file_name.into(),
            mode,
            tampered,
            generated,
        }
    }

    pub fn selection(&self) -> Option<ManualSelection> {
        self.mode.selection()
    }

    pub fn result(&self, kind: DetectorKind) -> Option<&DetectorResult> {
        match kind {
            DetectorKind::Tampered => self.tampered.as_ref(),
            DetectorKind::Generated => self.generated.as_ref(),
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = (DetectorKind, &str)> {
        [DetectorKind::Tampered, DetectorKind::Generated]
            .into_iter()
            .filter_map(move |kind| self.result(kind).and_then(|r| r.error()).map(|e| (kind, e)))
    }
}
