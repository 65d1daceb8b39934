use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use crate::DetectorKind;

/// Which detectors the user picked in Manual mode.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ManualSelection {
    TamperedOnly,
    GeneratedOnly,
    #[default]
    Both,
}

impl ManualSelection {
    pub fn all() -> impl Iterator<Item = ManualSelection> {
        ManualSelection::iter()
    }

    pub fn label(&self) -> &'static str {
        match self {
            ManualSelection::TamperedOnly => DetectorKind::Tampered.label(),
            ManualSelection::GeneratedOnly => DetectorKind::Generated.label(),
            ManualSelection::Both => "Both",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", content = "selection", rename_all = "snake_case")]
pub enum AnalysisMode {
    /// Run both detectors and show a consolidated verdict.
    #[default]
    Auto,
    /// Run the selected detectors and show their raw outputs.
    Manual(ManualSelection),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModeParseError {
    #[error("Unknown analysis mode: {0}")]
    UnknownMode(String),
    #[error("Manual mode requires a detector selection")]
    MissingSelection,
    #[error("Unknown detector selection: {0}")]
    UnknownSelection(String),
}

impl AnalysisMode {
    /// Builds a mode from the `mode` and `selection` form fields. A missing mode means Auto.
    pub fn from_form(mode: Option<&str>, selection: Option<&str>) -> Result<Self, ModeParseError> {
        let mode = mode.map(str::trim).unwrap_or("auto");
        if mode.eq_ignore_ascii_case("auto") {
            return Ok(AnalysisMode::Auto);
        }
        if !mode.eq_ignore_ascii_case("manual") {
            return Err(ModeParseError::UnknownMode(mode.to_string()));
        }

        let selection = selection
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(ModeParseError::MissingSelection)?;
        let selection = ManualSelection::from_str(&selection.to_ascii_lowercase())
            .map_err(|_| ModeParseError::UnknownSelection(selection.to_string()))?;
        Ok(AnalysisMode::Manual(selection))
    }

    /// Value of the `mode` form field.
    pub fn form_value(&self) -> &'static str {
        match self {
            AnalysisMode::Auto => "auto",
            AnalysisMode::Manual(_) => "manual",
        }
    }

    pub fn selection(&self) -> Option<ManualSelection> {
        match self {
            AnalysisMode::Auto => None,
            AnalysisMode::Manual(selection) => Some(*selection),
        }
    }

    pub fn is_auto(&self) -> bool {
        matches!(self, AnalysisMode::Auto)
    }

    pub fn includes(&self, kind: DetectorKind) -> bool {
        match (self, kind) {
            (AnalysisMode::Auto, _) => true,
            (AnalysisMode::Manual(ManualSelection::Both), _) => true,
            (AnalysisMode::Manual(ManualSelection::TamperedOnly), DetectorKind::Tampered) => true,
            (AnalysisMode::Manual(ManualSelection::GeneratedOnly), DetectorKind::Generated) => true,
            _ => false,
        }
    }

    pub fn detectors(&self) -> Vec<DetectorKind> {
        DetectorKind::iter().filter(|kind| self.includes(*kind)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_and_both_run_every_detector() {
        let all = vec![DetectorKind::Tampered, DetectorKind::Generated];
        assert_eq!(AnalysisMode::Auto.detectors(), all);
        assert_eq!(AnalysisMode::Manual(ManualSelection::Both).detectors(), all);
    }

    #[test]
    fn single_selection_runs_one_detector() {
        assert_eq!(
            AnalysisMode::Manual(ManualSelection::TamperedOnly).detectors(),
            vec![DetectorKind::Tampered]
        );
        assert_eq!(
            AnalysisMode::Manual(ManualSelection::GeneratedOnly).detectors(),
            vec![DetectorKind::Generated]
        );
    }

    #[test]
    fn parses_form_fields() {
        assert_eq!(AnalysisMode::from_form(None, None), Ok(AnalysisMode::Auto));
        assert_eq!(AnalysisMode::from_form(Some("Auto"), Some("both")), Ok(AnalysisMode::Auto));
        assert_eq!(
            AnalysisMode::from_form(Some("manual"), Some("generated_only")),
            Ok(AnalysisMode::Manual(ManualSelection::GeneratedOnly))
        );
        assert_eq!(
            AnalysisMode::from_form(Some("MANUAL"), Some("Tampered_Only")),
            Ok(AnalysisMode::Manual(ManualSelection::TamperedOnly))
        );
    }

    #[test]
    fn rejects_bad_form_fields() {
        assert_eq!(
            AnalysisMode::from_form(Some("turbo"), None),
            Err(ModeParseError::UnknownMode("turbo".into()))
        );
        assert_eq!(
            AnalysisMode::from_form(Some("manual"), None),
            Err(ModeParseError::MissingSelection)
        );
        assert_eq!(
            AnalysisMode::from_form(Some("manual"), Some("everything")),
            Err(ModeParseError::UnknownSelection("everything".into()))
        );
    }

    #[test]
    fn form_values_round_trip() {
        let mode = AnalysisMode::Manual(ManualSelection::TamperedOnly);
        let selection = mode.selection().map(|s| s.to_string());
        assert_eq!(selection.as_deref(), Some("tampered_only"));
        assert_eq!(
            AnalysisMode::from_form(Some(mode.form_value()), selection.as_deref()),
            Ok(mode)
        );
    }

    #[test]
    fn serializes_with_mode_tag() {
        let json = serde_json::to_value(AnalysisMode::Manual(ManualSelection::Both)).unwrap();
        assert_eq!(json, serde_json::json!({ "mode": "manual", "selection": "both" }));
        let json = serde_json::to_value(AnalysisMode::Auto).unwrap();
        assert_eq!(json, serde_json::json!({ "mode": "auto" }));
    }
}
