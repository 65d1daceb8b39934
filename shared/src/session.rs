use serde::{Deserialize, Serialize};

use crate::ResultBundle;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("No file uploaded for analysis")]
    NoFile,
    #[error("An analysis is already running")]
    AnalysisInProgress,
}

/// Per-session analysis state: the current file and the bundle produced for it.
///
/// A bundle is only ever held for the file that produced it. Selecting a file with a
/// different name clears it, and completions for a previous file are dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    last_uploaded_file: Option<String>,
    bundle: Option<ResultBundle>,
    analyzing: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when the file differs from the previous one and stale results were cleared.
    pub fn on_file_selected(&mut self, file_name: &str) -> bool {
        if self.last_uploaded_file.as_deref() == Some(file_name) {
            return false;
        }
        self.last_uploaded_file = Some(file_name.to_string());
        self.bundle = None;
        true
    }

    pub fn begin_analysis(&mut self) -> Result<(), SessionError> {
        if self.last_uploaded_file.is_none() {
            return Err(SessionError::NoFile);
        }
        if self.analyzing {
            return Err(SessionError::AnalysisInProgress);
        }
        self.analyzing = true;
        Ok(())
    }

    /// Stores the bundle if it belongs to the current file. Returns `false` when it was dropped.
    pub fn on_analysis_complete(&mut self, bundle: ResultBundle) -> bool {
        self.analyzing = false;
        if self.last_uploaded_file.as_deref() != Some(bundle.file_name.as_str()) {
            return false;
        }
        self.bundle = Some(bundle);
        true
    }

    pub fn on_analysis_failed(&mut self) {
        self.analyzing = false;
    }

    pub fn current_bundle(&self) -> Option<&ResultBundle> {
        self.bundle.as_ref()
    }

    pub fn last_uploaded_file(&self) -> Option<&str> {
        self.last_uploaded_file.as_deref()
    }

    pub fn is_analyzing(&self) -> bool {
        self.analyzing
    }
}
