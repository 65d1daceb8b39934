mod bundle;
mod detector;
mod mode;
pub mod report;
pub mod session;
pub mod verdict;

pub use bundle::ResultBundle;
pub use detector::{DetectorKind, DetectorPayload, DetectorResult};
pub use mode::{AnalysisMode, ManualSelection, ModeParseError};
pub use report::{GeneratedReport, TamperedReport};
pub use session::{SessionError, SessionState};
pub use verdict::{consolidate, Verdict};
