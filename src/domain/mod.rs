pub mod history;
pub mod types;

pub use history::{content_preview, HistoryEntry, SessionInfo};
pub use types::{Classification, ClassificationResult, RiskLevel};
