use thiserror::Error;

/// Domain errors surfaced by the views. None of them is fatal: each one
/// stands for "no result" and is rendered as an explicit empty state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("insufficient data for {view}: {reason}")]
    InsufficientData { view: &'static str, reason: String },
}

impl AnalysisError {
    pub fn insufficient(view: &'static str, reason: impl Into<String>) -> Self {
        AnalysisError::InsufficientData {
            view,
            reason: reason.into(),
        }
    }
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;
