//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("No council models configured")]
    NoModels,

    #[error("All council models failed to respond")]
    AllModelsFailed,

    #[error("Invalid question: {0}")]
    InvalidQuestion(String),

    #[error("Too many responses to anonymize: {0} (at most 26 labels available)")]
    TooManyResponses(usize),

    #[error("Invalid label map: {0}")]
    InvalidLabelMap(String),

    #[error("Invalid turn transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Operation cancelled")]
    Cancelled,
}

impl DomainError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_error_display() {
        let error = DomainError::Cancelled;
        assert_eq!(error.to_string(), "Operation cancelled");
    }

    #[test]
    fn test_is_cancelled_check() {
        assert!(DomainError::Cancelled.is_cancelled());
        assert!(!DomainError::NoModels.is_cancelled());
        assert!(!DomainError::AllModelsFailed.is_cancelled());
        assert!(!DomainError::TooManyResponses(27).is_cancelled());
    }
}
