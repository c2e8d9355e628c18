//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid model: {0:?}")]
    InvalidModel(String),

    #[error("Invalid run id: {0:?}")]
    InvalidRunId(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            DomainError::InvalidRunId("a/b".to_string()).to_string(),
            "Invalid run id: \"a/b\""
        );
        assert_eq!(
            DomainError::InvalidModel(String::new()).to_string(),
            "Invalid model: \"\""
        );
    }
}
