// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid argument '{name}': {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    #[error("Invalid job state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl DomainError {
    /// `name` was absent where a value is required
    pub fn null_argument(name: &'static str) -> Self {
        DomainError::InvalidArgument {
            name,
            reason: "must not be null".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DomainError>;
