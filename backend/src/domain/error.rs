use thiserror::Error;

/// Failures surfaced by the scheduling services
#[derive(Debug, Error)]
pub enum DomainError {
    /// Input rejected at the validation boundary; `field` names the culprit.
    #[error("invalid {field}: {message}")]
    Validation { field: String, message: String },

    /// A job, client, rule or schedule slot does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// The backing store could not be read or written.
    #[error("storage failure: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl DomainError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        DomainError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        DomainError::NotFound(what.into())
    }

    /// Offending field for validation failures
    pub fn field(&self) -> Option<&str> {
        match self {
            DomainError::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}

pub type DomainResult<T> = std::result::Result<T, DomainError>;
