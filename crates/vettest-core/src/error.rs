//! Error types.
//!
//! The scoring engine is infallible; these errors belong to the catalog
//! loader, the approval policy, and the persistence collaborator. `StoreError`
//! lives here so callers can classify failures for retry decisions without
//! string matching.

use thiserror::Error;

/// A catalog that violates the question or section invariants.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A multiple-choice question without any options.
    #[error("multiple-choice question '{question}' has no options")]
    MissingOptions { question: String },

    /// A multiple-choice question without a correct choice.
    #[error("multiple-choice question '{question}' has no correct choice")]
    MissingCorrectChoice { question: String },

    /// The correct choice is not one of the option keys.
    #[error("correct choice '{choice}' of question '{question}' is not one of its options")]
    UnknownCorrectChoice { question: String, choice: String },

    /// Negative or non-finite section weight.
    #[error("section '{section}' has invalid weight {weight}")]
    InvalidWeight { section: String, weight: f64 },

    /// The legacy question API reported a failure.
    #[error("catalog source reported an error: {0}")]
    SourceFailed(String),
}

/// An approval policy that cannot be satisfied.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("approval_min ({min}) is greater than approval_max ({max})")]
    InvertedBand { min: u32, max: u32 },
}

/// Errors raised by a persistence collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested record does not exist.
    #[error("record not found: {0}")]
    NotFound(String),

    /// A record with the same id already exists.
    #[error("record already exists: {0}")]
    Conflict(String),

    /// The record could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing store is temporarily unavailable.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Returns `true` if retrying the same operation cannot succeed.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            StoreError::NotFound(_) | StoreError::Conflict(_) | StoreError::Serialization(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_permanence() {
        assert!(StoreError::Conflict("x".into()).is_permanent());
        assert!(StoreError::NotFound("x".into()).is_permanent());
        assert!(!StoreError::Unavailable("down".into()).is_permanent());
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        assert!(!StoreError::from(io).is_permanent());
    }

    #[test]
    fn policy_error_message() {
        let err = PolicyError::InvertedBand { min: 95, max: 85 };
        assert_eq!(
            err.to_string(),
            "approval_min (95) is greater than approval_max (85)"
        );
    }
}
