use rust_decimal::Decimal;
use thiserror::Error;

/// Application-level error types
///
/// Every failure is recoverable: operations validate fully before mutating,
/// so an error always leaves the ledger unchanged.
#[derive(Error, Debug)]
pub enum EqubError {
    /// Bad or missing input (names, amounts, dates)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Non-creator attempting an admin-only action
    #[error("Permission denied: {0}")]
    Permission(String),

    /// State conflicts: duplicate payment in cycle, code collision,
    /// equb full, already joined, recipient already paid this cycle
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Unknown equb, member, or join code
    #[error("Not found: {0}")]
    NotFound(String),

    /// Contribution below the computed requirement; the caller may
    /// confirm and re-submit with the shortfall accepted
    #[error("Contribution below required amount: {required} ETB required, {offered} ETB offered")]
    BelowRequired { required: Decimal, offered: Decimal },

    /// Persistence failure (the in-memory ledger stays valid for the session)
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for application errors
pub type EqubResult<T> = Result<T, EqubError>;

impl EqubError {
    /// Check if error is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, EqubError::NotFound(_))
    }

    /// Check if the error asks the caller to confirm a short payment
    pub fn needs_confirmation(&self) -> bool {
        matches!(self, EqubError::BelowRequired { .. })
    }

    /// Short category label, used by the CLI when surfacing failures
    pub fn category(&self) -> &'static str {
        match self {
            EqubError::Validation(_) => "validation",
            EqubError::Permission(_) => "permission",
            EqubError::Conflict(_) => "conflict",
            EqubError::NotFound(_) => "not-found",
            EqubError::BelowRequired { .. } => "confirmation",
            EqubError::Storage(_) => "storage",
            EqubError::Serialization(_) => "serialization",
        }
    }
}
