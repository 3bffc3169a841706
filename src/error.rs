//! Error taxonomy for the billing core.
//!
//! Cart and totals operations never fail; every failure surface lives at the
//! persistence or export boundary and is recoverable at the UI level. The
//! `Network` variant is the only transient one — the retry policy refuses to
//! retry anything else.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PosError>;

#[derive(Debug, Error)]
pub enum PosError {
    /// Locally rejected input (missing required field, disallowed price).
    /// No state was mutated.
    #[error("validation: {0}")]
    Validation(String),

    /// A repository call failed. State is unchanged; the caller may retry.
    #[error("persistence: {0}")]
    Persistence(String),

    /// Connectivity failure on a read. Retried a bounded number of times
    /// before falling back to the cached menu snapshot.
    #[error("network: {0}")]
    Network(String),

    /// Receipt/PDF/ZIP generation failed.
    #[error("render: {0}")]
    Render(String),
}

impl PosError {
    /// Whether the retry policy is allowed to re-attempt the operation.
    pub fn is_transient(&self) -> bool {
        matches!(self, PosError::Network(_))
    }
}

impl From<rusqlite::Error> for PosError {
    fn from(e: rusqlite::Error) -> Self {
        PosError::Persistence(e.to_string())
    }
}

impl From<serde_json::Error> for PosError {
    fn from(e: serde_json::Error) -> Self {
        PosError::Persistence(format!("json: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_network_is_transient() {
        assert!(PosError::Network("down".into()).is_transient());
        assert!(!PosError::Persistence("disk".into()).is_transient());
        assert!(!PosError::Validation("name".into()).is_transient());
        assert!(!PosError::Render("pdf".into()).is_transient());
    }
}
