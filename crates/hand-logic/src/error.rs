//! Error types shared across the engine

use thiserror::Error;

use crate::hand::HandId;
use crate::tournament::TournamentViolation;

/// Errors surfaced by hand resolution, the ledger, and the request boundary.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Caller picked a hand that is missing, non-integral, or outside the catalog.
    #[error("invalid hand index: {input}")]
    InvalidHandIndex { input: String },

    /// The win relation is not a balanced odd tournament.
    #[error("invalid tournament: {0}")]
    InvalidTournament(#[from] TournamentViolation),

    /// Internal misuse: a hand id outside the catalog reached the comparison API.
    #[error("unknown hand {hand} (catalog holds {size} hands)")]
    UnknownHand { hand: HandId, size: usize },

    #[error("no user identity supplied")]
    MissingIdentity,

    #[error("persistence failure: {0}")]
    PersistenceFailure(#[from] LedgerError),
}

impl EngineError {
    pub(crate) fn invalid_index(input: impl ToString) -> Self {
        EngineError::InvalidHandIndex {
            input: input.to_string(),
        }
    }

    /// Only ledger failures are worth retrying; everything else is a caller
    /// or configuration error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::PersistenceFailure(_))
    }
}

/// Storage-level failures reported by a [`crate::MatchLedger`].
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger lock poisoned")]
    Poisoned,

    #[error("storage error: {0}")]
    Storage(String),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for LedgerError {
    fn from(err: rusqlite::Error) -> Self {
        LedgerError::Storage(err.to_string())
    }
}
