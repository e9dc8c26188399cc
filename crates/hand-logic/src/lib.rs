//! Hand Logic
//!
//! Generalized rock-paper-scissors against a computer opponent:
//! - a catalog of N hands (N odd)
//! - a validated, balanced win relation over them
//! - single-round resolution with an injectable randomness source
//! - an append-only per-user match ledger and its history queries
//!
//! This crate is compiled to:
//! - Native (for services and the `arena` CLI)
//! - WASM (for frontend previews of the win table)

mod api;
mod clock;
mod config;
mod error;
mod hand;
mod ledger;
mod query;
mod random;
mod resolver;
mod tournament;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "wasm")]
mod wasm;

pub use api::{Arena, ErrorPayload, PlayRequest, PlayResponse};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, GameConfig};
pub use error::{EngineError, LedgerError};
pub use hand::{Hand, HandCatalog, HandId};
pub use ledger::{MatchLedger, MatchRecord, MemoryLedger, NewMatch, UserId};
pub use query::{HistoryEntry, HistorySummary, LedgerQuery};
pub use random::{HandDraw, RngDraw, SeededRng, SystemDraw};
pub use resolver::{MatchResolver, MatchResult, PersistencePolicy};
pub use tournament::{Outcome, TournamentGraph, TournamentViolation};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteLedger;
