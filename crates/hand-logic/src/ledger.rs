//! Append-only match ledger

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::LedgerError;
use crate::hand::HandId;
use crate::tournament::Outcome;

/// Stable identity supplied by the caller's identity provider
pub type UserId = u64;

/// A resolved match waiting to be written
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMatch {
    pub user_id: UserId,
    pub player_hand: HandId,
    pub opponent_hand: HandId,
    pub outcome: Outcome,
    pub played_at: DateTime<Utc>,
}

/// A match as stored. Immutable once written.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: u64,
    pub user_id: UserId,
    pub player_hand: HandId,
    pub opponent_hand: HandId,
    pub outcome: Outcome,
    pub played_at: DateTime<Utc>,
}

impl MatchRecord {
    pub fn from_new(id: u64, entry: NewMatch) -> Self {
        Self {
            id,
            user_id: entry.user_id,
            player_hand: entry.player_hand,
            opponent_hand: entry.opponent_hand,
            outcome: entry.outcome,
            played_at: entry.played_at,
        }
    }
}

/// Persistence seam for match records.
///
/// Implementations must make each `append` all-or-nothing, assign strictly
/// increasing ids, and make an appended record visible to the next
/// `records_for` call. There is no update or delete.
pub trait MatchLedger: Send + Sync {
    fn append(&self, entry: NewMatch) -> Result<MatchRecord, LedgerError>;

    /// Every record for `user`, in no particular order
    fn records_for(&self, user: UserId) -> Result<Vec<MatchRecord>, LedgerError>;
}

impl<L: MatchLedger + ?Sized> MatchLedger for Arc<L> {
    fn append(&self, entry: NewMatch) -> Result<MatchRecord, LedgerError> {
        (**self).append(entry)
    }

    fn records_for(&self, user: UserId) -> Result<Vec<MatchRecord>, LedgerError> {
        (**self).records_for(user)
    }
}

#[derive(Debug, Default)]
struct Inner {
    last_id: u64,
    by_user: HashMap<UserId, Vec<MatchRecord>>,
}

/// Process-local ledger
#[derive(Debug, Default)]
pub struct MemoryLedger {
    inner: RwLock<Inner>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total records across all users
    pub fn len(&self) -> usize {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.by_user.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MatchLedger for MemoryLedger {
    fn append(&self, entry: NewMatch) -> Result<MatchRecord, LedgerError> {
        let mut inner = self.inner.write().map_err(|_| LedgerError::Poisoned)?;
        inner.last_id += 1;
        let record = MatchRecord::from_new(inner.last_id, entry);
        inner
            .by_user
            .entry(record.user_id)
            .or_default()
            .push(record.clone());
        trace!(id = record.id, user = record.user_id, "appended match record");
        Ok(record)
    }

    fn records_for(&self, user: UserId) -> Result<Vec<MatchRecord>, LedgerError> {
        let inner = self.inner.read().map_err(|_| LedgerError::Poisoned)?;
        Ok(inner.by_user.get(&user).cloned().unwrap_or_default())
    }
}

/// Ledger whose storage is always down
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct FailingLedger;

#[cfg(test)]
impl MatchLedger for FailingLedger {
    fn append(&self, _entry: NewMatch) -> Result<MatchRecord, LedgerError> {
        Err(LedgerError::Storage("disk unavailable".into()))
    }

    fn records_for(&self, _user: UserId) -> Result<Vec<MatchRecord>, LedgerError> {
        Err(LedgerError::Storage("disk unavailable".into()))
    }
}
