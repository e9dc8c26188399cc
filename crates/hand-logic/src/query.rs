//! Read side of the ledger

use std::cmp::Reverse;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::hand::HandCatalog;
use crate::ledger::{MatchLedger, MatchRecord, UserId};
use crate::tournament::Outcome;

/// Display form of one past round
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub player_hand_name: String,
    pub opponent_hand_name: String,
    pub outcome: Outcome,
    pub timestamp: DateTime<Utc>,
}

/// Win/lose/draw tally for one user
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistorySummary {
    pub played: usize,
    pub wins: usize,
    pub losses: usize,
    pub draws: usize,
}

impl HistorySummary {
    fn add(&mut self, outcome: Outcome) {
        self.played += 1;
        match outcome {
            Outcome::Win => self.wins += 1,
            Outcome::Lose => self.losses += 1,
            Outcome::Draw => self.draws += 1,
        }
    }
}

pub struct LedgerQuery {
    catalog: Arc<HandCatalog>,
    ledger: Arc<dyn MatchLedger>,
}

impl LedgerQuery {
    pub fn new(catalog: Arc<HandCatalog>, ledger: Arc<dyn MatchLedger>) -> Self {
        Self { catalog, ledger }
    }

    /// All of `user`'s rounds, most recent first.
    ///
    /// Equal timestamps fall back to the higher record id first, so the
    /// order is total and repeatable.
    pub fn history(&self, user: UserId) -> Result<Vec<MatchRecord>, EngineError> {
        let mut records = self.ledger.records_for(user)?;
        records.sort_unstable_by_key(|r| Reverse((r.played_at, r.id)));
        Ok(records)
    }

    /// The first `limit` entries of [`Self::history`]
    pub fn recent(&self, user: UserId, limit: usize) -> Result<Vec<MatchRecord>, EngineError> {
        let mut records = self.history(user)?;
        records.truncate(limit);
        Ok(records)
    }

    /// [`Self::history`] with hand ids resolved to names
    pub fn entries(&self, user: UserId) -> Result<Vec<HistoryEntry>, EngineError> {
        self.history(user)?
            .into_iter()
            .map(|record| {
                Ok(HistoryEntry {
                    player_hand_name: self.catalog.name(record.player_hand)?.to_string(),
                    opponent_hand_name: self.catalog.name(record.opponent_hand)?.to_string(),
                    outcome: record.outcome,
                    timestamp: record.played_at,
                })
            })
            .collect()
    }

    pub fn summary(&self, user: UserId) -> Result<HistorySummary, EngineError> {
        let mut summary = HistorySummary::default();
        for record in self.ledger.records_for(user)? {
            summary.add(record.outcome);
        }
        Ok(summary)
    }
}
