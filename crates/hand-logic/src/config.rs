//! Game configuration: hand names, win table, persistence policy

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

use crate::hand::{HandCatalog, HandId};
use crate::resolver::PersistencePolicy;
use crate::tournament::{TournamentGraph, TournamentViolation};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid win table: {0}")]
    Tournament(#[from] TournamentViolation),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Display names, indexed by hand id
    pub hands: Vec<String>,
    /// `hand -> hands it beats`
    pub beats: BTreeMap<HandId, Vec<HandId>>,
    #[serde(default)]
    pub persistence: PersistencePolicy,
}

impl GameConfig {
    /// Seven-hand table shipped with the game
    pub fn reference() -> Self {
        let hands = ["rock", "scissors", "paper", "water", "air", "sponge", "fire"]
            .into_iter()
            .map(String::from)
            .collect();
        let beats = BTreeMap::from([
            (0, vec![1, 5, 6]),
            (1, vec![2, 4, 5]),
            (2, vec![0, 3, 4]),
            (3, vec![0, 1, 6]),
            (4, vec![0, 3, 6]),
            (5, vec![2, 3, 4]),
            (6, vec![1, 2, 5]),
        ]);
        Self {
            hands,
            beats,
            persistence: PersistencePolicy::default(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Validate the win table and produce the immutable catalog and graph.
    ///
    /// A table that is not a balanced odd tournament is rejected here, before
    /// any round can be resolved against it.
    pub fn build(&self) -> Result<(Arc<HandCatalog>, Arc<TournamentGraph>), ConfigError> {
        let catalog = HandCatalog::new(self.hands.iter().cloned());
        let graph = TournamentGraph::new(catalog.size(), &self.beats).map_err(|violation| {
            error!(%violation, "rejected win table");
            violation
        })?;
        info!(hands = catalog.size(), "loaded win table");
        Ok((Arc::new(catalog), Arc::new(graph)))
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::reference()
    }
}
