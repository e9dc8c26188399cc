//! Request/response shapes for an outer transport (HTTP, CLI, WASM)
//!
//! Identity is supplied by the caller; this layer only checks that it is
//! present.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::clock::Clock;
use crate::config::{ConfigError, GameConfig};
use crate::error::EngineError;
use crate::hand::{Hand, HandCatalog};
use crate::ledger::{MatchLedger, UserId};
use crate::query::{HistoryEntry, HistorySummary, LedgerQuery};
use crate::random::HandDraw;
use crate::resolver::{MatchResolver, MatchResult};
use crate::tournament::Outcome;

/// Player's pick as it arrives from the outside.
///
/// Form posts deliver strings, JSON clients numbers; both are accepted as long
/// as they hold an integer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayRequest {
    #[serde(default, alias = "player_hand")]
    pub player_hand_index: Option<Value>,
}

impl PlayRequest {
    pub fn new(index: i64) -> Self {
        Self {
            player_hand_index: Some(Value::from(index)),
        }
    }

    /// The submitted index, if it is an integer at all
    pub fn index(&self) -> Result<i64, EngineError> {
        match &self.player_hand_index {
            None | Some(Value::Null) => Err(EngineError::invalid_index("missing")),
            Some(Value::Number(n)) => n.as_i64().ok_or_else(|| EngineError::invalid_index(n)),
            Some(Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| EngineError::invalid_index(s)),
            Some(other) => Err(EngineError::invalid_index(other)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayResponse {
    pub player_hand_index: usize,
    pub player_hand_name: String,
    pub opponent_hand_index: usize,
    pub opponent_hand_name: String,
    pub outcome: Outcome,
    pub result_text: String,
    pub recorded: bool,
}

impl From<MatchResult> for PlayResponse {
    fn from(result: MatchResult) -> Self {
        let recorded = result.recorded();
        Self {
            player_hand_index: result.player_hand.id,
            player_hand_name: result.player_hand.name,
            opponent_hand_index: result.opponent_hand.id,
            opponent_hand_name: result.opponent_hand.name,
            outcome: result.outcome,
            result_text: result.outcome.message().to_string(),
            recorded,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error: String,
}

impl From<&EngineError> for ErrorPayload {
    fn from(err: &EngineError) -> Self {
        let error = match err {
            EngineError::InvalidHandIndex { .. } => "invalid hand index".to_string(),
            EngineError::MissingIdentity => "not signed in".to_string(),
            EngineError::PersistenceFailure(_) => "match could not be recorded".to_string(),
            EngineError::InvalidTournament(_) | EngineError::UnknownHand { .. } => {
                "internal error".to_string()
            }
        };
        Self { error }
    }
}

/// Play and history entry points bundled for a transport layer
pub struct Arena {
    resolver: MatchResolver,
    query: LedgerQuery,
}

impl Arena {
    pub fn new(resolver: MatchResolver, query: LedgerQuery) -> Self {
        Self { resolver, query }
    }

    pub fn from_config(
        config: &GameConfig,
        ledger: Arc<dyn MatchLedger>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        let (catalog, graph) = config.build()?;
        let resolver = MatchResolver::new(Arc::clone(&catalog), graph, Arc::clone(&ledger), clock)?
            .with_policy(config.persistence);
        let query = LedgerQuery::new(catalog, ledger);
        info!(policy = ?config.persistence, "arena ready");
        Ok(Self::new(resolver, query))
    }

    pub fn catalog(&self) -> &HandCatalog {
        self.resolver.catalog()
    }

    pub fn hands(&self) -> &[Hand] {
        self.catalog().hands()
    }

    pub fn resolver(&self) -> &MatchResolver {
        &self.resolver
    }

    pub fn query(&self) -> &LedgerQuery {
        &self.query
    }

    pub fn play<D: HandDraw + ?Sized>(
        &self,
        user: Option<UserId>,
        request: &PlayRequest,
        draw: &mut D,
    ) -> Result<PlayResponse, EngineError> {
        let user = user.ok_or(EngineError::MissingIdentity)?;
        let hand = self.catalog().parse_index(request.index()?)?;
        self.resolver.resolve(hand, draw, user).map(PlayResponse::from)
    }

    /// JSON in, JSON out. Errors come back as `{"error": "..."}`.
    pub fn play_json<D: HandDraw + ?Sized>(
        &self,
        user: Option<UserId>,
        body: &str,
        draw: &mut D,
    ) -> Value {
        let request = match serde_json::from_str::<PlayRequest>(body) {
            Ok(request) => request,
            Err(_) => return error_value(&EngineError::invalid_index(body)),
        };
        match self.play(user, &request, draw) {
            Ok(response) => serde_json::to_value(response)
                .unwrap_or_else(|err| serde_json::json!({ "error": err.to_string() })),
            Err(err) => error_value(&err),
        }
    }

    pub fn history(&self, user: Option<UserId>) -> Result<Vec<HistoryEntry>, EngineError> {
        let user = user.ok_or(EngineError::MissingIdentity)?;
        self.query.entries(user)
    }

    pub fn summary(&self, user: Option<UserId>) -> Result<HistorySummary, EngineError> {
        let user = user.ok_or(EngineError::MissingIdentity)?;
        self.query.summary(user)
    }
}

fn error_value(err: &EngineError) -> Value {
    serde_json::json!({ "error": ErrorPayload::from(err).error })
}
