//! Single-round resolution against the computer

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::clock::Clock;
use crate::error::EngineError;
use crate::hand::{Hand, HandCatalog, HandId};
use crate::ledger::{MatchLedger, NewMatch, UserId};
use crate::random::HandDraw;
use crate::tournament::{Outcome, TournamentGraph, TournamentViolation};

/// What to do with a resolved round whose ledger write failed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistencePolicy {
    /// Fail the request; an unlogged round is never reported as played
    #[default]
    Strict,
    /// Report the round anyway, marked as not recorded
    BestEffort,
}

/// Result of one resolved round
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub user_id: UserId,
    pub player_hand: Hand,
    pub opponent_hand: Hand,
    pub outcome: Outcome,
    pub played_at: DateTime<Utc>,
    /// Ledger id, or `None` when the write failed under [`PersistencePolicy::BestEffort`]
    pub record_id: Option<u64>,
}

impl MatchResult {
    pub fn recorded(&self) -> bool {
        self.record_id.is_some()
    }
}

/// Resolves a player's hand against a randomly drawn opponent hand and
/// appends the round to the ledger.
pub struct MatchResolver {
    catalog: Arc<HandCatalog>,
    graph: Arc<TournamentGraph>,
    ledger: Arc<dyn MatchLedger>,
    clock: Arc<dyn Clock>,
    policy: PersistencePolicy,
}

impl MatchResolver {
    pub fn new(
        catalog: Arc<HandCatalog>,
        graph: Arc<TournamentGraph>,
        ledger: Arc<dyn MatchLedger>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, TournamentViolation> {
        if catalog.size() != graph.size() {
            return Err(TournamentViolation::SizeMismatch {
                hands: catalog.size(),
                table: graph.size(),
            });
        }
        Ok(Self {
            catalog,
            graph,
            ledger,
            clock,
            policy: PersistencePolicy::default(),
        })
    }

    pub fn with_policy(mut self, policy: PersistencePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> PersistencePolicy {
        self.policy
    }

    pub fn catalog(&self) -> &HandCatalog {
        &self.catalog
    }

    pub fn graph(&self) -> &TournamentGraph {
        &self.graph
    }

    /// Play one round for `user`.
    ///
    /// Exactly one ledger append is attempted per call, and only after the
    /// player's hand has been validated and the outcome computed.
    pub fn resolve<D: HandDraw + ?Sized>(
        &self,
        player_hand: HandId,
        draw: &mut D,
        user: UserId,
    ) -> Result<MatchResult, EngineError> {
        if !self.catalog.is_valid(player_hand) {
            return Err(EngineError::invalid_index(player_hand));
        }

        let opponent_hand = draw.draw(self.catalog.size());
        // a draw outside the catalog surfaces here as UnknownHand
        let outcome = self.graph.compare(player_hand, opponent_hand)?;
        let player = self.catalog.get(player_hand)?.clone();
        let opponent = self.catalog.get(opponent_hand)?.clone();
        let played_at = self.clock.now();

        debug!(
            user,
            player = %player.name,
            opponent = %opponent.name,
            %outcome,
            "resolved round"
        );

        let entry = NewMatch {
            user_id: user,
            player_hand,
            opponent_hand,
            outcome,
            played_at,
        };

        let record_id = match self.ledger.append(entry) {
            Ok(record) => Some(record.id),
            Err(err) => match self.policy {
                PersistencePolicy::Strict => {
                    error!(user, error = %err, "failed to record round");
                    return Err(EngineError::PersistenceFailure(err));
                }
                PersistencePolicy::BestEffort => {
                    warn!(user, error = %err, "round not recorded");
                    None
                }
            },
        };

        Ok(MatchResult {
            user_id: user,
            player_hand: player,
            opponent_hand: opponent,
            outcome,
            played_at,
            record_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::ledger::{FailingLedger, MemoryLedger};
    use crate::random::{FixedDraw, SeededRng};
    use crate::tournament::tests::reference_rows;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn catalog() -> Arc<HandCatalog> {
        Arc::new(HandCatalog::new([
            "rock", "scissors", "paper", "water", "air", "sponge", "fire",
        ]))
    }

    fn graph() -> Arc<TournamentGraph> {
        Arc::new(TournamentGraph::from_rows(&reference_rows()).unwrap())
    }

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        ))
    }

    fn resolver(ledger: Arc<dyn MatchLedger>) -> MatchResolver {
        MatchResolver::new(catalog(), graph(), ledger, clock()).unwrap()
    }

    #[test]
    fn test_forced_draw_scenario() {
        let ledger = Arc::new(MemoryLedger::new());
        let resolver = resolver(ledger.clone());

        let result = resolver.resolve(2, &mut FixedDraw(0), 11).unwrap();

        assert_eq!(result.player_hand.id, 2);
        assert_eq!(result.player_hand.name, "paper");
        assert_eq!(result.opponent_hand.id, 0);
        assert_eq!(result.opponent_hand.name, "rock");
        assert_eq!(result.outcome, Outcome::Win);
        assert_eq!(result.record_id, Some(1));

        let stored = ledger.records_for(11).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].player_hand, 2);
        assert_eq!(stored[0].opponent_hand, 0);
        assert_eq!(stored[0].outcome, Outcome::Win);
        assert_eq!(stored[0].played_at, result.played_at);
    }

    #[test]
    fn test_draw_and_loss() {
        let resolver = resolver(Arc::new(MemoryLedger::new()));
        let draw = resolver.resolve(4, &mut FixedDraw(4), 1).unwrap();
        assert_eq!(draw.outcome, Outcome::Draw);

        // 1 does not beat 0
        let loss = resolver.resolve(1, &mut FixedDraw(0), 1).unwrap();
        assert_eq!(loss.outcome, Outcome::Lose);
    }

    #[test]
    fn test_invalid_hand_writes_nothing() {
        let ledger = Arc::new(MemoryLedger::new());
        let resolver = resolver(ledger.clone());

        let err = resolver.resolve(9, &mut FixedDraw(0), 1).unwrap_err();
        assert!(matches!(err, EngineError::InvalidHandIndex { .. }));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_broken_draw_is_unknown_hand() {
        struct OutOfRange;
        impl HandDraw for OutOfRange {
            fn draw(&mut self, bound: usize) -> usize {
                bound
            }
        }

        let ledger = Arc::new(MemoryLedger::new());
        let resolver = resolver(ledger.clone());
        let err = resolver.resolve(0, &mut OutOfRange, 1).unwrap_err();
        assert!(matches!(err, EngineError::UnknownHand { hand: 7, .. }));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_strict_policy_fails_request() {
        let resolver = resolver(Arc::new(FailingLedger));
        assert_eq!(resolver.policy(), PersistencePolicy::Strict);

        let err = resolver.resolve(2, &mut FixedDraw(0), 1).unwrap_err();
        assert!(matches!(err, EngineError::PersistenceFailure(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_best_effort_policy_reports_unrecorded() {
        let resolver =
            resolver(Arc::new(FailingLedger)).with_policy(PersistencePolicy::BestEffort);

        let result = resolver.resolve(2, &mut FixedDraw(0), 1).unwrap();
        assert_eq!(result.outcome, Outcome::Win);
        assert!(!result.recorded());
        assert_eq!(result.record_id, None);
    }

    #[test]
    fn test_size_mismatch_rejected() {
        let small = Arc::new(HandCatalog::new(["rock", "scissors", "paper"]));
        let err = MatchResolver::new(small, graph(), Arc::new(MemoryLedger::new()), clock())
            .err()
            .unwrap();
        assert_eq!(err, TournamentViolation::SizeMismatch { hands: 3, table: 7 });
    }

    #[test]
    fn test_timestamps_follow_clock() {
        let clock = clock();
        let ledger = Arc::new(MemoryLedger::new());
        let resolver = MatchResolver::new(catalog(), graph(), ledger, clock.clone()).unwrap();

        let first = resolver.resolve(0, &mut FixedDraw(1), 1).unwrap();
        clock.advance(chrono::Duration::seconds(30));
        let second = resolver.resolve(0, &mut FixedDraw(1), 1).unwrap();

        assert_eq!(second.played_at - first.played_at, chrono::Duration::seconds(30));
        assert!(second.record_id > first.record_id);
    }

    #[test]
    fn test_seeded_replay_is_deterministic() {
        let resolver = resolver(Arc::new(MemoryLedger::new()));
        let seed = [3u8; 32];

        let run = |nonce| {
            let mut rng = SeededRng::new(&seed, nonce);
            (0..20)
                .map(|_| resolver.resolve(5, &mut rng, 2).unwrap().opponent_hand.id)
                .collect::<Vec<_>>()
        };
        assert_eq!(run(0), run(0));
    }

    proptest! {
        #[test]
        fn prop_opponent_stays_in_catalog(seed in any::<[u8; 32]>(), hand in 0usize..7) {
            let resolver = resolver(Arc::new(MemoryLedger::new()));
            let mut rng = SeededRng::new(&seed, 0);
            for _ in 0..10 {
                let result = resolver.resolve(hand, &mut rng, 1).unwrap();
                prop_assert!(result.opponent_hand.id < 7);
                prop_assert_eq!(
                    result.outcome,
                    resolver.graph().compare(hand, result.opponent_hand.id).unwrap()
                );
            }
        }
    }
}
