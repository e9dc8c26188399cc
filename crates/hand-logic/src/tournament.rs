//! Win relation over hands
//!
//! A hand set is only fair when the relation forms a balanced odd tournament:
//! - no hand beats itself
//! - every pair of distinct hands has exactly one winner
//! - every hand beats exactly (N-1)/2 others
//!
//! [`TournamentGraph::new`] checks all three before anything is resolved.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::EngineError;
use crate::hand::HandId;

/// Result of comparing two hands, from the first hand's point of view
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Lose,
    Draw,
}

impl Outcome {
    /// Stable machine-facing label
    pub fn label(self) -> &'static str {
        match self {
            Outcome::Win => "win",
            Outcome::Lose => "lose",
            Outcome::Draw => "draw",
        }
    }

    /// Human-facing text shown to the player
    pub fn message(self) -> &'static str {
        match self {
            Outcome::Win => "You win!",
            Outcome::Lose => "You lose...",
            Outcome::Draw => "It's a draw.",
        }
    }

    /// The same match seen from the other side
    pub fn reverse(self) -> Self {
        match self {
            Outcome::Win => Outcome::Lose,
            Outcome::Lose => Outcome::Win,
            Outcome::Draw => Outcome::Draw,
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "win" => Some(Outcome::Win),
            "lose" => Some(Outcome::Lose),
            "draw" => Some(Outcome::Draw),
            _ => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// First invariant a candidate win relation breaks
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TournamentViolation {
    #[error("tournament has no hands")]
    EmptyCatalog,

    #[error("hand count must be odd (got {size})")]
    EvenHandCount { size: usize },

    #[error("catalog has {hands} hands but the table covers {table}")]
    SizeMismatch { hands: usize, table: usize },

    #[error("hand {hand} is outside the catalog of {size}")]
    OutOfRange { hand: HandId, size: usize },

    #[error("hand {hand} beats itself")]
    SelfBeat { hand: HandId },

    #[error("neither {a} nor {b} beats the other")]
    MissingPair { a: HandId, b: HandId },

    #[error("{a} and {b} both beat each other")]
    MutualBeat { a: HandId, b: HandId },

    #[error("hand {hand} beats {degree} hands, expected {expected}")]
    IrregularOutDegree {
        hand: HandId,
        degree: usize,
        expected: usize,
    },
}

/// Validated, immutable win relation.
///
/// Stored as a dense `size * size` matrix; `wins[a * size + b]` is true iff
/// `a` directly beats `b`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TournamentGraph {
    size: usize,
    wins: Vec<bool>,
}

impl TournamentGraph {
    /// Build from a mapping `hand -> hands it beats`.
    ///
    /// Hands absent from the mapping beat nothing, which the pair and
    /// out-degree checks then reject.
    pub fn new(
        size: usize,
        beats: &BTreeMap<HandId, Vec<HandId>>,
    ) -> Result<Self, TournamentViolation> {
        if size == 0 {
            return Err(TournamentViolation::EmptyCatalog);
        }
        if size % 2 == 0 {
            return Err(TournamentViolation::EvenHandCount { size });
        }

        let mut wins = vec![false; size * size];
        for (&from, targets) in beats {
            if from >= size {
                return Err(TournamentViolation::OutOfRange { hand: from, size });
            }
            for &to in targets {
                if to >= size {
                    return Err(TournamentViolation::OutOfRange { hand: to, size });
                }
                if to == from {
                    return Err(TournamentViolation::SelfBeat { hand: from });
                }
                wins[from * size + to] = true;
            }
        }

        for a in 0..size {
            for b in (a + 1)..size {
                match (wins[a * size + b], wins[b * size + a]) {
                    (true, true) => return Err(TournamentViolation::MutualBeat { a, b }),
                    (false, false) => return Err(TournamentViolation::MissingPair { a, b }),
                    _ => {}
                }
            }
        }

        let expected = (size - 1) / 2;
        for hand in 0..size {
            let degree = wins[hand * size..(hand + 1) * size]
                .iter()
                .filter(|w| **w)
                .count();
            if degree != expected {
                return Err(TournamentViolation::IrregularOutDegree {
                    hand,
                    degree,
                    expected,
                });
            }
        }

        Ok(Self { size, wins })
    }

    /// Build from rows where `rows[i]` lists the hands `i` beats.
    pub fn from_rows(rows: &[Vec<HandId>]) -> Result<Self, TournamentViolation> {
        let beats: BTreeMap<HandId, Vec<HandId>> = rows.iter().cloned().enumerate().collect();
        Self::new(rows.len(), &beats)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    fn check(&self, hand: HandId) -> Result<(), EngineError> {
        if hand < self.size {
            Ok(())
        } else {
            Err(EngineError::UnknownHand {
                hand,
                size: self.size,
            })
        }
    }

    /// True iff `a` directly beats `b`
    pub fn beats(&self, a: HandId, b: HandId) -> Result<bool, EngineError> {
        self.check(a)?;
        self.check(b)?;
        Ok(self.wins[a * self.size + b])
    }

    /// Outcome for `a` when played against `b`
    pub fn compare(&self, a: HandId, b: HandId) -> Result<Outcome, EngineError> {
        if self.beats(a, b)? {
            Ok(Outcome::Win)
        } else if a == b {
            Ok(Outcome::Draw)
        } else {
            Ok(Outcome::Lose)
        }
    }

    fn row(&self, hand: HandId) -> impl Iterator<Item = HandId> + '_ {
        self.wins[hand * self.size..(hand + 1) * self.size]
            .iter()
            .enumerate()
            .filter_map(|(b, w)| w.then_some(b))
    }

    /// Hands that `hand` beats, ascending
    pub fn victims(&self, hand: HandId) -> Result<Vec<HandId>, EngineError> {
        self.check(hand)?;
        Ok(self.row(hand).collect())
    }
}
