//! The fixed set of selectable hands

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Index of a hand within its catalog, always in `[0, N)`.
pub type HandId = usize;

/// One selectable move
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hand {
    pub id: HandId,
    pub name: String,
}

/// Immutable, enumerable set of hands.
///
/// Ids are dense: the hand at position `i` has id `i`. The catalog does not
/// enforce an odd size on its own; [`crate::TournamentGraph`] rejects even
/// catalogs when the win relation is built over them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HandCatalog {
    hands: Vec<Hand>,
}

impl HandCatalog {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let hands = names
            .into_iter()
            .enumerate()
            .map(|(id, name)| Hand { id, name: name.into() })
            .collect();
        Self { hands }
    }

    /// Number of hands (N)
    pub fn size(&self) -> usize {
        self.hands.len()
    }

    pub fn is_valid(&self, id: HandId) -> bool {
        id < self.hands.len()
    }

    pub fn get(&self, id: HandId) -> Result<&Hand, EngineError> {
        self.hands.get(id).ok_or(EngineError::UnknownHand {
            hand: id,
            size: self.hands.len(),
        })
    }

    pub fn name(&self, id: HandId) -> Result<&str, EngineError> {
        self.get(id).map(|hand| hand.name.as_str())
    }

    pub fn hands(&self) -> &[Hand] {
        &self.hands
    }

    /// Turn an untrusted signed index into a catalog id.
    pub fn parse_index(&self, index: i64) -> Result<HandId, EngineError> {
        usize::try_from(index)
            .ok()
            .filter(|id| self.is_valid(*id))
            .ok_or_else(|| EngineError::invalid_index(index))
    }
}
