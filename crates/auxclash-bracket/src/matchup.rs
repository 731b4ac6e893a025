//! Matchups: the 1-or-2 contestant unit competing in one round.

use std::fmt;

use auxclash_protocol::{ClientId, Contestant};
use serde::{Deserialize, Serialize};

/// A unique identifier for a matchup within one bracket.
///
/// Two matchups with identical entrants are still distinct matchups — the
/// history ledger records *which* matchup was played, not which pairing.
/// Reconstructed next-round pairings get fresh ids, so a pairing that
/// shifts while its round is still forming can never be mistaken for one
/// that already ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchupId(pub u64);

impl fmt::Display for MatchupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M-{}", self.0)
    }
}

/// One or two contestants competing for a slot in the next round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matchup {
    id: MatchupId,
    entrants: Vec<Contestant>,
}

impl Matchup {
    /// Invariant: `entrants` has length 1 (bye) or 2. Enforced by the
    /// bracket, which is the only constructor call site.
    pub(crate) fn new(id: MatchupId, entrants: Vec<Contestant>) -> Self {
        debug_assert!(!entrants.is_empty() && entrants.len() <= 2);
        Self { id, entrants }
    }

    pub fn id(&self) -> MatchupId {
        self.id
    }

    pub fn entrants(&self) -> &[Contestant] {
        &self.entrants
    }

    /// A bye has a single entrant who advances without playing.
    pub fn is_bye(&self) -> bool {
        self.entrants.len() == 1
    }

    /// Whether the given client is one of the entrants.
    pub fn contains(&self, client: &ClientId) -> bool {
        self.entrants.iter().any(|c| &c.client == client)
    }

    pub(crate) fn into_entrants(self) -> Vec<Contestant> {
        self.entrants
    }

    /// The entrant other than `client`, for 2-entrant matchups.
    pub fn opponent_of(&self, client: &ClientId) -> Option<&Contestant> {
        if self.entrants.len() != 2 {
            return None;
        }
        self.entrants.iter().find(|c| &c.client != client)
    }
}
