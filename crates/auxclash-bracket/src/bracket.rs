//! The bracket: pending rounds, played history, and advancement rules.

use std::collections::BTreeMap;

use auxclash_protocol::Contestant;
use rand::Rng;
use rand::seq::SliceRandom;

use crate::{BracketError, Matchup, MatchupId, RoundsCache, total_rounds};

/// A single-elimination tournament tree.
///
/// Rounds are numbered from 1. A round's matchups are pending until their
/// id lands in that round's history; [`Self::next_matchup`] always returns
/// the first pending matchup of the lowest round, so a round fully
/// resolves before the next one begins.
///
/// The next round is *reconstructed* every time a winner is recorded:
/// everything accumulated there so far is flattened back into sequential
/// pairs (trailing entrant becomes a bye). Until the current round
/// finishes, the next round's pairings are provisional and may shift as
/// later winners arrive. Callers must treat a pairing as settled only
/// once its round has begun to play.
#[derive(Debug, Clone)]
pub struct Bracket {
    rounds: BTreeMap<u32, Vec<Matchup>>,
    history: BTreeMap<u32, Vec<MatchupId>>,
    winner: Option<Contestant>,
    total_rounds: u32,
    next_id: u64,
}

impl Bracket {
    /// Builds round 1 from the given contestants.
    ///
    /// The order is shuffled uniformly (Fisher–Yates via `SliceRandom`),
    /// then paired sequentially; an odd trailing contestant becomes a bye.
    /// If the matchup count itself comes out odd, the last matchup is
    /// rotated to the front so byes spread across rounds instead of
    /// stacking at the end of every round.
    pub fn build<R: Rng + ?Sized>(
        contestants: &[Contestant],
        cache: &mut RoundsCache,
        rng: &mut R,
    ) -> Result<Self, BracketError> {
        if contestants.is_empty() {
            return Err(BracketError::NoContestants);
        }
        let mut order = contestants.to_vec();
        order.shuffle(rng);

        let mut bracket = Self::seeded(order);
        bracket.total_rounds = total_rounds(contestants.len(), cache);
        Ok(bracket)
    }

    /// Builds round 1 in the given order, without shuffling.
    ///
    /// Used by the round-count simulation; `total_rounds` is left at 0 and
    /// filled in by [`Self::build`].
    pub(crate) fn seeded(order: Vec<Contestant>) -> Self {
        let mut bracket = Self {
            rounds: BTreeMap::new(),
            history: BTreeMap::new(),
            winner: None,
            total_rounds: 0,
            next_id: 0,
        };
        let mut matchups = bracket.pair_sequential(order);
        if matchups.len() % 2 == 1 {
            matchups.rotate_right(1);
        }
        bracket.rounds.insert(1, matchups);
        bracket
    }

    /// The overall winner, once the final matchup has resolved.
    pub fn winner(&self) -> Option<&Contestant> {
        self.winner.as_ref()
    }

    pub fn is_decided(&self) -> bool {
        self.winner.is_some()
    }

    /// Total rounds this bracket takes, fixed at build time.
    pub fn total_rounds(&self) -> u32 {
        self.total_rounds
    }

    /// The matchups currently recorded for a round (pending and played).
    pub fn round_matchups(&self, round: u32) -> Option<&[Matchup]> {
        self.rounds.get(&round).map(Vec::as_slice)
    }

    /// The first matchup not yet played, scanning rounds in ascending
    /// order. `None` once the bracket is decided (or, defensively, if
    /// nothing is pending).
    pub fn next_matchup(&self) -> Option<(u32, Matchup)> {
        if self.winner.is_some() {
            return None;
        }
        for (&round, matchups) in &self.rounds {
            let played = self.history.get(&round);
            for matchup in matchups {
                let done =
                    played.is_some_and(|ids| ids.contains(&matchup.id()));
                if !done {
                    return Some((round, matchup.clone()));
                }
            }
        }
        None
    }

    /// Records the outcome of a pending matchup and advances the winner.
    ///
    /// - Fails (no-op) once the bracket is decided.
    /// - A bye resolves to its sole entrant regardless of `winner`.
    /// - If the round holds exactly one matchup, the winner takes the
    ///   bracket (terminal).
    /// - Otherwise the winner joins round+1, which is then reconstructed
    ///   from every entrant accumulated there so far, in arrival order.
    pub fn play_next_matchup(
        &mut self,
        round: u32,
        id: MatchupId,
        winner: &Contestant,
    ) -> Result<(), BracketError> {
        if self.winner.is_some() {
            return Err(BracketError::AlreadyDecided);
        }
        let already_played = self
            .history
            .get(&round)
            .is_some_and(|ids| ids.contains(&id));
        let matchup = self
            .rounds
            .get(&round)
            .and_then(|ms| ms.iter().find(|m| m.id() == id))
            .filter(|_| !already_played)
            .cloned()
            .ok_or(BracketError::UnknownMatchup(id, round))?;

        let advancing = if matchup.is_bye() {
            matchup.entrants()[0].clone()
        } else if matchup.contains(&winner.client) {
            winner.clone()
        } else {
            return Err(BracketError::WinnerNotEntrant(id));
        };

        self.history.entry(round).or_default().push(id);

        let round_size = self.rounds.get(&round).map_or(0, Vec::len);
        if round_size == 1 {
            tracing::debug!(winner = %advancing.username, "bracket decided");
            self.winner = Some(advancing);
            return Ok(());
        }

        self.reconstruct_next_round(round + 1, advancing);
        Ok(())
    }

    /// Flatten-and-repair: pool every entrant already advanced into the
    /// round, append the newcomer, and re-pair sequentially. Fresh ids are
    /// allocated because these are new (still provisional) matchups.
    fn reconstruct_next_round(&mut self, round: u32, advancing: Contestant) {
        let mut pool: Vec<Contestant> = self
            .rounds
            .remove(&round)
            .unwrap_or_default()
            .into_iter()
            .flat_map(Matchup::into_entrants)
            .collect();
        pool.push(advancing);

        let rebuilt = self.pair_sequential(pool);
        self.rounds.insert(round, rebuilt);
    }

    /// Pairs a pool of contestants into matchups in order; an odd trailing
    /// contestant becomes a bye.
    fn pair_sequential(&mut self, pool: Vec<Contestant>) -> Vec<Matchup> {
        let mut matchups = Vec::with_capacity(pool.len().div_ceil(2));
        let mut entrants = pool.into_iter();
        loop {
            match (entrants.next(), entrants.next()) {
                (Some(a), Some(b)) => {
                    matchups.push(Matchup::new(self.alloc_id(), vec![a, b]));
                }
                (Some(lone), None) => {
                    matchups.push(Matchup::new(self.alloc_id(), vec![lone]));
                    break;
                }
                (None, _) => break,
            }
        }
        matchups
    }

    fn alloc_id(&mut self) -> MatchupId {
        self.next_id += 1;
        MatchupId(self.next_id)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn contestants(n: usize) -> Vec<Contestant> {
        (0..n)
            .map(|i| Contestant::new(format!("player-{i}"), format!("c-{i}")))
            .collect()
    }

    fn build(n: usize) -> Bracket {
        let mut cache = RoundsCache::new();
        let mut rng = StdRng::seed_from_u64(7);
        Bracket::build(&contestants(n), &mut cache, &mut rng).unwrap()
    }

    #[test]
    fn test_build_rejects_empty_field() {
        let mut cache = RoundsCache::new();
        let mut rng = StdRng::seed_from_u64(0);
        let result = Bracket::build(&[], &mut cache, &mut rng);
        assert!(matches!(result, Err(BracketError::NoContestants)));
    }

    #[test]
    fn test_build_round_one_shape() {
        // ⌈n/2⌉ matchups, every contestant in exactly one of them.
        for n in 1..=12 {
            let bracket = build(n);
            let round1 = bracket.round_matchups(1).unwrap();
            assert_eq!(round1.len(), n.div_ceil(2), "n = {n}");

            let mut seen: Vec<&str> = round1
                .iter()
                .flat_map(|m| m.entrants())
                .map(|c| c.username.as_str())
                .collect();
            seen.sort_unstable();
            assert_eq!(seen.len(), n, "n = {n}");
            seen.dedup();
            assert_eq!(seen.len(), n, "duplicate entrant for n = {n}");
        }
    }

    #[test]
    fn test_build_odd_matchup_count_puts_bye_first() {
        // 5 contestants → 3 matchups; the trailing bye is rotated to the
        // front so it resolves before the full pairings.
        let bracket = build(5);
        let round1 = bracket.round_matchups(1).unwrap();
        assert_eq!(round1.len(), 3);
        assert!(round1[0].is_bye());
        assert!(!round1[1].is_bye());
        assert!(!round1[2].is_bye());
    }

    #[test]
    fn test_build_even_matchup_count_no_bye() {
        let bracket = build(4);
        let round1 = bracket.round_matchups(1).unwrap();
        assert_eq!(round1.len(), 2);
        assert!(round1.iter().all(|m| !m.is_bye()));
    }

    #[test]
    fn test_next_matchup_returns_lowest_pending() {
        let mut bracket = build(4);
        let (round, first) = bracket.next_matchup().unwrap();
        assert_eq!(round, 1);

        let winner = first.entrants()[0].clone();
        bracket.play_next_matchup(round, first.id(), &winner).unwrap();

        // Still a pending matchup in round 1 — that comes before round 2.
        let (round, second) = bracket.next_matchup().unwrap();
        assert_eq!(round, 1);
        assert_ne!(second.id(), first.id());
    }

    #[test]
    fn test_play_bye_ignores_winner_argument() {
        let mut bracket = build(5);
        let (round, bye) = bracket.next_matchup().unwrap();
        assert!(bye.is_bye());
        let lone = bye.entrants()[0].clone();

        // Pass some *other* contestant as the claimed winner.
        let outsider = Contestant::new("outsider", "c-x");
        bracket.play_next_matchup(round, bye.id(), &outsider).unwrap();

        // The sole entrant advanced regardless.
        let round2 = bracket.round_matchups(2).unwrap();
        assert!(round2.iter().any(|m| m.contains(&lone.client)));
        assert!(!round2.iter().any(|m| m.contains(&outsider.client)));
    }

    #[test]
    fn test_play_rejects_non_entrant_winner() {
        let mut bracket = build(4);
        let (round, matchup) = bracket.next_matchup().unwrap();
        let outsider = Contestant::new("outsider", "c-x");
        let result = bracket.play_next_matchup(round, matchup.id(), &outsider);
        assert!(matches!(result, Err(BracketError::WinnerNotEntrant(_))));
    }

    #[test]
    fn test_play_rejects_replay_of_same_matchup() {
        let mut bracket = build(4);
        let (round, matchup) = bracket.next_matchup().unwrap();
        let winner = matchup.entrants()[0].clone();
        bracket.play_next_matchup(round, matchup.id(), &winner).unwrap();

        let result = bracket.play_next_matchup(round, matchup.id(), &winner);
        assert!(matches!(result, Err(BracketError::UnknownMatchup(..))));
    }

    #[test]
    fn test_play_after_decided_is_noop_failure() {
        let mut bracket = build(2);
        let (round, matchup) = bracket.next_matchup().unwrap();
        let winner = matchup.entrants()[0].clone();
        bracket.play_next_matchup(round, matchup.id(), &winner).unwrap();
        assert!(bracket.is_decided());

        let result = bracket.play_next_matchup(round, matchup.id(), &winner);
        assert!(matches!(result, Err(BracketError::AlreadyDecided)));
        assert_eq!(bracket.winner().unwrap(), &winner);
    }

    #[test]
    fn test_next_matchup_none_once_decided() {
        let mut bracket = build(2);
        let (round, matchup) = bracket.next_matchup().unwrap();
        let winner = matchup.entrants()[0].clone();
        bracket.play_next_matchup(round, matchup.id(), &winner).unwrap();
        assert!(bracket.next_matchup().is_none());
    }

    #[test]
    fn test_reconstruction_repairs_as_winners_arrive() {
        // 4 contestants, 2 matchups in round 1. After the first winner,
        // round 2 holds a provisional bye; after the second, the two
        // winners are re-paired into a single matchup with a fresh id.
        let mut bracket = build(4);

        let (round, m1) = bracket.next_matchup().unwrap();
        let w1 = m1.entrants()[0].clone();
        bracket.play_next_matchup(round, m1.id(), &w1).unwrap();

        let provisional = bracket.round_matchups(2).unwrap().to_vec();
        assert_eq!(provisional.len(), 1);
        assert!(provisional[0].is_bye());

        let (round, m2) = bracket.next_matchup().unwrap();
        assert_eq!(round, 1);
        let w2 = m2.entrants()[1].clone();
        bracket.play_next_matchup(round, m2.id(), &w2).unwrap();

        let finals = bracket.round_matchups(2).unwrap();
        assert_eq!(finals.len(), 1);
        assert!(!finals[0].is_bye());
        assert!(finals[0].contains(&w1.client));
        assert!(finals[0].contains(&w2.client));
        assert_ne!(finals[0].id(), provisional[0].id(), "repair allocates fresh ids");
    }
}
