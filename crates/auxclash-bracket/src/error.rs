//! Error types for the bracket engine.

use crate::MatchupId;

/// Errors from bracket operations.
///
/// The room layer only calls the engine with matchups the engine itself
/// handed out, so hitting one of these in practice means a bug upstream.
/// Each fails the single call and leaves the bracket untouched.
#[derive(Debug, thiserror::Error)]
pub enum BracketError {
    /// The bracket already has an overall winner; nothing left to play.
    #[error("bracket is already decided")]
    AlreadyDecided,

    /// The matchup id is not pending in the given round.
    #[error("matchup {0} is not pending in round {1}")]
    UnknownMatchup(MatchupId, u32),

    /// The named winner is not one of the matchup's entrants.
    #[error("winner is not an entrant of matchup {0}")]
    WinnerNotEntrant(MatchupId),

    /// A bracket needs at least one contestant.
    #[error("cannot build a bracket with no contestants")]
    NoContestants,
}
