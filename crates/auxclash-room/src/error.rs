//! Error types for the room layer.
//!
//! Every variant's display string doubles as the boundary failure message
//! (the facade folds these into `{success: false, message}` replies), so
//! they are written for players, not logs.

use crate::registry::{MIN_CONTESTANTS, MIN_CREDENTIAL_LEN};

/// Errors from room and registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The caller's identity belongs to no room.
    #[error("you are not in a room")]
    NotFound,

    /// No room has the given host.
    #[error("no room hosted by {0:?}")]
    UnknownHost(String),

    /// The username collides (case-insensitively) with one already in play.
    #[error("username {0:?} is already taken")]
    UsernameTaken(String),

    /// Username or password below the minimum length.
    #[error(
        "username and password must be at least {MIN_CREDENTIAL_LEN} characters"
    )]
    CredentialsTooShort,

    /// Wrong room password.
    #[error("incorrect room password")]
    WrongPassword,

    /// The room is at capacity.
    #[error("room is full")]
    RoomFull,

    /// This identity already belongs to a room.
    #[error("you are already in a room")]
    AlreadyInRoom,

    /// A host-only operation called by a non-host.
    #[error("only the host can {0}")]
    HostOnly(&'static str),

    /// Not enough contestants to start a game.
    #[error("need at least {MIN_CONTESTANTS} contestants to start, have {0}")]
    NotEnoughContestants(usize),

    /// The operation is not valid in the room's current phase.
    #[error("{0} is not allowed right now")]
    WrongPhase(&'static str),

    /// The caller is not in the current matchup.
    #[error("you are not in the current matchup")]
    NotInMatchup,

    /// The caller is not a voter for the current matchup.
    #[error("you are not voting on this matchup")]
    NotAVoter,

    /// The vote names someone outside the current matchup.
    #[error("{0:?} is not in the current matchup")]
    InvalidVoteTarget(String),

    /// The submitted clip's start offset lies past its end.
    #[error("clip start offset is past the end of the track")]
    InvalidSubmission,

    /// Rejected settings change.
    #[error("invalid settings: {0}")]
    InvalidSettings(&'static str),

    /// No prompt pack with that name.
    #[error("unknown prompt pack {0:?}")]
    UnknownPromptPack(String),

    /// The named prompt pack has no prompts in it.
    #[error("prompt pack {0:?} is empty")]
    EmptyPromptPack(String),

    /// The room's task is gone (closed channel).
    #[error("room is unavailable")]
    Unavailable,
}
