//! Phases, roles, and the status projection sent to clients.

use std::fmt;

use auxclash_protocol::RoomSettings;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// One state of the per-room game loop.
///
/// ```text
/// setting → message → playing → voting → results → (message | ending)
///    ↑                                                      │
///    └────────────────────── reset ────────────────────────┘
/// ```
///
/// `setting` is the lobby; there is no terminal phase — a finished game
/// recycles the room back to `setting` for the next one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Lobby: contestants gather, the host tunes settings and prompts.
    #[default]
    Setting,
    /// An announcement screen with a countdown (versus, bye, notices).
    Message,
    /// Matchup entrants pick and submit their tracks.
    Playing,
    /// Everyone else votes.
    Voting,
    /// The round's outcome on display.
    Results,
    /// Transient marker for a voided round; resolves back to `setting`.
    Ending,
}

impl Phase {
    /// Lock-ins only mean something while a window is open to shorten.
    pub fn accepts_lock_in(&self) -> bool {
        matches!(self, Self::Playing | Self::Voting)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Setting => "setting",
            Self::Message => "message",
            Self::Playing => "playing",
            Self::Voting => "voting",
            Self::Results => "results",
            Self::Ending => "ending",
        };
        write!(f, "{name}")
    }
}

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// The caller's relationship to the current matchup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// In the current matchup.
    Player,
    /// Voting on the current matchup.
    Voter,
    /// Neither — watching this one from the bench.
    Waiter,
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// The outcome of one matchup, shown during the `results` phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundResults {
    pub winner: String,
    pub loser: String,
    /// Title of the winning submission, when there was one.
    pub track: Option<String>,
    /// Votes the winner received (synthesized as unanimous on a
    /// single-submission auto-award).
    pub votes: usize,
    /// Set when the vote was an exact tie and a coin flip decided it.
    pub tie: bool,
}

/// What clients see of one submission — enough to render the clip and who
/// it belongs to, nothing more.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionSummary {
    pub player: String,
    pub video_id: String,
    pub title: String,
    pub author: String,
    pub duration_secs: u32,
    pub start_secs: u32,
}

/// Acknowledgement for a lock-in: whether the caller had already locked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockInReceipt {
    pub already_locked: bool,
}

/// The caller-specific projection of a room's state.
///
/// This is the answer to every `room_state` poll; it never exposes other
/// contestants' identities, only usernames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomStatus {
    pub phase: Phase,
    pub role: Role,
    pub role_message: String,
    pub is_host: bool,
    pub host: String,
    pub contestants: Vec<String>,
    /// Usernames in the current matchup (empty outside a game).
    pub matchup: Vec<String>,
    pub voters: Vec<String>,
    /// Usernames currently in the disconnect grace window.
    pub disconnected: Vec<String>,
    /// Matchups played so far this game, 1-based once a game starts.
    pub round: u32,
    /// Depth of the current matchup in the bracket.
    pub bracket_level: u32,
    pub total_rounds: u32,
    pub announcement: Option<String>,
    pub prompt: Option<String>,
    /// Seconds left on the active countdown (0 when idle).
    pub countdown: u32,
    pub settings: RoomSettings,
    pub submissions: Vec<SubmissionSummary>,
    pub results: Option<RoundResults>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Phase::Setting).unwrap(), "\"setting\"");
        assert_eq!(serde_json::to_string(&Phase::Playing).unwrap(), "\"playing\"");
        assert_eq!(serde_json::to_string(&Phase::Ending).unwrap(), "\"ending\"");
    }

    #[test]
    fn test_phase_display_matches_wire_name() {
        for phase in [
            Phase::Setting,
            Phase::Message,
            Phase::Playing,
            Phase::Voting,
            Phase::Results,
            Phase::Ending,
        ] {
            let wire = serde_json::to_string(&phase).unwrap();
            assert_eq!(wire, format!("\"{phase}\""));
        }
    }

    #[test]
    fn test_phase_default_is_setting() {
        assert_eq!(Phase::default(), Phase::Setting);
    }

    #[test]
    fn test_accepts_lock_in_only_in_open_windows() {
        assert!(Phase::Playing.accepts_lock_in());
        assert!(Phase::Voting.accepts_lock_in());
        assert!(!Phase::Setting.accepts_lock_in());
        assert!(!Phase::Message.accepts_lock_in());
        assert!(!Phase::Results.accepts_lock_in());
        assert!(!Phase::Ending.accepts_lock_in());
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Voter).unwrap(), "\"voter\"");
    }

    #[test]
    fn test_round_results_round_trip() {
        let results = RoundResults {
            winner: "Alice".into(),
            loser: "Bob".into(),
            track: Some("Take On Me".into()),
            votes: 3,
            tie: false,
        };
        let bytes = serde_json::to_vec(&results).unwrap();
        let decoded: RoundResults = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(results, decoded);
    }
}
