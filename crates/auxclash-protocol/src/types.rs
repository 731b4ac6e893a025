//! Core identity and payload types.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// The durable identity of a participant.
///
/// Supplied by the external session layer: it survives reconnection even
/// though the underlying socket does not. The core treats it as an opaque
/// stable key — it is never parsed, only compared and hashed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub String);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ClientId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for ClientId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A unique identifier for a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Contestant
// ---------------------------------------------------------------------------

/// A participant in a room.
///
/// The username is globally unique (case-insensitively) across all rooms;
/// the client id ties the contestant back to their session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contestant {
    pub username: String,
    pub client: ClientId,
}

impl Contestant {
    pub fn new(username: impl Into<String>, client: impl Into<ClientId>) -> Self {
        Self {
            username: username.into(),
            client: client.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// RoomSettings
// ---------------------------------------------------------------------------

/// Per-room configuration, editable by the host before a game starts.
///
/// All durations are whole seconds — the countdown ticks at 1 Hz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSettings {
    /// Maximum contestants allowed in the room.
    pub max_players: usize,
    /// How much of a submitted track is played back to voters.
    pub clip_secs: u32,
    /// Submission window for a matchup.
    pub round_secs: u32,
    /// Voting window.
    pub vote_secs: u32,
    /// How long results stay on screen.
    pub results_secs: u32,
    /// Duration of announcement screens ("X vs Y", byes, game over).
    pub message_secs: u32,
    /// Grace window for a disconnected contestant to return.
    pub grace_secs: u32,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            max_players: 8,
            clip_secs: 30,
            round_secs: 90,
            vote_secs: 30,
            results_secs: 10,
            message_secs: 6,
            grace_secs: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// VideoSubmission
// ---------------------------------------------------------------------------

/// A contestant's chosen track for the current matchup.
///
/// The search that produced it happens outside the core (the client talks
/// to the content-search collaborator directly); by the time it arrives
/// here it is already a concrete playable item. The core records these
/// fields and nothing else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSubmission {
    /// Identifier understood by the playback side.
    pub video_id: String,
    /// Display title.
    pub title: String,
    /// Content author/channel — not the submitting contestant.
    pub author: String,
    /// Full length of the item, in seconds.
    pub duration_secs: u32,
    /// Where playback should start, in seconds.
    pub start_secs: u32,
}

// ---------------------------------------------------------------------------
// RoomHostEntry
// ---------------------------------------------------------------------------

/// A summary of one room for the lobby listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomHostEntry {
    /// Username of the room's host — rooms are addressed by host in joins.
    pub host: String,
    /// Number of contestants currently in the room.
    pub contestants: usize,
    /// Capacity from the room's settings.
    pub max_players: usize,
    /// Whether a game is currently running.
    pub in_game: bool,
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! JSON-shape tests.
    //!
    //! The external transport serializes these types verbatim, so the
    //! serde attributes are part of the contract — a shape change here
    //! breaks every client.

    use super::*;

    #[test]
    fn test_client_id_serializes_as_plain_string() {
        // `#[serde(transparent)]`: ClientId("abc") → "abc", not {"0":"abc"}.
        let json = serde_json::to_string(&ClientId::from("abc123")).unwrap();
        assert_eq!(json, "\"abc123\"");
    }

    #[test]
    fn test_client_id_deserializes_from_plain_string() {
        let id: ClientId = serde_json::from_str("\"abc123\"").unwrap();
        assert_eq!(id, ClientId::from("abc123"));
    }

    #[test]
    fn test_room_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&RoomId(7)).unwrap();
        assert_eq!(json, "7");
    }

    #[test]
    fn test_room_id_display() {
        assert_eq!(RoomId(3).to_string(), "R-3");
    }

    #[test]
    fn test_contestant_round_trip() {
        let c = Contestant::new("Alice", "sock-1");
        let bytes = serde_json::to_vec(&c).unwrap();
        let decoded: Contestant = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(c, decoded);
    }

    #[test]
    fn test_room_settings_default_values() {
        let s = RoomSettings::default();
        assert_eq!(s.max_players, 8);
        assert_eq!(s.clip_secs, 30);
        assert_eq!(s.round_secs, 90);
        assert_eq!(s.vote_secs, 30);
        assert_eq!(s.results_secs, 10);
        assert_eq!(s.message_secs, 6);
        assert_eq!(s.grace_secs, 30);
    }

    #[test]
    fn test_room_settings_round_trip() {
        let s = RoomSettings {
            max_players: 4,
            round_secs: 45,
            ..RoomSettings::default()
        };
        let bytes = serde_json::to_vec(&s).unwrap();
        let decoded: RoomSettings = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(s, decoded);
    }

    #[test]
    fn test_video_submission_json_field_names() {
        let v = VideoSubmission {
            video_id: "yt:dQw4w9WgXcQ".into(),
            title: "Never Gonna Give You Up".into(),
            author: "Rick Astley".into(),
            duration_secs: 212,
            start_secs: 43,
        };
        let json: serde_json::Value = serde_json::to_value(&v).unwrap();
        assert_eq!(json["video_id"], "yt:dQw4w9WgXcQ");
        assert_eq!(json["title"], "Never Gonna Give You Up");
        assert_eq!(json["author"], "Rick Astley");
        assert_eq!(json["duration_secs"], 212);
        assert_eq!(json["start_secs"], 43);
    }

    #[test]
    fn test_room_host_entry_round_trip() {
        let e = RoomHostEntry {
            host: "Alice".into(),
            contestants: 3,
            max_players: 8,
            in_game: false,
        };
        let bytes = serde_json::to_vec(&e).unwrap();
        let decoded: RoomHostEntry = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(e, decoded);
    }
}
