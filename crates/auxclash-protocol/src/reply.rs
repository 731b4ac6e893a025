//! The reply envelope.
//!
//! Every boundary operation answers with a [`Reply`]: failures travel as
//! `{success: false, message}` values, never as faults. Successful replies
//! carry their payload under `data` (omitted for operations that return
//! nothing).

use serde::{Deserialize, Serialize};

/// Result envelope for a boundary operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply<T> {
    /// Whether the operation succeeded.
    pub success: bool,
    /// Human-readable failure reason; absent on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// The operation's payload; absent on failure and for unit replies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> Reply<T> {
    /// A successful reply carrying a payload.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    /// A successful reply with no payload.
    pub fn done() -> Self {
        Self {
            success: true,
            message: None,
            data: None,
        }
    }

    /// A failed reply with a reason.
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }
}

/// Maps a `Result` into the envelope, using the error's `Display` as the
/// failure message.
impl<T, E: std::fmt::Display> From<Result<T, E>> for Reply<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => Reply::ok(data),
            Err(e) => Reply::fail(e.to_string()),
        }
    }
}
