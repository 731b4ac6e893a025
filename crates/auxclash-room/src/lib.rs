//! Room state machine and registry for AuxClash.
//!
//! Each room is an isolated Tokio task (actor model) owning its bracket,
//! countdown, prompt deck, and phase state. The [`GameManager`] registry
//! creates rooms, enforces global username uniqueness, and routes
//! identity-addressed operations to the owning room.
//!
//! # Key types
//!
//! - [`GameManager`] — the registry: create/join/route/prune
//! - [`RoomHandle`] — talk to a running room actor
//! - [`Phase`] / [`RoomStatus`] — the state machine and its projection
//! - [`PromptSource`] — where prompt packs come from

mod error;
mod prompts;
mod registry;
mod room;
mod status;

pub use error::RoomError;
pub use prompts::{BuiltinPrompts, PromptPack, PromptSource};
pub use registry::{GameManager, MIN_CONTESTANTS, MIN_CREDENTIAL_LEN};
pub use room::{DisconnectOutcome, RoomHandle, RoomInfo};
pub use status::{
    LockInReceipt, Phase, Role, RoomStatus, RoundResults, SubmissionSummary,
};
