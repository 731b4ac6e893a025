//! Boundary types for AuxClash.
//!
//! Everything in this crate crosses the boundary between the game core and
//! the external session/transport layer: identifiers, room settings, video
//! submissions, lobby listings, and the [`Reply`] envelope that every
//! operation answers with.
//!
//! The transport itself (sockets, HTTP, whatever carries these payloads) is
//! an external collaborator — this crate only fixes the shapes it speaks.

mod reply;
mod types;

pub use reply::Reply;
pub use types::{
    ClientId, Contestant, RoomHostEntry, RoomId, RoomSettings,
    VideoSubmission,
};
