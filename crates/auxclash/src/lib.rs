//! # AuxClash
//!
//! A tournament clip-battle backend: contestants pair off in a
//! single-elimination bracket, submit tracks against a prompt, the rest of
//! the room votes, and the winner advances until someone takes the aux.
//!
//! This crate is the boundary surface. [`AuxClash`] owns the room
//! registry and exposes every identity-addressed operation the external
//! session/transport layer can invoke, each answering with a
//! [`Reply`] — failures are `{success: false, message}` values, never
//! faults. The transport maps its own requests (socket events, HTTP,
//! anything) onto these calls and serializes the replies as-is.
//!
//! ```no_run
//! use auxclash::AuxClash;
//!
//! # async fn demo() {
//! let mut service = AuxClash::with_builtin_prompts();
//! let created = service.create_room("Alice", "pass1", "sock-1".into()).await;
//! assert!(created.success);
//! # }
//! ```

use auxclash_protocol::{
    ClientId, Reply, RoomHostEntry, RoomSettings, VideoSubmission,
};
use auxclash_room::{
    GameManager, LockInReceipt, PromptSource, RoomStatus,
};
use std::sync::Arc;

pub use auxclash_protocol::{Contestant, RoomId};
pub use auxclash_room::{
    BuiltinPrompts, Phase, PromptPack, Role, RoomError, RoundResults,
    SubmissionSummary,
};
pub use auxclash_protocol as protocol;

/// The boundary service: one per process, driven by the transport layer.
pub struct AuxClash {
    manager: GameManager,
}

impl AuxClash {
    /// A service with a custom prompt-pack source (e.g. packs loaded from
    /// disk by the host application).
    pub fn new(prompts: Arc<dyn PromptSource>) -> Self {
        Self {
            manager: GameManager::new(prompts),
        }
    }

    /// A service backed by the compiled-in prompt packs.
    pub fn with_builtin_prompts() -> Self {
        Self {
            manager: GameManager::with_builtin_prompts(),
        }
    }

    /// Creates a room hosted by `username` and returns its settings.
    pub async fn create_room(
        &mut self,
        username: &str,
        password: &str,
        client: ClientId,
    ) -> Reply<RoomSettings> {
        self.manager
            .create_room(username, password, client)
            .await
            .into()
    }

    /// Joins the room hosted by `host_username`.
    pub async fn join_room(
        &mut self,
        host_username: &str,
        username: &str,
        password: &str,
        client: ClientId,
    ) -> Reply<RoomSettings> {
        self.manager
            .join_room(host_username, username, password, client)
            .await
            .into()
    }

    /// Host-only: builds the bracket and starts the game loop.
    pub async fn start_game(&mut self, client: ClientId) -> Reply<()> {
        match self.manager.start_game(client).await {
            Ok(()) => Reply::done(),
            Err(e) => Reply::fail(e.to_string()),
        }
    }

    /// The lobby listing of open rooms.
    pub async fn room_hosts(&mut self) -> Reply<Vec<RoomHostEntry>> {
        Reply::ok(self.manager.room_hosts().await)
    }

    /// The caller's view of their room.
    pub async fn room_state(
        &mut self,
        client: ClientId,
    ) -> Reply<RoomStatus> {
        self.manager.room_state(client).await.into()
    }

    /// Submits (or replaces) the caller's track for the current matchup.
    pub async fn submit_video(
        &mut self,
        client: ClientId,
        video: VideoSubmission,
    ) -> Reply<()> {
        match self.manager.submit_video(client, video).await {
            Ok(()) => Reply::done(),
            Err(e) => Reply::fail(e.to_string()),
        }
    }

    /// Casts (or replaces) the caller's vote for a matchup entrant.
    pub async fn submit_vote(
        &mut self,
        client: ClientId,
        for_username: &str,
    ) -> Reply<()> {
        match self.manager.submit_vote(client, for_username).await {
            Ok(()) => Reply::done(),
            Err(e) => Reply::fail(e.to_string()),
        }
    }

    /// Signals the caller is ready; may fast-forward the phase countdown.
    pub async fn lock_in(
        &mut self,
        client: ClientId,
    ) -> Reply<LockInReceipt> {
        self.manager.lock_in(client).await.into()
    }

    /// Host-only: replaces the room settings.
    pub async fn save_settings(
        &mut self,
        client: ClientId,
        settings: RoomSettings,
    ) -> Reply<RoomSettings> {
        self.manager.save_settings(client, settings).await.into()
    }

    /// Host-only: installs a named prompt pack.
    pub async fn save_prompt(
        &mut self,
        client: ClientId,
        pack_name: &str,
    ) -> Reply<()> {
        match self.manager.save_prompt(client, pack_name).await {
            Ok(()) => Reply::done(),
            Err(e) => Reply::fail(e.to_string()),
        }
    }

    /// Names of the prompt packs the source offers.
    pub fn prompt_packs(&self) -> Reply<Vec<String>> {
        Reply::ok(self.manager.prompt_packs())
    }

    /// Reports a dropped connection. Unknown identities are a no-op —
    /// the transport fires this for every lost socket.
    pub async fn disconnect(&mut self, client: ClientId) -> Reply<()> {
        match self.manager.disconnect(client).await {
            Ok(()) => Reply::done(),
            Err(e) => Reply::fail(e.to_string()),
        }
    }

    /// Rejoins after a disconnect; answers with the caller's room view.
    pub async fn reconnect(
        &mut self,
        client: ClientId,
    ) -> Reply<RoomStatus> {
        self.manager.reconnect(client).await.into()
    }
}
