//! The room registry: creates rooms, enforces username uniqueness, and
//! routes identity-addressed operations to the owning room.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use auxclash_protocol::{
    ClientId, Contestant, RoomHostEntry, RoomId, RoomSettings,
    VideoSubmission,
};

use crate::prompts::{PromptPack, PromptSource};
use crate::room::{spawn_room, DisconnectOutcome, RoomHandle, RoomInfo};
use crate::status::{LockInReceipt, RoomStatus};
use crate::{BuiltinPrompts, RoomError};

/// Counter for generating unique room ids.
static NEXT_ROOM_ID: AtomicU64 = AtomicU64::new(1);

/// Command channel size per room actor.
const COMMAND_CHANNEL_SIZE: usize = 64;

/// A game needs two matchup entrants and at least one voter.
pub const MIN_CONTESTANTS: usize = 3;

/// Minimum length for usernames and room passwords.
pub const MIN_CREDENTIAL_LEN: usize = 4;

/// The single in-memory registry of rooms.
///
/// Routing is scan-based: every operation that arrives with only a client
/// identity asks each room actor for its roster and picks the owner.
/// Username uniqueness runs over the same scans, which also prune handles
/// whose actor has exited (an emptied room shuts itself down).
pub struct GameManager {
    rooms: HashMap<RoomId, RoomHandle>,
    prompts: Arc<dyn PromptSource>,
}

impl GameManager {
    pub fn new(prompts: Arc<dyn PromptSource>) -> Self {
        Self {
            rooms: HashMap::new(),
            prompts,
        }
    }

    /// A registry backed by the compiled-in prompt packs.
    pub fn with_builtin_prompts() -> Self {
        Self::new(Arc::new(BuiltinPrompts))
    }

    // -- Scanning ---------------------------------------------------------

    /// Queries every room for its metadata, dropping rooms that no longer
    /// answer (their actor exited when the room emptied).
    async fn scan(&mut self) -> Vec<(RoomId, RoomInfo)> {
        let mut alive = Vec::with_capacity(self.rooms.len());
        let mut dead = Vec::new();
        for (&room_id, handle) in &self.rooms {
            match handle.info().await {
                Ok(info) => alive.push((room_id, info)),
                Err(_) => dead.push(room_id),
            }
        }
        for room_id in dead {
            tracing::debug!(%room_id, "pruned closed room");
            self.rooms.remove(&room_id);
        }
        alive
    }

    /// Finds the room a client belongs to.
    async fn find_room_of(
        &mut self,
        client: &ClientId,
    ) -> Result<RoomHandle, RoomError> {
        for (room_id, info) in self.scan().await {
            if info.clients.contains(client) {
                if let Some(handle) = self.rooms.get(&room_id) {
                    return Ok(handle.clone());
                }
            }
        }
        Err(RoomError::NotFound)
    }

    /// Whether a username collides (case-insensitively) with any
    /// contestant in any room.
    pub async fn is_unique_username(&mut self, username: &str) -> bool {
        !self.scan().await.iter().any(|(_, info)| {
            info.usernames
                .iter()
                .any(|taken| taken.eq_ignore_ascii_case(username))
        })
    }

    fn validate_credentials(
        username: &str,
        password: &str,
    ) -> Result<(), RoomError> {
        if username.chars().count() < MIN_CREDENTIAL_LEN
            || password.chars().count() < MIN_CREDENTIAL_LEN
        {
            return Err(RoomError::CredentialsTooShort);
        }
        Ok(())
    }

    async fn reject_known_client(
        &mut self,
        client: &ClientId,
    ) -> Result<(), RoomError> {
        match self.find_room_of(client).await {
            Ok(_) => Err(RoomError::AlreadyInRoom),
            Err(_) => Ok(()),
        }
    }

    // -- Lobby operations -------------------------------------------------

    /// Creates a room with the caller as host and returns its settings.
    pub async fn create_room(
        &mut self,
        username: &str,
        password: &str,
        client: ClientId,
    ) -> Result<RoomSettings, RoomError> {
        Self::validate_credentials(username, password)?;
        if !self.is_unique_username(username).await {
            return Err(RoomError::UsernameTaken(username.to_owned()));
        }
        self.reject_known_client(&client).await?;

        let room_id = RoomId(NEXT_ROOM_ID.fetch_add(1, Ordering::Relaxed));
        let host = Contestant::new(username, client);
        let handle = spawn_room(
            room_id,
            host,
            password.to_owned(),
            self.default_pack(),
            COMMAND_CHANNEL_SIZE,
        );
        self.rooms.insert(room_id, handle);
        tracing::info!(%room_id, host = username, "room created");
        Ok(RoomSettings::default())
    }

    /// Joins the room hosted by `host_username`.
    pub async fn join_room(
        &mut self,
        host_username: &str,
        username: &str,
        password: &str,
        client: ClientId,
    ) -> Result<RoomSettings, RoomError> {
        Self::validate_credentials(username, password)?;
        if !self.is_unique_username(username).await {
            return Err(RoomError::UsernameTaken(username.to_owned()));
        }
        self.reject_known_client(&client).await?;

        let target = self
            .scan()
            .await
            .into_iter()
            .find(|(_, info)| info.host.eq_ignore_ascii_case(host_username))
            .map(|(room_id, _)| room_id)
            .ok_or_else(|| {
                RoomError::UnknownHost(host_username.to_owned())
            })?;

        let handle = self
            .rooms
            .get(&target)
            .ok_or(RoomError::Unavailable)?
            .clone();
        handle
            .join(Contestant::new(username, client), password.to_owned())
            .await
    }

    /// The lobby listing: one entry per room, keyed by host.
    pub async fn room_hosts(&mut self) -> Vec<RoomHostEntry> {
        self.scan()
            .await
            .into_iter()
            .map(|(_, info)| RoomHostEntry {
                host: info.host,
                contestants: info.usernames.len(),
                max_players: info.max_players,
                in_game: info.in_game,
            })
            .collect()
    }

    /// Names of the prompt packs on offer.
    pub fn prompt_packs(&self) -> Vec<String> {
        self.prompts.pack_names()
    }

    fn default_pack(&self) -> PromptPack {
        // First listed pack; a sourceless setup still gets a playable deck.
        self.prompts
            .pack_names()
            .first()
            .and_then(|name| self.prompts.pack(name))
            .unwrap_or_else(|| PromptPack {
                name: "free-play".to_owned(),
                prompts: vec!["Play anything you want".to_owned()],
            })
    }

    // -- Identity-addressed operations ------------------------------------

    /// Host-only: builds the bracket and starts the game.
    pub async fn start_game(
        &mut self,
        client: ClientId,
    ) -> Result<(), RoomError> {
        let room = self.find_room_of(&client).await?;
        room.start_game(client).await
    }

    pub async fn submit_video(
        &mut self,
        client: ClientId,
        video: VideoSubmission,
    ) -> Result<(), RoomError> {
        let room = self.find_room_of(&client).await?;
        room.submit_video(client, video).await
    }

    pub async fn submit_vote(
        &mut self,
        client: ClientId,
        for_username: &str,
    ) -> Result<(), RoomError> {
        let room = self.find_room_of(&client).await?;
        room.submit_vote(client, for_username.to_owned()).await
    }

    pub async fn lock_in(
        &mut self,
        client: ClientId,
    ) -> Result<LockInReceipt, RoomError> {
        let room = self.find_room_of(&client).await?;
        room.lock_in(client).await
    }

    pub async fn room_state(
        &mut self,
        client: ClientId,
    ) -> Result<RoomStatus, RoomError> {
        let room = self.find_room_of(&client).await?;
        room.status(client).await
    }

    /// Host-only: replaces the room settings while in the lobby.
    pub async fn save_settings(
        &mut self,
        client: ClientId,
        settings: RoomSettings,
    ) -> Result<RoomSettings, RoomError> {
        let room = self.find_room_of(&client).await?;
        room.save_settings(client, settings).await
    }

    /// Host-only: installs a named prompt pack from the source.
    pub async fn save_prompt(
        &mut self,
        client: ClientId,
        pack_name: &str,
    ) -> Result<(), RoomError> {
        let pack = self
            .prompts
            .pack(pack_name)
            .ok_or_else(|| {
                RoomError::UnknownPromptPack(pack_name.to_owned())
            })?;
        if pack.prompts.is_empty() {
            return Err(RoomError::EmptyPromptPack(pack_name.to_owned()));
        }
        let room = self.find_room_of(&client).await?;
        room.install_prompts(client, pack).await
    }

    /// Reports a dropped connection to the owning room.
    ///
    /// The transport fires this for *every* lost connection, most of which
    /// belong to nobody in a room — those are a quiet no-op.
    pub async fn disconnect(
        &mut self,
        client: ClientId,
    ) -> Result<(), RoomError> {
        let room = match self.find_room_of(&client).await {
            Ok(room) => room,
            Err(RoomError::NotFound) => return Ok(()),
            Err(e) => return Err(e),
        };
        match room.disconnect(client).await? {
            DisconnectOutcome::Left {
                room_now_empty: true,
            } => {
                // The actor exits on its own; forget the handle now so
                // the host's username frees up immediately.
                self.rooms.remove(&room.room_id());
                tracing::info!(room_id = %room.room_id(), "empty room removed");
            }
            DisconnectOutcome::Left { .. } | DisconnectOutcome::GracePeriod => {}
        }
        Ok(())
    }

    /// Rejoins a paused game; returns the caller's view of the room.
    pub async fn reconnect(
        &mut self,
        client: ClientId,
    ) -> Result<RoomStatus, RoomError> {
        let room = self.find_room_of(&client).await?;
        room.reconnect(client).await
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
