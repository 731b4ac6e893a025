//! Room actor: an isolated Tokio task owning one game.
//!
//! Each room runs in its own task with its own countdown. The outside
//! world talks to it through an mpsc command channel; phase transitions
//! arrive as countdown expiries. Both feed the same `select!` loop, so
//! every mutation of room state is serialized through one task — there is
//! no other synchronization, and none is needed.

use std::collections::HashSet;

use auxclash_bracket::{Bracket, Matchup, RoundsCache};
use auxclash_protocol::{
    ClientId, Contestant, RoomId, RoomSettings, VideoSubmission,
};
use auxclash_timer::{Countdown, CountdownEvent, PausedCountdown};
use rand::Rng;
use tokio::sync::{mpsc, oneshot};

use crate::prompts::{PromptDeck, PromptPack};
use crate::registry::MIN_CONTESTANTS;
use crate::status::{
    LockInReceipt, Phase, Role, RoomStatus, RoundResults, SubmissionSummary,
};
use crate::RoomError;

// ---------------------------------------------------------------------------
// Timer goals — the phase-dispatch table
// ---------------------------------------------------------------------------

/// What an expiring countdown means for the room.
///
/// Every phase transition is one of these tags armed on the countdown and
/// interpreted by [`Room::on_expiry`]. The tag is the whole deferred
/// state — there are no captured closures, so a superseded transition is
/// cancelled by simply re-arming (or stopping) the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimerGoal {
    /// "X vs Y" announcement finished — open the submission window.
    BeginPlaying,
    /// Bye announcement finished — auto-advance its sole entrant.
    ResolveBye,
    /// Submission window closed — branch on how many tracks came in.
    EndPlaying,
    /// Voting window closed — tally.
    EndVoting,
    /// Results screen done — restart path.
    EndResults,
    /// "Neither submitted" notice done — void the round.
    VoidRound,
    /// "Game over" notice done — recycle the room to the lobby.
    FinishGame,
    /// Disconnect grace expired — purge the missing and abandon the game.
    AbandonGame,
}

// ---------------------------------------------------------------------------
// Internal round state
// ---------------------------------------------------------------------------

/// The matchup currently in play: its bracket round plus the matchup
/// itself (cloned out of the bracket when announced).
#[derive(Debug, Clone)]
struct CurrentMatchup {
    round: u32,
    matchup: Matchup,
}

/// Per-matchup transient state. Reset between matchups.
#[derive(Default)]
struct RoundStatus {
    phase: Phase,
    /// Matchups announced so far this game.
    round_counter: u32,
    bracket_level: u32,
    current: Option<CurrentMatchup>,
    voters: Vec<Contestant>,
    /// Last-write-wins per submitter.
    submissions: Vec<(ClientId, VideoSubmission)>,
    /// `(voter, voted-for)`, last write wins per voter.
    votes: Vec<(ClientId, ClientId)>,
    results: Option<RoundResults>,
    announcement: Option<String>,
    prompt: Option<String>,
}

/// Everything needed to resume play after a disconnect pause, captured
/// once on the first disconnect and restored in one move when the
/// disconnected set empties.
struct PausedSnapshot {
    phase: Phase,
    announcement: Option<String>,
    countdown: Option<PausedCountdown<TimerGoal>>,
}

// ---------------------------------------------------------------------------
// Commands and replies
// ---------------------------------------------------------------------------

/// What happened to a disconnecting contestant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectOutcome {
    /// No game running: the contestant left the room outright.
    Left { room_now_empty: bool },
    /// Game running: the grace notice is (already) counting down.
    GracePeriod,
}

/// A snapshot of room metadata for the registry's scans and the lobby.
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub host: String,
    pub usernames: Vec<String>,
    pub clients: Vec<ClientId>,
    pub max_players: usize,
    pub in_game: bool,
}

/// Commands sent to a room actor through its channel. Variants carrying a
/// `oneshot::Sender` are request/response; the rest are fire-and-forget.
pub(crate) enum RoomCommand {
    Join {
        contestant: Contestant,
        password: String,
        reply: oneshot::Sender<Result<RoomSettings, RoomError>>,
    },
    StartGame {
        caller: ClientId,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    SubmitVideo {
        caller: ClientId,
        video: VideoSubmission,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    SubmitVote {
        caller: ClientId,
        for_username: String,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    LockIn {
        caller: ClientId,
        reply: oneshot::Sender<Result<LockInReceipt, RoomError>>,
    },
    SaveSettings {
        caller: ClientId,
        settings: RoomSettings,
        reply: oneshot::Sender<Result<RoomSettings, RoomError>>,
    },
    InstallPrompts {
        caller: ClientId,
        pack: PromptPack,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Status {
        caller: ClientId,
        reply: oneshot::Sender<Result<RoomStatus, RoomError>>,
    },
    Disconnect {
        caller: ClientId,
        reply: oneshot::Sender<Result<DisconnectOutcome, RoomError>>,
    },
    Reconnect {
        caller: ClientId,
        reply: oneshot::Sender<Result<RoomStatus, RoomError>>,
    },
    Info {
        reply: oneshot::Sender<RoomInfo>,
    },
}

// ---------------------------------------------------------------------------
// RoomHandle
// ---------------------------------------------------------------------------

/// Handle to a running room actor. Cheap to clone — an mpsc sender.
///
/// A dead actor (emptied room) surfaces as [`RoomError::Unavailable`];
/// the registry prunes such handles on its next scan.
#[derive(Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<Result<T, RoomError>>) -> RoomCommand,
    ) -> Result<T, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(make(reply_tx))
            .await
            .map_err(|_| RoomError::Unavailable)?;
        reply_rx.await.map_err(|_| RoomError::Unavailable)?
    }

    pub async fn join(
        &self,
        contestant: Contestant,
        password: String,
    ) -> Result<RoomSettings, RoomError> {
        self.request(|reply| RoomCommand::Join {
            contestant,
            password,
            reply,
        })
        .await
    }

    pub async fn start_game(&self, caller: ClientId) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::StartGame { caller, reply })
            .await
    }

    pub async fn submit_video(
        &self,
        caller: ClientId,
        video: VideoSubmission,
    ) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::SubmitVideo {
            caller,
            video,
            reply,
        })
        .await
    }

    pub async fn submit_vote(
        &self,
        caller: ClientId,
        for_username: String,
    ) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::SubmitVote {
            caller,
            for_username,
            reply,
        })
        .await
    }

    pub async fn lock_in(
        &self,
        caller: ClientId,
    ) -> Result<LockInReceipt, RoomError> {
        self.request(|reply| RoomCommand::LockIn { caller, reply })
            .await
    }

    pub async fn save_settings(
        &self,
        caller: ClientId,
        settings: RoomSettings,
    ) -> Result<RoomSettings, RoomError> {
        self.request(|reply| RoomCommand::SaveSettings {
            caller,
            settings,
            reply,
        })
        .await
    }

    pub async fn install_prompts(
        &self,
        caller: ClientId,
        pack: PromptPack,
    ) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::InstallPrompts {
            caller,
            pack,
            reply,
        })
        .await
    }

    pub async fn status(
        &self,
        caller: ClientId,
    ) -> Result<RoomStatus, RoomError> {
        self.request(|reply| RoomCommand::Status { caller, reply })
            .await
    }

    pub async fn disconnect(
        &self,
        caller: ClientId,
    ) -> Result<DisconnectOutcome, RoomError> {
        self.request(|reply| RoomCommand::Disconnect { caller, reply })
            .await
    }

    pub async fn reconnect(
        &self,
        caller: ClientId,
    ) -> Result<RoomStatus, RoomError> {
        self.request(|reply| RoomCommand::Reconnect { caller, reply })
            .await
    }

    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Info { reply: reply_tx })
            .await
            .map_err(|_| RoomError::Unavailable)?;
        reply_rx.await.map_err(|_| RoomError::Unavailable)
    }
}

// ---------------------------------------------------------------------------
// The actor
// ---------------------------------------------------------------------------

enum Input {
    Command(Option<RoomCommand>),
    Clock(CountdownEvent<TimerGoal>),
}

struct Room {
    id: RoomId,
    host: Contestant,
    password: String,
    settings: RoomSettings,
    contestants: Vec<Contestant>,
    locked_in: HashSet<ClientId>,
    disconnected: HashSet<ClientId>,
    paused: Option<PausedSnapshot>,
    bracket: Option<Bracket>,
    rounds_cache: RoundsCache,
    deck: PromptDeck,
    status: RoundStatus,
}

/// Spawns a room actor and returns its handle. The host is the first
/// contestant.
pub(crate) fn spawn_room(
    room_id: RoomId,
    host: Contestant,
    password: String,
    deck_pack: PromptPack,
    channel_size: usize,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);

    let room = Room {
        id: room_id,
        host: host.clone(),
        password,
        settings: RoomSettings::default(),
        contestants: vec![host],
        locked_in: HashSet::new(),
        disconnected: HashSet::new(),
        paused: None,
        bracket: None,
        rounds_cache: RoundsCache::new(),
        deck: PromptDeck::new(deck_pack),
        status: RoundStatus::default(),
    };

    tokio::spawn(run(room, rx));

    RoomHandle {
        room_id,
        sender: tx,
    }
}

/// The actor loop: commands and countdown ticks, one at a time.
async fn run(mut room: Room, mut receiver: mpsc::Receiver<RoomCommand>) {
    tracing::info!(
        room_id = %room.id,
        host = %room.host.username,
        "room opened"
    );

    let mut countdown: Countdown<TimerGoal> = Countdown::idle();

    loop {
        let input = tokio::select! {
            cmd = receiver.recv() => Input::Command(cmd),
            event = countdown.tick() => Input::Clock(event),
        };

        match input {
            Input::Command(None) => break,
            Input::Command(Some(cmd)) => {
                room.handle_command(cmd, &mut countdown);
            }
            // The countdown value is read on demand by status polls;
            // a plain tick needs no action here.
            Input::Clock(CountdownEvent::Tick { .. }) => {}
            Input::Clock(CountdownEvent::Expired(goal)) => {
                room.on_expiry(goal, &mut countdown);
            }
        }

        if room.contestants.is_empty() {
            tracing::info!(room_id = %room.id, "room emptied");
            break;
        }
    }

    tracing::info!(room_id = %room.id, "room closed");
}

impl Room {
    // -- Command dispatch -------------------------------------------------

    fn handle_command(
        &mut self,
        cmd: RoomCommand,
        cd: &mut Countdown<TimerGoal>,
    ) {
        match cmd {
            RoomCommand::Join {
                contestant,
                password,
                reply,
            } => {
                let _ = reply.send(self.handle_join(contestant, &password));
            }
            RoomCommand::StartGame { caller, reply } => {
                let _ = reply.send(self.start_game(&caller, cd));
            }
            RoomCommand::SubmitVideo {
                caller,
                video,
                reply,
            } => {
                let _ = reply.send(self.submit_video(&caller, video));
            }
            RoomCommand::SubmitVote {
                caller,
                for_username,
                reply,
            } => {
                let _ = reply.send(self.submit_vote(&caller, &for_username));
            }
            RoomCommand::LockIn { caller, reply } => {
                let _ = reply.send(self.lock_in(&caller, cd));
            }
            RoomCommand::SaveSettings {
                caller,
                settings,
                reply,
            } => {
                let _ = reply.send(self.save_settings(&caller, settings));
            }
            RoomCommand::InstallPrompts {
                caller,
                pack,
                reply,
            } => {
                let _ = reply.send(self.install_prompts(&caller, pack));
            }
            RoomCommand::Status { caller, reply } => {
                let _ = reply.send(self.status_for(&caller, cd.remaining()));
            }
            RoomCommand::Disconnect { caller, reply } => {
                let _ = reply.send(self.handle_disconnect(&caller, cd));
            }
            RoomCommand::Reconnect { caller, reply } => {
                let _ = reply.send(self.handle_reconnect(&caller, cd));
            }
            RoomCommand::Info { reply } => {
                let _ = reply.send(self.info());
            }
        }
    }

    // -- Lobby operations -------------------------------------------------

    fn handle_join(
        &mut self,
        contestant: Contestant,
        password: &str,
    ) -> Result<RoomSettings, RoomError> {
        if self.status.phase != Phase::Setting {
            return Err(RoomError::WrongPhase("joining"));
        }
        if self.contestants.len() >= self.settings.max_players {
            return Err(RoomError::RoomFull);
        }
        if password != self.password {
            return Err(RoomError::WrongPassword);
        }

        tracing::info!(
            room_id = %self.id,
            username = %contestant.username,
            contestants = self.contestants.len() + 1,
            "contestant joined"
        );
        self.contestants.push(contestant);
        Ok(self.settings.clone())
    }

    fn save_settings(
        &mut self,
        caller: &ClientId,
        settings: RoomSettings,
    ) -> Result<RoomSettings, RoomError> {
        self.require_host(caller, "change settings")?;
        if self.status.phase != Phase::Setting {
            return Err(RoomError::WrongPhase("changing settings"));
        }
        if settings.max_players < MIN_CONTESTANTS {
            return Err(RoomError::InvalidSettings(
                "capacity below the three-contestant minimum",
            ));
        }
        if settings.max_players < self.contestants.len() {
            return Err(RoomError::InvalidSettings(
                "capacity below the current roster",
            ));
        }
        let durations = [
            settings.clip_secs,
            settings.round_secs,
            settings.vote_secs,
            settings.results_secs,
            settings.message_secs,
            settings.grace_secs,
        ];
        if durations.contains(&0) {
            return Err(RoomError::InvalidSettings(
                "every duration must be at least one second",
            ));
        }

        self.settings = settings;
        tracing::info!(room_id = %self.id, "settings updated");
        Ok(self.settings.clone())
    }

    fn install_prompts(
        &mut self,
        caller: &ClientId,
        pack: PromptPack,
    ) -> Result<(), RoomError> {
        self.require_host(caller, "choose the prompt pack")?;
        if self.status.phase != Phase::Setting {
            return Err(RoomError::WrongPhase("changing prompts"));
        }
        tracing::info!(room_id = %self.id, pack = %pack.name, "prompt pack installed");
        self.deck = PromptDeck::new(pack);
        Ok(())
    }

    fn require_host(
        &self,
        caller: &ClientId,
        action: &'static str,
    ) -> Result<(), RoomError> {
        if caller == &self.host.client {
            Ok(())
        } else {
            Err(RoomError::HostOnly(action))
        }
    }

    // -- Game start and the matchup loop ----------------------------------

    fn start_game(
        &mut self,
        caller: &ClientId,
        cd: &mut Countdown<TimerGoal>,
    ) -> Result<(), RoomError> {
        self.require_host(caller, "start the game")?;
        if self.status.phase != Phase::Setting {
            return Err(RoomError::WrongPhase("starting the game"));
        }
        if self.contestants.len() < MIN_CONTESTANTS {
            return Err(RoomError::NotEnoughContestants(
                self.contestants.len(),
            ));
        }

        let bracket = Bracket::build(
            &self.contestants,
            &mut self.rounds_cache,
            &mut rand::rng(),
        )
        .map_err(|_| RoomError::NotEnoughContestants(0))?;

        tracing::info!(
            room_id = %self.id,
            contestants = self.contestants.len(),
            rounds = bracket.total_rounds(),
            "game started"
        );
        self.bracket = Some(bracket);
        self.status.round_counter = 0;
        self.begin_matchup(cd);
        Ok(())
    }

    /// Announces the next pending matchup (step 1 of the loop) and arms
    /// the announcement countdown.
    fn begin_matchup(&mut self, cd: &mut Countdown<TimerGoal>) {
        let next = self.bracket.as_ref().and_then(Bracket::next_matchup);
        let Some((level, matchup)) = next else {
            // Defensive: the restart path only recurses here while the
            // bracket is undecided, so something pending must exist.
            tracing::warn!(room_id = %self.id, "no pending matchup; resetting");
            self.reset_to_setting(cd);
            return;
        };

        let voters: Vec<Contestant> = self
            .contestants
            .iter()
            .filter(|c| !matchup.contains(&c.client))
            .cloned()
            .collect();

        self.locked_in.clear();
        self.status.round_counter += 1;
        self.status.bracket_level = level;
        self.status.voters = voters;
        self.status.submissions.clear();
        self.status.votes.clear();
        self.status.results = None;
        self.status.phase = Phase::Message;

        let entrants = matchup.entrants();
        if matchup.is_bye() {
            self.status.announcement = Some(format!(
                "{} advances on a bye",
                entrants[0].username
            ));
            self.status.prompt = None;
            cd.arm(self.settings.message_secs, TimerGoal::ResolveBye);
        } else {
            self.status.announcement = Some(format!(
                "{} vs {}",
                entrants[0].username, entrants[1].username
            ));
            self.status.prompt = Some(self.deck.draw(&mut rand::rng()));
            cd.arm(self.settings.message_secs, TimerGoal::BeginPlaying);
        }

        tracing::info!(
            room_id = %self.id,
            round = self.status.round_counter,
            level,
            bye = matchup.is_bye(),
            "matchup announced"
        );
        self.status.current = Some(CurrentMatchup {
            round: level,
            matchup,
        });
    }

    // -- Countdown dispatch ------------------------------------------------

    fn on_expiry(&mut self, goal: TimerGoal, cd: &mut Countdown<TimerGoal>) {
        tracing::debug!(room_id = %self.id, ?goal, "countdown expired");
        match goal {
            TimerGoal::BeginPlaying => {
                self.status.phase = Phase::Playing;
                self.locked_in.clear();
                cd.arm(self.settings.round_secs, TimerGoal::EndPlaying);
            }
            TimerGoal::ResolveBye => {
                if let Some(current) = self.status.current.clone() {
                    let lone = current.matchup.entrants()[0].clone();
                    self.resolve_in_bracket(&current, &lone);
                }
                self.restart_path(cd);
            }
            TimerGoal::EndPlaying => self.end_playing(cd),
            TimerGoal::EndVoting => self.end_voting(cd),
            TimerGoal::EndResults => self.restart_path(cd),
            TimerGoal::VoidRound => {
                self.status.phase = Phase::Ending;
                self.restart_path(cd);
            }
            TimerGoal::FinishGame => self.reset_to_setting(cd),
            TimerGoal::AbandonGame => self.abandon_game(cd),
        }
    }

    /// Step 5: the submission window closed.
    fn end_playing(&mut self, cd: &mut Countdown<TimerGoal>) {
        match self.status.submissions.len() {
            0 => {
                tracing::info!(room_id = %self.id, "round voided — no submissions");
                self.status.phase = Phase::Message;
                self.status.announcement = Some(
                    "Neither contestant submitted a track — round voided"
                        .to_owned(),
                );
                self.status.prompt = None;
                cd.arm(self.settings.message_secs, TimerGoal::VoidRound);
            }
            1 => {
                // Sole submitter wins by walkover: synthesize a unanimous
                // vote so the results read like any other round.
                let submitter = self.status.submissions[0].0.clone();
                let Some(winner) = self.entrant_by_client(&submitter) else {
                    tracing::warn!(room_id = %self.id, "submitter left the matchup");
                    self.status.phase = Phase::Ending;
                    self.restart_path(cd);
                    return;
                };
                self.status.votes = self
                    .status
                    .voters
                    .iter()
                    .map(|v| (v.client.clone(), submitter.clone()))
                    .collect();
                let votes_for = self.status.votes.len();
                self.award_round(winner, votes_for, false, cd);
            }
            _ => {
                self.status.phase = Phase::Voting;
                self.status.votes.clear();
                self.locked_in.clear();
                cd.arm(self.settings.vote_secs, TimerGoal::EndVoting);
            }
        }
    }

    /// Step 6: tally and award.
    fn end_voting(&mut self, cd: &mut Countdown<TimerGoal>) {
        let Some(current) = self.status.current.clone() else {
            tracing::warn!(room_id = %self.id, "voting ended with no matchup");
            self.reset_to_setting(cd);
            return;
        };
        let entrants = current.matchup.entrants();
        if entrants.len() != 2 {
            tracing::warn!(room_id = %self.id, "voting ended on a bye");
            self.restart_path(cd);
            return;
        }

        let count = |client: &ClientId| {
            self.status
                .votes
                .iter()
                .filter(|(_, voted_for)| voted_for == client)
                .count()
        };
        let votes_first = count(&entrants[0].client);
        let votes_second = count(&entrants[1].client);

        let (first_wins, tie) =
            break_tie(votes_first, votes_second, &mut rand::rng());
        let (winner, votes_for) = if first_wins {
            (entrants[0].clone(), votes_first)
        } else {
            (entrants[1].clone(), votes_second)
        };

        self.award_round(winner, votes_for, tie, cd);
    }

    /// Records the decided winner in the bracket and shows results.
    fn award_round(
        &mut self,
        winner: Contestant,
        votes_for: usize,
        tie: bool,
        cd: &mut Countdown<TimerGoal>,
    ) {
        let Some(current) = self.status.current.clone() else {
            tracing::warn!(room_id = %self.id, "award with no matchup");
            self.reset_to_setting(cd);
            return;
        };

        self.resolve_in_bracket(&current, &winner);

        let loser = current
            .matchup
            .opponent_of(&winner.client)
            .map(|c| c.username.clone())
            .unwrap_or_default();
        let track = self
            .status
            .submissions
            .iter()
            .find(|(client, _)| client == &winner.client)
            .map(|(_, video)| video.title.clone());

        tracing::info!(
            room_id = %self.id,
            winner = %winner.username,
            votes = votes_for,
            tie,
            "round decided"
        );
        self.status.results = Some(RoundResults {
            winner: winner.username,
            loser,
            track,
            votes: votes_for,
            tie,
        });
        self.status.phase = Phase::Results;
        cd.arm(self.settings.results_secs, TimerGoal::EndResults);
    }

    fn resolve_in_bracket(
        &mut self,
        current: &CurrentMatchup,
        winner: &Contestant,
    ) {
        let Some(bracket) = &mut self.bracket else {
            tracing::warn!(room_id = %self.id, "resolution with no bracket");
            return;
        };
        if let Err(e) = bracket.play_next_matchup(
            current.round,
            current.matchup.id(),
            winner,
        ) {
            tracing::warn!(room_id = %self.id, error = %e, "bracket refused resolution");
        }
    }

    /// Step 7: clear transient state, then game-over / void / next matchup.
    fn restart_path(&mut self, cd: &mut Countdown<TimerGoal>) {
        self.status.votes.clear();
        self.status.submissions.clear();
        self.status.results = None;
        cd.stop();

        let champion = self
            .bracket
            .as_ref()
            .and_then(Bracket::winner)
            .map(|c| c.username.clone());
        if let Some(champion) = champion {
            tracing::info!(room_id = %self.id, %champion, "game over");
            self.status.phase = Phase::Message;
            self.status.announcement =
                Some(format!("Game over — {champion} takes the aux"));
            self.status.prompt = None;
            cd.arm(self.settings.message_secs, TimerGoal::FinishGame);
        } else if self.status.phase == Phase::Ending {
            self.reset_to_setting(cd);
        } else {
            self.begin_matchup(cd);
        }
    }

    /// Back to the lobby: drop the bracket and all transient state, keep
    /// the roster, settings, and prompt deck.
    fn reset_to_setting(&mut self, cd: &mut Countdown<TimerGoal>) {
        cd.stop();
        self.bracket = None;
        self.paused = None;
        self.locked_in.clear();
        self.disconnected.clear();
        self.status = RoundStatus::default();
        tracing::info!(room_id = %self.id, "room back in the lobby");
    }

    // -- In-round operations ----------------------------------------------

    fn submit_video(
        &mut self,
        caller: &ClientId,
        video: VideoSubmission,
    ) -> Result<(), RoomError> {
        if self.status.phase != Phase::Playing {
            return Err(RoomError::WrongPhase("submitting"));
        }
        if self.entrant_by_client(caller).is_none() {
            return Err(RoomError::NotInMatchup);
        }
        if video.duration_secs > 0 && video.start_secs >= video.duration_secs {
            return Err(RoomError::InvalidSubmission);
        }

        // Last write wins: a resubmission replaces the earlier track.
        self.status
            .submissions
            .retain(|(client, _)| client != caller);
        tracing::debug!(
            room_id = %self.id,
            title = %video.title,
            "track submitted"
        );
        self.status.submissions.push((caller.clone(), video));
        Ok(())
    }

    fn submit_vote(
        &mut self,
        caller: &ClientId,
        for_username: &str,
    ) -> Result<(), RoomError> {
        if self.status.phase != Phase::Voting {
            return Err(RoomError::WrongPhase("voting"));
        }
        if !self.status.voters.iter().any(|v| &v.client == caller) {
            return Err(RoomError::NotAVoter);
        }
        let target = self
            .status
            .current
            .as_ref()
            .and_then(|current| {
                current
                    .matchup
                    .entrants()
                    .iter()
                    .find(|c| c.username.eq_ignore_ascii_case(for_username))
            })
            .ok_or_else(|| {
                RoomError::InvalidVoteTarget(for_username.to_owned())
            })?
            .client
            .clone();

        // Last write wins for votes too.
        self.status.votes.retain(|(voter, _)| voter != caller);
        self.status.votes.push((caller.clone(), target));
        Ok(())
    }

    fn lock_in(
        &mut self,
        caller: &ClientId,
        cd: &mut Countdown<TimerGoal>,
    ) -> Result<LockInReceipt, RoomError> {
        if !self.status.phase.accepts_lock_in() {
            return Err(RoomError::WrongPhase("locking in"));
        }
        let already_locked = !self.locked_in.insert(caller.clone());

        // The shortcut: when everyone the phase waits on is ready, fall
        // through to the final second instead of running out the clock.
        let all_ready = match self.status.phase {
            Phase::Playing => self
                .status
                .current
                .as_ref()
                .is_some_and(|current| {
                    current
                        .matchup
                        .entrants()
                        .iter()
                        .all(|c| self.locked_in.contains(&c.client))
                }),
            Phase::Voting => self
                .status
                .voters
                .iter()
                .all(|v| self.locked_in.contains(&v.client)),
            _ => false,
        };
        if all_ready {
            tracing::debug!(room_id = %self.id, "all locked in — fast-forwarding");
            cd.fast_forward(1);
        }

        Ok(LockInReceipt { already_locked })
    }

    // -- Disconnect / reconnect -------------------------------------------

    fn handle_disconnect(
        &mut self,
        caller: &ClientId,
        cd: &mut Countdown<TimerGoal>,
    ) -> Result<DisconnectOutcome, RoomError> {
        if !self.contestants.iter().any(|c| &c.client == caller) {
            return Err(RoomError::NotFound);
        }

        // Lobby: leaving is final, the room dies when it empties.
        if self.bracket.is_none() {
            self.contestants.retain(|c| &c.client != caller);
            self.locked_in.remove(caller);
            tracing::info!(
                room_id = %self.id,
                remaining = self.contestants.len(),
                "contestant left before the game"
            );
            return Ok(DisconnectOutcome::Left {
                room_now_empty: self.contestants.is_empty(),
            });
        }

        // Mid-game: pause once, then keep extending the notice roster.
        if self.disconnected.contains(caller) {
            return Ok(DisconnectOutcome::GracePeriod);
        }

        let first = self.disconnected.is_empty();
        if first {
            self.paused = Some(PausedSnapshot {
                phase: self.status.phase,
                announcement: self.status.announcement.clone(),
                countdown: cd.pause(),
            });
        }
        self.disconnected.insert(caller.clone());

        self.status.phase = Phase::Message;
        self.status.announcement = Some(self.disconnect_notice());
        if first {
            cd.arm(self.settings.grace_secs, TimerGoal::AbandonGame);
            tracing::info!(
                room_id = %self.id,
                grace_secs = self.settings.grace_secs,
                "game paused for disconnect"
            );
        }

        Ok(DisconnectOutcome::GracePeriod)
    }

    fn handle_reconnect(
        &mut self,
        caller: &ClientId,
        cd: &mut Countdown<TimerGoal>,
    ) -> Result<RoomStatus, RoomError> {
        if !self.contestants.iter().any(|c| &c.client == caller) {
            return Err(RoomError::NotFound);
        }

        if self.disconnected.remove(caller) {
            if self.disconnected.is_empty() {
                // Everyone is back: restore the snapshot in one move.
                if let Some(snapshot) = self.paused.take() {
                    self.status.phase = snapshot.phase;
                    self.status.announcement = snapshot.announcement;
                    match snapshot.countdown {
                        Some(paused) => cd.resume(paused),
                        None => {
                            cd.stop();
                        }
                    }
                }
                tracing::info!(room_id = %self.id, "all reconnected — game resumed");
            } else {
                self.status.announcement = Some(self.disconnect_notice());
            }
        }
        // Reconnecting while never marked disconnected is benign — the
        // transport retries on flaky links.
        self.status_for(caller, cd.remaining())
    }

    /// Purge everyone still missing and recycle the room.
    fn abandon_game(&mut self, cd: &mut Countdown<TimerGoal>) {
        let gone = std::mem::take(&mut self.disconnected);
        self.contestants.retain(|c| !gone.contains(&c.client));
        tracing::info!(
            room_id = %self.id,
            purged = gone.len(),
            remaining = self.contestants.len(),
            "grace expired — game abandoned"
        );
        self.reset_to_setting(cd);
    }

    fn disconnect_notice(&self) -> String {
        // Roster order keeps the notice stable as the set changes.
        let names: Vec<&str> = self
            .contestants
            .iter()
            .filter(|c| self.disconnected.contains(&c.client))
            .map(|c| c.username.as_str())
            .collect();
        format!("Connection lost — waiting for {} to return", names.join(", "))
    }

    // -- Projections -------------------------------------------------------

    fn entrant_by_client(&self, client: &ClientId) -> Option<Contestant> {
        self.status
            .current
            .as_ref()
            .and_then(|current| {
                current
                    .matchup
                    .entrants()
                    .iter()
                    .find(|c| &c.client == client)
            })
            .cloned()
    }

    fn status_for(
        &self,
        caller: &ClientId,
        countdown: u32,
    ) -> Result<RoomStatus, RoomError> {
        if !self.contestants.iter().any(|c| &c.client == caller) {
            return Err(RoomError::NotFound);
        }

        let in_matchup = self.entrant_by_client(caller).is_some();
        let is_voter =
            self.status.voters.iter().any(|v| &v.client == caller);
        let (role, role_message) = if self.status.current.is_none() {
            (Role::Waiter, "Waiting for the game to start".to_owned())
        } else if in_matchup {
            (
                Role::Player,
                "You're up — pick your track and lock in".to_owned(),
            )
        } else if is_voter {
            (Role::Voter, "Listen close, your vote decides this one".to_owned())
        } else {
            (Role::Waiter, "Sitting this one out".to_owned())
        };

        let matchup = self
            .status
            .current
            .as_ref()
            .map(|current| {
                current
                    .matchup
                    .entrants()
                    .iter()
                    .map(|c| c.username.clone())
                    .collect()
            })
            .unwrap_or_default();

        let submissions = self
            .status
            .submissions
            .iter()
            .map(|(client, video)| SubmissionSummary {
                player: self
                    .contestants
                    .iter()
                    .find(|c| &c.client == client)
                    .map(|c| c.username.clone())
                    .unwrap_or_default(),
                video_id: video.video_id.clone(),
                title: video.title.clone(),
                author: video.author.clone(),
                duration_secs: video.duration_secs,
                start_secs: video.start_secs,
            })
            .collect();

        let disconnected = self
            .contestants
            .iter()
            .filter(|c| self.disconnected.contains(&c.client))
            .map(|c| c.username.clone())
            .collect();

        Ok(RoomStatus {
            phase: self.status.phase,
            role,
            role_message,
            is_host: caller == &self.host.client,
            host: self.host.username.clone(),
            contestants: self
                .contestants
                .iter()
                .map(|c| c.username.clone())
                .collect(),
            matchup,
            voters: self
                .status
                .voters
                .iter()
                .map(|v| v.username.clone())
                .collect(),
            disconnected,
            round: self.status.round_counter,
            bracket_level: self.status.bracket_level,
            total_rounds: self
                .bracket
                .as_ref()
                .map(Bracket::total_rounds)
                .unwrap_or(0),
            announcement: self.status.announcement.clone(),
            prompt: self.status.prompt.clone(),
            countdown,
            settings: self.settings.clone(),
            submissions,
            results: self.status.results.clone(),
        })
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.id,
            host: self.host.username.clone(),
            usernames: self
                .contestants
                .iter()
                .map(|c| c.username.clone())
                .collect(),
            clients: self
                .contestants
                .iter()
                .map(|c| c.client.clone())
                .collect(),
            max_players: self.settings.max_players,
            in_game: self.bracket.is_some(),
        }
    }
}

/// Majority wins; an exact count is settled by an unweighted coin flip.
/// Returns `(first entrant wins, was a tie)`.
fn break_tie<R: Rng + ?Sized>(
    votes_first: usize,
    votes_second: usize,
    rng: &mut R,
) -> (bool, bool) {
    match votes_first.cmp(&votes_second) {
        std::cmp::Ordering::Greater => (true, false),
        std::cmp::Ordering::Less => (false, false),
        std::cmp::Ordering::Equal => (rng.random_bool(0.5), true),
    }
}
