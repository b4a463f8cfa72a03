use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rand::Rng;
use regex::Regex;
use sea_orm::DatabaseConnection;
use std::sync::{Arc, LazyLock};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::dataset::ChallengeDataset;
use crate::websocket::connection::{ConnectionId, ConnectionManager, RoomBinding};
use battle_core::{Room, RoundClosure};
use battle_persistence::repositories::round_repository::NewRound;
use battle_persistence::{RoomRepository, RoundRepository};
use battle_types::{
    GameError, Player, RoomPhase, RoomSettings, RoomSnapshot, ServerMessage,
};

const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const ROOM_CODE_LENGTH: usize = 6;
const CODE_GENERATION_ATTEMPTS: usize = 32;

static ROOM_CODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^[A-Z0-9]{6}$").unwrap());

pub fn is_valid_room_code(code: &str) -> bool {
    ROOM_CODE_PATTERN.is_match(code)
}

/// What caused a round close. The timer path must not abort its own
/// task handle; every other path aborts the pending timer so it cannot
/// fire a duplicate end later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseTrigger {
    Timeout,
    AllSubmitted,
    PlayerLeft,
    ForcedReset,
}

/// Registry entry: the room's authoritative state plus the armed round
/// timer. Everything inside is guarded by the per-room mutex.
struct ActiveRoom {
    room: Room,
    round_timer: Option<JoinHandle<()>>,
    last_activity: Instant,
}

impl ActiveRoom {
    fn new(room: Room) -> Self {
        Self {
            room,
            round_timer: None,
            last_activity: Instant::now(),
        }
    }

    fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    fn abort_timer(&mut self) {
        if let Some(timer) = self.round_timer.take() {
            timer.abort();
        }
    }

    fn is_expired(&self, timeout: Duration) -> bool {
        self.last_activity.elapsed() > timeout
    }
}

/// Owns every live room and drives the round lifecycle: create/join/
/// leave, round start, the two racing end-round triggers, scoring,
/// standings, persistence write-through, and outbound broadcasts.
///
/// Locking: the registry map is sharded (DashMap); each room has its own
/// mutex, so rooms never block each other. State transitions, scoring
/// and broadcast snapshots happen under the room lock; database writes
/// happen after it is released.
pub struct RoomManager {
    rooms: DashMap<String, Arc<Mutex<ActiveRoom>>>,
    connection_manager: Arc<ConnectionManager>,
    dataset: Arc<ChallengeDataset>,
    room_repository: RoomRepository,
    round_repository: RoundRepository,
    default_settings: RoomSettings,
}

impl RoomManager {
    pub fn new(
        connection_manager: Arc<ConnectionManager>,
        dataset: Arc<ChallengeDataset>,
        db: DatabaseConnection,
        default_settings: RoomSettings,
    ) -> Self {
        Self {
            rooms: DashMap::new(),
            connection_manager,
            dataset,
            room_repository: RoomRepository::new(db.clone()),
            round_repository: RoundRepository::new(db),
            default_settings,
        }
    }

    /// Create a room under a fresh 6-character code.
    pub async fn create_room(
        &self,
        settings: Option<RoomSettings>,
    ) -> Result<String, GameError> {
        let settings = settings.unwrap_or_else(|| self.default_settings.clone());
        let now = Utc::now();

        let mut created: Option<String> = None;
        for _ in 0..CODE_GENERATION_ATTEMPTS {
            let code = generate_room_code();
            match self.rooms.entry(code.clone()) {
                Entry::Occupied(_) => continue,
                Entry::Vacant(vacant) => {
                    vacant.insert(Arc::new(Mutex::new(ActiveRoom::new(Room::new(
                        &code,
                        settings.clone(),
                        now,
                    )))));
                    created = Some(code);
                    break;
                }
            }
        }

        let code = created.ok_or(GameError::RoomCodeCollision {
            code: "<exhausted>".to_string(),
        })?;

        if let Err(e) = self.room_repository.create_room(&code, now).await {
            error!("Failed to persist room {}: {:#}", code, e);
        }

        info!("Created room {}", code);
        Ok(code)
    }

    pub async fn room_snapshot(&self, code: &str) -> Option<RoomSnapshot> {
        let entry = self.get_room(code)?;
        let active = entry.lock().await;
        Some(active.room.snapshot())
    }

    pub async fn join_room(
        &self,
        connection_id: ConnectionId,
        room_code: &str,
        player_name: &str,
    ) -> Result<Player, GameError> {
        if !is_valid_room_code(room_code) {
            return Err(GameError::validation(
                "room code",
                "must be 6 characters A-Z or 0-9",
            ));
        }

        let entry = self
            .get_room(room_code)
            .ok_or_else(|| GameError::RoomNotFound { code: room_code.to_string() })?;

        let (player, players, phase) = {
            let mut active = entry.lock().await;
            let player = active.room.add_player(player_name, Utc::now())?;
            active.touch();

            self.connection_manager
                .bind_to_room(
                    connection_id,
                    RoomBinding {
                        room_code: room_code.to_string(),
                        player_id: player.id,
                        player_name: player.name.clone(),
                    },
                )
                .await;

            self.connection_manager
                .send_to_room(
                    room_code,
                    ServerMessage::PlayerJoined {
                        player: player.clone(),
                        players: active.room.players.clone(),
                    },
                )
                .await;

            (player, active.room.players.clone(), active.room.phase)
        };

        let _ = self
            .connection_manager
            .send_to_connection(
                connection_id,
                ServerMessage::JoinedRoom {
                    player: player.clone(),
                    players,
                    phase,
                },
            )
            .await;

        if let Err(e) = self.room_repository.add_player(room_code, &player).await {
            error!("Failed to persist player {} in {}: {:#}", player.name, room_code, e);
        }

        info!("Player {} joined room {}", player.name, room_code);
        Ok(player)
    }

    pub async fn leave_room(&self, connection_id: ConnectionId) -> Result<(), GameError> {
        let Some(binding) = self.connection_manager.get_binding(connection_id).await else {
            return Ok(()); // not in a room
        };
        self.connection_manager.clear_binding(connection_id).await;

        let Some(entry) = self.get_room(&binding.room_code) else {
            return Ok(());
        };

        let mut closure = None;
        let mut discard_room = false;
        {
            let mut active = entry.lock().await;
            let player = match active.room.remove_player(binding.player_id) {
                Ok(player) => player,
                Err(_) => return Ok(()), // already gone
            };
            active.touch();

            if active.room.is_empty() {
                // Last player out: drop the room and any pending timer.
                active.abort_timer();
                discard_room = true;
            } else {
                self.connection_manager
                    .send_to_room(
                        &binding.room_code,
                        ServerMessage::PlayerLeft {
                            player_id: player.id,
                            player_name: player.name.clone(),
                            players: active.room.players.clone(),
                        },
                    )
                    .await;

                // A departing non-submitter can leave everyone else
                // already answered; the round ends through the same
                // idempotent path as any other trigger.
                if active.room.all_submitted() {
                    let round_id = active
                        .room
                        .current_round
                        .as_ref()
                        .map(|r| r.id.clone())
                        .unwrap_or_default();
                    closure = self
                        .close_round_locked(&mut active, &round_id, CloseTrigger::PlayerLeft)
                        .await;
                }
            }
        }

        if discard_room {
            self.rooms.remove(&binding.room_code);
            info!("Discarded empty room {}", binding.room_code);
            if let Err(e) = self.room_repository.delete_room(&binding.room_code).await {
                error!("Failed to delete room {}: {:#}", binding.room_code, e);
            }
        } else if let Err(e) = self.room_repository.remove_player(binding.player_id).await {
            error!("Failed to remove player row {}: {:#}", binding.player_name, e);
        }

        if let Some(closure) = closure {
            self.persist_closure(&closure).await;
        }

        info!("Player {} left room {}", binding.player_name, binding.room_code);
        Ok(())
    }

    /// Host-only: reset standings and the round counter, then start
    /// round one. A stale live round is force-ended first, through the
    /// same idempotent close path as every other trigger.
    pub async fn start_game(
        self: Arc<Self>,
        connection_id: ConnectionId,
        room_code: &str,
        settings: Option<RoomSettings>,
    ) -> Result<(), GameError> {
        let binding = self.binding_for_room(connection_id, room_code).await?;
        let entry = self
            .get_room(room_code)
            .ok_or_else(|| GameError::RoomNotFound { code: room_code.to_string() })?;

        let (forced, new_round) = {
            let mut active = entry.lock().await;

            let forced = if active.room.phase == RoomPhase::Playing {
                warn!("Force-ending stale round in room {}", room_code);
                let round_id = active
                    .room
                    .current_round
                    .as_ref()
                    .map(|r| r.id.clone())
                    .unwrap_or_default();
                self.close_round_locked(&mut active, &round_id, CloseTrigger::ForcedReset)
                    .await
            } else {
                None
            };

            active.room.start_game(binding.player_id, settings)?;
            let new_round = Self::start_round_locked(&self, &mut active).await?;
            (forced, new_round)
        };

        if let Some(closure) = forced {
            self.persist_closure(&closure).await;
        }
        self.persist_round_start(&new_round).await;
        Ok(())
    }

    /// Host-only: advance to the next round while rounds remain.
    pub async fn next_round(
        self: Arc<Self>,
        connection_id: ConnectionId,
        room_code: &str,
    ) -> Result<(), GameError> {
        let binding = self.binding_for_room(connection_id, room_code).await?;
        let entry = self
            .get_room(room_code)
            .ok_or_else(|| GameError::RoomNotFound { code: room_code.to_string() })?;

        let new_round = {
            let mut active = entry.lock().await;
            if !active.room.is_host(binding.player_id) {
                return Err(GameError::NotHost { action: "advance the round".to_string() });
            }
            Self::start_round_locked(&self, &mut active).await?
        };

        self.persist_round_start(&new_round).await;
        Ok(())
    }

    /// Record a player's guess; ends the round early when the distinct
    /// submitter count reaches the roster size.
    pub async fn submit_prompt(
        &self,
        connection_id: ConnectionId,
        round_id: &str,
        text: &str,
    ) -> Result<(), GameError> {
        let binding = self
            .connection_manager
            .get_binding(connection_id)
            .await
            .ok_or(GameError::PlayerNotFound)?;
        let entry = self
            .get_room(&binding.room_code)
            .ok_or_else(|| GameError::RoomNotFound { code: binding.room_code.clone() })?;

        let now = Utc::now();
        let closure = {
            let mut active = entry.lock().await;
            let outcome =
                active
                    .room
                    .record_submission(round_id, binding.player_id, text, now)?;
            active.touch();

            self.connection_manager
                .send_to_room(
                    &binding.room_code,
                    ServerMessage::PromptSubmitted {
                        round_id: round_id.to_string(),
                        player_name: binding.player_name.clone(),
                        submitted_count: outcome.submitted_count,
                        player_count: outcome.player_count,
                    },
                )
                .await;

            if outcome.all_submitted {
                info!(
                    "All {} players submitted, ending round {} early",
                    outcome.player_count, round_id
                );
                self.close_round_locked(&mut active, round_id, CloseTrigger::AllSubmitted)
                    .await
            } else {
                None
            }
        };

        if let Err(e) = self
            .round_repository
            .save_submission(round_id, &binding.player_name, text.trim(), now)
            .await
        {
            error!("Failed to persist submission for {}: {:#}", binding.player_name, e);
        }
        if let Some(closure) = closure {
            self.persist_closure(&closure).await;
        }
        Ok(())
    }

    /// Withdraw a live submission, reopening editing until the round
    /// actually ends.
    pub async fn unsubmit_prompt(
        &self,
        connection_id: ConnectionId,
        round_id: &str,
    ) -> Result<(), GameError> {
        let binding = self
            .connection_manager
            .get_binding(connection_id)
            .await
            .ok_or(GameError::PlayerNotFound)?;
        let entry = self
            .get_room(&binding.room_code)
            .ok_or_else(|| GameError::RoomNotFound { code: binding.room_code.clone() })?;

        {
            let mut active = entry.lock().await;
            let player_name = active.room.withdraw_submission(round_id, binding.player_id)?;
            active.touch();

            self.connection_manager
                .send_to_room(
                    &binding.room_code,
                    ServerMessage::PromptUnsubmitted {
                        round_id: round_id.to_string(),
                        player_name,
                    },
                )
                .await;
        }

        if let Err(e) = self
            .round_repository
            .delete_submission(round_id, &binding.player_name)
            .await
        {
            error!("Failed to delete submission row for {}: {:#}", binding.player_name, e);
        }
        Ok(())
    }

    /// Timer-fired close. Stale and duplicate triggers are no-ops.
    pub async fn end_round(&self, room_code: &str, round_id: &str) {
        let Some(entry) = self.get_room(room_code) else {
            return; // room discarded while the timer slept
        };

        let closure = {
            let mut active = entry.lock().await;
            self.close_round_locked(&mut active, round_id, CloseTrigger::Timeout)
                .await
        };

        if let Some(closure) = closure {
            self.persist_closure(&closure).await;
        }
    }

    pub async fn handle_disconnect(&self, connection_id: ConnectionId) {
        if let Err(e) = self.leave_room(connection_id).await {
            error!("Error handling disconnect {}: {}", connection_id, e);
        }
    }

    /// Drop rooms with no activity inside the timeout, cancelling any
    /// timer still armed so it cannot fire against a dead room.
    pub async fn cleanup_abandoned_rooms(&self, timeout: Duration) {
        let candidates: Vec<(String, Arc<Mutex<ActiveRoom>>)> = self
            .rooms
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        for (code, entry) in candidates {
            let expired = {
                let mut active = entry.lock().await;
                if active.is_expired(timeout) {
                    active.abort_timer();
                    true
                } else {
                    false
                }
            };

            if expired {
                self.rooms.remove(&code);
                info!("Removed abandoned room {}", code);
                if let Err(e) = self.room_repository.delete_room(&code).await {
                    error!("Failed to delete abandoned room {}: {:#}", code, e);
                }
            }
        }
    }

    pub fn active_room_count(&self) -> usize {
        self.rooms.len()
    }

    fn get_room(&self, code: &str) -> Option<Arc<Mutex<ActiveRoom>>> {
        self.rooms.get(code).map(|entry| entry.value().clone())
    }

    async fn binding_for_room(
        &self,
        connection_id: ConnectionId,
        room_code: &str,
    ) -> Result<RoomBinding, GameError> {
        let binding = self
            .connection_manager
            .get_binding(connection_id)
            .await
            .ok_or(GameError::PlayerNotFound)?;
        if binding.room_code != room_code {
            return Err(GameError::PlayerNotFound);
        }
        Ok(binding)
    }

    /// `Waiting -> Playing` under the room lock: pick a challenge, build
    /// the round, broadcast round-started, and only then arm the timer.
    /// Returns the write-through snapshot for the caller to persist
    /// after unlocking.
    async fn start_round_locked(
        manager: &Arc<RoomManager>,
        active: &mut ActiveRoom,
    ) -> Result<NewRound, GameError> {
        if manager.dataset.is_empty() {
            return Err(GameError::internal("challenge dataset is empty"));
        }
        let challenge = manager.dataset.next_challenge();
        let now = Utc::now();

        let (round_id, image_path, time_limit, difficulty, target_text) = {
            let round = active.room.begin_round(challenge, now)?;
            (
                round.id.clone(),
                round.image_path.clone(),
                round.time_limit_seconds,
                round.difficulty,
                round.target_text.clone(),
            )
        };
        let room_code = active.room.code.clone();

        manager
            .connection_manager
            .send_to_room(
                &room_code,
                ServerMessage::RoundStarted {
                    round_id: round_id.clone(),
                    image_path: image_path.clone(),
                    time_limit_seconds: time_limit,
                    round_number: active.room.rounds_played,
                    total_rounds: active.room.settings.rounds,
                    difficulty,
                    cumulative_scores: active.room.scores_sorted(),
                },
            )
            .await;

        // Timer armed strictly after the round-started broadcast.
        let timer_manager = manager.clone();
        let timer_code = room_code.clone();
        let timer_round = round_id.clone();
        active.round_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(time_limit)).await;
            timer_manager.end_round(&timer_code, &timer_round).await;
        }));
        active.touch();

        info!(
            "Round {}/{} started in room {} ({:?})",
            active.room.rounds_played, active.room.settings.rounds, room_code, difficulty
        );

        Ok(NewRound {
            id: round_id,
            room_code,
            image_path,
            target_text,
            time_limit_seconds: time_limit,
            difficulty: format!("{difficulty:?}"),
            started_at: now,
        })
    }

    /// The single authoritative `Playing -> (Waiting | Finished)` body.
    /// Must be called with the room lock held. The idempotency guard
    /// lives in `Room::finish_round`; whichever trigger loses the race
    /// gets `None` back and does nothing.
    async fn close_round_locked(
        &self,
        active: &mut ActiveRoom,
        round_id: &str,
        trigger: CloseTrigger,
    ) -> Option<RoundClosure> {
        let closure = match active.room.finish_round(round_id, Utc::now()) {
            Ok(Some(closure)) => closure,
            Ok(None) => return None, // duplicate or stale trigger: success no-op
            Err(e) => {
                error!("Failed to close round {}: {}", round_id, e);
                return None;
            }
        };

        // The timer path must not abort its own task; everywhere else
        // the pending timer is aborted so it cannot fire again.
        match trigger {
            CloseTrigger::Timeout => {
                active.round_timer.take();
            }
            _ => active.abort_timer(),
        }
        active.touch();

        let room_code = active.room.code.clone();
        self.connection_manager
            .send_to_room(
                &room_code,
                ServerMessage::RoundEnded {
                    round_id: closure.round_id.clone(),
                    target_text: closure.target_text.clone(),
                    results: closure.results.clone(),
                    stats: closure.stats.clone(),
                    cumulative_scores: closure.cumulative_scores.clone(),
                    round_number: closure.round_number,
                    total_rounds: closure.total_rounds,
                    is_last_round: closure.is_last_round,
                },
            )
            .await;

        if let Some(rankings) = &closure.final_rankings {
            self.connection_manager
                .send_to_room(
                    &room_code,
                    ServerMessage::GameCompleted {
                        final_rankings: rankings.clone(),
                    },
                )
                .await;
        }

        info!(
            "Round {} ended in room {} ({:?}), {} results",
            closure.round_id,
            room_code,
            trigger,
            closure.results.len()
        );
        Some(closure)
    }

    async fn persist_round_start(&self, new_round: &NewRound) {
        if let Err(e) = self.round_repository.create_round(new_round).await {
            error!("Failed to persist round {}: {:#}", new_round.id, e);
        }
    }

    /// Write-through after the lock is released. Failures are logged and
    /// never touch in-memory state.
    async fn persist_closure(&self, closure: &RoundClosure) {
        if let Err(e) = self
            .round_repository
            .close_round(&closure.round_id, closure.ended_at)
            .await
        {
            error!("Failed to persist round close {}: {:#}", closure.round_id, e);
        }
        if let Err(e) = self.round_repository.save_results(&closure.results).await {
            error!("Failed to persist results for {}: {:#}", closure.round_id, e);
        }
    }
}

fn generate_room_code() -> String {
    let mut rng = rand::thread_rng();
    (0..ROOM_CODE_LENGTH)
        .map(|_| {
            let index = rng.gen_range(0..ROOM_CODE_ALPHABET.len());
            ROOM_CODE_ALPHABET[index] as char
        })
        .collect()
}
