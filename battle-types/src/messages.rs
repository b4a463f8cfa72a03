use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::{
    DifficultyTier, FinalRanking, Player, PlayerResult, RoomPhase, RoomSettings, RoundStats,
};

/// Inbound actions a connected client can send over the socket. Room
/// creation happens over REST; everything after that is socket traffic.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ClientMessage {
    JoinRoom { room_code: String, player_name: String },
    LeaveRoom,
    StartGame { room_code: String, settings: Option<RoomSettings> },
    SubmitPrompt { round_id: String, text: String },
    UnsubmitPrompt { round_id: String },
    NextRound { room_code: String },
    Heartbeat,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ServerMessage {
    /// Sent to the joining player only; the rest of the room gets
    /// `PlayerJoined`.
    JoinedRoom {
        player: Player,
        players: Vec<Player>,
        phase: RoomPhase,
    },
    PlayerJoined {
        player: Player,
        players: Vec<Player>,
    },
    PlayerLeft {
        player_id: Uuid,
        player_name: String,
        players: Vec<Player>,
    },
    RoundStarted {
        round_id: String,
        image_path: String,
        time_limit_seconds: u64,
        round_number: u32,
        total_rounds: u32,
        difficulty: DifficultyTier,
        cumulative_scores: Vec<(String, i32)>,
    },
    PromptSubmitted {
        round_id: String,
        player_name: String,
        submitted_count: usize,
        player_count: usize,
    },
    PromptUnsubmitted {
        round_id: String,
        player_name: String,
    },
    RoundEnded {
        round_id: String,
        target_text: String,
        results: Vec<PlayerResult>,
        stats: RoundStats,
        cumulative_scores: Vec<(String, i32)>,
        round_number: u32,
        total_rounds: u32,
        is_last_round: bool,
    },
    GameCompleted {
        final_rankings: Vec<FinalRanking>,
    },
    Error {
        message: String,
    },
}
