use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::player::Player;

/// Lifecycle phase of a room. `Finished` is terminal for the current game
/// only; a new `start-game` returns the room to `Playing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum RoomPhase {
    Waiting,
    Playing,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RoomSettings {
    pub rounds: u32,
    pub time_limit_seconds: u64,
    pub max_players: usize,
    pub character_limit: usize,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            rounds: 3,
            time_limit_seconds: 60,
            max_players: 8,
            character_limit: 400,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum DifficultyTier {
    Easy,
    Medium,
    Hard,
}

impl DifficultyTier {
    /// Scale factor applied to (accuracy + bonuses) to produce
    /// leaderboard points.
    pub fn multiplier(&self) -> f64 {
        match self {
            DifficultyTier::Easy => 1.0,
            DifficultyTier::Medium => 1.2,
            DifficultyTier::Hard => 1.5,
        }
    }
}

/// Classification facts about a target prompt, produced offline by the
/// difficulty analyzer. The round controller passes this through without
/// interpreting it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DifficultyMetadata {
    pub word_count: usize,
    pub named_entities: usize,
    pub has_complex_keywords: bool,
    pub has_art_style: bool,
    pub has_abstract_concepts: bool,
    pub is_verbose: bool,
}

/// One entry of the challenge corpus: the prompt to guess, the image it
/// generated, and its precomputed difficulty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Challenge {
    pub target_text: String,
    pub image_path: String,
    pub difficulty: DifficultyTier,
    pub metadata: DifficultyMetadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum BonusKind {
    Conciseness,
    Creativity,
    TechnicalTerm,
    PerfectMatch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Bonus {
    pub kind: BonusKind,
    pub points: i32,
    pub detail: String,
}

/// Output of the scoring engine for a single (target, attempt) pair.
/// `accuracy_score` is the unscaled 0-100 similarity; `leaderboard_points`
/// already includes bonuses and the difficulty multiplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ScoreResult {
    pub accuracy_score: i32,
    pub leaderboard_points: i32,
    pub matched_words: Vec<String>,
    pub missed_words: Vec<String>,
    pub bonuses: Vec<Bonus>,
    pub explanation: String,
}

/// Scored outcome of one player's submission for one round. Immutable
/// once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PlayerResult {
    pub round_id: String,
    pub player_name: String,
    pub text: String,
    pub accuracy_score: i32,
    pub leaderboard_points: i32,
    pub matched_words: Vec<String>,
    pub missed_words: Vec<String>,
    pub bonuses: Vec<Bonus>,
    pub explanation: String,
    /// RFC 3339; None when the player never submitted and was scored
    /// against empty text.
    pub submitted_at: Option<String>,
}

/// Aggregate accuracy statistics for one round's results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RoundStats {
    pub average: i32,
    pub highest: i32,
    pub lowest: i32,
    pub median: i32,
    pub count: usize,
}

impl RoundStats {
    pub fn from_results(results: &[PlayerResult]) -> Self {
        if results.is_empty() {
            return Self::default();
        }
        let mut scores: Vec<i32> = results.iter().map(|r| r.accuracy_score).collect();
        scores.sort_unstable();
        let sum: i32 = scores.iter().sum();
        Self {
            average: (sum as f64 / scores.len() as f64).round() as i32,
            highest: *scores.last().unwrap(),
            lowest: scores[0],
            median: scores[scores.len() / 2],
            count: scores.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FinalRanking {
    pub rank: u32,
    pub player_name: String,
    pub score: i32,
}

/// Snapshot of a room as served over HTTP. Never exposes the current
/// round's target text while the round is live.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RoomSnapshot {
    pub code: String,
    pub phase: RoomPhase,
    pub players: Vec<Player>,
    pub settings: RoomSettings,
    pub rounds_played: u32,
    pub cumulative_scores: Vec<(String, i32)>,
    pub created_at: String, // ISO 8601 string
}
