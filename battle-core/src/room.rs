use battle_types::{
    Challenge, DifficultyMetadata, DifficultyTier, FinalRanking, GameError, Player, PlayerId,
    PlayerResult, RoomPhase, RoomSettings, RoomSnapshot, RoundStats,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use crate::ScoringEngine;

pub const MIN_PLAYERS: usize = 2;
pub const MAX_NAME_LENGTH: usize = 20;

/// A player's current guess for the active round. Overwritable until the
/// round closes.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub player_name: String,
    pub text: String,
    pub submitted_at: DateTime<Utc>,
}

/// One timed guessing challenge. The `ended` flag flips exactly once;
/// every piece of close logic goes through `Room::finish_round`.
#[derive(Debug)]
pub struct Round {
    pub id: String,
    pub room_code: String,
    pub target_text: String,
    pub image_path: String,
    pub time_limit_seconds: u64,
    pub difficulty: DifficultyTier,
    pub metadata: DifficultyMetadata,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub ended: bool,
    /// Keyed by lowercased player name; distinct keys decide "everyone
    /// has answered".
    submissions: HashMap<String, Submission>,
}

impl Round {
    fn new(
        room_code: &str,
        challenge: Challenge,
        time_limit_seconds: u64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Self::generate_id(now),
            room_code: room_code.to_string(),
            target_text: challenge.target_text,
            image_path: challenge.image_path,
            time_limit_seconds,
            difficulty: challenge.difficulty,
            metadata: challenge.metadata,
            started_at: now,
            ended_at: None,
            ended: false,
            submissions: HashMap::new(),
        }
    }

    fn generate_id(now: DateTime<Utc>) -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        format!("round_{}_{}", now.timestamp_millis(), &suffix[..8])
    }

    pub fn submission_count(&self) -> usize {
        self.submissions.len()
    }

    pub fn submission_for(&self, player_name: &str) -> Option<&Submission> {
        self.submissions.get(&player_name.to_lowercase())
    }
}

/// Outcome of recording a submission, used by the controller to evaluate
/// the early-termination trigger.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubmissionOutcome {
    pub submitted_count: usize,
    pub player_count: usize,
    pub all_submitted: bool,
}

/// Everything produced by closing a round, snapshotted so the caller can
/// persist and broadcast after releasing the room lock.
#[derive(Debug)]
pub struct RoundClosure {
    pub round_id: String,
    pub target_text: String,
    pub results: Vec<PlayerResult>,
    pub stats: RoundStats,
    pub cumulative_scores: Vec<(String, i32)>,
    pub round_number: u32,
    pub total_rounds: u32,
    pub is_last_round: bool,
    pub final_rankings: Option<Vec<FinalRanking>>,
    pub ended_at: DateTime<Utc>,
}

/// Authoritative in-memory state of one room. All mutation happens
/// through these methods; the server serializes access with a per-room
/// lock.
#[derive(Debug)]
pub struct Room {
    pub code: String,
    pub players: Vec<Player>,
    pub phase: RoomPhase,
    pub settings: RoomSettings,
    pub rounds_played: u32,
    pub cumulative_scores: HashMap<String, i32>,
    pub current_round: Option<Round>,
    pub final_summary: Option<Vec<FinalRanking>>,
    pub created_at: DateTime<Utc>,
    game_started: bool,
}

impl Room {
    pub fn new(code: &str, settings: RoomSettings, now: DateTime<Utc>) -> Self {
        Self {
            code: code.to_string(),
            players: Vec::new(),
            phase: RoomPhase::Waiting,
            settings,
            rounds_played: 0,
            cumulative_scores: HashMap::new(),
            current_round: None,
            final_summary: None,
            created_at: now,
            game_started: false,
        }
    }

    /// The host is the earliest joiner still present.
    pub fn host(&self) -> Option<&Player> {
        self.players.first()
    }

    pub fn is_host(&self, player_id: PlayerId) -> bool {
        self.host().is_some_and(|p| p.id == player_id)
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn find_player(&self, player_id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn add_player(&mut self, name: &str, now: DateTime<Utc>) -> Result<Player, GameError> {
        let name = name.trim();
        if name.is_empty() || name.chars().count() > MAX_NAME_LENGTH {
            return Err(GameError::validation(
                "player name",
                format!("must be 1 to {MAX_NAME_LENGTH} characters"),
            ));
        }

        let taken = self
            .players
            .iter()
            .any(|p| p.name.to_lowercase() == name.to_lowercase());
        if taken {
            return Err(GameError::NameTaken { name: name.to_string() });
        }

        if self.players.len() >= self.settings.max_players {
            return Err(GameError::RoomFull { code: self.code.clone() });
        }

        let player = Player {
            id: Uuid::new_v4(),
            name: name.to_string(),
            joined_at: now.to_rfc3339(),
        };
        self.players.push(player.clone());

        // Late joiners enter the standings at zero so the score table
        // always covers everyone active in the current game.
        if self.game_started && self.phase != RoomPhase::Finished {
            self.cumulative_scores.entry(player.name.clone()).or_insert(0);
        }

        Ok(player)
    }

    /// Remove a player, withdrawing any live submission of theirs. The
    /// caller is responsible for discarding the room when it empties and
    /// for re-checking `all_submitted` afterwards: a departing
    /// non-submitter may satisfy the everyone-answered trigger.
    pub fn remove_player(&mut self, player_id: PlayerId) -> Result<Player, GameError> {
        let index = self
            .players
            .iter()
            .position(|p| p.id == player_id)
            .ok_or(GameError::PlayerNotFound)?;
        let player = self.players.remove(index);

        if let Some(round) = self.current_round.as_mut() {
            if !round.ended {
                round.submissions.remove(&player.name.to_lowercase());
            }
        }

        Ok(player)
    }

    /// Reset for a fresh game: zeroed standings for the current roster,
    /// round counter back to zero, optional new settings. Host only.
    /// Requires that no round is live; the controller force-ends a stale
    /// one through the idempotent close path first.
    pub fn start_game(
        &mut self,
        player_id: PlayerId,
        settings: Option<RoomSettings>,
    ) -> Result<(), GameError> {
        if !self.is_host(player_id) {
            return Err(GameError::NotHost { action: "start the game".to_string() });
        }
        if self.phase == RoomPhase::Playing {
            return Err(GameError::WrongPhase {
                action: "starting a game".to_string(),
                phase: "Playing".to_string(),
            });
        }

        if let Some(settings) = settings {
            self.settings = settings;
        }
        self.rounds_played = 0;
        self.final_summary = None;
        self.cumulative_scores = self.players.iter().map(|p| (p.name.clone(), 0)).collect();
        self.game_started = true;
        self.phase = RoomPhase::Waiting;

        Ok(())
    }

    /// `Waiting -> Playing`: create the round and count it. The caller
    /// broadcasts round-started and only then arms the timeout timer.
    pub fn begin_round(
        &mut self,
        challenge: Challenge,
        now: DateTime<Utc>,
    ) -> Result<&Round, GameError> {
        if self.phase != RoomPhase::Waiting {
            return Err(GameError::WrongPhase {
                action: "starting a round".to_string(),
                phase: format!("{:?}", self.phase),
            });
        }
        if self.players.len() < MIN_PLAYERS {
            return Err(GameError::validation(
                "players",
                format!("need at least {MIN_PLAYERS} players to start"),
            ));
        }

        self.phase = RoomPhase::Playing;
        self.rounds_played += 1;
        self.current_round = Some(Round::new(
            &self.code,
            challenge,
            self.settings.time_limit_seconds,
            now,
        ));

        Ok(self.current_round.as_ref().unwrap())
    }

    /// Record (or overwrite) a player's guess for the active round.
    pub fn record_submission(
        &mut self,
        round_id: &str,
        player_id: PlayerId,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<SubmissionOutcome, GameError> {
        let player_name = self
            .find_player(player_id)
            .ok_or(GameError::PlayerNotFound)?
            .name
            .clone();

        let text = text.trim();
        if text.is_empty() || text.chars().count() > self.settings.character_limit {
            return Err(GameError::InvalidSubmission {
                reason: format!(
                    "prompt must be 1 to {} characters",
                    self.settings.character_limit
                ),
            });
        }

        let player_count = self.players.len();
        let round = self.live_round_mut(round_id)?;

        round.submissions.insert(
            player_name.to_lowercase(),
            Submission {
                player_name,
                text: text.to_string(),
                submitted_at: now,
            },
        );

        let submitted_count = round.submission_count();
        Ok(SubmissionOutcome {
            submitted_count,
            player_count,
            all_submitted: submitted_count >= player_count,
        })
    }

    /// Withdraw a live submission, reopening editing for that player.
    pub fn withdraw_submission(
        &mut self,
        round_id: &str,
        player_id: PlayerId,
    ) -> Result<String, GameError> {
        let player_name = self
            .find_player(player_id)
            .ok_or(GameError::PlayerNotFound)?
            .name
            .clone();

        let round = self.live_round_mut(round_id)?;
        round
            .submissions
            .remove(&player_name.to_lowercase())
            .ok_or(GameError::InvalidSubmission {
                reason: "no submission to withdraw".to_string(),
            })?;

        Ok(player_name)
    }

    /// Whether the everyone-answered trigger currently holds.
    pub fn all_submitted(&self) -> bool {
        match &self.current_round {
            Some(round) if !round.ended && !self.players.is_empty() => {
                round.submission_count() >= self.players.len()
            }
            _ => false,
        }
    }

    /// `Playing -> (Waiting | Finished)`: the single authoritative close.
    /// Idempotent: only the caller that observes `ended == false` scores
    /// and transitions; every other invocation (stale timer, duplicate
    /// trigger, already-detached round) gets `Ok(None)`.
    pub fn finish_round(
        &mut self,
        round_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<RoundClosure>, GameError> {
        let round_matches = self
            .current_round
            .as_ref()
            .is_some_and(|r| r.id == round_id && !r.ended);
        if !round_matches {
            debug!("Ignoring duplicate or stale close for round {}", round_id);
            return Ok(None);
        }

        let mut round = self.current_round.take().unwrap();
        round.ended = true;
        round.ended_at = Some(now);

        // Every roster player gets a result; a missing submission is
        // scored as empty text (accuracy 0, full missed list).
        let mut results: Vec<PlayerResult> = self
            .players
            .iter()
            .map(|player| {
                let submission = round.submission_for(&player.name);
                let text = submission.map(|s| s.text.as_str()).unwrap_or("");
                let score = ScoringEngine::score(
                    &round.target_text,
                    text,
                    round.difficulty,
                    &round.metadata,
                );
                PlayerResult {
                    round_id: round.id.clone(),
                    player_name: player.name.clone(),
                    text: text.to_string(),
                    accuracy_score: score.accuracy_score,
                    leaderboard_points: score.leaderboard_points,
                    matched_words: score.matched_words,
                    missed_words: score.missed_words,
                    bonuses: score.bonuses,
                    explanation: score.explanation,
                    submitted_at: submission.map(|s| s.submitted_at.to_rfc3339()),
                }
            })
            .collect();

        for result in &results {
            *self
                .cumulative_scores
                .entry(result.player_name.clone())
                .or_insert(0) += result.leaderboard_points;
        }

        // Deterministic ordering: points, then earliest submission, then
        // name. Players scored without a submission sort after everyone
        // who submitted at the same point total.
        results.sort_by(|a, b| {
            b.leaderboard_points
                .cmp(&a.leaderboard_points)
                .then_with(|| match (&a.submitted_at, &b.submitted_at) {
                    (Some(x), Some(y)) => x.cmp(y),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => std::cmp::Ordering::Equal,
                })
                .then_with(|| a.player_name.cmp(&b.player_name))
        });

        let stats = RoundStats::from_results(&results);

        let is_last_round = self.rounds_played >= self.settings.rounds;
        let final_rankings = if is_last_round {
            self.phase = RoomPhase::Finished;
            let rankings = self.final_rankings();
            self.final_summary = Some(rankings.clone());
            Some(rankings)
        } else {
            self.phase = RoomPhase::Waiting;
            None
        };

        Ok(Some(RoundClosure {
            round_id: round.id,
            target_text: round.target_text,
            results,
            stats,
            cumulative_scores: self.scores_sorted(),
            round_number: self.rounds_played,
            total_rounds: self.settings.rounds,
            is_last_round,
            final_rankings,
            ended_at: now,
        }))
    }

    /// Standings ranked by cumulative points, ties broken by name.
    pub fn final_rankings(&self) -> Vec<FinalRanking> {
        self.scores_sorted()
            .into_iter()
            .enumerate()
            .map(|(index, (player_name, score))| FinalRanking {
                rank: (index + 1) as u32,
                player_name,
                score,
            })
            .collect()
    }

    pub fn scores_sorted(&self) -> Vec<(String, i32)> {
        let mut scores: Vec<(String, i32)> = self
            .cumulative_scores
            .iter()
            .map(|(name, score)| (name.clone(), *score))
            .collect();
        scores.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        scores
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            code: self.code.clone(),
            phase: self.phase,
            players: self.players.clone(),
            settings: self.settings.clone(),
            rounds_played: self.rounds_played,
            cumulative_scores: self.scores_sorted(),
            created_at: self.created_at.to_rfc3339(),
        }
    }

    fn live_round_mut(&mut self, round_id: &str) -> Result<&mut Round, GameError> {
        let round = self
            .current_round
            .as_mut()
            .filter(|r| r.id == round_id)
            .ok_or(GameError::RoundNotFound { id: round_id.to_string() })?;
        if round.ended {
            return Err(GameError::InvalidSubmission {
                reason: "round has already ended".to_string(),
            });
        }
        Ok(round)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn challenge(target: &str) -> Challenge {
        Challenge {
            target_text: target.to_string(),
            image_path: "/api/images/test.png".to_string(),
            difficulty: DifficultyTier::Easy,
            metadata: DifficultyMetadata::default(),
        }
    }

    fn room_with_players(names: &[&str]) -> (Room, Vec<Player>) {
        let mut room = Room::new("ABC123", RoomSettings::default(), Utc::now());
        let players = names
            .iter()
            .map(|name| room.add_player(name, Utc::now()).unwrap())
            .collect();
        (room, players)
    }

    fn playing_room(names: &[&str], target: &str) -> (Room, Vec<Player>, String) {
        let (mut room, players) = room_with_players(names);
        room.start_game(players[0].id, None).unwrap();
        let round_id = room
            .begin_round(challenge(target), Utc::now())
            .unwrap()
            .id
            .clone();
        (room, players, round_id)
    }

    #[test]
    fn test_join_rejects_duplicate_names_case_insensitively() {
        let (mut room, _) = room_with_players(&["Alice"]);
        let err = room.add_player("alice", Utc::now()).unwrap_err();
        assert!(matches!(err, GameError::NameTaken { .. }));
    }

    #[test]
    fn test_join_rejects_bad_names() {
        let (mut room, _) = room_with_players(&[]);
        assert!(room.add_player("   ", Utc::now()).is_err());
        assert!(room.add_player(&"x".repeat(21), Utc::now()).is_err());
        assert!(room.add_player(&"x".repeat(20), Utc::now()).is_ok());
    }

    #[test]
    fn test_join_respects_capacity() {
        let (mut room, _) = room_with_players(&[]);
        for i in 0..8 {
            room.add_player(&format!("Player{i}"), Utc::now()).unwrap();
        }
        let err = room.add_player("Ninth", Utc::now()).unwrap_err();
        assert!(matches!(err, GameError::RoomFull { .. }));
    }

    #[test]
    fn test_begin_round_requires_two_players() {
        let (mut room, players) = room_with_players(&["Alice"]);
        room.start_game(players[0].id, None).unwrap();
        let err = room.begin_round(challenge("a red car"), Utc::now()).unwrap_err();
        assert_eq!(err.kind(), battle_types::ErrorKind::Validation);
    }

    #[test]
    fn test_begin_round_requires_waiting_phase() {
        let (mut room, _, _) = playing_room(&["Alice", "Bob"], "a red car");
        let err = room.begin_round(challenge("another"), Utc::now()).unwrap_err();
        assert!(matches!(err, GameError::WrongPhase { .. }));
    }

    #[test]
    fn test_start_game_is_host_only() {
        let (mut room, players) = room_with_players(&["Alice", "Bob"]);
        let err = room.start_game(players[1].id, None).unwrap_err();
        assert!(matches!(err, GameError::NotHost { .. }));
        assert!(room.start_game(players[0].id, None).is_ok());
    }

    #[test]
    fn test_start_game_seeds_scores_for_roster() {
        let (mut room, players) = room_with_players(&["Alice", "Bob"]);
        room.start_game(players[0].id, None).unwrap();
        assert_eq!(room.cumulative_scores.len(), 2);
        assert_eq!(room.cumulative_scores["Alice"], 0);
        assert_eq!(room.cumulative_scores["Bob"], 0);
    }

    #[test]
    fn test_submissions_overwrite_per_player() {
        let (mut room, players, round_id) = playing_room(&["Alice", "Bob"], "a red car");

        let outcome = room
            .record_submission(&round_id, players[0].id, "first try", Utc::now())
            .unwrap();
        assert_eq!(outcome.submitted_count, 1);
        assert!(!outcome.all_submitted);

        // Redo: still one distinct submitter.
        let outcome = room
            .record_submission(&round_id, players[0].id, "second try", Utc::now())
            .unwrap();
        assert_eq!(outcome.submitted_count, 1);

        let round = room.current_round.as_ref().unwrap();
        assert_eq!(round.submission_for("Alice").unwrap().text, "second try");
    }

    #[test]
    fn test_all_submitted_counts_distinct_players() {
        let (mut room, players, round_id) = playing_room(&["Alice", "Bob"], "a red car");

        room.record_submission(&round_id, players[0].id, "a car", Utc::now())
            .unwrap();
        assert!(!room.all_submitted());

        let outcome = room
            .record_submission(&round_id, players[1].id, "red car", Utc::now())
            .unwrap();
        assert!(outcome.all_submitted);
        assert!(room.all_submitted());
    }

    #[test]
    fn test_submission_length_validation() {
        let mut settings = RoomSettings::default();
        settings.character_limit = 10;
        let mut room = Room::new("ABC123", settings, Utc::now());
        let alice = room.add_player("Alice", Utc::now()).unwrap();
        let bob = room.add_player("Bob", Utc::now()).unwrap();
        let _ = bob;
        room.start_game(alice.id, None).unwrap();
        let round_id = room
            .begin_round(challenge("a red car"), Utc::now())
            .unwrap()
            .id
            .clone();

        assert!(room.record_submission(&round_id, alice.id, "  ", Utc::now()).is_err());
        assert!(
            room.record_submission(&round_id, alice.id, "eleven chars", Utc::now())
                .is_err()
        );
        assert!(room.record_submission(&round_id, alice.id, "ten chars!", Utc::now()).is_ok());
    }

    #[test]
    fn test_unsubmit_reopens_editing() {
        let (mut room, players, round_id) = playing_room(&["Alice", "Bob"], "a red car");

        room.record_submission(&round_id, players[0].id, "a car", Utc::now())
            .unwrap();
        room.withdraw_submission(&round_id, players[0].id).unwrap();
        assert_eq!(room.current_round.as_ref().unwrap().submission_count(), 0);

        // Nothing left to withdraw.
        assert!(room.withdraw_submission(&round_id, players[0].id).is_err());
    }

    #[test]
    fn test_finish_round_is_idempotent() {
        let (mut room, players, round_id) = playing_room(&["Alice", "Bob"], "a red car");
        room.record_submission(&round_id, players[0].id, "a red car", Utc::now())
            .unwrap();

        let first = room.finish_round(&round_id, Utc::now()).unwrap();
        assert!(first.is_some());

        // Duplicate triggers are success-no-ops.
        let second = room.finish_round(&round_id, Utc::now()).unwrap();
        assert!(second.is_none());
        let stale = room.finish_round("round_0_deadbeef", Utc::now()).unwrap();
        assert!(stale.is_none());
    }

    #[test]
    fn test_finish_round_scores_missing_submissions_as_empty() {
        let (mut room, players, round_id) = playing_room(&["Alice", "Bob"], "a red car");
        room.record_submission(&round_id, players[0].id, "a red car", Utc::now())
            .unwrap();

        let closure = room.finish_round(&round_id, Utc::now()).unwrap().unwrap();
        assert_eq!(closure.results.len(), 2);

        let bob = closure
            .results
            .iter()
            .find(|r| r.player_name == "Bob")
            .unwrap();
        assert_eq!(bob.accuracy_score, 0);
        assert_eq!(bob.leaderboard_points, 0);
        assert!(bob.submitted_at.is_none());
        assert_eq!(bob.missed_words, vec!["a", "red", "car"]);

        let alice = closure
            .results
            .iter()
            .find(|r| r.player_name == "Alice")
            .unwrap();
        assert_eq!(alice.accuracy_score, 100);
        assert_eq!(closure.results[0].player_name, "Alice");
    }

    #[test]
    fn test_finish_round_updates_cumulative_scores_once() {
        let (mut room, players, round_id) = playing_room(&["Alice", "Bob"], "a red car");
        room.record_submission(&round_id, players[0].id, "a red car", Utc::now())
            .unwrap();

        let closure = room.finish_round(&round_id, Utc::now()).unwrap().unwrap();
        let alice_points = closure
            .results
            .iter()
            .find(|r| r.player_name == "Alice")
            .unwrap()
            .leaderboard_points;

        assert_eq!(room.cumulative_scores["Alice"], alice_points);
        assert_eq!(room.cumulative_scores["Bob"], 0);

        // The no-op duplicate close must not double-count.
        room.finish_round(&round_id, Utc::now()).unwrap();
        assert_eq!(room.cumulative_scores["Alice"], alice_points);
    }

    #[test]
    fn test_phase_returns_to_waiting_until_last_round() {
        let mut settings = RoomSettings::default();
        settings.rounds = 2;
        let mut room = Room::new("ABC123", settings, Utc::now());
        let alice = room.add_player("Alice", Utc::now()).unwrap();
        room.add_player("Bob", Utc::now()).unwrap();
        room.start_game(alice.id, None).unwrap();

        let round_id = room
            .begin_round(challenge("a red car"), Utc::now())
            .unwrap()
            .id
            .clone();
        let closure = room.finish_round(&round_id, Utc::now()).unwrap().unwrap();
        assert!(!closure.is_last_round);
        assert_eq!(room.phase, RoomPhase::Waiting);
        assert!(room.current_round.is_none());

        let round_id = room
            .begin_round(challenge("a blue boat"), Utc::now())
            .unwrap()
            .id
            .clone();
        let closure = room.finish_round(&round_id, Utc::now()).unwrap().unwrap();
        assert!(closure.is_last_round);
        assert_eq!(room.phase, RoomPhase::Finished);
        assert!(closure.final_rankings.is_some());
        assert!(room.final_summary.is_some());
    }

    #[test]
    fn test_final_rankings_order_and_tie_break() {
        let (mut room, _) = room_with_players(&["Cara", "Alice", "Bob"]);
        room.cumulative_scores =
            [("Cara".to_string(), 50), ("Alice".to_string(), 90), ("Bob".to_string(), 50)]
                .into_iter()
                .collect();

        let rankings = room.final_rankings();
        assert_eq!(rankings[0].player_name, "Alice");
        assert_eq!(rankings[0].rank, 1);
        // Tie at 50 broken lexically.
        assert_eq!(rankings[1].player_name, "Bob");
        assert_eq!(rankings[2].player_name, "Cara");
    }

    #[test]
    fn test_new_game_resets_scores_and_counter() {
        let mut settings = RoomSettings::default();
        settings.rounds = 1;
        let mut room = Room::new("ABC123", settings, Utc::now());
        let alice = room.add_player("Alice", Utc::now()).unwrap();
        let bob = room.add_player("Bob", Utc::now()).unwrap();
        room.start_game(alice.id, None).unwrap();

        let round_id = room
            .begin_round(challenge("a red car"), Utc::now())
            .unwrap()
            .id
            .clone();
        room.record_submission(&round_id, bob.id, "a red car", Utc::now())
            .unwrap();
        room.finish_round(&round_id, Utc::now()).unwrap();
        assert_eq!(room.phase, RoomPhase::Finished);
        assert!(room.cumulative_scores["Bob"] > 0);

        room.start_game(alice.id, None).unwrap();
        assert_eq!(room.phase, RoomPhase::Waiting);
        assert_eq!(room.rounds_played, 0);
        assert_eq!(room.cumulative_scores["Bob"], 0);
        assert!(room.final_summary.is_none());
    }

    #[test]
    fn test_leave_withdraws_submission_and_can_complete_round() {
        let (mut room, players, round_id) =
            playing_room(&["Alice", "Bob", "Cara"], "a red car");

        room.record_submission(&round_id, players[0].id, "a car", Utc::now())
            .unwrap();
        room.record_submission(&round_id, players[1].id, "red car", Utc::now())
            .unwrap();
        assert!(!room.all_submitted());

        // The non-submitter leaves; everyone remaining has answered.
        room.remove_player(players[2].id).unwrap();
        assert!(room.all_submitted());
    }

    #[test]
    fn test_late_joiner_enters_standings_at_zero() {
        let (mut room, players, round_id) = playing_room(&["Alice", "Bob"], "a red car");
        let _ = round_id;
        let _ = players;

        let cara = room.add_player("Cara", Utc::now()).unwrap();
        assert_eq!(room.cumulative_scores.get("Cara"), Some(&0));
        let _ = cara;
    }

    #[test]
    fn test_submission_after_close_is_rejected() {
        let (mut room, players, round_id) = playing_room(&["Alice", "Bob"], "a red car");
        room.record_submission(&round_id, players[0].id, "a red car", Utc::now())
            .unwrap();
        room.record_submission(&round_id, players[1].id, "red car", Utc::now())
            .unwrap();
        room.finish_round(&round_id, Utc::now()).unwrap();

        let err = room
            .record_submission(&round_id, players[0].id, "too late", Utc::now())
            .unwrap_err();
        assert!(matches!(err, GameError::RoundNotFound { .. }));
    }
}
