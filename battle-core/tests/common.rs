use battle_core::Room;
use battle_types::{Challenge, DifficultyMetadata, DifficultyTier, Player, RoomSettings};
use chrono::Utc;

/// Creates a challenge with a known target and difficulty.
pub fn create_challenge(target: &str, difficulty: DifficultyTier) -> Challenge {
    Challenge {
        target_text: target.to_string(),
        image_path: format!("/api/images/{}.png", target.replace(' ', "_")),
        difficulty,
        metadata: DifficultyMetadata::default(),
    }
}

/// Creates a room with the given players already joined.
pub fn create_room_with_players(names: &[&str], settings: RoomSettings) -> (Room, Vec<Player>) {
    let mut room = Room::new("TEST01", settings, Utc::now());
    let players = names
        .iter()
        .map(|name| room.add_player(name, Utc::now()).expect("join failed"))
        .collect();
    (room, players)
}

/// Creates a two-player room with a game started and one round running.
pub fn create_running_round(target: &str) -> (Room, Vec<Player>, String) {
    let (mut room, players) = create_room_with_players(&["Alice", "Bob"], RoomSettings::default());
    room.start_game(players[0].id, None).expect("start failed");
    let round_id = room
        .begin_round(create_challenge(target, DifficultyTier::Easy), Utc::now())
        .expect("round failed")
        .id
        .clone();
    (room, players, round_id)
}
