use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

pub type PlayerId = Uuid;

/// A member of a room's roster. Identity is per-room only: the id is
/// stable for the lifetime of the player's connection and the name is
/// unique within the room, case-insensitively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub joined_at: String, // ISO 8601 string
}
