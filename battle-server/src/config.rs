use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub dataset_path: String,
    pub images_dir: String,
    pub default_rounds: u32,
    pub default_time_limit_seconds: u64,
    pub max_players_per_room: usize,
    pub character_limit: usize,
    pub room_timeout_minutes: u64,
    pub connection_timeout_seconds: u64,
}

impl Config {
    pub fn new() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("Invalid PORT"),
            dataset_path: env::var("DATASET_PATH")
                .unwrap_or_else(|_| "./dataset/custom_prompts_df.csv".to_string()),
            images_dir: env::var("IMAGES_DIR").unwrap_or_else(|_| "./dataset/images".to_string()),
            default_rounds: env::var("DEFAULT_ROUNDS")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .expect("Invalid DEFAULT_ROUNDS"),
            default_time_limit_seconds: env::var("DEFAULT_TIME_LIMIT_SECONDS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .expect("Invalid DEFAULT_TIME_LIMIT_SECONDS"),
            max_players_per_room: env::var("MAX_PLAYERS_PER_ROOM")
                .unwrap_or_else(|_| "8".to_string())
                .parse()
                .expect("Invalid MAX_PLAYERS_PER_ROOM"),
            character_limit: env::var("CHARACTER_LIMIT")
                .unwrap_or_else(|_| "400".to_string())
                .parse()
                .expect("Invalid CHARACTER_LIMIT"),
            room_timeout_minutes: env::var("ROOM_TIMEOUT_MINUTES")
                .unwrap_or_else(|_| "120".to_string())
                .parse()
                .expect("Invalid ROOM_TIMEOUT_MINUTES"),
            connection_timeout_seconds: env::var("CONNECTION_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .expect("Invalid CONNECTION_TIMEOUT_SECONDS"),
        }
    }

    pub fn default_settings(&self) -> battle_types::RoomSettings {
        battle_types::RoomSettings {
            rounds: self.default_rounds,
            time_limit_seconds: self.default_time_limit_seconds,
            max_players: self.max_players_per_room,
            character_limit: self.character_limit,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
