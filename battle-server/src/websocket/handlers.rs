use std::sync::Arc;
use tracing::{info, warn};

use crate::room_manager::RoomManager;
use crate::websocket::connection::{ConnectionId, ConnectionManager};
use battle_types::{ClientMessage, GameError, ServerMessage};

/// Dispatches validated inbound messages into the room manager and
/// reports failures back to the sending socket.
#[derive(Clone)]
pub struct MessageHandler {
    connection_id: ConnectionId,
    connection_manager: Arc<ConnectionManager>,
    room_manager: Arc<RoomManager>,
}

impl MessageHandler {
    pub fn new(
        connection_id: ConnectionId,
        connection_manager: Arc<ConnectionManager>,
        room_manager: Arc<RoomManager>,
    ) -> Self {
        Self {
            connection_id,
            connection_manager,
            room_manager,
        }
    }

    pub async fn handle_message(&self, message: ClientMessage) -> Result<(), String> {
        self.connection_manager
            .update_activity(self.connection_id)
            .await;

        let outcome = match message {
            ClientMessage::JoinRoom { room_code, player_name } => self
                .room_manager
                .join_room(self.connection_id, &room_code, &player_name)
                .await
                .map(|_| ()),
            ClientMessage::LeaveRoom => {
                self.room_manager.leave_room(self.connection_id).await
            }
            ClientMessage::StartGame { room_code, settings } => {
                self.room_manager
                    .clone()
                    .start_game(self.connection_id, &room_code, settings)
                    .await
            }
            ClientMessage::SubmitPrompt { round_id, text } => {
                self.room_manager
                    .submit_prompt(self.connection_id, &round_id, &text)
                    .await
            }
            ClientMessage::UnsubmitPrompt { round_id } => {
                self.room_manager
                    .unsubmit_prompt(self.connection_id, &round_id)
                    .await
            }
            ClientMessage::NextRound { room_code } => {
                self.room_manager
                    .clone()
                    .next_round(self.connection_id, &room_code)
                    .await
            }
            ClientMessage::Heartbeat => Ok(()),
        };

        if let Err(game_error) = outcome {
            self.report_error(game_error).await?;
        }
        Ok(())
    }

    pub async fn handle_disconnect(&self) {
        info!("Handling disconnect for connection {}", self.connection_id);
        self.room_manager.handle_disconnect(self.connection_id).await;
    }

    /// Validation and conflict errors surface their reason; internal
    /// errors are logged in full and surfaced generically.
    async fn report_error(&self, error: GameError) -> Result<(), String> {
        match error.kind() {
            battle_types::ErrorKind::Internal => {
                warn!("Internal error on connection {}: {}", self.connection_id, error);
            }
            _ => {
                info!("Rejected action on connection {}: {}", self.connection_id, error);
            }
        }

        self.connection_manager
            .send_to_connection(
                self.connection_id,
                ServerMessage::Error {
                    message: error.client_message(),
                },
            )
            .await
    }
}
