use anyhow::Result;
use sea_orm::{ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::entities::{players, prelude::*, rooms};
use battle_types::Player;

pub struct RoomRepository {
    db: DatabaseConnection,
}

impl RoomRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create_room(&self, code: &str, created_at: chrono::DateTime<chrono::Utc>) -> Result<()> {
        let room = rooms::ActiveModel {
            code: ActiveValue::Set(code.to_string()),
            created_at: ActiveValue::Set(created_at.into()),
        };
        Rooms::insert(room).exec(&self.db).await?;
        Ok(())
    }

    pub async fn find_room(&self, code: &str) -> Result<Option<rooms::Model>> {
        Ok(Rooms::find_by_id(code).one(&self.db).await?)
    }

    pub async fn delete_room(&self, code: &str) -> Result<()> {
        Players::delete_many()
            .filter(players::Column::Code.eq(code))
            .exec(&self.db)
            .await?;
        Rooms::delete_by_id(code).exec(&self.db).await?;
        Ok(())
    }

    pub async fn add_player(&self, code: &str, player: &Player) -> Result<()> {
        let joined_at = chrono::DateTime::parse_from_rfc3339(&player.joined_at)
            .unwrap_or_else(|_| chrono::Utc::now().into());

        let row = players::ActiveModel {
            id: ActiveValue::Set(player.id),
            code: ActiveValue::Set(code.to_string()),
            name: ActiveValue::Set(player.name.clone()),
            joined_at: ActiveValue::Set(joined_at),
        };
        Players::insert(row).exec(&self.db).await?;
        Ok(())
    }

    pub async fn remove_player(&self, player_id: Uuid) -> Result<()> {
        Players::delete_by_id(player_id).exec(&self.db).await?;
        Ok(())
    }

    pub async fn room_players(&self, code: &str) -> Result<Vec<players::Model>> {
        Ok(Players::find()
            .filter(players::Column::Code.eq(code))
            .all(&self.db)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::connect_to_memory_database;
    use migration::{Migrator, MigratorTrait};

    async fn test_repository() -> RoomRepository {
        let db = connect_to_memory_database().await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        RoomRepository::new(db)
    }

    fn test_player(name: &str) -> Player {
        Player {
            id: Uuid::new_v4(),
            name: name.to_string(),
            joined_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    #[tokio::test]
    async fn test_create_and_find_room() {
        let repo = test_repository().await;
        repo.create_room("ABC123", chrono::Utc::now()).await.unwrap();

        let found = repo.find_room("ABC123").await.unwrap();
        assert!(found.is_some());
        assert!(repo.find_room("ZZZZZZ").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_player_roster_round_trip() {
        let repo = test_repository().await;
        repo.create_room("ABC123", chrono::Utc::now()).await.unwrap();

        let alice = test_player("Alice");
        let bob = test_player("Bob");
        repo.add_player("ABC123", &alice).await.unwrap();
        repo.add_player("ABC123", &bob).await.unwrap();
        assert_eq!(repo.room_players("ABC123").await.unwrap().len(), 2);

        repo.remove_player(alice.id).await.unwrap();
        let remaining = repo.room_players("ABC123").await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].name, "Bob");
    }

    #[tokio::test]
    async fn test_delete_room_removes_players() {
        let repo = test_repository().await;
        repo.create_room("ABC123", chrono::Utc::now()).await.unwrap();
        repo.add_player("ABC123", &test_player("Alice")).await.unwrap();

        repo.delete_room("ABC123").await.unwrap();
        assert!(repo.find_room("ABC123").await.unwrap().is_none());
        assert!(repo.room_players("ABC123").await.unwrap().is_empty());
    }
}
