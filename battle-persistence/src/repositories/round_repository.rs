use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
};

use crate::entities::{prelude::*, results, rounds, submissions};
use battle_types::PlayerResult;

/// Fields needed to persist a newly started round.
#[derive(Debug, Clone)]
pub struct NewRound {
    pub id: String,
    pub room_code: String,
    pub image_path: String,
    pub target_text: String,
    pub time_limit_seconds: u64,
    pub difficulty: String,
    pub started_at: DateTime<Utc>,
}

pub struct RoundRepository {
    db: DatabaseConnection,
}

impl RoundRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create_round(&self, round: &NewRound) -> Result<()> {
        let row = rounds::ActiveModel {
            id: ActiveValue::Set(round.id.clone()),
            code: ActiveValue::Set(round.room_code.clone()),
            image_path: ActiveValue::Set(round.image_path.clone()),
            target_text: ActiveValue::Set(round.target_text.clone()),
            time_limit: ActiveValue::Set(round.time_limit_seconds as i64),
            difficulty: ActiveValue::Set(round.difficulty.clone()),
            created_at: ActiveValue::Set(round.started_at.into()),
            closed_at: ActiveValue::Set(None),
        };
        Rounds::insert(row).exec(&self.db).await?;
        Ok(())
    }

    /// Stamp the round closed. Set exactly once per round by the
    /// controller's close path.
    pub async fn close_round(&self, round_id: &str, closed_at: DateTime<Utc>) -> Result<()> {
        let round = Rounds::find_by_id(round_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| anyhow::anyhow!("round {} not persisted", round_id))?;

        let mut active: rounds::ActiveModel = round.into();
        active.closed_at = ActiveValue::Set(Some(closed_at.into()));
        Rounds::update(active).exec(&self.db).await?;
        Ok(())
    }

    pub async fn find_round(&self, round_id: &str) -> Result<Option<rounds::Model>> {
        Ok(Rounds::find_by_id(round_id).one(&self.db).await?)
    }

    /// Record a player's current guess. An earlier guess by the same
    /// player for the same round is replaced, keeping one live row per
    /// (round, player).
    pub async fn save_submission(
        &self,
        round_id: &str,
        player_name: &str,
        text: &str,
        created_at: DateTime<Utc>,
    ) -> Result<()> {
        self.delete_submission(round_id, player_name).await?;

        let row = submissions::ActiveModel {
            id: ActiveValue::NotSet,
            round_id: ActiveValue::Set(round_id.to_string()),
            player_name: ActiveValue::Set(player_name.to_string()),
            text: ActiveValue::Set(text.to_string()),
            created_at: ActiveValue::Set(created_at.into()),
        };
        Submissions::insert(row).exec(&self.db).await?;
        Ok(())
    }

    pub async fn delete_submission(&self, round_id: &str, player_name: &str) -> Result<()> {
        Submissions::delete_many()
            .filter(submissions::Column::RoundId.eq(round_id))
            .filter(submissions::Column::PlayerName.eq(player_name))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    pub async fn round_submissions(&self, round_id: &str) -> Result<Vec<submissions::Model>> {
        Ok(Submissions::find()
            .filter(submissions::Column::RoundId.eq(round_id))
            .all(&self.db)
            .await?)
    }

    pub async fn save_results(&self, round_results: &[PlayerResult]) -> Result<()> {
        if round_results.is_empty() {
            return Ok(());
        }

        let rows: Vec<results::ActiveModel> = round_results
            .iter()
            .map(|r| results::ActiveModel {
                id: ActiveValue::NotSet,
                round_id: ActiveValue::Set(r.round_id.clone()),
                player_name: ActiveValue::Set(r.player_name.clone()),
                text: ActiveValue::Set(r.text.clone()),
                accuracy_score: ActiveValue::Set(r.accuracy_score),
                leaderboard_points: ActiveValue::Set(r.leaderboard_points),
                matched: ActiveValue::Set(r.matched_words.join(", ")),
                missed: ActiveValue::Set(r.missed_words.join(", ")),
            })
            .collect();

        Results::insert_many(rows).exec(&self.db).await?;
        Ok(())
    }

    pub async fn round_results(&self, round_id: &str) -> Result<Vec<results::Model>> {
        Ok(Results::find()
            .filter(results::Column::RoundId.eq(round_id))
            .all(&self.db)
            .await?)
    }
}
