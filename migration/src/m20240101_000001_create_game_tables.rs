use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Rooms::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Rooms::Code).string().not_null().primary_key())
                    .col(
                        ColumnDef::new(Rooms::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Players::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Players::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Players::Code).string().not_null())
                    .col(ColumnDef::new(Players::Name).string().not_null())
                    .col(
                        ColumnDef::new(Players::JoinedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_players_code")
                    .table(Players::Table)
                    .col(Players::Code)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Rounds::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Rounds::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Rounds::Code).string().not_null())
                    .col(ColumnDef::new(Rounds::ImagePath).string().not_null())
                    .col(ColumnDef::new(Rounds::TargetText).string().not_null())
                    .col(ColumnDef::new(Rounds::TimeLimit).big_integer().not_null())
                    .col(ColumnDef::new(Rounds::Difficulty).string().not_null())
                    .col(
                        ColumnDef::new(Rounds::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Rounds::ClosedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_rounds_code")
                    .table(Rounds::Table)
                    .col(Rounds::Code)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Submissions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Submissions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Submissions::RoundId).string().not_null())
                    .col(ColumnDef::new(Submissions::PlayerName).string().not_null())
                    .col(ColumnDef::new(Submissions::Text).string().not_null())
                    .col(
                        ColumnDef::new(Submissions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_submissions_round_id")
                    .table(Submissions::Table)
                    .col(Submissions::RoundId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Results::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Results::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Results::RoundId).string().not_null())
                    .col(ColumnDef::new(Results::PlayerName).string().not_null())
                    .col(ColumnDef::new(Results::Text).string().not_null())
                    .col(ColumnDef::new(Results::AccuracyScore).integer().not_null())
                    .col(
                        ColumnDef::new(Results::LeaderboardPoints)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Results::Matched).string())
                    .col(ColumnDef::new(Results::Missed).string())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_results_round_id")
                    .table(Results::Table)
                    .col(Results::RoundId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Results::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Submissions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Rounds::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Players::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Rooms::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Rooms {
    Table,
    Code,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Players {
    Table,
    Id,
    Code,
    Name,
    JoinedAt,
}

#[derive(DeriveIden)]
enum Rounds {
    Table,
    Id,
    Code,
    ImagePath,
    TargetText,
    TimeLimit,
    Difficulty,
    CreatedAt,
    ClosedAt,
}

#[derive(DeriveIden)]
enum Submissions {
    Table,
    Id,
    RoundId,
    PlayerName,
    Text,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Results {
    Table,
    Id,
    RoundId,
    PlayerName,
    Text,
    AccuracyScore,
    LeaderboardPoints,
    Matched,
    Missed,
}
