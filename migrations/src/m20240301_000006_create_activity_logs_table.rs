use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // No FK on user_id: log rows outlive their actors and render as
        // "System" when the user is gone.
        manager
            .create_table(
                Table::create()
                    .table(ActivityLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ActivityLogs::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ActivityLogs::UserId).big_integer().null())
                    .col(ColumnDef::new(ActivityLogs::ActionType).string().not_null())
                    .col(
                        ColumnDef::new(ActivityLogs::ActionDetails)
                            .text()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ActivityLogs::IpAddress).string().null())
                    .col(ColumnDef::new(ActivityLogs::UserAgent).string().null())
                    .col(
                        ColumnDef::new(ActivityLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ActivityLogs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum ActivityLogs {
    Table,
    Id,
    UserId,
    ActionType,
    ActionDetails,
    IpAddress,
    UserAgent,
    CreatedAt,
}
