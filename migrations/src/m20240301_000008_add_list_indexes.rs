use sea_orm_migration::prelude::*;

use crate::m20240301_000004_create_orders_table::Orders;
use crate::m20240301_000006_create_activity_logs_table::ActivityLogs;

#[derive(DeriveMigrationName)]
pub struct Migration;

// Covering indexes for the filtered list screens; every list query filters
// or sorts on one of these columns.
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx-orders-status-date")
                    .table(Orders::Table)
                    .col(Orders::OrderStatus)
                    .col(Orders::OrderDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-orders-customer")
                    .table(Orders::Table)
                    .col(Orders::CustomerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-orders-branch")
                    .table(Orders::Table)
                    .col(Orders::BranchId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-activity_logs-created")
                    .table(ActivityLogs::Table)
                    .col(ActivityLogs::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-activity_logs-user-action")
                    .table(ActivityLogs::Table)
                    .col(ActivityLogs::UserId)
                    .col(ActivityLogs::ActionType)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx-orders-status-date").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx-orders-customer").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx-orders-branch").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx-activity_logs-created").to_owned())
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx-activity_logs-user-action")
                    .to_owned(),
            )
            .await
    }
}
