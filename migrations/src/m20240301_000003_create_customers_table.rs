use sea_orm_migration::prelude::*;

use crate::m20240301_000002_create_users_table::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Customers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Customers::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Customers::UserId).big_integer().null())
                    .col(ColumnDef::new(Customers::Fullname).string().not_null())
                    .col(ColumnDef::new(Customers::Email).string().null())
                    .col(ColumnDef::new(Customers::Phone).string().null())
                    .col(ColumnDef::new(Customers::Address).text().null())
                    .col(ColumnDef::new(Customers::Company).string().null())
                    .col(
                        ColumnDef::new(Customers::LastDebtReminder)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Customers::CreatedAt).timestamp_with_time_zone().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-customers-user_id")
                            .from(Customers::Table, Customers::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Customers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Customers {
    Table,
    Id,
    UserId,
    Fullname,
    Email,
    Phone,
    Address,
    Company,
    LastDebtReminder,
    CreatedAt,
}
