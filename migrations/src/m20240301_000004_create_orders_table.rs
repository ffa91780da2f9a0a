use sea_orm_migration::prelude::*;

use crate::m20240301_000001_create_branches_table::Branches;
use crate::m20240301_000002_create_users_table::Users;
use crate::m20240301_000003_create_customers_table::Customers;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Orders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Orders::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Orders::OrderNumber)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Orders::CustomerId).big_integer().not_null())
                    .col(ColumnDef::new(Orders::SellerId).big_integer().not_null())
                    .col(ColumnDef::new(Orders::BranchId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Orders::OrderStatus)
                            .string()
                            .not_null()
                            .default("new"),
                    )
                    .col(ColumnDef::new(Orders::OrderDate).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Orders::ProcessingDate).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(Orders::CompletionDate).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(Orders::DeliveryDate).timestamp_with_time_zone().null())
                    .col(
                        ColumnDef::new(Orders::TotalAmount)
                            .decimal()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Orders::AdvancePayment)
                            .decimal()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Orders::RemainingAmount)
                            .decimal()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Orders::AssemblyFee)
                            .decimal()
                            .not_null()
                            .default(0.0),
                    )
                    .col(ColumnDef::new(Orders::Notes).text().null())
                    .col(ColumnDef::new(Orders::StatusNote).text().null())
                    .col(ColumnDef::new(Orders::Barcode).string().not_null())
                    .col(ColumnDef::new(Orders::DrawingImage).string().null())
                    .col(ColumnDef::new(Orders::PrintedAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(Orders::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Orders::UpdatedAt).timestamp_with_time_zone().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-orders-customer_id")
                            .from(Orders::Table, Orders::CustomerId)
                            .to(Customers::Table, Customers::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-orders-seller_id")
                            .from(Orders::Table, Orders::SellerId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-orders-branch_id")
                            .from(Orders::Table, Orders::BranchId)
                            .to(Branches::Table, Branches::Id),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Orders::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Orders {
    Table,
    Id,
    OrderNumber,
    CustomerId,
    SellerId,
    BranchId,
    OrderStatus,
    OrderDate,
    ProcessingDate,
    CompletionDate,
    DeliveryDate,
    TotalAmount,
    AdvancePayment,
    RemainingAmount,
    AssemblyFee,
    Notes,
    StatusNote,
    Barcode,
    DrawingImage,
    PrintedAt,
    CreatedAt,
    UpdatedAt,
}
