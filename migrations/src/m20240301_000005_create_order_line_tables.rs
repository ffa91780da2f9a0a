use sea_orm_migration::prelude::*;

use crate::m20240301_000004_create_orders_table::Orders;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OrderProfiles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OrderProfiles::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(OrderProfiles::OrderId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrderProfiles::ProfileType)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(OrderProfiles::Color).string().null())
                    .col(
                        ColumnDef::new(OrderProfiles::Quantity)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(OrderProfiles::UnitPrice)
                            .decimal()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(OrderProfiles::TotalPrice)
                            .decimal()
                            .not_null()
                            .default(0.0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-order_profiles-order_id")
                            .from(OrderProfiles::Table, OrderProfiles::OrderId)
                            .to(Orders::Table, Orders::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(OrderGlass::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OrderGlass::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OrderGlass::OrderId).big_integer().not_null())
                    .col(ColumnDef::new(OrderGlass::GlassType).string().not_null())
                    .col(
                        ColumnDef::new(OrderGlass::Width)
                            .decimal()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(OrderGlass::Height)
                            .decimal()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(OrderGlass::Quantity)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(OrderGlass::UnitPrice)
                            .decimal()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(OrderGlass::TotalPrice)
                            .decimal()
                            .not_null()
                            .default(0.0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-order_glass-order_id")
                            .from(OrderGlass::Table, OrderGlass::OrderId)
                            .to(Orders::Table, Orders::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(OrderPricing::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OrderPricing::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(OrderPricing::OrderId)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(OrderPricing::ProfilesTotal)
                            .decimal()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(OrderPricing::GlassTotal)
                            .decimal()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(OrderPricing::AssemblyFee)
                            .decimal()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(OrderPricing::GrandTotal)
                            .decimal()
                            .not_null()
                            .default(0.0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-order_pricing-order_id")
                            .from(OrderPricing::Table, OrderPricing::OrderId)
                            .to(Orders::Table, Orders::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OrderPricing::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(OrderGlass::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(OrderProfiles::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum OrderProfiles {
    Table,
    Id,
    OrderId,
    ProfileType,
    Color,
    Quantity,
    UnitPrice,
    TotalPrice,
}

#[derive(DeriveIden)]
pub enum OrderGlass {
    Table,
    Id,
    OrderId,
    GlassType,
    Width,
    Height,
    Quantity,
    UnitPrice,
    TotalPrice,
}

#[derive(DeriveIden)]
pub enum OrderPricing {
    Table,
    Id,
    OrderId,
    ProfilesTotal,
    GlassTotal,
    AssemblyFee,
    GrandTotal,
}
