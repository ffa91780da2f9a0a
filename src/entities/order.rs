use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Enum representing the possible statuses of a fabrication order.
///
/// The status machine is intentionally permissive: the back office may set
/// any status from any status (see DESIGN.md).
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[sea_orm(string_value = "new")]
    New,
    #[sea_orm(string_value = "processing")]
    Processing,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "delivered")]
    Delivered,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl OrderStatus {
    /// Human-readable label used in audit details and list screens.
    pub fn label(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Processing => "Processing",
            Self::Completed => "Completed",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    #[validate(length(
        min = 1,
        max = 50,
        message = "Order number must be between 1 and 50 characters"
    ))]
    pub order_number: String,

    pub customer_id: i64,
    pub seller_id: i64,
    pub branch_id: i64,
    pub order_status: OrderStatus,
    pub order_date: DateTime<Utc>,
    pub processing_date: Option<DateTime<Utc>>,
    pub completion_date: Option<DateTime<Utc>>,
    pub delivery_date: Option<DateTime<Utc>>,
    pub total_amount: Decimal,
    pub advance_payment: Decimal,
    pub remaining_amount: Decimal,
    pub assembly_fee: Decimal,
    pub notes: Option<String>,
    pub status_note: Option<String>,
    pub barcode: String,
    pub drawing_image: Option<String>,
    pub printed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id"
    )]
    Customer,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::SellerId",
        to = "super::user::Column::Id"
    )]
    Seller,
    #[sea_orm(
        belongs_to = "super::branch::Entity",
        from = "Column::BranchId",
        to = "super::branch::Column::Id"
    )]
    Branch,
    #[sea_orm(has_many = "super::order_profile::Entity")]
    Profiles,
    #[sea_orm(has_many = "super::order_glass::Entity")]
    Glass,
    #[sea_orm(has_one = "super::order_pricing::Entity")]
    Pricing,
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Seller.def()
    }
}

impl Related<super::branch::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Branch.def()
    }
}

impl Related<super::order_profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Profiles.def()
    }
}

impl Related<super::order_glass::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Glass.def()
    }
}

impl Related<super::order_pricing::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Pricing.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
