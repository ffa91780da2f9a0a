use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoSimpleExpr, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use validator::Validate;

use crate::auth::{AuthContext, RequestMeta};
use crate::db::filter::{DateRange, FilterBuilder};
use crate::db::paginate::{self, Page, PageRequest};
use crate::db::DbPool;
use crate::entities::{
    customer,
    order::{self, OrderStatus},
    order_glass, order_pricing, order_profile,
};
use crate::errors::ServiceError;
use crate::services::activity_log::{ActionKind, ActivityLogService, NewActivity};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProfileLine {
    #[validate(length(min = 1, message = "Profile type is required"))]
    pub profile_type: String,
    pub color: Option<String>,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GlassLine {
    #[validate(length(min = 1, message = "Glass type is required"))]
    pub glass_type: String,
    pub width: Decimal,
    pub height: Decimal,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    pub unit_price: Decimal,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    pub customer_id: i64,
    /// Defaults to the caller's branch when omitted.
    pub branch_id: Option<i64>,
    /// Generated when omitted.
    #[validate(length(min = 1, max = 50, message = "Order number must be 1-50 characters"))]
    pub order_number: Option<String>,
    #[serde(default)]
    pub advance_payment: Decimal,
    #[serde(default)]
    pub assembly_fee: Decimal,
    pub notes: Option<String>,
    pub drawing_image: Option<String>,
    #[validate]
    #[serde(default)]
    pub profiles: Vec<ProfileLine>,
    #[validate]
    #[serde(default)]
    pub glass: Vec<GlassLine>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReplaceLinesRequest {
    pub assembly_fee: Option<Decimal>,
    #[validate]
    #[serde(default)]
    pub profiles: Vec<ProfileLine>,
    #[validate]
    #[serde(default)]
    pub glass: Vec<GlassLine>,
}

/// Filters accepted by the order list screen.
#[derive(Debug, Clone, Default)]
pub struct OrderListFilter {
    pub status: Option<OrderStatus>,
    pub date_start: Option<NaiveDate>,
    pub date_end: Option<NaiveDate>,
    pub branch_id: Option<i64>,
    pub seller_id: Option<i64>,
    pub customer_id: Option<i64>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OrderListRow {
    pub id: i64,
    pub order_number: String,
    pub barcode: String,
    pub customer_id: i64,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub seller_id: i64,
    pub branch_id: i64,
    pub order_status: OrderStatus,
    pub status_label: String,
    pub order_date: chrono::DateTime<Utc>,
    pub total_amount: Decimal,
    pub advance_payment: Decimal,
    pub remaining_amount: Decimal,
}

#[derive(Debug, Serialize)]
pub struct OrderDetails {
    pub order: order::Model,
    pub customer: customer::Model,
    pub profiles: Vec<order_profile::Model>,
    pub glass: Vec<order_glass::Model>,
    pub pricing: Option<order_pricing::Model>,
}

fn profile_totals(lines: &[ProfileLine]) -> Decimal {
    lines
        .iter()
        .map(|l| Decimal::from(l.quantity) * l.unit_price)
        .sum()
}

fn glass_totals(lines: &[GlassLine]) -> Decimal {
    lines
        .iter()
        .map(|l| Decimal::from(l.quantity) * l.unit_price)
        .sum()
}

fn generate_order_number() -> String {
    format!(
        "ALP-{}-{:04}",
        Utc::now().format("%y%m%d"),
        rand::thread_rng().gen_range(0..10_000)
    )
}

fn generate_barcode() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

async fn insert_lines<C: ConnectionTrait>(
    conn: &C,
    order_id: i64,
    profiles: &[ProfileLine],
    glass: &[GlassLine],
) -> Result<(), sea_orm::DbErr> {
    for line in profiles {
        order_profile::ActiveModel {
            order_id: Set(order_id),
            profile_type: Set(line.profile_type.clone()),
            color: Set(line.color.clone()),
            quantity: Set(line.quantity),
            unit_price: Set(line.unit_price),
            total_price: Set(Decimal::from(line.quantity) * line.unit_price),
            ..Default::default()
        }
        .insert(conn)
        .await?;
    }
    for line in glass {
        order_glass::ActiveModel {
            order_id: Set(order_id),
            glass_type: Set(line.glass_type.clone()),
            width: Set(line.width),
            height: Set(line.height),
            quantity: Set(line.quantity),
            unit_price: Set(line.unit_price),
            total_price: Set(Decimal::from(line.quantity) * line.unit_price),
            ..Default::default()
        }
        .insert(conn)
        .await?;
    }
    Ok(())
}

/// Service for creating, reading and listing fabrication orders.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DbPool>,
    activity: ActivityLogService,
}

impl OrderService {
    pub fn new(db: Arc<DbPool>, activity: ActivityLogService) -> Self {
        Self { db, activity }
    }

    #[instrument(skip(self, request, actor, meta), fields(customer_id = %request.customer_id))]
    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
        actor: &AuthContext,
        meta: &RequestMeta,
    ) -> Result<order::Model, ServiceError> {
        actor.require_staff()?;
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let branch_id = request
            .branch_id
            .filter(|id| *id > 0)
            .or(actor.branch_id)
            .ok_or_else(|| {
                ServiceError::ValidationError("branch_id is required".to_string())
            })?;

        let customer = customer::Entity::find_by_id(request.customer_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Customer {} not found", request.customer_id))
            })?;

        let profiles_total = profile_totals(&request.profiles);
        let glass_total = glass_totals(&request.glass);
        let total_amount = profiles_total + glass_total + request.assembly_fee;
        let remaining_amount = total_amount - request.advance_payment;

        let order_number = request
            .order_number
            .clone()
            .unwrap_or_else(generate_order_number);
        let now = Utc::now();

        let txn = self.db.begin().await.map_err(|e| {
            error!(error = %e, "failed to start order creation transaction");
            ServiceError::DatabaseError(e)
        })?;

        let order_model = order::ActiveModel {
            order_number: Set(order_number.clone()),
            customer_id: Set(request.customer_id),
            seller_id: Set(actor.user_id),
            branch_id: Set(branch_id),
            order_status: Set(OrderStatus::New),
            order_date: Set(now),
            total_amount: Set(total_amount),
            advance_payment: Set(request.advance_payment),
            remaining_amount: Set(remaining_amount),
            assembly_fee: Set(request.assembly_fee),
            notes: Set(request.notes.clone()),
            barcode: Set(generate_barcode()),
            drawing_image: Set(request.drawing_image.clone()),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            error!(error = %e, order_number = %order_number, "failed to insert order");
            ServiceError::DatabaseError(e)
        })?;

        insert_lines(&txn, order_model.id, &request.profiles, &request.glass).await?;

        order_pricing::ActiveModel {
            order_id: Set(order_model.id),
            profiles_total: Set(profiles_total),
            glass_total: Set(glass_total),
            assembly_fee: Set(request.assembly_fee),
            grand_total: Set(total_amount),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        self.activity
            .record_in(
                &txn,
                NewActivity {
                    actor: Some(actor.user_id),
                    action: ActionKind::OrderCreated,
                    details: format!(
                        "{}: created for {} ({} profile, {} glass lines)",
                        order_number,
                        customer.fullname,
                        request.profiles.len(),
                        request.glass.len()
                    ),
                    meta: meta.clone(),
                },
            )
            .await;

        txn.commit().await.map_err(|e| {
            error!(error = %e, "failed to commit order creation");
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id = order_model.id, order_number = %order_number, "order created");
        Ok(order_model)
    }

    /// Loads an order with its customer, line items and pricing breakdown.
    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: i64) -> Result<OrderDetails, ServiceError> {
        let order = order::Entity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let customer = customer::Entity::find_by_id(order.customer_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Customer {} not found for order {}",
                    order.customer_id, order_id
                ))
            })?;

        let profiles = order_profile::Entity::find()
            .filter(order_profile::Column::OrderId.eq(order_id))
            .all(&*self.db)
            .await?;
        let glass = order_glass::Entity::find()
            .filter(order_glass::Column::OrderId.eq(order_id))
            .all(&*self.db)
            .await?;
        let pricing = order_pricing::Entity::find()
            .filter(order_pricing::Column::OrderId.eq(order_id))
            .one(&*self.db)
            .await?;

        Ok(OrderDetails {
            order,
            customer,
            profiles,
            glass,
            pricing,
        })
    }

    /// Resolves an order by its display number.
    #[instrument(skip(self))]
    pub async fn get_order_by_number(&self, order_number: &str) -> Result<OrderDetails, ServiceError> {
        let order = order::Entity::find()
            .filter(order::Column::OrderNumber.eq(order_number))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Order {} not found", order_number))
            })?;
        self.get_order(order.id).await
    }

    /// Paginated, filtered order listing. Non-admin staff only ever see
    /// their own branch regardless of the requested branch filter.
    #[instrument(skip(self, actor))]
    pub async fn list_orders(
        &self,
        filter: OrderListFilter,
        page: PageRequest,
        actor: &AuthContext,
    ) -> Result<Page<OrderListRow>, ServiceError> {
        actor.require_staff()?;

        let branch_id = actor.branch_scope().or(filter.branch_id);
        let range = DateRange::resolve(filter.date_start, filter.date_end, Utc::now().date_naive());
        let condition = FilterBuilder::new()
            .date_range(order::Column::OrderDate, &range)
            .equals(order::Column::OrderStatus, filter.status)
            .foreign_key(order::Column::BranchId, branch_id)
            .foreign_key(order::Column::SellerId, filter.seller_id)
            .foreign_key(order::Column::CustomerId, filter.customer_id)
            .search(
                filter.search.as_deref(),
                [
                    order::Column::OrderNumber.into_simple_expr(),
                    order::Column::Barcode.into_simple_expr(),
                    customer::Column::Fullname.into_simple_expr(),
                    customer::Column::Phone.into_simple_expr(),
                ],
            )
            .build();

        let query = order::Entity::find()
            .find_also_related(customer::Entity)
            .filter(condition)
            .order_by_desc(order::Column::OrderDate);

        let page = paginate::fetch_page(&*self.db, query, page).await?;
        Ok(page.map(|(order, customer)| {
            let (customer_name, customer_phone) = customer
                .map(|c| (c.fullname, c.phone))
                .unwrap_or_else(|| ("Unknown".to_string(), None));
            OrderListRow {
                id: order.id,
                order_number: order.order_number,
                barcode: order.barcode,
                customer_id: order.customer_id,
                customer_name,
                customer_phone,
                seller_id: order.seller_id,
                branch_id: order.branch_id,
                status_label: order.order_status.label().to_string(),
                order_status: order.order_status,
                order_date: order.order_date,
                total_amount: order.total_amount,
                advance_payment: order.advance_payment,
                remaining_amount: order.remaining_amount,
            }
        }))
    }

    /// Stamps the first print time; line items become immutable afterwards.
    #[instrument(skip(self))]
    pub async fn mark_printed(&self, order_id: i64) -> Result<order::Model, ServiceError> {
        let order = order::Entity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        if order.printed_at.is_some() {
            return Ok(order);
        }

        let mut active: order::ActiveModel = order.into();
        active.printed_at = Set(Some(Utc::now()));
        Ok(active.update(&*self.db).await?)
    }

    /// Replaces the line items of an unprinted order and recomputes its
    /// totals. Printed orders reject the change.
    #[instrument(skip(self, request, actor, meta))]
    pub async fn replace_lines(
        &self,
        order_id: i64,
        request: ReplaceLinesRequest,
        actor: &AuthContext,
        meta: &RequestMeta,
    ) -> Result<order::Model, ServiceError> {
        actor.require_staff()?;
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let txn = self.db.begin().await.map_err(ServiceError::DatabaseError)?;

        let order = order::Entity::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        if order.printed_at.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Order {} has been printed; line items are immutable",
                order.order_number
            )));
        }

        order_profile::Entity::delete_many()
            .filter(order_profile::Column::OrderId.eq(order_id))
            .exec(&txn)
            .await?;
        order_glass::Entity::delete_many()
            .filter(order_glass::Column::OrderId.eq(order_id))
            .exec(&txn)
            .await?;
        insert_lines(&txn, order_id, &request.profiles, &request.glass).await?;

        let assembly_fee = request.assembly_fee.unwrap_or(order.assembly_fee);
        let profiles_total = profile_totals(&request.profiles);
        let glass_total = glass_totals(&request.glass);
        let total_amount = profiles_total + glass_total + assembly_fee;
        let advance = order.advance_payment;
        let order_number = order.order_number.clone();

        if let Some(pricing) = order_pricing::Entity::find()
            .filter(order_pricing::Column::OrderId.eq(order_id))
            .one(&txn)
            .await?
        {
            let mut pricing: order_pricing::ActiveModel = pricing.into();
            pricing.profiles_total = Set(profiles_total);
            pricing.glass_total = Set(glass_total);
            pricing.assembly_fee = Set(assembly_fee);
            pricing.grand_total = Set(total_amount);
            pricing.update(&txn).await?;
        }

        let mut active: order::ActiveModel = order.into();
        active.total_amount = Set(total_amount);
        active.assembly_fee = Set(assembly_fee);
        active.remaining_amount = Set(total_amount - advance);
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(&txn).await?;

        self.activity
            .record_in(
                &txn,
                NewActivity {
                    actor: Some(actor.user_id),
                    action: ActionKind::OrderUpdated,
                    details: format!("{}: line items replaced", order_number),
                    meta: meta.clone(),
                },
            )
            .await;

        txn.commit().await.map_err(ServiceError::DatabaseError)?;
        Ok(updated)
    }
}
