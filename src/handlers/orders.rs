use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::auth::{AuthContext, RequestMeta};
use crate::db::paginate::Page;
use crate::entities::order::{self, OrderStatus};
use crate::errors::ServiceError;
use crate::handlers::common::{default_page, page_request, parse_date, parse_enum};
use crate::services::orders::{
    CreateOrderRequest, OrderDetails, OrderListFilter, OrderListRow, ReplaceLinesRequest,
};
use crate::{ApiResponse, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct OrdersListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    pub per_page: Option<u64>,
    pub status: Option<String>,
    pub date_start: Option<String>,
    pub date_end: Option<String>,
    pub branch_id: Option<i64>,
    pub seller_id: Option<i64>,
    pub customer_id: Option<i64>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub new_status: String,
    pub status_note: Option<String>,
}

pub async fn list_orders(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<OrdersListQuery>,
) -> ApiResult<Page<OrderListRow>> {
    let filter = OrderListFilter {
        status: parse_enum::<OrderStatus>(query.status.as_deref(), "status")?,
        date_start: parse_date(query.date_start.as_deref(), "date_start")?,
        date_end: parse_date(query.date_end.as_deref(), "date_end")?,
        branch_id: query.branch_id,
        seller_id: query.seller_id,
        customer_id: query.customer_id,
        search: query.search,
    };
    let page = page_request(&state.config, query.page, query.per_page);

    let result = state.services.orders.list_orders(filter, page, &auth).await?;
    Ok(Json(ApiResponse::success(result)))
}

pub async fn get_order(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(order_id): Path<i64>,
) -> ApiResult<OrderDetails> {
    let details = state.services.orders.get_order(order_id).await?;
    Ok(Json(ApiResponse::success(details)))
}

pub async fn get_order_by_number(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(order_number): Path<String>,
) -> ApiResult<OrderDetails> {
    let details = state
        .services
        .orders
        .get_order_by_number(&order_number)
        .await?;
    Ok(Json(ApiResponse::success(details)))
}

pub async fn create_order(
    State(state): State<AppState>,
    auth: AuthContext,
    meta: RequestMeta,
    Json(request): Json<CreateOrderRequest>,
) -> ApiResult<order::Model> {
    let created = state
        .services
        .orders
        .create_order(request, &auth, &meta)
        .await?;
    Ok(Json(ApiResponse::success_with_message(
        created,
        "Order created".to_string(),
    )))
}

pub async fn update_order_status(
    State(state): State<AppState>,
    auth: AuthContext,
    meta: RequestMeta,
    Path(order_id): Path<i64>,
    Json(request): Json<UpdateOrderStatusRequest>,
) -> ApiResult<order::Model> {
    let new_status = request
        .new_status
        .trim()
        .parse::<OrderStatus>()
        .map_err(|_| {
            ServiceError::InvalidStatus(format!("Unknown order status: {}", request.new_status))
        })?;

    let updated = state
        .services
        .order_status
        .transition(order_id, new_status, request.status_note, &auth, &meta)
        .await?;
    Ok(Json(ApiResponse::success_with_message(
        updated,
        "Order status updated".to_string(),
    )))
}

pub async fn mark_printed(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(order_id): Path<i64>,
) -> ApiResult<order::Model> {
    let updated = state.services.orders.mark_printed(order_id).await?;
    Ok(Json(ApiResponse::success(updated)))
}

pub async fn replace_lines(
    State(state): State<AppState>,
    auth: AuthContext,
    meta: RequestMeta,
    Path(order_id): Path<i64>,
    Json(request): Json<ReplaceLinesRequest>,
) -> ApiResult<order::Model> {
    let updated = state
        .services
        .orders
        .replace_lines(order_id, request, &auth, &meta)
        .await?;
    Ok(Json(ApiResponse::success_with_message(
        updated,
        "Order lines updated".to_string(),
    )))
}
