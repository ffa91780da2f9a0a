use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::auth::{AuthContext, RequestMeta};
use crate::db::paginate::Page;
use crate::entities::customer;
use crate::handlers::common::{default_page, page_request};
use crate::services::customers::{CreateCustomerRequest, CustomerListFilter};
use crate::services::reminders::DispatchReport;
use crate::{ApiResponse, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct CustomersListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    pub per_page: Option<u64>,
    pub search: Option<String>,
}

pub async fn list_customers(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<CustomersListQuery>,
) -> ApiResult<Page<customer::Model>> {
    let filter = CustomerListFilter {
        search: query.search,
    };
    let page = page_request(&state.config, query.page, query.per_page);

    let result = state
        .services
        .customers
        .list_customers(filter, page, &auth)
        .await?;
    Ok(Json(ApiResponse::success(result)))
}

pub async fn get_customer(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(customer_id): Path<i64>,
) -> ApiResult<customer::Model> {
    let customer = state.services.customers.get_customer(customer_id).await?;
    Ok(Json(ApiResponse::success(customer)))
}

pub async fn create_customer(
    State(state): State<AppState>,
    auth: AuthContext,
    meta: RequestMeta,
    Json(request): Json<CreateCustomerRequest>,
) -> ApiResult<customer::Model> {
    let created = state
        .services
        .customers
        .create_customer(request, &auth, &meta)
        .await?;
    Ok(Json(ApiResponse::success_with_message(
        created,
        "Customer created".to_string(),
    )))
}

pub async fn send_reminder(
    State(state): State<AppState>,
    auth: AuthContext,
    meta: RequestMeta,
    Path(customer_id): Path<i64>,
) -> ApiResult<DispatchReport> {
    let report = state
        .services
        .reminders
        .send_debt_reminder(customer_id, &auth, &meta)
        .await?;
    let message = if report.success {
        "Reminder sent".to_string()
    } else {
        format!("Reminder could not be delivered: {}", report.message)
    };
    Ok(Json(ApiResponse::success_with_message(report, message)))
}
