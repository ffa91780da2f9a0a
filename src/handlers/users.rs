use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::auth::{AuthContext, RequestMeta};
use crate::db::paginate::Page;
use crate::entities::user::{self, UserRole, UserStatus};
use crate::errors::ServiceError;
use crate::handlers::common::{default_page, page_request, parse_date, parse_enum};
use crate::services::users::{CreateUserRequest, UserListFilter};
use crate::{ApiResponse, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct UsersListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    pub per_page: Option<u64>,
    pub role: Option<String>,
    pub status: Option<String>,
    pub branch_id: Option<i64>,
    pub date_start: Option<String>,
    pub date_end: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetUserStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangeRoleRequest {
    pub role: String,
    #[serde(default)]
    pub sync_customer_link: bool,
}

#[derive(Debug, Serialize)]
pub struct ResetPasswordResponse {
    pub new_password: String,
}

pub async fn list_users(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<UsersListQuery>,
) -> ApiResult<Page<user::Model>> {
    let filter = UserListFilter {
        role: parse_enum::<UserRole>(query.role.as_deref(), "role")?,
        status: parse_enum::<UserStatus>(query.status.as_deref(), "status")?,
        branch_id: query.branch_id,
        date_start: parse_date(query.date_start.as_deref(), "date_start")?,
        date_end: parse_date(query.date_end.as_deref(), "date_end")?,
        search: query.search,
    };
    let page = page_request(&state.config, query.page, query.per_page);

    let result = state.services.users.list_users(filter, page, &auth).await?;
    Ok(Json(ApiResponse::success(result)))
}

pub async fn create_user(
    State(state): State<AppState>,
    auth: AuthContext,
    meta: RequestMeta,
    Json(request): Json<CreateUserRequest>,
) -> ApiResult<user::Model> {
    let created = state
        .services
        .users
        .create_user(request, &auth, &meta)
        .await?;
    Ok(Json(ApiResponse::success_with_message(
        created,
        "User created".to_string(),
    )))
}

pub async fn set_status(
    State(state): State<AppState>,
    auth: AuthContext,
    meta: RequestMeta,
    Path(user_id): Path<i64>,
    Json(request): Json<SetUserStatusRequest>,
) -> ApiResult<user::Model> {
    let status = request.status.trim().parse::<UserStatus>().map_err(|_| {
        ServiceError::ValidationError(format!("Unknown user status: {}", request.status))
    })?;

    let updated = state
        .services
        .users
        .set_status(user_id, status, &auth, &meta)
        .await?;
    Ok(Json(ApiResponse::success_with_message(
        updated,
        "User status updated".to_string(),
    )))
}

pub async fn change_role(
    State(state): State<AppState>,
    auth: AuthContext,
    meta: RequestMeta,
    Path(user_id): Path<i64>,
    Json(request): Json<ChangeRoleRequest>,
) -> ApiResult<user::Model> {
    let role = request.role.trim().parse::<UserRole>().map_err(|_| {
        ServiceError::ValidationError(format!("Unknown user role: {}", request.role))
    })?;

    let updated = state
        .services
        .users
        .change_role(user_id, role, request.sync_customer_link, &auth, &meta)
        .await?;
    Ok(Json(ApiResponse::success_with_message(
        updated,
        "User role updated".to_string(),
    )))
}

pub async fn reset_password(
    State(state): State<AppState>,
    auth: AuthContext,
    meta: RequestMeta,
    Path(user_id): Path<i64>,
) -> ApiResult<ResetPasswordResponse> {
    let new_password = state
        .services
        .users
        .reset_password(user_id, &auth, &meta)
        .await?;
    Ok(Json(ApiResponse::success_with_message(
        ResetPasswordResponse { new_password },
        "Password reset; share the new password with the user".to_string(),
    )))
}
