use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::auth::AuthContext;
use crate::db::paginate::Page;
use crate::handlers::common::{default_page, page_request, parse_date};
use crate::services::activity_log::{ActivityListFilter, ActivityLogRow};
use crate::{ApiResponse, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct ActivityListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    pub per_page: Option<u64>,
    pub user_id: Option<i64>,
    /// Action type filter; an open string set.
    #[serde(rename = "type")]
    pub action_type: Option<String>,
    pub date_start: Option<String>,
    pub date_end: Option<String>,
    pub search: Option<String>,
}

pub async fn list_activity(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<ActivityListQuery>,
) -> ApiResult<Page<ActivityLogRow>> {
    auth.require_admin()?;

    let filter = ActivityListFilter {
        user_id: query.user_id,
        action_type: query.action_type,
        date_start: parse_date(query.date_start.as_deref(), "date_start")?,
        date_end: parse_date(query.date_end.as_deref(), "date_end")?,
        search: query.search,
    };
    let page = page_request(&state.config, query.page, query.per_page);

    let result = state.services.activity.list(filter, page).await?;
    Ok(Json(ApiResponse::success(result)))
}
