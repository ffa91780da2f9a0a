use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::auth::{AuthContext, RequestMeta};
use crate::db::paginate::Page;
use crate::entities::notification_template::{self, TemplateChannel, TemplateStatus};
use crate::handlers::common::{default_page, page_request, parse_enum};
use crate::notifications::templates::TemplateListFilter;
use crate::notifications::SaveTemplateRequest;
use crate::services::reminders::DispatchReport;
use crate::{ApiResponse, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct TemplatesListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    pub per_page: Option<u64>,
    pub channel: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TestMessageRequest {
    pub recipient: String,
    #[serde(default)]
    pub variables: HashMap<String, String>,
}

pub async fn list_templates(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<TemplatesListQuery>,
) -> ApiResult<Page<notification_template::Model>> {
    let filter = TemplateListFilter {
        channel: parse_enum::<TemplateChannel>(query.channel.as_deref(), "channel")?,
        status: parse_enum::<TemplateStatus>(query.status.as_deref(), "status")?,
        search: query.search,
    };
    let page = page_request(&state.config, query.page, query.per_page);

    let result = state
        .services
        .templates
        .list_templates(filter, page, &auth)
        .await?;
    Ok(Json(ApiResponse::success(result)))
}

pub async fn save_template(
    State(state): State<AppState>,
    auth: AuthContext,
    meta: RequestMeta,
    Json(request): Json<SaveTemplateRequest>,
) -> ApiResult<notification_template::Model> {
    let saved = state
        .services
        .templates
        .save_template(request, &auth, &meta)
        .await?;
    Ok(Json(ApiResponse::success_with_message(
        saved,
        "Template saved".to_string(),
    )))
}

pub async fn delete_template(
    State(state): State<AppState>,
    auth: AuthContext,
    meta: RequestMeta,
    Path(template_id): Path<i64>,
) -> ApiResult<()> {
    state
        .services
        .templates
        .delete_template(template_id, &auth, &meta)
        .await?;
    Ok(Json(ApiResponse::success_with_message(
        (),
        "Template deleted".to_string(),
    )))
}

pub async fn test_message(
    State(state): State<AppState>,
    auth: AuthContext,
    meta: RequestMeta,
    Path(template_id): Path<i64>,
    Json(request): Json<TestMessageRequest>,
) -> ApiResult<DispatchReport> {
    let report = state
        .services
        .reminders
        .send_test_message(template_id, &request.recipient, request.variables, &auth, &meta)
        .await?;
    let message = if report.success {
        "Test message sent".to_string()
    } else {
        format!("Test message failed: {}", report.message)
    };
    Ok(Json(ApiResponse::success_with_message(report, message)))
}
