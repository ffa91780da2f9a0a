use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ConnectionTrait, EntityTrait, IntoSimpleExpr, QueryFilter, QueryOrder, Set,
};
use serde::Serialize;
use tracing::{instrument, warn};

use crate::auth::RequestMeta;
use crate::db::filter::{DateRange, FilterBuilder};
use crate::db::paginate::{self, Page, PageRequest};
use crate::db::DbPool;
use crate::entities::{activity_log, user};
use crate::errors::ServiceError;

/// Known audit action types. The column is an open string set: anything a
/// newer (or older) build wrote that we do not recognize round-trips through
/// `Other` and renders with its raw value.
#[derive(Debug, Clone, PartialEq, Eq, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum ActionKind {
    OrderCreated,
    OrderUpdated,
    OrderStatusChange,
    UserCreated,
    CustomerCreated,
    UserStatusChange,
    UserRoleChange,
    PasswordReset,
    DebtReminderSent,
    TemplateSaved,
    TemplateDeleted,
    TestMessage,
    Login,
    #[strum(default)]
    Other(String),
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::OrderCreated => "order_created",
            Self::OrderUpdated => "order_updated",
            Self::OrderStatusChange => "order_status_change",
            Self::UserCreated => "user_created",
            Self::CustomerCreated => "customer_created",
            Self::UserStatusChange => "user_status_change",
            Self::UserRoleChange => "user_role_change",
            Self::PasswordReset => "password_reset",
            Self::DebtReminderSent => "debt_reminder_sent",
            Self::TemplateSaved => "template_saved",
            Self::TemplateDeleted => "template_deleted",
            Self::TestMessage => "test_message",
            Self::Login => "login",
            Self::Other(raw) => raw,
        })
    }
}

impl ActionKind {
    /// Human-readable label; unknown kinds fall back to the raw string.
    pub fn label(&self) -> String {
        match self {
            Self::OrderCreated => "Order created".to_string(),
            Self::OrderUpdated => "Order updated".to_string(),
            Self::OrderStatusChange => "Order status change".to_string(),
            Self::UserCreated => "User created".to_string(),
            Self::CustomerCreated => "Customer created".to_string(),
            Self::UserStatusChange => "User status change".to_string(),
            Self::UserRoleChange => "User role change".to_string(),
            Self::PasswordReset => "Password reset".to_string(),
            Self::DebtReminderSent => "Debt reminder sent".to_string(),
            Self::TemplateSaved => "Template saved".to_string(),
            Self::TemplateDeleted => "Template deleted".to_string(),
            Self::TestMessage => "Test message".to_string(),
            Self::Login => "Login".to_string(),
            Self::Other(raw) => raw.clone(),
        }
    }

    pub fn parse(raw: &str) -> Self {
        raw.parse().unwrap_or_else(|_| Self::Other(raw.to_string()))
    }
}

/// One audit entry to append.
#[derive(Debug, Clone)]
pub struct NewActivity {
    /// Acting user; `None` marks a system-initiated action.
    pub actor: Option<i64>,
    pub action: ActionKind,
    pub details: String,
    pub meta: RequestMeta,
}

/// Filters accepted by the activity list screen.
#[derive(Debug, Clone, Default)]
pub struct ActivityListFilter {
    pub user_id: Option<i64>,
    pub action_type: Option<String>,
    pub date_start: Option<NaiveDate>,
    pub date_end: Option<NaiveDate>,
    pub search: Option<String>,
}

/// Row shape rendered by the activity list screen.
#[derive(Debug, Serialize)]
pub struct ActivityLogRow {
    pub id: i64,
    pub user_id: Option<i64>,
    pub actor_name: String,
    pub action_type: String,
    pub action_label: String,
    pub action_details: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Append-only audit logger.
///
/// Recording is fire-and-forget: a failed insert is logged and swallowed so
/// the triggering business operation never fails because of its audit trail.
#[derive(Clone)]
pub struct ActivityLogService {
    db: Arc<DbPool>,
}

impl ActivityLogService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Appends one entry on its own connection.
    #[instrument(skip(self, entry), fields(action = %entry.action))]
    pub async fn record(&self, entry: NewActivity) {
        if let Err(err) = insert_entry(&*self.db, entry).await {
            warn!(error = %err, "failed to append activity log entry");
        }
    }

    /// Appends one entry through a caller-held transaction, so the audit row
    /// commits or rolls back together with the business write. Insert
    /// failures are still swallowed.
    pub async fn record_in<C: ConnectionTrait>(&self, conn: &C, entry: NewActivity) {
        if let Err(err) = insert_entry(conn, entry).await {
            warn!(error = %err, "failed to append activity log entry");
        }
    }

    /// Paginated, filtered audit listing with the actor's name left-joined
    /// in. Actors that no longer exist render as "System".
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: ActivityListFilter,
        page: PageRequest,
    ) -> Result<Page<ActivityLogRow>, ServiceError> {
        let range = DateRange::resolve(filter.date_start, filter.date_end, Utc::now().date_naive());
        let condition = FilterBuilder::new()
            .date_range(activity_log::Column::CreatedAt, &range)
            .foreign_key(activity_log::Column::UserId, filter.user_id)
            .equals(
                activity_log::Column::ActionType,
                filter
                    .action_type
                    .as_deref()
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string),
            )
            .search(
                filter.search.as_deref(),
                [
                    activity_log::Column::ActionType.into_simple_expr(),
                    activity_log::Column::ActionDetails.into_simple_expr(),
                    activity_log::Column::IpAddress.into_simple_expr(),
                    user::Column::Fullname.into_simple_expr(),
                ],
            )
            .build();

        let query = activity_log::Entity::find()
            .find_also_related(user::Entity)
            .filter(condition)
            .order_by_desc(activity_log::Column::CreatedAt);

        let page = paginate::fetch_page(&*self.db, query, page).await?;
        Ok(page.map(|(log, actor)| {
            let kind = ActionKind::parse(&log.action_type);
            ActivityLogRow {
                id: log.id,
                user_id: log.user_id,
                actor_name: actor
                    .map(|u| u.fullname)
                    .unwrap_or_else(|| "System".to_string()),
                action_label: kind.label(),
                action_type: log.action_type,
                action_details: log.action_details,
                ip_address: log.ip_address,
                user_agent: log.user_agent,
                created_at: log.created_at,
            }
        }))
    }
}

async fn insert_entry<C: ConnectionTrait>(conn: &C, entry: NewActivity) -> Result<(), sea_orm::DbErr> {
    let model = activity_log::ActiveModel {
        user_id: Set(entry.actor),
        action_type: Set(entry.action.to_string()),
        action_details: Set(entry.details),
        ip_address: Set(entry.meta.ip_address),
        user_agent: Set(entry.meta.user_agent),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    activity_log::Entity::insert(model).exec(conn).await?;
    Ok(())
}
