use std::sync::Arc;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, Set, TransactionTrait};
use tracing::{error, info, instrument};

use crate::auth::{AuthContext, RequestMeta};
use crate::db::DbPool;
use crate::entities::order::{self, OrderStatus};
use crate::errors::ServiceError;
use crate::services::activity_log::{ActionKind, ActivityLogService, NewActivity};

/// Applies order status changes.
///
/// The transition function is total: any status may be set to any other,
/// matching long-standing back-office behavior (see DESIGN.md). Entering
/// `processing`, `completed` or `delivered` stamps the matching timestamp
/// column; the stamp refreshes on every re-entry rather than only the first.
/// The status write and its audit entry share one transaction.
#[derive(Clone)]
pub struct OrderStatusService {
    db: Arc<DbPool>,
    activity: ActivityLogService,
}

impl OrderStatusService {
    pub fn new(db: Arc<DbPool>, activity: ActivityLogService) -> Self {
        Self { db, activity }
    }

    #[instrument(skip(self, actor, meta), fields(order_id = %order_id, new_status = %new_status))]
    pub async fn transition(
        &self,
        order_id: i64,
        new_status: OrderStatus,
        note: Option<String>,
        actor: &AuthContext,
        meta: &RequestMeta,
    ) -> Result<order::Model, ServiceError> {
        let txn = self.db.begin().await.map_err(|e| {
            error!(error = %e, "failed to begin status transition transaction");
            ServiceError::DatabaseError(e)
        })?;

        let existing = order::Entity::find_by_id(order_id)
            .one(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = order_id, "failed to fetch order for status update");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let old_status = existing.order_status;
        let order_number = existing.order_number.clone();
        let now = Utc::now();

        let mut active: order::ActiveModel = existing.into();
        active.order_status = Set(new_status);
        match new_status {
            OrderStatus::Processing => active.processing_date = Set(Some(now)),
            OrderStatus::Completed => active.completion_date = Set(Some(now)),
            OrderStatus::Delivered => active.delivery_date = Set(Some(now)),
            OrderStatus::New | OrderStatus::Cancelled => {}
        }
        let note = note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        if let Some(note) = &note {
            active.status_note = Set(Some(note.clone()));
        }
        active.updated_at = Set(Some(now));

        let updated = active.update(&txn).await.map_err(|e| {
            error!(error = %e, order_id = order_id, "failed to update order status");
            ServiceError::DatabaseError(e)
        })?;

        let mut details = format!(
            "{}: {} \u{2192} {}",
            order_number,
            old_status.label(),
            new_status.label()
        );
        if let Some(note) = &note {
            details.push_str(" (");
            details.push_str(note);
            details.push(')');
        }
        self.activity
            .record_in(
                &txn,
                NewActivity {
                    actor: Some(actor.user_id),
                    action: ActionKind::OrderStatusChange,
                    details,
                    meta: meta.clone(),
                },
            )
            .await;

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = order_id, "failed to commit status transition");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            order_id = order_id,
            old_status = %old_status,
            new_status = %new_status,
            "order status updated"
        );

        Ok(updated)
    }
}
