use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoSimpleExpr, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use tracing::{instrument, warn};
use validator::Validate;

use crate::auth::{AuthContext, RequestMeta};
use crate::db::filter::FilterBuilder;
use crate::db::paginate::{self, Page, PageRequest};
use crate::db::DbPool;
use crate::entities::notification_template::{self, TemplateChannel, TemplateStatus};
use crate::errors::ServiceError;
use crate::services::activity_log::{ActionKind, ActivityLogService, NewActivity};

/// Substitutes `{{var}}` placeholders. Placeholders without a matching
/// variable are left verbatim.
pub fn render_template(content: &str, variables: &HashMap<String, String>) -> String {
    let mut rendered = content.to_string();
    for (name, value) in variables {
        rendered = rendered.replace(&format!("{{{{{}}}}}", name), value);
    }
    rendered
}

#[derive(Debug, Deserialize, Validate)]
pub struct SaveTemplateRequest {
    #[validate(length(min = 1, max = 60, message = "Template code is required"))]
    pub template_code: String,
    #[validate(length(min = 1, max = 120, message = "Template name is required"))]
    pub template_name: String,
    pub template_subject: Option<String>,
    #[validate(length(min = 1, message = "Template content is required"))]
    pub template_content: String,
    pub channel: TemplateChannel,
    pub status: TemplateStatus,
}

/// Filters accepted by the template list screen.
#[derive(Debug, Clone, Default)]
pub struct TemplateListFilter {
    pub channel: Option<TemplateChannel>,
    pub status: Option<TemplateStatus>,
    pub search: Option<String>,
}

/// Manages notification templates.
///
/// The database row is the source of truth; when a mirror directory is
/// configured (for transports that read template files off disk) the file is
/// rewritten on every save and removed on delete. Mirror IO failures are
/// logged and never fail the save, since the cache is regenerable.
#[derive(Clone)]
pub struct NotificationTemplateService {
    db: Arc<DbPool>,
    activity: ActivityLogService,
    mirror_dir: Option<PathBuf>,
}

impl NotificationTemplateService {
    pub fn new(
        db: Arc<DbPool>,
        activity: ActivityLogService,
        mirror_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            db,
            activity,
            mirror_dir,
        }
    }

    /// Inserts or updates the template identified by (code, channel).
    #[instrument(skip(self, request, actor, meta), fields(code = %request.template_code, channel = %request.channel))]
    pub async fn save_template(
        &self,
        request: SaveTemplateRequest,
        actor: &AuthContext,
        meta: &RequestMeta,
    ) -> Result<notification_template::Model, ServiceError> {
        actor.require_admin()?;
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let existing = notification_template::Entity::find()
            .filter(notification_template::Column::TemplateCode.eq(request.template_code.clone()))
            .filter(notification_template::Column::Channel.eq(request.channel))
            .one(&*self.db)
            .await?;

        let now = Utc::now();
        let saved = match existing {
            Some(template) => {
                let mut active: notification_template::ActiveModel = template.into();
                active.template_name = Set(request.template_name);
                active.template_subject = Set(request.template_subject);
                active.template_content = Set(request.template_content);
                active.status = Set(request.status);
                active.updated_at = Set(Some(now));
                active.update(&*self.db).await?
            }
            None => {
                notification_template::ActiveModel {
                    template_code: Set(request.template_code),
                    template_name: Set(request.template_name),
                    template_subject: Set(request.template_subject),
                    template_content: Set(request.template_content),
                    channel: Set(request.channel),
                    status: Set(request.status),
                    created_at: Set(now),
                    ..Default::default()
                }
                .insert(&*self.db)
                .await?
            }
        };

        self.write_mirror(&saved).await;

        self.activity
            .record(NewActivity {
                actor: Some(actor.user_id),
                action: ActionKind::TemplateSaved,
                details: format!("{}/{}: template saved", saved.channel, saved.template_code),
                meta: meta.clone(),
            })
            .await;

        Ok(saved)
    }

    /// Deletes a template row and its mirrored file.
    #[instrument(skip(self, actor, meta))]
    pub async fn delete_template(
        &self,
        template_id: i64,
        actor: &AuthContext,
        meta: &RequestMeta,
    ) -> Result<(), ServiceError> {
        actor.require_admin()?;

        let template = notification_template::Entity::find_by_id(template_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Template {} not found", template_id))
            })?;

        notification_template::Entity::delete_by_id(template_id)
            .exec(&*self.db)
            .await?;

        self.remove_mirror(&template).await;

        self.activity
            .record(NewActivity {
                actor: Some(actor.user_id),
                action: ActionKind::TemplateDeleted,
                details: format!(
                    "{}/{}: template deleted",
                    template.channel, template.template_code
                ),
                meta: meta.clone(),
            })
            .await;

        Ok(())
    }

    pub async fn get_template(
        &self,
        template_id: i64,
    ) -> Result<notification_template::Model, ServiceError> {
        notification_template::Entity::find_by_id(template_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Template {} not found", template_id)))
    }

    /// Active template for (code, channel), if one exists.
    pub async fn get_active(
        &self,
        template_code: &str,
        channel: TemplateChannel,
    ) -> Result<Option<notification_template::Model>, ServiceError> {
        Ok(notification_template::Entity::find()
            .filter(notification_template::Column::TemplateCode.eq(template_code))
            .filter(notification_template::Column::Channel.eq(channel))
            .filter(notification_template::Column::Status.eq(TemplateStatus::Active))
            .one(&*self.db)
            .await?)
    }

    /// Paginated template listing.
    #[instrument(skip(self, actor))]
    pub async fn list_templates(
        &self,
        filter: TemplateListFilter,
        page: PageRequest,
        actor: &AuthContext,
    ) -> Result<Page<notification_template::Model>, ServiceError> {
        actor.require_admin()?;

        let condition = FilterBuilder::new()
            .equals(notification_template::Column::Channel, filter.channel)
            .equals(notification_template::Column::Status, filter.status)
            .search(
                filter.search.as_deref(),
                [
                    notification_template::Column::TemplateCode.into_simple_expr(),
                    notification_template::Column::TemplateName.into_simple_expr(),
                    notification_template::Column::TemplateContent.into_simple_expr(),
                ],
            )
            .build();

        let query = notification_template::Entity::find()
            .filter(condition)
            .order_by_asc(notification_template::Column::TemplateCode);

        Ok(paginate::fetch_page(&*self.db, query, page).await?)
    }

    fn mirror_path(&self, template: &notification_template::Model) -> Option<PathBuf> {
        let dir = self.mirror_dir.as_ref()?;
        let code: String = template
            .template_code
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        Some(dir.join(format!("{}_{}.txt", template.channel, code)))
    }

    async fn write_mirror(&self, template: &notification_template::Model) {
        let Some(path) = self.mirror_path(template) else {
            return;
        };
        if let Some(parent) = path.parent() {
            if let Err(err) = tokio::fs::create_dir_all(parent).await {
                warn!(error = %err, path = %path.display(), "failed to create template mirror directory");
                return;
            }
        }
        if let Err(err) = tokio::fs::write(&path, &template.template_content).await {
            warn!(error = %err, path = %path.display(), "failed to write template mirror file");
        }
    }

    async fn remove_mirror(&self, template: &notification_template::Model) {
        let Some(path) = self.mirror_path(template) else {
            return;
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                warn!(error = %err, path = %path.display(), "failed to remove template mirror file");
            }
        }
    }
}
