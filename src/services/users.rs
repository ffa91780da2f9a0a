use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHasher,
};
use chrono::{NaiveDate, Utc};
use rand::Rng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoSimpleExpr, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::Deserialize;
use tracing::{error, info, instrument};
use validator::Validate;

use crate::auth::{AuthContext, RequestMeta};
use crate::db::filter::{DateRange, FilterBuilder};
use crate::db::paginate::{self, Page, PageRequest};
use crate::db::DbPool;
use crate::entities::{
    customer,
    user::{self, UserRole, UserStatus},
};
use crate::errors::ServiceError;
use crate::services::activity_log::{ActionKind, ActivityLogService, NewActivity};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 120, message = "Full name is required"))]
    pub fullname: String,
    #[validate(email(message = "Email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    pub role: UserRole,
    pub branch_id: Option<i64>,
    pub phone: Option<String>,
}

/// Filters accepted by the user list screen.
#[derive(Debug, Clone, Default)]
pub struct UserListFilter {
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
    pub branch_id: Option<i64>,
    pub date_start: Option<NaiveDate>,
    pub date_end: Option<NaiveDate>,
    pub search: Option<String>,
}

fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::HashError(e.to_string()))
}

fn generate_password() -> String {
    rand::thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(12)
        .map(char::from)
        .collect()
}

/// Derives the login name from the mailbox part of the email.
fn username_from_email(email: &str) -> String {
    email
        .split('@')
        .next()
        .unwrap_or(email)
        .to_ascii_lowercase()
}

/// Service for managing back-office accounts.
#[derive(Clone)]
pub struct UserService {
    db: Arc<DbPool>,
    activity: ActivityLogService,
}

impl UserService {
    pub fn new(db: Arc<DbPool>, activity: ActivityLogService) -> Self {
        Self { db, activity }
    }

    /// Creates an account; a `customer` role also creates the linked
    /// customer row in the same transaction.
    #[instrument(skip(self, request, actor, meta), fields(email = %request.email, role = %request.role))]
    pub async fn create_user(
        &self,
        request: CreateUserRequest,
        actor: &AuthContext,
        meta: &RequestMeta,
    ) -> Result<user::Model, ServiceError> {
        actor.require_admin()?;
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let branch_id = request.branch_id.filter(|id| *id > 0);
        if request.role.requires_branch() && branch_id.is_none() {
            return Err(ServiceError::ValidationError(format!(
                "branch_id is required for role {}",
                request.role
            )));
        }
        let phone = request
            .phone
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string);
        if request.role.requires_phone() && phone.is_none() {
            return Err(ServiceError::ValidationError(
                "phone is required for customer accounts".to_string(),
            ));
        }

        let now = Utc::now();
        let txn = self.db.begin().await.map_err(|e| {
            error!(error = %e, "failed to start user creation transaction");
            ServiceError::DatabaseError(e)
        })?;

        let created = user::ActiveModel {
            fullname: Set(request.fullname.clone()),
            email: Set(request.email.clone()),
            username: Set(username_from_email(&request.email)),
            password_hash: Set(hash_password(&request.password)?),
            role: Set(request.role),
            branch_id: Set(branch_id),
            status: Set(UserStatus::Active),
            phone: Set(phone.clone()),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            error!(error = %e, email = %request.email, "failed to insert user");
            ServiceError::DatabaseError(e)
        })?;

        if created.role == UserRole::Customer {
            customer::ActiveModel {
                user_id: Set(Some(created.id)),
                fullname: Set(created.fullname.clone()),
                email: Set(Some(created.email.clone())),
                phone: Set(phone),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }

        self.activity
            .record_in(
                &txn,
                NewActivity {
                    actor: Some(actor.user_id),
                    action: ActionKind::UserCreated,
                    details: format!("{}: created with role {}", created.username, created.role),
                    meta: meta.clone(),
                },
            )
            .await;

        txn.commit().await.map_err(ServiceError::DatabaseError)?;
        info!(user_id = created.id, "user created");
        Ok(created)
    }

    /// Paginated, filtered account listing.
    #[instrument(skip(self, actor))]
    pub async fn list_users(
        &self,
        filter: UserListFilter,
        page: PageRequest,
        actor: &AuthContext,
    ) -> Result<Page<user::Model>, ServiceError> {
        actor.require_admin()?;

        let mut builder = FilterBuilder::new()
            .equals(user::Column::Role, filter.role)
            .equals(user::Column::Status, filter.status)
            .foreign_key(user::Column::BranchId, filter.branch_id)
            .search(
                filter.search.as_deref(),
                [
                    user::Column::Fullname.into_simple_expr(),
                    user::Column::Email.into_simple_expr(),
                    user::Column::Username.into_simple_expr(),
                    user::Column::Phone.into_simple_expr(),
                ],
            );
        if filter.date_start.is_some() || filter.date_end.is_some() {
            let range =
                DateRange::resolve(filter.date_start, filter.date_end, Utc::now().date_naive());
            builder = builder.date_range(user::Column::CreatedAt, &range);
        }

        let query = user::Entity::find()
            .filter(builder.build())
            .order_by_desc(user::Column::CreatedAt);

        Ok(paginate::fetch_page(&*self.db, query, page).await?)
    }

    /// Changes an account status. Admins cannot change their own account
    /// through this path.
    #[instrument(skip(self, actor, meta))]
    pub async fn set_status(
        &self,
        target_id: i64,
        new_status: UserStatus,
        actor: &AuthContext,
        meta: &RequestMeta,
    ) -> Result<user::Model, ServiceError> {
        actor.require_admin()?;
        if actor.user_id == target_id {
            return Err(ServiceError::Conflict(
                "You cannot change your own account status".to_string(),
            ));
        }

        let txn = self.db.begin().await.map_err(ServiceError::DatabaseError)?;
        let target = user::Entity::find_by_id(target_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", target_id)))?;

        let old_status = target.status;
        let username = target.username.clone();
        let mut active: user::ActiveModel = target.into();
        active.status = Set(new_status);
        let updated = active.update(&txn).await?;

        self.activity
            .record_in(
                &txn,
                NewActivity {
                    actor: Some(actor.user_id),
                    action: ActionKind::UserStatusChange,
                    details: format!("{}: {} \u{2192} {}", username, old_status, new_status),
                    meta: meta.clone(),
                },
            )
            .await;

        txn.commit().await.map_err(ServiceError::DatabaseError)?;
        Ok(updated)
    }

    /// Resets an account password to a generated one and returns it for
    /// one-time display. Admins cannot reset their own password here.
    #[instrument(skip(self, actor, meta))]
    pub async fn reset_password(
        &self,
        target_id: i64,
        actor: &AuthContext,
        meta: &RequestMeta,
    ) -> Result<String, ServiceError> {
        actor.require_admin()?;
        if actor.user_id == target_id {
            return Err(ServiceError::Conflict(
                "You cannot reset your own password through the admin panel".to_string(),
            ));
        }

        let txn = self.db.begin().await.map_err(ServiceError::DatabaseError)?;
        let target = user::Entity::find_by_id(target_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", target_id)))?;

        let username = target.username.clone();
        let new_password = generate_password();
        let mut active: user::ActiveModel = target.into();
        active.password_hash = Set(hash_password(&new_password)?);
        active.update(&txn).await?;

        self.activity
            .record_in(
                &txn,
                NewActivity {
                    actor: Some(actor.user_id),
                    action: ActionKind::PasswordReset,
                    details: format!("{}: password reset by admin", username),
                    meta: meta.clone(),
                },
            )
            .await;

        txn.commit().await.map_err(ServiceError::DatabaseError)?;
        Ok(new_password)
    }

    /// Changes an account role. The customer link is only touched when the
    /// caller opts into `sync_link`: role changes never silently create or
    /// destroy the linked customer row.
    #[instrument(skip(self, actor, meta))]
    pub async fn change_role(
        &self,
        target_id: i64,
        new_role: UserRole,
        sync_link: bool,
        actor: &AuthContext,
        meta: &RequestMeta,
    ) -> Result<user::Model, ServiceError> {
        actor.require_admin()?;

        let txn = self.db.begin().await.map_err(ServiceError::DatabaseError)?;
        let target = user::Entity::find_by_id(target_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", target_id)))?;

        if new_role.requires_branch() && target.branch_id.is_none() {
            return Err(ServiceError::ValidationError(format!(
                "role {} requires the account to be assigned to a branch",
                new_role
            )));
        }

        let old_role = target.role;
        let username = target.username.clone();
        let fullname = target.fullname.clone();
        let email = target.email.clone();
        let phone = target.phone.clone();
        let mut active: user::ActiveModel = target.into();
        active.role = Set(new_role);
        let updated = active.update(&txn).await?;

        if sync_link {
            let linked = customer::Entity::find()
                .filter(customer::Column::UserId.eq(target_id))
                .one(&txn)
                .await?;
            match (new_role == UserRole::Customer, linked) {
                (true, None) => {
                    customer::ActiveModel {
                        user_id: Set(Some(target_id)),
                        fullname: Set(fullname),
                        email: Set(Some(email)),
                        phone: Set(phone),
                        created_at: Set(Utc::now()),
                        ..Default::default()
                    }
                    .insert(&txn)
                    .await?;
                }
                (false, Some(customer)) => {
                    let mut link: customer::ActiveModel = customer.into();
                    link.user_id = Set(None);
                    link.update(&txn).await?;
                }
                _ => {}
            }
        }

        self.activity
            .record_in(
                &txn,
                NewActivity {
                    actor: Some(actor.user_id),
                    action: ActionKind::UserRoleChange,
                    details: format!(
                        "{}: {} \u{2192} {}{}",
                        username,
                        old_role,
                        new_role,
                        if sync_link { " (customer link synced)" } else { "" }
                    ),
                    meta: meta.clone(),
                },
            )
            .await;

        txn.commit().await.map_err(ServiceError::DatabaseError)?;
        Ok(updated)
    }
}
