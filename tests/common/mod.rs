#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use tokio::sync::Mutex;

use alumpro_api::auth::{AuthContext, RequestMeta};
use alumpro_api::config::AppConfig;
use alumpro_api::db::{establish_connection_with_config, run_migrations, DbConfig, DbPool};
use alumpro_api::entities::notification_template::TemplateChannel;
use alumpro_api::entities::order::OrderStatus;
use alumpro_api::entities::user::{UserRole, UserStatus};
use alumpro_api::entities::{branch, customer, order, user};
use alumpro_api::errors::ServiceError;
use alumpro_api::notifications::{DispatchOutcome, NotificationDispatcher};
use alumpro_api::services::AppServices;

/// Dispatcher stub that records every send and reports a fixed outcome.
pub struct StubDispatcher {
    pub succeed: bool,
    pub sent: Mutex<Vec<(TemplateChannel, String, String)>>,
}

impl StubDispatcher {
    pub fn succeeding() -> Arc<Self> {
        Arc::new(Self {
            succeed: true,
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            succeed: false,
            sent: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl NotificationDispatcher for StubDispatcher {
    async fn send(
        &self,
        channel: TemplateChannel,
        template_code: &str,
        recipient: &str,
        _variables: &HashMap<String, String>,
    ) -> Result<DispatchOutcome, ServiceError> {
        self.sent
            .lock()
            .await
            .push((channel, template_code.to_string(), recipient.to_string()));
        Ok(DispatchOutcome {
            success: self.succeed,
            message: if self.succeed {
                "delivered".to_string()
            } else {
                "gateway unavailable".to_string()
            },
        })
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        environment: "test".to_string(),
        port: 8080,
        database_url: "sqlite::memory:".to_string(),
        db_max_connections: 1,
        db_min_connections: 1,
        db_connect_timeout_secs: 5,
        db_idle_timeout_secs: 60,
        db_acquire_timeout_secs: 5,
        auto_migrate: true,
        log_level: "info".to_string(),
        log_json: false,
        default_page_size: 20,
        max_page_size: 100,
        reminder_template_code: "debt_reminder".to_string(),
        company_name: "AlumPro".to_string(),
        company_phone: "+90 555 000 0000".to_string(),
        template_mirror_dir: None,
        bootstrap_admin_token: None,
    }
}

pub struct TestApp {
    pub db: Arc<DbPool>,
    pub services: AppServices,
    pub config: AppConfig,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_parts(test_config(), StubDispatcher::succeeding()).await
    }

    pub async fn with_dispatcher(dispatcher: Arc<dyn NotificationDispatcher>) -> Self {
        Self::with_parts(test_config(), dispatcher).await
    }

    pub async fn with_parts(
        config: AppConfig,
        dispatcher: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        // One pooled connection keeps the in-memory database alive and
        // shared for the whole test.
        let db_cfg = DbConfig {
            url: config.database_url.clone(),
            max_connections: 1,
            min_connections: 1,
            ..Default::default()
        };
        let db = establish_connection_with_config(&db_cfg)
            .await
            .expect("test database connection");
        run_migrations(&db).await.expect("migrations");
        let db = Arc::new(db);
        let services = AppServices::new(db.clone(), &config, dispatcher);

        Self {
            db,
            services,
            config,
        }
    }
}

pub fn admin_ctx(user_id: i64) -> AuthContext {
    AuthContext {
        user_id,
        role: UserRole::Admin,
        branch_id: None,
    }
}

pub fn seller_ctx(user_id: i64, branch_id: i64) -> AuthContext {
    AuthContext {
        user_id,
        role: UserRole::Seller,
        branch_id: Some(branch_id),
    }
}

pub fn meta() -> RequestMeta {
    RequestMeta {
        ip_address: Some("203.0.113.7".to_string()),
        user_agent: Some("integration-test".to_string()),
    }
}

pub async fn seed_branch(db: &DbPool, name: &str) -> branch::Model {
    branch::ActiveModel {
        name: Set(name.to_string()),
        status: Set(branch::BranchStatus::Active),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed branch")
}

pub async fn seed_user(
    db: &DbPool,
    email: &str,
    role: UserRole,
    branch_id: Option<i64>,
) -> user::Model {
    user::ActiveModel {
        fullname: Set(format!("Test {}", email)),
        email: Set(email.to_string()),
        username: Set(email.split('@').next().unwrap().to_string()),
        password_hash: Set("$argon2id$test$hash".to_string()),
        role: Set(role),
        branch_id: Set(branch_id),
        status: Set(UserStatus::Active),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed user")
}

pub async fn seed_customer(db: &DbPool, fullname: &str, phone: Option<&str>) -> customer::Model {
    customer::ActiveModel {
        fullname: Set(fullname.to_string()),
        phone: Set(phone.map(str::to_string)),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed customer")
}

pub struct SeedOrder {
    pub order_number: String,
    pub customer_id: i64,
    pub seller_id: i64,
    pub branch_id: i64,
    pub status: OrderStatus,
    pub order_date: DateTime<Utc>,
    pub total_amount: Decimal,
    pub advance_payment: Decimal,
}

impl SeedOrder {
    pub fn new(order_number: &str, customer_id: i64, seller_id: i64, branch_id: i64) -> Self {
        Self {
            order_number: order_number.to_string(),
            customer_id,
            seller_id,
            branch_id,
            status: OrderStatus::New,
            order_date: Utc::now(),
            total_amount: Decimal::ZERO,
            advance_payment: Decimal::ZERO,
        }
    }

    pub fn status(mut self, status: OrderStatus) -> Self {
        self.status = status;
        self
    }

    pub fn order_date(mut self, date: DateTime<Utc>) -> Self {
        self.order_date = date;
        self
    }

    pub fn amounts(mut self, total: Decimal, advance: Decimal) -> Self {
        self.total_amount = total;
        self.advance_payment = advance;
        self
    }
}

pub async fn seed_order(db: &DbPool, seed: SeedOrder) -> order::Model {
    order::ActiveModel {
        order_number: Set(seed.order_number.clone()),
        customer_id: Set(seed.customer_id),
        seller_id: Set(seed.seller_id),
        branch_id: Set(seed.branch_id),
        order_status: Set(seed.status),
        order_date: Set(seed.order_date),
        total_amount: Set(seed.total_amount),
        advance_payment: Set(seed.advance_payment),
        remaining_amount: Set(seed.total_amount - seed.advance_payment),
        assembly_fee: Set(Decimal::ZERO),
        barcode: Set(format!("bc-{}", seed.order_number)),
        created_at: Set(seed.order_date),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed order")
}
