use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoSimpleExpr, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use tracing::{info, instrument};
use validator::Validate;

use crate::auth::{AuthContext, RequestMeta};
use crate::db::filter::FilterBuilder;
use crate::db::paginate::{self, Page, PageRequest};
use crate::db::DbPool;
use crate::entities::{customer, order};
use crate::errors::ServiceError;
use crate::services::activity_log::{ActionKind, ActivityLogService, NewActivity};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCustomerRequest {
    #[validate(length(min = 1, max = 120, message = "Full name is required"))]
    pub fullname: String,
    #[validate(email(message = "Email must be a valid address"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub company: Option<String>,
    /// Optional link to a portal account.
    pub user_id: Option<i64>,
}

/// Filters accepted by the customer list screen.
#[derive(Debug, Clone, Default)]
pub struct CustomerListFilter {
    pub search: Option<String>,
}

/// A customer's open balance: the orders still carrying a remainder.
#[derive(Debug)]
pub struct OutstandingBalance {
    pub customer: customer::Model,
    pub orders: Vec<order::Model>,
    pub total_due: Decimal,
}

/// Service for managing customer records.
#[derive(Clone)]
pub struct CustomerService {
    db: Arc<DbPool>,
    activity: ActivityLogService,
}

impl CustomerService {
    pub fn new(db: Arc<DbPool>, activity: ActivityLogService) -> Self {
        Self { db, activity }
    }

    /// Creates a customer record, with or without a linked portal account.
    #[instrument(skip(self, request, actor, meta), fields(fullname = %request.fullname))]
    pub async fn create_customer(
        &self,
        request: CreateCustomerRequest,
        actor: &AuthContext,
        meta: &RequestMeta,
    ) -> Result<customer::Model, ServiceError> {
        actor.require_staff()?;
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let created = customer::ActiveModel {
            user_id: Set(request.user_id.filter(|id| *id > 0)),
            fullname: Set(request.fullname),
            email: Set(request.email),
            phone: Set(request.phone),
            address: Set(request.address),
            company: Set(request.company),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        self.activity
            .record(NewActivity {
                actor: Some(actor.user_id),
                action: ActionKind::CustomerCreated,
                details: format!("{}: customer record created", created.fullname),
                meta: meta.clone(),
            })
            .await;

        info!(customer_id = created.id, "customer created");
        Ok(created)
    }

    /// Paginated customer listing with free-text search over name, email,
    /// phone and company.
    #[instrument(skip(self, actor))]
    pub async fn list_customers(
        &self,
        filter: CustomerListFilter,
        page: PageRequest,
        actor: &AuthContext,
    ) -> Result<Page<customer::Model>, ServiceError> {
        actor.require_staff()?;

        let condition = FilterBuilder::new()
            .search(
                filter.search.as_deref(),
                [
                    customer::Column::Fullname.into_simple_expr(),
                    customer::Column::Email.into_simple_expr(),
                    customer::Column::Phone.into_simple_expr(),
                    customer::Column::Company.into_simple_expr(),
                ],
            )
            .build();

        let query = customer::Entity::find()
            .filter(condition)
            .order_by_desc(customer::Column::CreatedAt);

        Ok(paginate::fetch_page(&*self.db, query, page).await?)
    }

    pub async fn get_customer(&self, customer_id: i64) -> Result<customer::Model, ServiceError> {
        customer::Entity::find_by_id(customer_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Customer {} not found", customer_id)))
    }

    /// Orders of this customer that still carry an unpaid remainder, oldest
    /// first, with their sum.
    #[instrument(skip(self))]
    pub async fn outstanding_balance(
        &self,
        customer_id: i64,
    ) -> Result<OutstandingBalance, ServiceError> {
        let customer = self.get_customer(customer_id).await?;

        let orders = order::Entity::find()
            .filter(order::Column::CustomerId.eq(customer_id))
            .filter(order::Column::RemainingAmount.gt(Decimal::ZERO))
            .order_by_asc(order::Column::OrderDate)
            .all(&*self.db)
            .await?;

        let total_due = orders.iter().map(|o| o.remaining_amount).sum();

        Ok(OutstandingBalance {
            customer,
            orders,
            total_due,
        })
    }
}
