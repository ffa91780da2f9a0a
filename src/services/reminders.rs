use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use serde::Serialize;
use tracing::{error, info, instrument, warn};

use crate::auth::{AuthContext, RequestMeta};
use crate::db::DbPool;
use crate::entities::customer;
use crate::entities::notification_template::TemplateChannel;
use crate::errors::ServiceError;
use crate::notifications::{
    render_template, DispatchOutcome, NotificationDispatcher, NotificationTemplateService,
};
use crate::services::activity_log::{ActionKind, ActivityLogService, NewActivity};
use crate::services::customers::CustomerService;

#[derive(Debug, Clone)]
pub struct ReminderConfig {
    pub template_code: String,
    pub company_name: String,
    pub company_phone: String,
}

/// Outcome of one reminder or test-message dispatch.
#[derive(Debug, Serialize)]
pub struct DispatchReport {
    pub success: bool,
    pub message: String,
    /// Rendered message body, for preview display.
    pub preview: String,
}

fn format_currency(amount: Decimal) -> String {
    format!("{:.2} TL", amount)
}

/// Debt reminder workflow over the WhatsApp channel.
///
/// The dispatch attempt is always recorded in the activity log; the
/// customer's `last_debt_reminder` timestamp is only advanced when the
/// dispatcher reports success.
#[derive(Clone)]
pub struct ReminderService {
    db: Arc<DbPool>,
    activity: ActivityLogService,
    customers: CustomerService,
    templates: NotificationTemplateService,
    dispatcher: Arc<dyn NotificationDispatcher>,
    config: ReminderConfig,
}

impl ReminderService {
    pub fn new(
        db: Arc<DbPool>,
        activity: ActivityLogService,
        customers: CustomerService,
        templates: NotificationTemplateService,
        dispatcher: Arc<dyn NotificationDispatcher>,
        config: ReminderConfig,
    ) -> Self {
        Self {
            db,
            activity,
            customers,
            templates,
            dispatcher,
            config,
        }
    }

    #[instrument(skip(self, actor, meta), fields(customer_id = customer_id))]
    pub async fn send_debt_reminder(
        &self,
        customer_id: i64,
        actor: &AuthContext,
        meta: &RequestMeta,
    ) -> Result<DispatchReport, ServiceError> {
        actor.require_staff()?;

        let balance = self.customers.outstanding_balance(customer_id).await?;
        let phone = balance
            .customer
            .phone
            .clone()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| {
                ServiceError::ValidationError(format!(
                    "Customer {} has no phone number on record",
                    balance.customer.fullname
                ))
            })?;
        if balance.orders.is_empty() {
            return Err(ServiceError::ValidationError(format!(
                "Customer {} has no outstanding balance",
                balance.customer.fullname
            )));
        }

        let order_numbers = balance
            .orders
            .iter()
            .map(|o| o.order_number.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        let mut variables = HashMap::new();
        variables.insert(
            "customer_name".to_string(),
            balance.customer.fullname.clone(),
        );
        variables.insert("total_due".to_string(), format_currency(balance.total_due));
        variables.insert("order_numbers".to_string(), order_numbers);
        variables.insert(
            "order_count".to_string(),
            balance.orders.len().to_string(),
        );
        variables.insert("company_name".to_string(), self.config.company_name.clone());
        variables.insert(
            "company_phone".to_string(),
            self.config.company_phone.clone(),
        );

        let template = self
            .templates
            .get_active(&self.config.template_code, TemplateChannel::Whatsapp)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Reminder template '{}' is not configured for WhatsApp",
                    self.config.template_code
                ))
            })?;
        let preview = render_template(&template.template_content, &variables);

        let outcome = match self
            .dispatcher
            .send(
                TemplateChannel::Whatsapp,
                &self.config.template_code,
                &phone,
                &variables,
            )
            .await
        {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(error = %err, customer_id = customer_id, "reminder dispatch failed");
                DispatchOutcome {
                    success: false,
                    message: err.to_string(),
                }
            }
        };

        // The attempt is auditable either way; only success moves the
        // last-reminder marker.
        self.activity
            .record(NewActivity {
                actor: Some(actor.user_id),
                action: ActionKind::DebtReminderSent,
                details: format!(
                    "{}: reminder for {} orders, {} due ({})",
                    balance.customer.fullname,
                    balance.orders.len(),
                    format_currency(balance.total_due),
                    if outcome.success { "sent" } else { "failed" }
                ),
                meta: meta.clone(),
            })
            .await;

        if outcome.success {
            let mut active: customer::ActiveModel = balance.customer.into();
            active.last_debt_reminder = Set(Some(Utc::now()));
            active.update(&*self.db).await?;
            info!(customer_id = customer_id, "debt reminder sent");
        } else {
            warn!(
                customer_id = customer_id,
                message = %outcome.message,
                "debt reminder was not delivered"
            );
        }

        Ok(DispatchReport {
            success: outcome.success,
            message: outcome.message,
            preview,
        })
    }

    /// Renders a stored template against caller-supplied variables and
    /// dispatches it to a caller-supplied recipient. No reminder state is
    /// touched.
    #[instrument(skip(self, variables, actor, meta))]
    pub async fn send_test_message(
        &self,
        template_id: i64,
        recipient: &str,
        variables: HashMap<String, String>,
        actor: &AuthContext,
        meta: &RequestMeta,
    ) -> Result<DispatchReport, ServiceError> {
        actor.require_admin()?;

        let recipient = recipient.trim();
        if recipient.is_empty() {
            return Err(ServiceError::ValidationError(
                "recipient is required".to_string(),
            ));
        }

        let template = self.templates.get_template(template_id).await?;
        let preview = render_template(&template.template_content, &variables);

        let outcome = match self
            .dispatcher
            .send(
                template.channel,
                &template.template_code,
                recipient,
                &variables,
            )
            .await
        {
            Ok(outcome) => outcome,
            Err(err) => DispatchOutcome {
                success: false,
                message: err.to_string(),
            },
        };

        self.activity
            .record(NewActivity {
                actor: Some(actor.user_id),
                action: ActionKind::TestMessage,
                details: format!(
                    "{}/{}: test message to {} ({})",
                    template.channel,
                    template.template_code,
                    recipient,
                    if outcome.success { "sent" } else { "failed" }
                ),
                meta: meta.clone(),
            })
            .await;

        Ok(DispatchReport {
            success: outcome.success,
            message: outcome.message,
            preview,
        })
    }
}
