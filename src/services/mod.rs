// Core services
pub mod activity_log;
pub mod customers;
pub mod order_status;
pub mod orders;
pub mod reminders;
pub mod users;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::notifications::{NotificationDispatcher, NotificationTemplateService};

/// Aggregate of the application services wired once at startup and shared
/// by every handler.
#[derive(Clone)]
pub struct AppServices {
    pub activity: activity_log::ActivityLogService,
    pub orders: orders::OrderService,
    pub order_status: order_status::OrderStatusService,
    pub users: users::UserService,
    pub customers: customers::CustomerService,
    pub templates: NotificationTemplateService,
    pub reminders: reminders::ReminderService,
}

impl AppServices {
    pub fn new(
        db: Arc<DbPool>,
        config: &AppConfig,
        dispatcher: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        let activity = activity_log::ActivityLogService::new(db.clone());
        let customers = customers::CustomerService::new(db.clone(), activity.clone());
        let templates = NotificationTemplateService::new(
            db.clone(),
            activity.clone(),
            config.template_mirror_dir.clone().map(Into::into),
        );
        let reminders = reminders::ReminderService::new(
            db.clone(),
            activity.clone(),
            customers.clone(),
            templates.clone(),
            dispatcher,
            reminders::ReminderConfig {
                template_code: config.reminder_template_code.clone(),
                company_name: config.company_name.clone(),
                company_phone: config.company_phone.clone(),
            },
        );

        Self {
            orders: orders::OrderService::new(db.clone(), activity.clone()),
            order_status: order_status::OrderStatusService::new(db.clone(), activity.clone()),
            users: users::UserService::new(db, activity.clone()),
            customers,
            templates,
            reminders,
            activity,
        }
    }
}
