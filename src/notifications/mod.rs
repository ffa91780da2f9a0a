//! Outbound notification seam.
//!
//! The back office only selects a template, assembles its variables and
//! records the attempt; actual delivery (WhatsApp session, SMTP, SMS
//! gateway) lives behind [`NotificationDispatcher`] as an external
//! collaborator.

pub mod templates;

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use crate::entities::notification_template::TemplateChannel;
use crate::errors::ServiceError;

pub use templates::{render_template, NotificationTemplateService, SaveTemplateRequest};

/// Result reported by a dispatcher for one outbound message.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchOutcome {
    pub success: bool,
    pub message: String,
}

#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn send(
        &self,
        channel: TemplateChannel,
        template_code: &str,
        recipient: &str,
        variables: &HashMap<String, String>,
    ) -> Result<DispatchOutcome, ServiceError>;
}

/// Dispatcher used when no transport is configured: logs the message and
/// reports success so the surrounding workflow stays exercisable.
pub struct LoggingDispatcher;

#[async_trait]
impl NotificationDispatcher for LoggingDispatcher {
    async fn send(
        &self,
        channel: TemplateChannel,
        template_code: &str,
        recipient: &str,
        variables: &HashMap<String, String>,
    ) -> Result<DispatchOutcome, ServiceError> {
        info!(
            channel = %channel,
            template_code = template_code,
            recipient = recipient,
            variable_count = variables.len(),
            "outbound notification (logging dispatcher)"
        );
        Ok(DispatchOutcome {
            success: true,
            message: "logged".to_string(),
        })
    }
}
