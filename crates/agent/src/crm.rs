//! Fire-and-forget lead-captured notifications. The chat path spawns the
//! notification and never awaits it; CRM latency or outages cannot delay a
//! reply.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use cardesk_core::domain::lead::Lead;

#[async_trait]
pub trait CrmNotifier: Send + Sync {
    async fn lead_captured(&self, lead: &Lead) -> Result<(), String>;
}

pub struct LoggingCrmNotifier;

#[async_trait]
impl CrmNotifier for LoggingCrmNotifier {
    async fn lead_captured(&self, lead: &Lead) -> Result<(), String> {
        info!(
            event_name = "secretary.crm.lead_captured",
            lead_id = %lead.id.0,
            tenant_id = %lead.tenant_id.0,
            "lead captured"
        );
        Ok(())
    }
}

/// Detached delivery; the JoinHandle is dropped on purpose.
pub fn notify_lead_captured(notifier: Arc<dyn CrmNotifier>, lead: Lead) {
    tokio::spawn(async move {
        if let Err(error) = notifier.lead_captured(&lead).await {
            warn!(
                event_name = "secretary.crm.notify_failed",
                lead_id = %lead.id.0,
                error = error,
                "lead-captured notification failed"
            );
        }
    });
}
