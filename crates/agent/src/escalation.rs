//! Best-effort notification to the profile owner when a conversation is
//! handed off. Delivery failures are logged and never fail the turn.

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use cardesk_core::domain::conversation::LeadInfo;
use cardesk_core::domain::profile::Profile;

#[derive(Debug, Error)]
#[error("escalation notification failed: {0}")]
pub struct NotifyError(pub String);

#[async_trait]
pub trait EscalationNotifier: Send + Sync {
    async fn notify(
        &self,
        profile: &Profile,
        reason: &str,
        lead_info: &LeadInfo,
    ) -> Result<(), NotifyError>;
}

/// Default notifier: records the handoff in the log stream for the owner's
/// dashboard to pick up. Email/Slack delivery plugs in behind the trait.
pub struct LoggingEscalationNotifier;

#[async_trait]
impl EscalationNotifier for LoggingEscalationNotifier {
    async fn notify(
        &self,
        profile: &Profile,
        reason: &str,
        lead_info: &LeadInfo,
    ) -> Result<(), NotifyError> {
        info!(
            event_name = "secretary.escalation.requested",
            profile_id = %profile.id.0,
            tenant_id = %profile.tenant_id.0,
            reason = reason,
            visitor_email = lead_info.email.as_deref().unwrap_or("unknown"),
            "conversation escalated to profile owner"
        );
        Ok(())
    }
}
