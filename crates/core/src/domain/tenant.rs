use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTier {
    Free,
    Pro,
    Enterprise,
}

impl SubscriptionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Pro => "pro",
            Self::Enterprise => "enterprise",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarProviderKind {
    Google,
    Outlook,
    Odoo,
}

impl CalendarProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Outlook => "outlook",
            Self::Odoo => "odoo",
        }
    }
}

/// One connected calendar source. Credentials are read-only from the
/// orchestrator's perspective; token refresh is owned by the integration
/// endpoints, not by the chat path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarIntegration {
    pub provider: CalendarProviderKind,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Isolation boundary: unit of quota and calendar-credential ownership.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    pub email: String,
    pub tier: SubscriptionTier,
    pub ai_usage_limit: i64,
    pub ai_usage_count: i64,
    pub calendar_integrations: Vec<CalendarIntegration>,
    pub crm_connected: bool,
    pub created_at: DateTime<Utc>,
}

impl Tenant {
    /// Soft cap check. Must run before the quota-consuming model call;
    /// the counter itself is only advanced after a successful turn.
    pub fn has_ai_quota(&self) -> bool {
        self.ai_usage_count < self.ai_usage_limit
    }

    /// The first configured integration is the active booking provider.
    pub fn active_calendar_integration(&self) -> Option<&CalendarIntegration> {
        self.calendar_integrations.first()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{
        CalendarIntegration, CalendarProviderKind, SubscriptionTier, Tenant, TenantId,
    };

    fn tenant_fixture(count: i64, limit: i64) -> Tenant {
        Tenant {
            id: TenantId("t-1".to_string()),
            name: "Acme".to_string(),
            email: "owner@acme.test".to_string(),
            tier: SubscriptionTier::Free,
            ai_usage_limit: limit,
            ai_usage_count: count,
            calendar_integrations: Vec::new(),
            crm_connected: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn quota_available_below_limit() {
        assert!(tenant_fixture(99, 100).has_ai_quota());
    }

    #[test]
    fn quota_exhausted_at_limit() {
        assert!(!tenant_fixture(100, 100).has_ai_quota());
        assert!(!tenant_fixture(101, 100).has_ai_quota());
    }

    #[test]
    fn first_integration_is_active() {
        let mut tenant = tenant_fixture(0, 100);
        assert!(tenant.active_calendar_integration().is_none());

        tenant.calendar_integrations = vec![
            CalendarIntegration {
                provider: CalendarProviderKind::Google,
                access_token: "g-token".to_string(),
                refresh_token: None,
                expires_at: None,
            },
            CalendarIntegration {
                provider: CalendarProviderKind::Outlook,
                access_token: "o-token".to_string(),
                refresh_token: None,
                expires_at: None,
            },
        ];

        let active = tenant.active_calendar_integration().expect("active integration");
        assert_eq!(active.provider, CalendarProviderKind::Google);
    }
}
