//! Demo data for local development. `cardesk seed` writes one tenant with a
//! connected calendar and one AI-enabled profile so the chat endpoint works
//! out of the box.

use chrono::Utc;

use cardesk_core::domain::profile::{AiConfig, Profile, ProfileId};
use cardesk_core::domain::tenant::{
    CalendarIntegration, CalendarProviderKind, SubscriptionTier, Tenant, TenantId,
};

use crate::repositories::{
    ProfileRepository, RepositoryError, SqlProfileRepository, SqlTenantRepository,
    TenantRepository,
};
use crate::DbPool;

pub struct DemoDataset {
    pub tenant: Tenant,
    pub profile: Profile,
}

pub fn demo_dataset() -> DemoDataset {
    let tenant = Tenant {
        id: TenantId("demo-tenant".to_string()),
        name: "Demo Workspace".to_string(),
        email: "demo@cardesk.test".to_string(),
        tier: SubscriptionTier::Pro,
        ai_usage_limit: 500,
        ai_usage_count: 0,
        calendar_integrations: vec![CalendarIntegration {
            provider: CalendarProviderKind::Google,
            access_token: "demo-access-token".to_string(),
            refresh_token: None,
            expires_at: None,
        }],
        crm_connected: false,
        created_at: Utc::now(),
    };

    let profile = Profile {
        id: ProfileId("demo-profile".to_string()),
        tenant_id: tenant.id.clone(),
        display_name: "Alex Rivera".to_string(),
        title: "Founder".to_string(),
        company: "Demo Workspace".to_string(),
        timezone: "America/New_York".to_string(),
        ai_config: AiConfig {
            enabled: true,
            personality: "professional and friendly".to_string(),
            greeting: "Hi! I'm Alex's AI assistant. How can I help?".to_string(),
            qualification_questions: vec![
                "What brings you to Alex's card today?".to_string(),
                "What company are you with?".to_string(),
            ],
            auto_booking: true,
        },
        created_at: Utc::now(),
    };

    DemoDataset { tenant, profile }
}

/// Idempotent: re-running `seed` leaves an existing demo tenant's usage
/// counter alone (the tenant upsert never touches it).
pub async fn seed_demo_dataset(pool: &DbPool) -> Result<DemoDataset, RepositoryError> {
    let dataset = demo_dataset();

    let tenants = SqlTenantRepository::new(pool.clone());
    tenants.save(dataset.tenant.clone()).await?;

    let profiles = SqlProfileRepository::new(pool.clone());
    profiles.save(dataset.profile.clone()).await?;

    Ok(dataset)
}
