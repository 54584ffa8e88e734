//! Per-tenant AI usage enforcement. The check happens before any model call
//! and the increment only after a turn has produced a reply, so failed model
//! calls never consume quota.

use std::sync::Arc;

use cardesk_core::domain::tenant::{Tenant, TenantId};
use cardesk_db::repositories::{RepositoryError, TenantRepository};

pub struct QuotaGuard {
    tenants: Arc<dyn TenantRepository>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuotaDecision {
    Allowed,
    Exhausted,
}

impl QuotaGuard {
    pub fn new(tenants: Arc<dyn TenantRepository>) -> Self {
        Self { tenants }
    }

    pub fn check(&self, tenant: &Tenant) -> QuotaDecision {
        if tenant.has_ai_quota() {
            QuotaDecision::Allowed
        } else {
            QuotaDecision::Exhausted
        }
    }

    /// Atomic usage bump, delegated to the repository so concurrent turns
    /// for one tenant never lose increments.
    pub async fn commit(&self, tenant_id: &TenantId) -> Result<(), RepositoryError> {
        self.tenants.increment_ai_usage(tenant_id).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;

    use cardesk_core::domain::tenant::{SubscriptionTier, Tenant, TenantId};
    use cardesk_db::repositories::{InMemoryTenantRepository, TenantRepository};

    use super::{QuotaDecision, QuotaGuard};

    fn tenant(count: i64, limit: i64) -> Tenant {
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

    #[tokio::test]
    async fn check_rejects_at_the_limit() {
        let repo = Arc::new(InMemoryTenantRepository::new());
        let guard = QuotaGuard::new(repo);
        assert_eq!(guard.check(&tenant(49, 50)), QuotaDecision::Allowed);
        assert_eq!(guard.check(&tenant(50, 50)), QuotaDecision::Exhausted);
        assert_eq!(guard.check(&tenant(51, 50)), QuotaDecision::Exhausted);
    }

    #[tokio::test]
    async fn commit_increments_stored_usage() {
        let repo = Arc::new(InMemoryTenantRepository::new());
        repo.save(tenant(0, 50)).await.expect("save");
        let guard = QuotaGuard::new(Arc::clone(&repo) as Arc<dyn TenantRepository>);

        guard.commit(&TenantId("t-1".to_string())).await.expect("commit");
        let stored = repo
            .find_by_id(&TenantId("t-1".to_string()))
            .await
            .expect("find")
            .expect("present");
        assert_eq!(stored.ai_usage_count, 1);
    }
}
