//! HashMap-backed repositories for tests and single-process demos. Same
//! contracts as the SQL implementations, including the atomic usage bump.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use cardesk_core::domain::conversation::{Conversation, ConversationId};
use cardesk_core::domain::lead::{Lead, LeadId};
use cardesk_core::domain::meeting::{Meeting, MeetingId};
use cardesk_core::domain::profile::{Profile, ProfileId};
use cardesk_core::domain::tenant::{Tenant, TenantId};

use super::{
    ConversationRepository, LeadRepository, MeetingRepository, ProfileRepository,
    RepositoryError, TenantRepository,
};

#[derive(Default)]
pub struct InMemoryTenantRepository {
    tenants: RwLock<HashMap<TenantId, Tenant>>,
}

impl InMemoryTenantRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TenantRepository for InMemoryTenantRepository {
    async fn find_by_id(&self, id: &TenantId) -> Result<Option<Tenant>, RepositoryError> {
        Ok(self.tenants.read().await.get(id).cloned())
    }

    async fn save(&self, tenant: Tenant) -> Result<(), RepositoryError> {
        let mut tenants = self.tenants.write().await;
        // Mirror the SQL upsert: a save never clobbers a concurrently bumped
        // usage counter.
        let mut tenant = tenant;
        if let Some(existing) = tenants.get(&tenant.id) {
            tenant.ai_usage_count = existing.ai_usage_count;
        }
        tenants.insert(tenant.id.clone(), tenant);
        Ok(())
    }

    async fn increment_ai_usage(&self, id: &TenantId) -> Result<(), RepositoryError> {
        let mut tenants = self.tenants.write().await;
        match tenants.get_mut(id) {
            Some(tenant) => {
                tenant.ai_usage_count += 1;
                Ok(())
            }
            None => Err(RepositoryError::NotFound(format!("tenant {}", id.0))),
        }
    }
}

#[derive(Default)]
pub struct InMemoryProfileRepository {
    profiles: RwLock<HashMap<ProfileId, Profile>>,
}

impl InMemoryProfileRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn find_by_id(&self, id: &ProfileId) -> Result<Option<Profile>, RepositoryError> {
        Ok(self.profiles.read().await.get(id).cloned())
    }

    async fn save(&self, profile: Profile) -> Result<(), RepositoryError> {
        self.profiles.write().await.insert(profile.id.clone(), profile);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryConversationRepository {
    conversations: RwLock<HashMap<ConversationId, Conversation>>,
}

impl InMemoryConversationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn latest_matching(
        &self,
        profile_id: &ProfileId,
        visitor_id: &str,
        filter: impl Fn(&Conversation) -> bool,
    ) -> Option<Conversation> {
        self.conversations
            .read()
            .await
            .values()
            .filter(|c| c.profile_id == *profile_id && c.visitor_id == visitor_id && filter(c))
            .max_by_key(|c| c.created_at)
            .cloned()
    }
}

#[async_trait]
impl ConversationRepository for InMemoryConversationRepository {
    async fn find_resumable(
        &self,
        profile_id: &ProfileId,
        visitor_id: &str,
    ) -> Result<Option<Conversation>, RepositoryError> {
        Ok(self.latest_matching(profile_id, visitor_id, |c| c.status.is_resumable()).await)
    }

    async fn find_by_visitor(
        &self,
        profile_id: &ProfileId,
        visitor_id: &str,
    ) -> Result<Option<Conversation>, RepositoryError> {
        Ok(self.latest_matching(profile_id, visitor_id, |_| true).await)
    }

    async fn find_by_id(
        &self,
        id: &ConversationId,
    ) -> Result<Option<Conversation>, RepositoryError> {
        Ok(self.conversations.read().await.get(id).cloned())
    }

    async fn save(&self, conversation: Conversation) -> Result<(), RepositoryError> {
        self.conversations.write().await.insert(conversation.id.clone(), conversation);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryLeadRepository {
    leads: RwLock<HashMap<LeadId, Lead>>,
}

impl InMemoryLeadRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.leads.read().await.len()
    }
}

#[async_trait]
impl LeadRepository for InMemoryLeadRepository {
    async fn find_by_id(&self, id: &LeadId) -> Result<Option<Lead>, RepositoryError> {
        Ok(self.leads.read().await.get(id).cloned())
    }

    async fn save(&self, lead: Lead) -> Result<(), RepositoryError> {
        self.leads.write().await.insert(lead.id.clone(), lead);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryMeetingRepository {
    meetings: RwLock<HashMap<MeetingId, Meeting>>,
}

impl InMemoryMeetingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.meetings.read().await.len()
    }

    pub async fn all(&self) -> Vec<Meeting> {
        self.meetings.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl MeetingRepository for InMemoryMeetingRepository {
    async fn find_by_id(&self, id: &MeetingId) -> Result<Option<Meeting>, RepositoryError> {
        Ok(self.meetings.read().await.get(id).cloned())
    }

    async fn find_active_for_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Option<Meeting>, RepositoryError> {
        Ok(self
            .meetings
            .read()
            .await
            .values()
            .filter(|m| {
                m.conversation_id.as_ref() == Some(conversation_id) && m.status.is_active()
            })
            .max_by_key(|m| m.created_at)
            .cloned())
    }

    async fn save(&self, meeting: Meeting) -> Result<(), RepositoryError> {
        self.meetings.write().await.insert(meeting.id.clone(), meeting);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use cardesk_core::domain::tenant::{SubscriptionTier, Tenant, TenantId};

    use super::InMemoryTenantRepository;
    use crate::repositories::TenantRepository;

    fn tenant_fixture() -> Tenant {
        Tenant {
            id: TenantId("t-1".to_string()),
            name: "Acme".to_string(),
            email: "owner@acme.test".to_string(),
            tier: SubscriptionTier::Free,
            ai_usage_limit: 100,
            ai_usage_count: 0,
            calendar_integrations: Vec::new(),
            crm_connected: false,
            created_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn concurrent_usage_bumps_are_not_lost() {
        let repo = Arc::new(InMemoryTenantRepository::new());
        repo.save(tenant_fixture()).await.expect("save");

        let mut handles = Vec::new();
        for _ in 0..20 {
            let repo = Arc::clone(&repo);
            handles.push(tokio::spawn(async move {
                repo.increment_ai_usage(&TenantId("t-1".to_string())).await
            }));
        }
        for handle in handles {
            handle.await.expect("join").expect("increment");
        }

        let tenant = repo
            .find_by_id(&TenantId("t-1".to_string()))
            .await
            .expect("find")
            .expect("present");
        assert_eq!(tenant.ai_usage_count, 20);
    }

    #[tokio::test]
    async fn save_does_not_clobber_usage_counter() {
        let repo = InMemoryTenantRepository::new();
        repo.save(tenant_fixture()).await.expect("save");
        repo.increment_ai_usage(&TenantId("t-1".to_string())).await.expect("increment");

        // A stale aggregate written back keeps the bumped counter.
        repo.save(tenant_fixture()).await.expect("re-save");
        let tenant = repo
            .find_by_id(&TenantId("t-1".to_string()))
            .await
            .expect("find")
            .expect("present");
        assert_eq!(tenant.ai_usage_count, 1);
    }
}
