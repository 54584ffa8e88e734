use async_trait::async_trait;
use thiserror::Error;

use cardesk_core::domain::conversation::{Conversation, ConversationId};
use cardesk_core::domain::lead::{Lead, LeadId};
use cardesk_core::domain::meeting::{Meeting, MeetingId};
use cardesk_core::domain::profile::{Profile, ProfileId};
use cardesk_core::domain::tenant::{Tenant, TenantId};

pub mod conversation;
pub mod lead;
pub mod meeting;
pub mod memory;
pub mod profile;
pub mod tenant;

pub use conversation::SqlConversationRepository;
pub use lead::SqlLeadRepository;
pub use meeting::SqlMeetingRepository;
pub use memory::{
    InMemoryConversationRepository, InMemoryLeadRepository, InMemoryMeetingRepository,
    InMemoryProfileRepository, InMemoryTenantRepository,
};
pub use profile::SqlProfileRepository;
pub use tenant::SqlTenantRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("not found: {0}")]
    NotFound(String),
}

#[async_trait]
pub trait TenantRepository: Send + Sync {
    async fn find_by_id(&self, id: &TenantId) -> Result<Option<Tenant>, RepositoryError>;
    async fn save(&self, tenant: Tenant) -> Result<(), RepositoryError>;

    /// Atomic per-tenant usage bump. Implementations must not read-modify-
    /// write: concurrent turns for one tenant may not lose increments.
    async fn increment_ai_usage(&self, id: &TenantId) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn find_by_id(&self, id: &ProfileId) -> Result<Option<Profile>, RepositoryError>;
    async fn save(&self, profile: Profile) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Most recent conversation for the (profile, visitor) pair whose status
    /// is in the resumable set, or None.
    async fn find_resumable(
        &self,
        profile_id: &ProfileId,
        visitor_id: &str,
    ) -> Result<Option<Conversation>, RepositoryError>;

    /// Most recent conversation for the pair regardless of status (transcript
    /// lookup surface).
    async fn find_by_visitor(
        &self,
        profile_id: &ProfileId,
        visitor_id: &str,
    ) -> Result<Option<Conversation>, RepositoryError>;

    async fn find_by_id(&self, id: &ConversationId)
        -> Result<Option<Conversation>, RepositoryError>;

    async fn save(&self, conversation: Conversation) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait LeadRepository: Send + Sync {
    async fn find_by_id(&self, id: &LeadId) -> Result<Option<Lead>, RepositoryError>;
    async fn save(&self, lead: Lead) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait MeetingRepository: Send + Sync {
    async fn find_by_id(&self, id: &MeetingId) -> Result<Option<Meeting>, RepositoryError>;

    /// Any non-cancelled meeting already created for the conversation; the
    /// booking transactor's duplicate guard.
    async fn find_active_for_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Option<Meeting>, RepositoryError>;

    async fn save(&self, meeting: Meeting) -> Result<(), RepositoryError>;
}
