pub mod config;
pub mod domain;
pub mod errors;
pub mod scheduling;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LlmProvider, LoadOptions, LogFormat};
pub use domain::conversation::{
    Conversation, ConversationId, ConversationStatus, FunctionCallRecord, LeadInfo, Message,
    MessageRole,
};
pub use domain::lead::{CrmSyncStatus, Lead, LeadId, LeadSource, LeadStatus};
pub use domain::meeting::{Attendee, Meeting, MeetingId, MeetingStatus};
pub use domain::profile::{AiConfig, Profile, ProfileId};
pub use domain::tenant::{
    CalendarIntegration, CalendarProviderKind, SubscriptionTier, Tenant, TenantId,
};
pub use errors::DomainError;
pub use scheduling::{free_slots, BusyInterval, SchedulingError, Slot, DEFAULT_SLOT_MINUTES};
