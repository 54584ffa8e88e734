use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::tenant::TenantId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProfileId(pub String);

/// AI secretary configuration attached to a profile. The qualification
/// questions are rendered verbatim into the system prompt, in order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiConfig {
    pub enabled: bool,
    pub personality: String,
    pub greeting: String,
    pub qualification_questions: Vec<String>,
    pub auto_booking: bool,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            personality: "professional and friendly".to_string(),
            greeting: "Hi! How can I help you today?".to_string(),
            qualification_questions: Vec::new(),
            auto_booking: true,
        }
    }
}

/// Public-facing persona owned by exactly one tenant. Read-only during a
/// conversation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    pub tenant_id: TenantId,
    pub display_name: String,
    pub title: String,
    pub company: String,
    pub timezone: String,
    pub ai_config: AiConfig,
    pub created_at: DateTime<Utc>,
}
