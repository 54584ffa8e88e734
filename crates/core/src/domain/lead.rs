use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::conversation::ConversationId;
use crate::domain::profile::ProfileId;
use crate::domain::tenant::TenantId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeadId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadSource {
    Qr,
    Nfc,
    Link,
    Chat,
}

impl LeadSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Qr => "qr",
            Self::Nfc => "nfc",
            Self::Link => "link",
            Self::Chat => "chat",
        }
    }
}

/// Externally driven beyond initial creation; the orchestrator only ever
/// creates leads as `new` or `qualified`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    New,
    Contacted,
    Qualified,
    Converted,
    Lost,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Contacted => "contacted",
            Self::Qualified => "qualified",
            Self::Converted => "converted",
            Self::Lost => "lost",
        }
    }
}

/// Outcome of the downstream CRM export for this lead. The chat path only
/// ever enqueues the export; this record is written by the sync pipeline.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrmSyncStatus {
    pub synced: bool,
    pub contact_id: Option<i64>,
    pub crm_lead_id: Option<i64>,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub id: LeadId,
    pub tenant_id: TenantId,
    pub profile_id: ProfileId,
    pub conversation_id: Option<ConversationId>,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub intent: Option<String>,
    pub source: LeadSource,
    pub status: LeadStatus,
    pub notes: String,
    pub crm_sync: CrmSyncStatus,
    pub created_at: DateTime<Utc>,
}
