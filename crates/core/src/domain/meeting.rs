use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::conversation::ConversationId;
use crate::domain::lead::LeadId;
use crate::domain::profile::ProfileId;
use crate::domain::tenant::{CalendarProviderKind, TenantId};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeetingId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    pub name: String,
    pub email: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingStatus {
    Scheduled,
    Confirmed,
    Cancelled,
    Completed,
}

impl MeetingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }

    /// Everything except a cancellation counts against the one-meeting-per-
    /// conversation-per-slot guard.
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}

/// A scheduled appointment. `external_event_id` is absent when the provider
/// call failed and the record exists only locally (sync gap).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meeting {
    pub id: MeetingId,
    pub tenant_id: TenantId,
    pub profile_id: ProfileId,
    pub lead_id: Option<LeadId>,
    pub conversation_id: Option<ConversationId>,
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub timezone: String,
    pub attendees: Vec<Attendee>,
    pub location: Option<String>,
    pub provider: CalendarProviderKind,
    pub external_event_id: Option<String>,
    pub status: MeetingStatus,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::MeetingStatus;

    #[test]
    fn only_cancelled_meetings_drop_out_of_the_duplicate_guard() {
        assert!(MeetingStatus::Scheduled.is_active());
        assert!(MeetingStatus::Confirmed.is_active());
        assert!(MeetingStatus::Completed.is_active());
        assert!(!MeetingStatus::Cancelled.is_active());
    }
}
