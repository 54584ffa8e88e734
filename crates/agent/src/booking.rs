//! Meeting creation. One non-cancelled meeting per conversation per slot:
//! retried booking calls return the meeting already created instead of
//! stacking duplicates.

use std::sync::Arc;

use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use cardesk_core::domain::conversation::{BookingResult, Conversation, ConversationStatus, LeadInfo};
use cardesk_core::domain::lead::{CrmSyncStatus, Lead, LeadId, LeadSource, LeadStatus};
use cardesk_core::domain::meeting::{Attendee, Meeting, MeetingId, MeetingStatus};
use cardesk_core::domain::profile::Profile;
use cardesk_core::domain::tenant::Tenant;
use cardesk_core::errors::DomainError;
use cardesk_db::repositories::{
    ConversationRepository, LeadRepository, MeetingRepository, RepositoryError,
};

use crate::calendar::{CalendarGateway, EventDraft};
use crate::crm::{notify_lead_captured, CrmNotifier};

#[derive(Clone, Debug, PartialEq)]
pub struct BookingParams {
    pub start: chrono::DateTime<chrono::Utc>,
    pub end: chrono::DateTime<chrono::Utc>,
    pub attendee: Attendee,
    pub notes: Option<String>,
    pub timezone: String,
}

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("tenant has no calendar integration configured")]
    NoCalendarIntegration,
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub struct BookingTransactor {
    conversations: Arc<dyn ConversationRepository>,
    leads: Arc<dyn LeadRepository>,
    meetings: Arc<dyn MeetingRepository>,
    calendar: Arc<dyn CalendarGateway>,
    crm: Arc<dyn CrmNotifier>,
}

impl BookingTransactor {
    pub fn new(
        conversations: Arc<dyn ConversationRepository>,
        leads: Arc<dyn LeadRepository>,
        meetings: Arc<dyn MeetingRepository>,
        calendar: Arc<dyn CalendarGateway>,
        crm: Arc<dyn CrmNotifier>,
    ) -> Self {
        Self { conversations, leads, meetings, calendar, crm }
    }

    /// Books a meeting for the conversation, mutating it to `booked` and
    /// persisting it. Idempotent: a non-cancelled meeting already attached to
    /// the conversation is returned unchanged.
    pub async fn book(
        &self,
        tenant: &Tenant,
        profile: &Profile,
        conversation: &mut Conversation,
        params: BookingParams,
    ) -> Result<Meeting, BookingError> {
        if let Some(existing) =
            self.meetings.find_active_for_conversation(&conversation.id).await?
        {
            return Ok(existing);
        }

        let integration = tenant
            .active_calendar_integration()
            .ok_or(BookingError::NoCalendarIntegration)?;

        conversation.merge_lead_info(&LeadInfo {
            name: Some(params.attendee.name.clone()),
            email: Some(params.attendee.email.clone()),
            ..LeadInfo::default()
        });

        let lead = match conversation.lead_info.email.clone() {
            Some(email) => {
                let lead = Lead {
                    id: LeadId(Uuid::new_v4().to_string()),
                    tenant_id: tenant.id.clone(),
                    profile_id: profile.id.clone(),
                    name: conversation
                        .lead_info
                        .name
                        .clone()
                        .unwrap_or_else(|| params.attendee.name.clone()),
                    email: Some(email),
                    phone: conversation.lead_info.phone.clone(),
                    company: conversation.lead_info.company.clone(),
                    conversation_id: Some(conversation.id.clone()),
                    intent: conversation.lead_info.intent.clone(),
                    notes: params.notes.clone().unwrap_or_default(),
                    source: LeadSource::Chat,
                    status: LeadStatus::Qualified,
                    crm_sync: CrmSyncStatus::default(),
                    created_at: chrono::Utc::now(),
                };
                self.leads.save(lead.clone()).await?;
                notify_lead_captured(Arc::clone(&self.crm), lead.clone());
                Some(lead)
            }
            None => None,
        };

        let draft = EventDraft {
            title: format!("Meeting with {}", params.attendee.name),
            description: params.notes.clone(),
            start: params.start,
            end: params.end,
            timezone: params.timezone.clone(),
            attendees: vec![params.attendee.clone()],
            location: None,
        };

        // A provider failure here does not fail the booking: the meeting is
        // kept locally without an external event id and the gap is logged for
        // reconciliation.
        let external_event_id = match self.calendar.create_event(integration, draft).await {
            Ok(id) => id,
            Err(error) => {
                warn!(
                    event_name = "secretary.booking.calendar_sync_gap",
                    tenant_id = %tenant.id.0,
                    conversation_id = %conversation.id.0,
                    provider = integration.provider.as_str(),
                    error = %error,
                    "calendar event creation failed; meeting stored locally only"
                );
                None
            }
        };

        let meeting = Meeting {
            id: MeetingId(Uuid::new_v4().to_string()),
            tenant_id: tenant.id.clone(),
            profile_id: profile.id.clone(),
            lead_id: lead.map(|l| l.id),
            conversation_id: Some(conversation.id.clone()),
            title: format!("Meeting with {}", params.attendee.name),
            description: params.notes,
            start_time: params.start,
            end_time: params.end,
            timezone: params.timezone,
            attendees: vec![params.attendee],
            location: None,
            provider: integration.provider,
            external_event_id,
            status: MeetingStatus::Scheduled,
            created_at: chrono::Utc::now(),
        };
        self.meetings.save(meeting.clone()).await?;

        conversation.booking = Some(BookingResult {
            meeting_id: meeting.id.clone(),
            booked_at: chrono::Utc::now(),
        });
        conversation.transition_to(ConversationStatus::Booked)?;
        self.conversations.save(conversation.clone()).await?;

        Ok(meeting)
    }
}
