use sqlx::Row;

use cardesk_core::domain::conversation::ConversationId;
use cardesk_core::domain::lead::LeadId;
use cardesk_core::domain::meeting::{Attendee, Meeting, MeetingId, MeetingStatus};
use cardesk_core::domain::profile::ProfileId;
use cardesk_core::domain::tenant::{CalendarProviderKind, TenantId};

use super::tenant::parse_timestamp;
use super::{MeetingRepository, RepositoryError};
use crate::DbPool;

pub struct SqlMeetingRepository {
    pool: DbPool,
}

impl SqlMeetingRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn parse_provider(raw: &str) -> CalendarProviderKind {
    match raw {
        "outlook" => CalendarProviderKind::Outlook,
        "odoo" => CalendarProviderKind::Odoo,
        _ => CalendarProviderKind::Google,
    }
}

fn parse_status(raw: &str) -> MeetingStatus {
    match raw {
        "confirmed" => MeetingStatus::Confirmed,
        "cancelled" => MeetingStatus::Cancelled,
        "completed" => MeetingStatus::Completed,
        _ => MeetingStatus::Scheduled,
    }
}

fn row_to_meeting(row: &sqlx::sqlite::SqliteRow) -> Result<Meeting, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let tenant_id: String =
        row.try_get("tenant_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let profile_id: String =
        row.try_get("profile_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let lead_id: Option<String> =
        row.try_get("lead_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let conversation_id: Option<String> =
        row.try_get("conversation_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let start_time: String =
        row.try_get("start_time").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let end_time: String =
        row.try_get("end_time").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let attendees: String =
        row.try_get("attendees").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let provider: String =
        row.try_get("provider").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let status: String =
        row.try_get("status").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let attendees: Vec<Attendee> = serde_json::from_str(&attendees)
        .map_err(|e| RepositoryError::Decode(format!("attendees: {e}")))?;

    Ok(Meeting {
        id: MeetingId(id),
        tenant_id: TenantId(tenant_id),
        profile_id: ProfileId(profile_id),
        lead_id: lead_id.map(LeadId),
        conversation_id: conversation_id.map(ConversationId),
        title: row.try_get("title").map_err(|e| RepositoryError::Decode(e.to_string()))?,
        description: row
            .try_get("description")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        start_time: parse_timestamp(&start_time)?,
        end_time: parse_timestamp(&end_time)?,
        timezone: row.try_get("timezone").map_err(|e| RepositoryError::Decode(e.to_string()))?,
        attendees,
        location: row.try_get("location").map_err(|e| RepositoryError::Decode(e.to_string()))?,
        provider: parse_provider(&provider),
        external_event_id: row
            .try_get("external_event_id")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        status: parse_status(&status),
        created_at: parse_timestamp(&created_at)?,
    })
}

#[async_trait::async_trait]
impl MeetingRepository for SqlMeetingRepository {
    async fn find_by_id(&self, id: &MeetingId) -> Result<Option<Meeting>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, tenant_id, profile_id, lead_id, conversation_id, title, description,
                    start_time, end_time, timezone, attendees, location, provider,
                    external_event_id, status, created_at
             FROM meeting WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_meeting).transpose()
    }

    async fn find_active_for_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Option<Meeting>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, tenant_id, profile_id, lead_id, conversation_id, title, description,
                    start_time, end_time, timezone, attendees, location, provider,
                    external_event_id, status, created_at
             FROM meeting
             WHERE conversation_id = ? AND status != 'cancelled'
             ORDER BY created_at DESC LIMIT 1",
        )
        .bind(&conversation_id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_meeting).transpose()
    }

    async fn save(&self, meeting: Meeting) -> Result<(), RepositoryError> {
        let attendees = serde_json::to_string(&meeting.attendees)
            .map_err(|e| RepositoryError::Decode(format!("attendees: {e}")))?;

        sqlx::query(
            "INSERT INTO meeting (id, tenant_id, profile_id, lead_id, conversation_id, title,
                                  description, start_time, end_time, timezone, attendees,
                                  location, provider, external_event_id, status, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 title = excluded.title,
                 description = excluded.description,
                 start_time = excluded.start_time,
                 end_time = excluded.end_time,
                 timezone = excluded.timezone,
                 attendees = excluded.attendees,
                 location = excluded.location,
                 external_event_id = excluded.external_event_id,
                 status = excluded.status",
        )
        .bind(&meeting.id.0)
        .bind(&meeting.tenant_id.0)
        .bind(&meeting.profile_id.0)
        .bind(meeting.lead_id.as_ref().map(|id| id.0.clone()))
        .bind(meeting.conversation_id.as_ref().map(|id| id.0.clone()))
        .bind(&meeting.title)
        .bind(&meeting.description)
        .bind(meeting.start_time.to_rfc3339())
        .bind(meeting.end_time.to_rfc3339())
        .bind(&meeting.timezone)
        .bind(attendees)
        .bind(&meeting.location)
        .bind(meeting.provider.as_str())
        .bind(&meeting.external_event_id)
        .bind(meeting.status.as_str())
        .bind(meeting.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
