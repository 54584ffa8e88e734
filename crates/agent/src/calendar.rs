//! Calendar provider boundary. Provider adapters (Google, Outlook, Odoo)
//! live behind this trait; the orchestrator only ever reads busy intervals
//! and creates events.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use cardesk_core::domain::meeting::Attendee;
use cardesk_core::domain::tenant::CalendarIntegration;
use cardesk_core::scheduling::BusyInterval;

#[derive(Clone, Debug, PartialEq)]
pub struct EventDraft {
    pub title: String,
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub timezone: String,
    pub attendees: Vec<Attendee>,
    pub location: Option<String>,
}

#[derive(Debug, Error)]
pub enum CalendarError {
    #[error("calendar provider request failed: {0}")]
    Provider(String),
    #[error("calendar credentials rejected")]
    Unauthorized,
}

#[async_trait]
pub trait CalendarGateway: Send + Sync {
    async fn list_busy(
        &self,
        integration: &CalendarIntegration,
        day_start: DateTime<Utc>,
        day_end: DateTime<Utc>,
    ) -> Result<Vec<BusyInterval>, CalendarError>;

    /// Returns the provider's event id, or None when the provider accepted
    /// the event without one.
    async fn create_event(
        &self,
        integration: &CalendarIntegration,
        draft: EventDraft,
    ) -> Result<Option<String>, CalendarError>;
}

/// Gateway for deployments with no provider adapters wired up: every day is
/// free and bookings stay local-only.
pub struct NullCalendarGateway;

#[async_trait]
impl CalendarGateway for NullCalendarGateway {
    async fn list_busy(
        &self,
        _integration: &CalendarIntegration,
        _day_start: DateTime<Utc>,
        _day_end: DateTime<Utc>,
    ) -> Result<Vec<BusyInterval>, CalendarError> {
        Ok(Vec::new())
    }

    async fn create_event(
        &self,
        _integration: &CalendarIntegration,
        _draft: EventDraft,
    ) -> Result<Option<String>, CalendarError> {
        Ok(None)
    }
}
