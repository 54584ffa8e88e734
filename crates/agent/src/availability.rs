//! Free-slot computation over the tenant's connected calendars.

use std::sync::Arc;

use chrono::{NaiveDate, TimeZone};
use chrono_tz::Tz;
use thiserror::Error;
use tracing::warn;

use cardesk_core::domain::tenant::Tenant;
use cardesk_core::scheduling::{self, BusyInterval, SchedulingError, Slot};

use crate::calendar::CalendarGateway;

#[derive(Debug, Error)]
pub enum AvailabilityError {
    #[error("unknown timezone: {0}")]
    UnknownTimezone(String),
    #[error(transparent)]
    Scheduling(#[from] SchedulingError),
}

pub struct AvailabilityEngine {
    calendar: Arc<dyn CalendarGateway>,
}

impl AvailabilityEngine {
    pub fn new(calendar: Arc<dyn CalendarGateway>) -> Self {
        Self { calendar }
    }

    /// Free business-hours slots on `date` in the visitor's timezone.
    ///
    /// Busy intervals are collected from every connected integration. A
    /// provider failure contributes zero busy intervals rather than failing
    /// the lookup, and zero integrations means the whole window is free.
    pub async fn compute_slots(
        &self,
        tenant: &Tenant,
        date: NaiveDate,
        duration_minutes: u32,
        timezone: &str,
    ) -> Result<Vec<Slot>, AvailabilityError> {
        let tz = scheduling::parse_timezone(timezone)
            .ok_or_else(|| AvailabilityError::UnknownTimezone(timezone.to_string()))?;

        let (day_start, day_end) = day_bounds_utc(date, tz);

        let mut busy: Vec<BusyInterval> = Vec::new();
        for integration in &tenant.calendar_integrations {
            match self.calendar.list_busy(integration, day_start, day_end).await {
                Ok(intervals) => busy.extend(intervals),
                Err(error) => {
                    warn!(
                        event_name = "secretary.availability.provider_failed",
                        tenant_id = %tenant.id.0,
                        provider = integration.provider.as_str(),
                        error = %error,
                        "calendar provider lookup failed; treating provider as free"
                    );
                }
            }
        }

        Ok(scheduling::free_slots(date, duration_minutes, tz, &busy)?)
    }
}

/// UTC bounds of the local calendar day. On a DST transition the local
/// midnight may be ambiguous or missing; the earliest valid instant wins and
/// a fully skipped midnight falls back to the UTC reading of the same wall
/// clock.
fn day_bounds_utc(
    date: NaiveDate,
    tz: Tz,
) -> (chrono::DateTime<chrono::Utc>, chrono::DateTime<chrono::Utc>) {
    let start_local = date.and_hms_opt(0, 0, 0).unwrap_or_default();
    let end_local = start_local + chrono::Duration::days(1);
    let start = tz
        .from_local_datetime(&start_local)
        .earliest()
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .unwrap_or_else(|| chrono::Utc.from_utc_datetime(&start_local));
    let end = tz
        .from_local_datetime(&end_local)
        .earliest()
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .unwrap_or_else(|| chrono::Utc.from_utc_datetime(&end_local));
    (start, end)
}
