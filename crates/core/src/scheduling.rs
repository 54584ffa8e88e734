//! Deterministic meeting-slot computation.
//!
//! The availability engine is pure: given a calendar day, a duration and the
//! busy intervals already fetched from the connected providers, it partitions
//! the business-hours window into consecutive duration-wide candidates and
//! drops every candidate that overlaps a busy interval. Fetching busy data is
//! the caller's concern; this module never performs I/O.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Meeting duration applied when the caller does not request one.
pub const DEFAULT_SLOT_MINUTES: u32 = 30;

const BUSINESS_START_HOUR: u32 = 9;
const BUSINESS_END_HOUR: u32 = 17;

/// An occupied interval on some connected calendar, in UTC.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// A candidate meeting interval, expressed in the visitor's local timezone.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Slot {
    pub fn start_string(&self) -> String {
        self.start.format("%Y-%m-%dT%H:%M:%S").to_string()
    }

    pub fn end_string(&self) -> String {
        self.end.format("%Y-%m-%dT%H:%M:%S").to_string()
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SchedulingError {
    #[error("slot duration must be between 1 and 480 minutes, got {0}")]
    InvalidDuration(u32),
}

/// Parses an IANA timezone name. Callers decide how to degrade on `None`;
/// the chat path falls back to UTC like the original widget did.
pub fn parse_timezone(raw: &str) -> Option<Tz> {
    raw.trim().parse::<Tz>().ok()
}

/// Computes free slots within 09:00-17:00 local time on `date`.
///
/// Candidates are laid out consecutively from 09:00 in `duration_minutes`
/// steps and clipped to the business-hours window: a candidate that would end
/// past 17:00 is not offered. A candidate survives when it overlaps no busy
/// interval under the half-open test `slot.start < busy.end && slot.end >
/// busy.start`, evaluated in UTC. Local times that do not exist in `tz`
/// (DST gap) produce no candidate. The result is ascending by start time and
/// may be empty.
pub fn free_slots(
    date: NaiveDate,
    duration_minutes: u32,
    tz: Tz,
    busy: &[BusyInterval],
) -> Result<Vec<Slot>, SchedulingError> {
    if duration_minutes == 0 || duration_minutes > 480 {
        return Err(SchedulingError::InvalidDuration(duration_minutes));
    }

    let step = Duration::minutes(i64::from(duration_minutes));
    let window_start = local_time(date, BUSINESS_START_HOUR);
    let window_end = local_time(date, BUSINESS_END_HOUR);

    let mut slots = Vec::new();
    let mut cursor = window_start;

    while cursor + step <= window_end {
        let slot = Slot { start: cursor, end: cursor + step };
        cursor += step;

        let (Some(start_utc), Some(end_utc)) = (resolve(tz, slot.start), resolve(tz, slot.end))
        else {
            continue;
        };

        let conflicts = busy
            .iter()
            .any(|interval| start_utc < interval.end && end_utc > interval.start);
        if !conflicts {
            slots.push(slot);
        }
    }

    Ok(slots)
}

fn local_time(date: NaiveDate, hour: u32) -> NaiveDateTime {
    date.and_hms_opt(hour, 0, 0).unwrap_or_else(|| date.and_time(chrono::NaiveTime::MIN))
}

fn resolve(tz: Tz, local: NaiveDateTime) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&local).earliest().map(|dt| dt.with_timezone(&Utc))
}
