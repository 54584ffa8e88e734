//! Callable capabilities declared to the model, and typed decoding of the
//! calls it sends back. A model requesting an unknown function or malformed
//! arguments is normal misbehavior, not a fault: decoding never fails the
//! turn, it produces a structured error payload fed back to the model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;

use cardesk_core::scheduling::DEFAULT_SLOT_MINUTES;

use crate::llm::{FunctionCall, ToolSpec};

pub const CHECK_AVAILABILITY: &str = "checkAvailability";
pub const BOOK_MEETING: &str = "bookMeeting";
pub const ESCALATE_TO_HUMAN: &str = "escalateToHuman";

pub fn tool_specs() -> Vec<ToolSpec> {
    vec![
        ToolSpec {
            name: CHECK_AVAILABILITY,
            description: "Check calendar availability for meeting slots on a specific date",
            parameters: json!({
                "type": "object",
                "properties": {
                    "date": {
                        "type": "string",
                        "description": "Date in YYYY-MM-DD format"
                    },
                    "duration": {
                        "type": "number",
                        "description": "Meeting duration in minutes (default: 30)"
                    },
                    "timezone": {
                        "type": "string",
                        "description": "Visitor timezone (IANA format, e.g., America/New_York)"
                    }
                },
                "required": ["date", "timezone"]
            }),
        },
        ToolSpec {
            name: BOOK_MEETING,
            description: "Book a confirmed meeting after visitor approval",
            parameters: json!({
                "type": "object",
                "properties": {
                    "startTime": {
                        "type": "string",
                        "description": "Meeting start time in ISO 8601 format"
                    },
                    "endTime": {
                        "type": "string",
                        "description": "Meeting end time in ISO 8601 format"
                    },
                    "attendee": {
                        "type": "object",
                        "properties": {
                            "name": { "type": "string" },
                            "email": { "type": "string" }
                        },
                        "required": ["name", "email"]
                    },
                    "notes": {
                        "type": "string",
                        "description": "Meeting notes or agenda"
                    }
                },
                "required": ["startTime", "endTime", "attendee"]
            }),
        },
        ToolSpec {
            name: ESCALATE_TO_HUMAN,
            description:
                "Escalate conversation to profile owner when visitor needs human assistance",
            parameters: json!({
                "type": "object",
                "properties": {
                    "reason": {
                        "type": "string",
                        "description": "Reason for escalation"
                    }
                },
                "required": ["reason"]
            }),
        },
    ]
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct AttendeeArgs {
    pub name: String,
    pub email: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckAvailabilityArgs {
    date: String,
    duration: Option<u32>,
    timezone: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BookMeetingArgs {
    start_time: String,
    end_time: String,
    attendee: AttendeeArgs,
    notes: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
struct EscalateArgs {
    reason: String,
}

/// A model function call decoded into the closed capability set.
#[derive(Clone, Debug, PartialEq)]
pub enum CapabilityCall {
    CheckAvailability {
        date: NaiveDate,
        duration_minutes: u32,
        timezone: String,
    },
    BookMeeting {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        attendee: AttendeeArgs,
        notes: Option<String>,
    },
    EscalateToHuman {
        reason: String,
    },
    /// Unknown name or undecodable arguments; `error` goes back to the model.
    Invalid {
        error: String,
    },
}

pub fn decode_call(call: &FunctionCall) -> CapabilityCall {
    match call.name.as_str() {
        CHECK_AVAILABILITY => decode_check_availability(call),
        BOOK_MEETING => decode_book_meeting(call),
        ESCALATE_TO_HUMAN => match EscalateArgs::deserialize(&call.arguments) {
            Ok(args) => CapabilityCall::EscalateToHuman { reason: args.reason },
            Err(error) => invalid(ESCALATE_TO_HUMAN, &error.to_string()),
        },
        other => CapabilityCall::Invalid { error: format!("Unknown function: {other}") },
    }
}

fn decode_check_availability(call: &FunctionCall) -> CapabilityCall {
    let args = match CheckAvailabilityArgs::deserialize(&call.arguments) {
        Ok(args) => args,
        Err(error) => return invalid(CHECK_AVAILABILITY, &error.to_string()),
    };
    let date = match NaiveDate::parse_from_str(&args.date, "%Y-%m-%d") {
        Ok(date) => date,
        Err(_) => {
            return invalid(CHECK_AVAILABILITY, &format!("date must be YYYY-MM-DD, got {}", args.date))
        }
    };
    CapabilityCall::CheckAvailability {
        date,
        duration_minutes: args.duration.unwrap_or(DEFAULT_SLOT_MINUTES),
        timezone: args.timezone,
    }
}

fn decode_book_meeting(call: &FunctionCall) -> CapabilityCall {
    let args = match BookMeetingArgs::deserialize(&call.arguments) {
        Ok(args) => args,
        Err(error) => return invalid(BOOK_MEETING, &error.to_string()),
    };
    let start = match parse_instant(&args.start_time) {
        Some(instant) => instant,
        None => return invalid(BOOK_MEETING, &format!("startTime is not ISO 8601: {}", args.start_time)),
    };
    let end = match parse_instant(&args.end_time) {
        Some(instant) => instant,
        None => return invalid(BOOK_MEETING, &format!("endTime is not ISO 8601: {}", args.end_time)),
    };
    if end <= start {
        return invalid(BOOK_MEETING, "endTime must be after startTime");
    }
    CapabilityCall::BookMeeting { start, end, attendee: args.attendee, notes: args.notes }
}

fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc)).ok()
}

fn invalid(name: &str, detail: &str) -> CapabilityCall {
    CapabilityCall::Invalid { error: format!("{name}: {detail}") }
}
