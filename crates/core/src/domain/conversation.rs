use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::meeting::MeetingId;
use crate::domain::profile::ProfileId;
use crate::domain::tenant::TenantId;
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Function,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Function => "function",
        }
    }
}

/// Record of a model-requested capability invocation, kept alongside the
/// transcript entry that carried it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionCallRecord {
    pub name: String,
    pub arguments: Value,
    pub result: Value,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub function_call: Option<FunctionCallRecord>,
}

/// Lead attributes extracted incrementally over the conversation. A known
/// value is never cleared by an incoming empty or absent one.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadInfo {
    pub name: Option<String>,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub intent: Option<String>,
}

impl LeadInfo {
    pub fn merge(&mut self, incoming: &LeadInfo) {
        merge_field(&mut self.name, &incoming.name);
        merge_field(&mut self.company, &incoming.company);
        merge_field(&mut self.email, &incoming.email);
        merge_field(&mut self.phone, &incoming.phone);
        merge_field(&mut self.intent, &incoming.intent);
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.company.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.intent.is_none()
    }
}

fn merge_field(current: &mut Option<String>, incoming: &Option<String>) {
    if let Some(value) = incoming {
        if !value.trim().is_empty() {
            *current = Some(value.clone());
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    Active,
    Qualified,
    Booked,
    Escalated,
    Closed,
}

impl ConversationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Qualified => "qualified",
            Self::Booked => "booked",
            Self::Escalated => "escalated",
            Self::Closed => "closed",
        }
    }

    /// A resumable conversation is continued by the next inbound message for
    /// the same (profile, visitor session id); anything else spawns a fresh
    /// session. Escalated sessions are deliberately not resumable.
    pub fn is_resumable(&self) -> bool {
        matches!(self, Self::Active | Self::Qualified)
    }

    /// Booked, escalated and closed are absorbing: qualification is never
    /// revoked, and nothing returns to automated handling.
    pub fn can_transition_to(&self, next: ConversationStatus) -> bool {
        if *self == next {
            return true;
        }
        matches!(
            (self, next),
            (Self::Active, Self::Qualified)
                | (Self::Active, Self::Booked)
                | (Self::Active, Self::Escalated)
                | (Self::Active, Self::Closed)
                | (Self::Qualified, Self::Booked)
                | (Self::Qualified, Self::Escalated)
                | (Self::Qualified, Self::Closed)
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingResult {
    pub meeting_id: MeetingId,
    pub booked_at: DateTime<Utc>,
}

/// One visitor's interaction session with one profile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub tenant_id: TenantId,
    pub profile_id: ProfileId,
    pub visitor_id: String,
    pub messages: Vec<Message>,
    pub lead_info: LeadInfo,
    pub status: ConversationStatus,
    pub booking: Option<BookingResult>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(
        id: ConversationId,
        tenant_id: TenantId,
        profile_id: ProfileId,
        visitor_id: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            tenant_id,
            profile_id,
            visitor_id,
            messages: Vec::new(),
            lead_info: LeadInfo::default(),
            status: ConversationStatus::Active,
            booking: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Appends to the ordered transcript; prior entries are never mutated.
    pub fn append_message(&mut self, role: MessageRole, content: impl Into<String>) {
        self.messages.push(Message {
            role,
            content: content.into(),
            timestamp: Utc::now(),
            function_call: None,
        });
        self.updated_at = Utc::now();
    }

    pub fn append_function_record(&mut self, record: FunctionCallRecord) {
        self.messages.push(Message {
            role: MessageRole::Function,
            content: record.name.clone(),
            timestamp: Utc::now(),
            function_call: Some(record),
        });
        self.updated_at = Utc::now();
    }

    pub fn merge_lead_info(&mut self, incoming: &LeadInfo) {
        self.lead_info.merge(incoming);
        self.updated_at = Utc::now();
    }

    pub fn transition_to(&mut self, next: ConversationStatus) -> Result<(), DomainError> {
        if self.status.can_transition_to(next) {
            self.status = next;
            self.updated_at = Utc::now();
            return Ok(());
        }

        Err(DomainError::InvalidConversationTransition { from: self.status, to: next })
    }
}
