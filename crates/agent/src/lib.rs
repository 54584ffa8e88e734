//! Conversation orchestration for the AI secretary: the model-facing tool
//! contract, availability and booking logic, quota enforcement, and the
//! per-turn dialogue loop.

pub mod availability;
pub mod booking;
pub mod calendar;
pub mod crm;
pub mod escalation;
pub mod gemini;
pub mod llm;
pub mod prompt;
pub mod quota;
pub mod secretary;
pub mod sessions;
pub mod tools;

pub use availability::AvailabilityEngine;
pub use booking::{BookingError, BookingParams, BookingTransactor};
pub use calendar::{CalendarError, CalendarGateway, EventDraft, NullCalendarGateway};
pub use crm::{CrmNotifier, LoggingCrmNotifier};
pub use escalation::{EscalationNotifier, LoggingEscalationNotifier};
pub use gemini::{GeminiClient, GeminiClientError};
pub use llm::{FunctionCall, LanguageModel, ModelError, ModelRequest, ModelResponse, ToolSpec};
pub use quota::QuotaGuard;
pub use secretary::{ChatError, ChatReply, ChatRequest, ConversationView, Secretary, VisitorInfo};
pub use sessions::SessionLocks;
