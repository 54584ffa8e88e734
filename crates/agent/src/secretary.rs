//! The dialogue orchestrator: one inbound visitor message in, exactly one
//! reply plus resulting conversation status out.
//!
//! Turn order for a single (profile, visitor session) key is serialized via
//! [`SessionLocks`]; everything else runs concurrently. Quota is checked
//! before the model is invoked and committed only after a reply exists, so a
//! failed model call costs the tenant nothing.

use std::sync::Arc;

use serde_json::{json, Value};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use cardesk_core::domain::conversation::{
    Conversation, ConversationId, ConversationStatus, FunctionCallRecord, LeadInfo, Message,
    MessageRole,
};
use cardesk_core::domain::profile::{Profile, ProfileId};
use cardesk_core::domain::tenant::Tenant;
use cardesk_core::errors::DomainError;
use cardesk_db::repositories::{
    ConversationRepository, LeadRepository, MeetingRepository, ProfileRepository, RepositoryError,
    TenantRepository,
};

use crate::availability::AvailabilityEngine;
use crate::booking::{BookingError, BookingParams, BookingTransactor};
use crate::calendar::CalendarGateway;
use crate::crm::CrmNotifier;
use crate::escalation::EscalationNotifier;
use crate::llm::{FunctionCall, LanguageModel, ModelError, ModelRequest};
use crate::prompt::build_system_prompt;
use crate::quota::{QuotaDecision, QuotaGuard};
use crate::sessions::SessionLocks;
use crate::tools::{decode_call, tool_specs, CapabilityCall};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct VisitorInfo {
    pub name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ChatRequest {
    pub profile_id: ProfileId,
    pub session_id: Option<String>,
    pub message: String,
    pub visitor_info: Option<VisitorInfo>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChatReply {
    pub reply: String,
    pub session_id: String,
    pub state: ConversationStatus,
}

/// Transcript lookup result for the conversation endpoint.
#[derive(Clone, Debug, PartialEq)]
pub struct ConversationView {
    pub session_id: String,
    pub status: ConversationStatus,
    pub messages: Vec<Message>,
    pub lead_info: LeadInfo,
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("message must not be empty")]
    EmptyMessage,
    #[error("profile not found")]
    ProfileNotFound,
    #[error("AI assistant is disabled for this profile")]
    AiDisabled,
    #[error("AI usage quota exceeded")]
    QuotaExceeded,
    #[error("failed to get AI response")]
    Model(#[source] ModelError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

pub struct Secretary {
    tenants: Arc<dyn TenantRepository>,
    profiles: Arc<dyn ProfileRepository>,
    conversations: Arc<dyn ConversationRepository>,
    model: Arc<dyn LanguageModel>,
    escalation: Arc<dyn EscalationNotifier>,
    quota: QuotaGuard,
    availability: AvailabilityEngine,
    booking: BookingTransactor,
    locks: SessionLocks,
}

impl Secretary {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tenants: Arc<dyn TenantRepository>,
        profiles: Arc<dyn ProfileRepository>,
        conversations: Arc<dyn ConversationRepository>,
        leads: Arc<dyn LeadRepository>,
        meetings: Arc<dyn MeetingRepository>,
        calendar: Arc<dyn CalendarGateway>,
        model: Arc<dyn LanguageModel>,
        escalation: Arc<dyn EscalationNotifier>,
        crm: Arc<dyn CrmNotifier>,
    ) -> Self {
        let quota = QuotaGuard::new(Arc::clone(&tenants));
        let availability = AvailabilityEngine::new(Arc::clone(&calendar));
        let booking =
            BookingTransactor::new(Arc::clone(&conversations), leads, meetings, calendar, crm);

        Self {
            tenants,
            profiles,
            conversations,
            model,
            escalation,
            quota,
            availability,
            booking,
            locks: SessionLocks::new(),
        }
    }

    /// Handles one inbound visitor message end to end.
    pub async fn chat(&self, request: ChatRequest) -> Result<ChatReply, ChatError> {
        if request.message.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let session_id =
            request.session_id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());

        // Two concurrent messages for one session must not both resume the
        // same conversation or double-commit quota; the whole turn runs under
        // the per-key lock.
        let lock = self.locks.lock_for(&request.profile_id, &session_id);
        let _turn = lock.lock().await;

        let profile = self
            .profiles
            .find_by_id(&request.profile_id)
            .await?
            .ok_or(ChatError::ProfileNotFound)?;
        if !profile.ai_config.enabled {
            return Err(ChatError::AiDisabled);
        }

        let tenant = self
            .tenants
            .find_by_id(&profile.tenant_id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("tenant {}", profile.tenant_id.0)))?;

        if self.quota.check(&tenant) == QuotaDecision::Exhausted {
            info!(
                event_name = "secretary.quota.exhausted",
                tenant_id = %tenant.id.0,
                profile_id = %profile.id.0,
                "turn rejected before model invocation"
            );
            return Err(ChatError::QuotaExceeded);
        }

        let mut conversation = self.load_or_create(&profile, &session_id).await?;

        if let Some(visitor) = &request.visitor_info {
            conversation.merge_lead_info(&LeadInfo {
                name: visitor.name.clone(),
                email: visitor.email.clone(),
                company: visitor.company.clone(),
                ..LeadInfo::default()
            });
        }

        conversation.append_message(MessageRole::User, request.message.clone());

        let system_prompt = build_system_prompt(&profile);
        let mut model_request = ModelRequest {
            system_prompt,
            transcript: conversation.messages.clone(),
            tools: tool_specs(),
            function_results: Vec::new(),
        };

        let response =
            self.model.generate(model_request.clone()).await.map_err(ChatError::Model)?;
        let mut reply = response.text.unwrap_or_default();

        // One extra model round-trip per requested function, in request
        // order; each re-invocation sees all results so far.
        for call in &response.function_calls {
            let result =
                self.execute_call(&tenant, &profile, &mut conversation, call).await;
            conversation.append_function_record(FunctionCallRecord {
                name: call.name.clone(),
                arguments: call.arguments.clone(),
                result: result.clone(),
            });
            model_request.function_results.push((call.clone(), result));
            model_request.transcript = conversation.messages.clone();

            let follow_up =
                self.model.generate(model_request.clone()).await.map_err(ChatError::Model)?;
            if let Some(text) = follow_up.text {
                reply = text;
            }
        }

        conversation.append_message(MessageRole::Assistant, reply.clone());

        if conversation.status == ConversationStatus::Active
            && policy::booking_intent_signal(&reply, conversation.lead_info.email.is_some())
        {
            conversation.transition_to(ConversationStatus::Qualified)?;
        }

        self.conversations.save(conversation.clone()).await?;
        self.quota.commit(&tenant.id).await?;

        Ok(ChatReply { reply, session_id, state: conversation.status })
    }

    /// Transcript lookup for the conversation endpoint; None when the visitor
    /// has no conversation with the profile.
    pub async fn conversation(
        &self,
        profile_id: &ProfileId,
        session_id: &str,
    ) -> Result<Option<ConversationView>, ChatError> {
        let found = self.conversations.find_by_visitor(profile_id, session_id).await?;
        Ok(found.map(|conversation| ConversationView {
            session_id: conversation.visitor_id,
            status: conversation.status,
            messages: conversation.messages,
            lead_info: conversation.lead_info,
        }))
    }

    async fn load_or_create(
        &self,
        profile: &Profile,
        session_id: &str,
    ) -> Result<Conversation, ChatError> {
        if let Some(existing) =
            self.conversations.find_resumable(&profile.id, session_id).await?
        {
            return Ok(existing);
        }

        Ok(Conversation::new(
            ConversationId(Uuid::new_v4().to_string()),
            profile.tenant_id.clone(),
            profile.id.clone(),
            session_id.to_string(),
        ))
    }

    async fn execute_call(
        &self,
        tenant: &Tenant,
        profile: &Profile,
        conversation: &mut Conversation,
        call: &FunctionCall,
    ) -> Value {
        match decode_call(call) {
            CapabilityCall::CheckAvailability { date, duration_minutes, timezone } => {
                match self
                    .availability
                    .compute_slots(tenant, date, duration_minutes, &timezone)
                    .await
                {
                    Ok(slots) => json!({
                        "success": true,
                        "slots": slots
                            .iter()
                            .map(|s| json!({ "start": s.start_string(), "end": s.end_string() }))
                            .collect::<Vec<_>>(),
                        "timezone": timezone,
                    }),
                    Err(error) => json!({ "success": false, "error": error.to_string() }),
                }
            }
            CapabilityCall::BookMeeting { start, end, attendee, notes } => {
                let params = BookingParams {
                    start,
                    end,
                    attendee: cardesk_core::domain::meeting::Attendee {
                        name: attendee.name,
                        email: attendee.email,
                    },
                    notes,
                    timezone: profile.timezone.clone(),
                };
                match self.booking.book(tenant, profile, conversation, params).await {
                    Ok(meeting) => json!({
                        "success": true,
                        "meetingId": meeting.id.0,
                        "startTime": meeting.start_time.to_rfc3339(),
                        "endTime": meeting.end_time.to_rfc3339(),
                    }),
                    Err(BookingError::NoCalendarIntegration) => json!({
                        "success": false,
                        "error": "No calendar is connected for this profile",
                    }),
                    Err(error) => json!({ "success": false, "error": error.to_string() }),
                }
            }
            CapabilityCall::EscalateToHuman { reason } => {
                if let Err(error) = conversation.transition_to(ConversationStatus::Escalated) {
                    return json!({ "success": false, "error": error.to_string() });
                }
                if let Err(error) =
                    self.escalation.notify(profile, &reason, &conversation.lead_info).await
                {
                    warn!(
                        event_name = "secretary.escalation.notify_failed",
                        profile_id = %profile.id.0,
                        error = %error,
                        "owner notification failed; escalation recorded anyway"
                    );
                }
                json!({
                    "success": true,
                    "message": format!("Escalated to {}. They will follow up shortly.", profile.display_name),
                })
            }
            CapabilityCall::Invalid { error } => json!({ "success": false, "error": error }),
        }
    }
}

pub mod policy {
    /// Lightweight qualification signal, independent of explicit function
    /// calls: a reply mentioning booking vocabulary while the visitor's email
    /// is already known marks the lead qualified. Heuristic, not
    /// authoritative; it only ever feeds the Active -> Qualified edge.
    pub fn booking_intent_signal(reply: &str, email_known: bool) -> bool {
        if !email_known {
            return false;
        }
        let lowered = reply.to_lowercase();
        ["book", "schedule", "meeting"].iter().any(|keyword| lowered.contains(keyword))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::Utc;
    use serde_json::json;

    use cardesk_core::domain::conversation::ConversationStatus;
    use cardesk_core::domain::meeting::MeetingStatus;
    use cardesk_core::domain::profile::{AiConfig, Profile, ProfileId};
    use cardesk_core::domain::tenant::{
        CalendarIntegration, CalendarProviderKind, SubscriptionTier, Tenant, TenantId,
    };
    use cardesk_db::repositories::{
        InMemoryConversationRepository, InMemoryLeadRepository, InMemoryMeetingRepository,
        InMemoryProfileRepository, InMemoryTenantRepository, ProfileRepository, TenantRepository,
    };

    use super::{policy, ChatError, ChatRequest, Secretary, VisitorInfo};
    use crate::calendar::NullCalendarGateway;
    use crate::crm::LoggingCrmNotifier;
    use crate::escalation::LoggingEscalationNotifier;
    use crate::llm::{
        FunctionCall, LanguageModel, ModelError, ModelRequest, ModelResponse,
    };

    struct ScriptedModel {
        responses: Mutex<VecDeque<Result<ModelResponse, ModelError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedModel {
        fn new(responses: Vec<Result<ModelResponse, ModelError>>) -> Self {
            Self { responses: Mutex::new(responses.into_iter().collect()), calls: AtomicUsize::new(0) }
        }

        fn text(reply: &str) -> Result<ModelResponse, ModelError> {
            Ok(ModelResponse { text: Some(reply.to_string()), function_calls: Vec::new() })
        }

        fn call(name: &str, arguments: serde_json::Value) -> Result<ModelResponse, ModelError> {
            Ok(ModelResponse {
                text: Some("One moment...".to_string()),
                function_calls: vec![FunctionCall { name: name.to_string(), arguments }],
            })
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        async fn generate(&self, _request: ModelRequest) -> Result<ModelResponse, ModelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .expect("script lock")
                .pop_front()
                .unwrap_or_else(|| ScriptedModel::text("(script exhausted)"))
        }
    }

    struct Harness {
        secretary: Secretary,
        tenants: Arc<InMemoryTenantRepository>,
        leads: Arc<InMemoryLeadRepository>,
        meetings: Arc<InMemoryMeetingRepository>,
        model: Arc<ScriptedModel>,
    }

    fn tenant(usage: i64, limit: i64) -> Tenant {
        Tenant {
            id: TenantId("t-1".to_string()),
            name: "Acme".to_string(),
            email: "owner@acme.test".to_string(),
            tier: SubscriptionTier::Pro,
            ai_usage_limit: limit,
            ai_usage_count: usage,
            calendar_integrations: vec![CalendarIntegration {
                provider: CalendarProviderKind::Google,
                access_token: "token".to_string(),
                refresh_token: None,
                expires_at: None,
            }],
            crm_connected: false,
            created_at: Utc::now(),
        }
    }

    fn profile(enabled: bool) -> Profile {
        Profile {
            id: ProfileId("p-1".to_string()),
            tenant_id: TenantId("t-1".to_string()),
            display_name: "Jane Doe".to_string(),
            title: "CTO".to_string(),
            company: "Acme".to_string(),
            timezone: "America/New_York".to_string(),
            ai_config: AiConfig { enabled, ..AiConfig::default() },
            created_at: Utc::now(),
        }
    }

    async fn harness(
        tenant: Tenant,
        profile: Profile,
        script: Vec<Result<ModelResponse, ModelError>>,
    ) -> Harness {
        let tenants = Arc::new(InMemoryTenantRepository::new());
        tenants.save(tenant).await.expect("save tenant");
        let profiles = Arc::new(InMemoryProfileRepository::new());
        profiles.save(profile).await.expect("save profile");
        let conversations = Arc::new(InMemoryConversationRepository::new());
        let leads = Arc::new(InMemoryLeadRepository::new());
        let meetings = Arc::new(InMemoryMeetingRepository::new());
        let model = Arc::new(ScriptedModel::new(script));

        let secretary = Secretary::new(
            Arc::clone(&tenants) as Arc<dyn cardesk_db::repositories::TenantRepository>,
            Arc::clone(&profiles) as Arc<dyn cardesk_db::repositories::ProfileRepository>,
            Arc::clone(&conversations)
                as Arc<dyn cardesk_db::repositories::ConversationRepository>,
            Arc::clone(&leads) as Arc<dyn cardesk_db::repositories::LeadRepository>,
            Arc::clone(&meetings) as Arc<dyn cardesk_db::repositories::MeetingRepository>,
            Arc::new(NullCalendarGateway),
            Arc::clone(&model) as Arc<dyn LanguageModel>,
            Arc::new(LoggingEscalationNotifier),
            Arc::new(LoggingCrmNotifier),
        );

        Harness { secretary, tenants, leads, meetings, model }
    }

    fn request(message: &str, session: Option<&str>) -> ChatRequest {
        ChatRequest {
            profile_id: ProfileId("p-1".to_string()),
            session_id: session.map(str::to_string),
            message: message.to_string(),
            visitor_info: None,
        }
    }

    async fn usage(harness: &Harness) -> i64 {
        harness
            .tenants
            .find_by_id(&TenantId("t-1".to_string()))
            .await
            .expect("find")
            .expect("present")
            .ai_usage_count
    }

    #[tokio::test]
    async fn plain_turn_replies_and_commits_quota() {
        let h = harness(tenant(0, 50), profile(true), vec![ScriptedModel::text("Hello!")]).await;
        let reply = h.secretary.chat(request("hi", Some("s-1"))).await.expect("chat");

        assert_eq!(reply.reply, "Hello!");
        assert_eq!(reply.session_id, "s-1");
        assert_eq!(reply.state, ConversationStatus::Active);
        assert_eq!(usage(&h).await, 1);
    }

    #[tokio::test]
    async fn missing_session_id_is_generated() {
        let h = harness(tenant(0, 50), profile(true), vec![ScriptedModel::text("Hello!")]).await;
        let reply = h.secretary.chat(request("hi", None)).await.expect("chat");
        assert!(!reply.session_id.is_empty());
    }

    #[tokio::test]
    async fn same_session_resumes_the_same_conversation() {
        let h = harness(
            tenant(0, 50),
            profile(true),
            vec![ScriptedModel::text("Hello!"), ScriptedModel::text("Welcome back!")],
        )
        .await;
        h.secretary.chat(request("hi", Some("s-1"))).await.expect("first turn");
        h.secretary.chat(request("hi again", Some("s-1"))).await.expect("second turn");

        let view = h
            .secretary
            .conversation(&ProfileId("p-1".to_string()), "s-1")
            .await
            .expect("lookup")
            .expect("present");
        // Two user + two assistant messages in one transcript.
        assert_eq!(view.messages.len(), 4);
    }

    #[tokio::test]
    async fn concurrent_turns_for_one_session_serialize() {
        let h = harness(
            tenant(0, 50),
            profile(true),
            vec![ScriptedModel::text("First!"), ScriptedModel::text("Second!")],
        )
        .await;

        // Both turns target the same session; the per-key lock must force one
        // to finish (save + quota commit) before the other loads the
        // conversation.
        let (a, b) = tokio::join!(
            h.secretary.chat(request("hi", Some("s-1"))),
            h.secretary.chat(request("still there?", Some("s-1"))),
        );
        a.expect("first turn");
        b.expect("second turn");

        let view = h
            .secretary
            .conversation(&ProfileId("p-1".to_string()), "s-1")
            .await
            .expect("lookup")
            .expect("present");
        assert_eq!(view.messages.len(), 4);
        assert_eq!(usage(&h).await, 2);
    }

    #[tokio::test]
    async fn exhausted_quota_rejects_before_the_model_is_invoked() {
        let h = harness(tenant(50, 50), profile(true), vec![ScriptedModel::text("nope")]).await;
        let result = h.secretary.chat(request("hi", Some("s-1"))).await;

        assert!(matches!(result, Err(ChatError::QuotaExceeded)));
        assert_eq!(h.model.call_count(), 0);
        assert_eq!(usage(&h).await, 50);
    }

    #[tokio::test]
    async fn disabled_profile_is_rejected() {
        let h = harness(tenant(0, 50), profile(false), vec![]).await;
        let result = h.secretary.chat(request("hi", Some("s-1"))).await;
        assert!(matches!(result, Err(ChatError::AiDisabled)));
    }

    #[tokio::test]
    async fn unknown_profile_is_rejected() {
        let h = harness(tenant(0, 50), profile(true), vec![]).await;
        let result = h
            .secretary
            .chat(ChatRequest {
                profile_id: ProfileId("p-missing".to_string()),
                session_id: Some("s-1".to_string()),
                message: "hi".to_string(),
                visitor_info: None,
            })
            .await;
        assert!(matches!(result, Err(ChatError::ProfileNotFound)));
    }

    #[tokio::test]
    async fn model_failure_consumes_no_quota_and_persists_nothing() {
        let h = harness(
            tenant(0, 50),
            profile(true),
            vec![Err(ModelError::Transport("scripted outage".to_string()))],
        )
        .await;
        let result = h.secretary.chat(request("hi", Some("s-1"))).await;

        assert!(matches!(result, Err(ChatError::Model(_))));
        assert_eq!(usage(&h).await, 0);
        let view = h
            .secretary
            .conversation(&ProfileId("p-1".to_string()), "s-1")
            .await
            .expect("lookup");
        assert!(view.is_none());
    }

    #[tokio::test]
    async fn book_meeting_call_books_and_transitions() {
        let h = harness(
            tenant(0, 50),
            profile(true),
            vec![
                ScriptedModel::call(
                    "bookMeeting",
                    json!({
                        "startTime": "2024-06-10T14:00:00Z",
                        "endTime": "2024-06-10T14:30:00Z",
                        "attendee": { "name": "Sam Visitor", "email": "sam@example.com" }
                    }),
                ),
                ScriptedModel::text("You're booked for Monday 10am!"),
            ],
        )
        .await;

        let reply = h
            .secretary
            .chat(request("yes, book the 10am slot", Some("s-1")))
            .await
            .expect("chat");

        assert_eq!(reply.reply, "You're booked for Monday 10am!");
        assert_eq!(reply.state, ConversationStatus::Booked);
        assert_eq!(h.meetings.count().await, 1);
        assert_eq!(h.leads.count().await, 1);

        let lead_email = {
            let meeting = h
                .secretary
                .conversation(&ProfileId("p-1".to_string()), "s-1")
                .await
                .expect("lookup")
                .expect("present");
            meeting.lead_info.email
        };
        assert_eq!(lead_email.as_deref(), Some("sam@example.com"));
    }

    #[tokio::test]
    async fn retried_booking_call_creates_one_meeting() {
        let args = json!({
            "startTime": "2024-06-10T14:00:00Z",
            "endTime": "2024-06-10T14:30:00Z",
            "attendee": { "name": "Sam Visitor", "email": "sam@example.com" }
        });
        let h = harness(
            tenant(0, 50),
            profile(true),
            vec![
                Ok(ModelResponse {
                    text: Some("Booking...".to_string()),
                    function_calls: vec![
                        FunctionCall { name: "bookMeeting".to_string(), arguments: args.clone() },
                        FunctionCall { name: "bookMeeting".to_string(), arguments: args },
                    ],
                }),
                ScriptedModel::text("Booked."),
                ScriptedModel::text("Still booked."),
            ],
        )
        .await;

        h.secretary.chat(request("book it twice", Some("s-1"))).await.expect("chat");
        assert_eq!(h.meetings.count().await, 1);

        let stored = h.meetings.all().await;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].status, MeetingStatus::Scheduled);
    }

    #[tokio::test]
    async fn escalation_absorbs_and_next_message_starts_fresh() {
        let h = harness(
            tenant(0, 50),
            profile(true),
            vec![
                ScriptedModel::call("escalateToHuman", json!({ "reason": "visitor asked" })),
                ScriptedModel::text("I've handed this to Jane."),
                ScriptedModel::text("Hi! How can I help?"),
            ],
        )
        .await;

        let first = h.secretary.chat(request("human please", Some("s-1"))).await.expect("chat");
        assert_eq!(first.state, ConversationStatus::Escalated);

        // The escalated conversation is not resumable: the next message gets
        // a brand-new transcript.
        let second = h.secretary.chat(request("hello?", Some("s-1"))).await.expect("chat");
        assert_eq!(second.state, ConversationStatus::Active);

        let view = h
            .secretary
            .conversation(&ProfileId("p-1".to_string()), "s-1")
            .await
            .expect("lookup")
            .expect("present");
        assert_eq!(view.messages.len(), 2);
    }

    #[tokio::test]
    async fn unknown_function_yields_structured_error_not_failure() {
        let h = harness(
            tenant(0, 50),
            profile(true),
            vec![
                ScriptedModel::call("deleteEverything", json!({})),
                ScriptedModel::text("Sorry, I can't do that."),
            ],
        )
        .await;

        let reply = h.secretary.chat(request("do something odd", Some("s-1"))).await.expect("chat");
        assert_eq!(reply.reply, "Sorry, I can't do that.");

        let view = h
            .secretary
            .conversation(&ProfileId("p-1".to_string()), "s-1")
            .await
            .expect("lookup")
            .expect("present");
        let record = view
            .messages
            .iter()
            .find_map(|m| m.function_call.as_ref())
            .expect("function record");
        assert_eq!(record.result["success"], false);
    }

    #[tokio::test]
    async fn booking_keywords_with_known_email_qualify_the_lead() {
        let h = harness(
            tenant(0, 50),
            profile(true),
            vec![ScriptedModel::text("Great, let's schedule a meeting for next week.")],
        )
        .await;

        let reply = h
            .secretary
            .chat(ChatRequest {
                profile_id: ProfileId("p-1".to_string()),
                session_id: Some("s-1".to_string()),
                message: "I'd like to meet".to_string(),
                visitor_info: Some(VisitorInfo {
                    name: Some("Sam".to_string()),
                    email: Some("sam@example.com".to_string()),
                    company: None,
                }),
            })
            .await
            .expect("chat");

        assert_eq!(reply.state, ConversationStatus::Qualified);
    }

    #[test]
    fn booking_intent_signal_requires_both_keyword_and_email() {
        assert!(policy::booking_intent_signal("let's book it", true));
        assert!(policy::booking_intent_signal("I'll schedule that", true));
        assert!(!policy::booking_intent_signal("let's book it", false));
        assert!(!policy::booking_intent_signal("nice weather today", true));
    }
}
