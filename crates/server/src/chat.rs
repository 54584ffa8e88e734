//! Public chat API: the widget-facing turn endpoint and transcript lookup.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use cardesk_agent::{ChatError, ChatRequest, Secretary, VisitorInfo};
use cardesk_core::domain::conversation::Message;
use cardesk_core::domain::profile::ProfileId;

#[derive(Clone)]
pub struct ApiState {
    secretary: Arc<Secretary>,
}

pub fn router(secretary: Arc<Secretary>) -> Router {
    Router::new()
        .route("/api/ai/chat", post(chat))
        .route("/api/ai/conversation/{profile_id}/{session_id}", get(conversation))
        .with_state(ApiState { secretary })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VisitorInfoBody {
    name: Option<String>,
    email: Option<String>,
    company: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatBody {
    profile_id: String,
    session_id: Option<String>,
    message: String,
    visitor_info: Option<VisitorInfoBody>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatResponseBody {
    reply: String,
    session_id: String,
    state: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

async fn chat(
    State(state): State<ApiState>,
    Json(body): Json<ChatBody>,
) -> Result<Json<ChatResponseBody>, (StatusCode, Json<ErrorBody>)> {
    let request = ChatRequest {
        profile_id: ProfileId(body.profile_id),
        session_id: body.session_id,
        message: body.message,
        visitor_info: body.visitor_info.map(|v| VisitorInfo {
            name: v.name,
            email: v.email,
            company: v.company,
        }),
    };

    match state.secretary.chat(request).await {
        Ok(reply) => {
            info!(
                event_name = "api.chat.turn_completed",
                session_id = %reply.session_id,
                state = reply.state.as_str(),
                "chat turn completed"
            );
            Ok(Json(ChatResponseBody {
                reply: reply.reply,
                session_id: reply.session_id,
                state: reply.state.as_str().to_string(),
            }))
        }
        Err(error) => Err(map_chat_error(error)),
    }
}

fn map_chat_error(error: ChatError) -> (StatusCode, Json<ErrorBody>) {
    let (status, message) = match &error {
        ChatError::EmptyMessage => (StatusCode::BAD_REQUEST, error.to_string()),
        ChatError::ProfileNotFound => (StatusCode::NOT_FOUND, error.to_string()),
        ChatError::AiDisabled => (StatusCode::FORBIDDEN, error.to_string()),
        ChatError::QuotaExceeded => (
            StatusCode::TOO_MANY_REQUESTS,
            "AI usage quota exceeded. Please upgrade your plan.".to_string(),
        ),
        ChatError::Model(_) => {
            (StatusCode::BAD_GATEWAY, "Failed to get AI response".to_string())
        }
        ChatError::Repository(_) | ChatError::Domain(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
        }
    };

    if status.is_server_error() {
        error!(event_name = "api.chat.turn_failed", error = %error, "chat turn failed");
    }

    (status, Json(ErrorBody { error: message }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MessageBody {
    role: String,
    content: String,
    timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LeadInfoBody {
    name: Option<String>,
    company: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    intent: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConversationBody {
    session_id: String,
    status: String,
    messages: Vec<MessageBody>,
    lead_info: LeadInfoBody,
}

fn message_body(message: &Message) -> MessageBody {
    MessageBody {
        role: message.role.as_str().to_string(),
        content: message.content.clone(),
        timestamp: message.timestamp.to_rfc3339(),
    }
}

async fn conversation(
    State(state): State<ApiState>,
    Path((profile_id, session_id)): Path<(String, String)>,
) -> Result<Json<ConversationBody>, (StatusCode, Json<ErrorBody>)> {
    let found = state
        .secretary
        .conversation(&ProfileId(profile_id), &session_id)
        .await
        .map_err(map_chat_error)?;

    match found {
        Some(view) => Ok(Json(ConversationBody {
            session_id: view.session_id,
            status: view.status.as_str().to_string(),
            messages: view.messages.iter().map(message_body).collect(),
            lead_info: LeadInfoBody {
                name: view.lead_info.name,
                company: view.lead_info.company,
                email: view.lead_info.email,
                phone: view.lead_info.phone,
                intent: view.lead_info.intent,
            },
        })),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorBody { error: "conversation not found".to_string() }),
        )),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::Utc;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use cardesk_agent::{
        LanguageModel, LoggingCrmNotifier, LoggingEscalationNotifier, ModelError, ModelRequest,
        ModelResponse, NullCalendarGateway, Secretary,
    };
    use cardesk_core::domain::profile::{AiConfig, Profile, ProfileId};
    use cardesk_core::domain::tenant::{SubscriptionTier, Tenant, TenantId};
    use cardesk_db::repositories::{
        InMemoryConversationRepository, InMemoryLeadRepository, InMemoryMeetingRepository,
        InMemoryProfileRepository, InMemoryTenantRepository, ProfileRepository, TenantRepository,
    };

    struct FixedModel {
        reply: &'static str,
    }

    #[async_trait]
    impl LanguageModel for FixedModel {
        async fn generate(&self, _request: ModelRequest) -> Result<ModelResponse, ModelError> {
            Ok(ModelResponse { text: Some(self.reply.to_string()), function_calls: Vec::new() })
        }
    }

    async fn router(usage: i64, limit: i64, enabled: bool) -> axum::Router {
        let tenants = Arc::new(InMemoryTenantRepository::new());
        tenants
            .save(Tenant {
                id: TenantId("t-1".to_string()),
                name: "Acme".to_string(),
                email: "owner@acme.test".to_string(),
                tier: SubscriptionTier::Free,
                ai_usage_limit: limit,
                ai_usage_count: usage,
                calendar_integrations: Vec::new(),
                crm_connected: false,
                created_at: Utc::now(),
            })
            .await
            .expect("save tenant");
        let profiles = Arc::new(InMemoryProfileRepository::new());
        profiles
            .save(Profile {
                id: ProfileId("p-1".to_string()),
                tenant_id: TenantId("t-1".to_string()),
                display_name: "Jane Doe".to_string(),
                title: "CTO".to_string(),
                company: "Acme".to_string(),
                timezone: "America/New_York".to_string(),
                ai_config: AiConfig { enabled, ..AiConfig::default() },
                created_at: Utc::now(),
            })
            .await
            .expect("save profile");

        let secretary = Arc::new(Secretary::new(
            tenants,
            profiles,
            Arc::new(InMemoryConversationRepository::new()),
            Arc::new(InMemoryLeadRepository::new()),
            Arc::new(InMemoryMeetingRepository::new()),
            Arc::new(NullCalendarGateway),
            Arc::new(FixedModel { reply: "Hello there!" }),
            Arc::new(LoggingEscalationNotifier),
            Arc::new(LoggingCrmNotifier),
        ));

        super::router(secretary)
    }

    async fn post_chat(router: axum::Router, body: Value) -> (StatusCode, Value) {
        let response = router
            .oneshot(
                Request::post("/api/ai/chat")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .expect("request"),
            )
            .await
            .expect("response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        (status, serde_json::from_slice(&bytes).expect("json"))
    }

    #[tokio::test]
    async fn chat_turn_returns_reply_session_and_state() {
        let (status, body) = post_chat(
            router(0, 50, true).await,
            json!({ "profileId": "p-1", "sessionId": "s-1", "message": "hi" }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reply"], "Hello there!");
        assert_eq!(body["sessionId"], "s-1");
        assert_eq!(body["state"], "active");
    }

    #[tokio::test]
    async fn quota_exhaustion_maps_to_429_with_a_distinct_message() {
        let (status, body) = post_chat(
            router(50, 50, true).await,
            json!({ "profileId": "p-1", "sessionId": "s-1", "message": "hi" }),
        )
        .await;

        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert!(body["error"].as_str().expect("error").contains("quota"));
    }

    #[tokio::test]
    async fn disabled_profile_maps_to_403() {
        let (status, _) = post_chat(
            router(0, 50, false).await,
            json!({ "profileId": "p-1", "sessionId": "s-1", "message": "hi" }),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn unknown_profile_maps_to_404() {
        let (status, _) = post_chat(
            router(0, 50, true).await,
            json!({ "profileId": "p-missing", "sessionId": "s-1", "message": "hi" }),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn empty_message_maps_to_400() {
        let (status, _) = post_chat(
            router(0, 50, true).await,
            json!({ "profileId": "p-1", "sessionId": "s-1", "message": "   " }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn conversation_lookup_round_trips_after_a_turn() {
        let router = router(0, 50, true).await;
        let (status, _) = post_chat(
            router.clone(),
            json!({ "profileId": "p-1", "sessionId": "s-1", "message": "hi" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let response = router
            .oneshot(
                Request::get("/api/ai/conversation/p-1/s-1")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let body: Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(body["sessionId"], "s-1");
        assert_eq!(body["status"], "active");
        assert_eq!(body["messages"].as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn missing_conversation_maps_to_404() {
        let response = router(0, 50, true)
            .await
            .oneshot(
                Request::get("/api/ai/conversation/p-1/s-unknown")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
