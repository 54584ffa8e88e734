use sqlx::Row;

use cardesk_core::domain::conversation::{
    BookingResult, Conversation, ConversationId, ConversationStatus, FunctionCallRecord, LeadInfo,
    Message, MessageRole,
};
use cardesk_core::domain::meeting::MeetingId;
use cardesk_core::domain::profile::ProfileId;
use cardesk_core::domain::tenant::TenantId;

use super::tenant::parse_timestamp;
use super::{ConversationRepository, RepositoryError};
use crate::DbPool;

pub struct SqlConversationRepository {
    pool: DbPool,
}

impl SqlConversationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn hydrate(
        &self,
        row: &sqlx::sqlite::SqliteRow,
    ) -> Result<Conversation, RepositoryError> {
        let mut conversation = row_to_conversation(row)?;
        conversation.messages = self.load_messages(&conversation.id).await?;
        Ok(conversation)
    }

    async fn load_messages(
        &self,
        id: &ConversationId,
    ) -> Result<Vec<Message>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT role, content, timestamp, function_name, function_arguments, function_result
             FROM conversation_message WHERE conversation_id = ? ORDER BY seq ASC",
        )
        .bind(&id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_message).collect()
    }
}

fn parse_status(raw: &str) -> ConversationStatus {
    match raw {
        "qualified" => ConversationStatus::Qualified,
        "booked" => ConversationStatus::Booked,
        "escalated" => ConversationStatus::Escalated,
        "closed" => ConversationStatus::Closed,
        _ => ConversationStatus::Active,
    }
}

fn parse_role(raw: &str) -> MessageRole {
    match raw {
        "system" => MessageRole::System,
        "assistant" => MessageRole::Assistant,
        "function" => MessageRole::Function,
        _ => MessageRole::User,
    }
}

fn row_to_conversation(row: &sqlx::sqlite::SqliteRow) -> Result<Conversation, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let tenant_id: String =
        row.try_get("tenant_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let profile_id: String =
        row.try_get("profile_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let visitor_id: String =
        row.try_get("visitor_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let status: String =
        row.try_get("status").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let meeting_id: Option<String> =
        row.try_get("meeting_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let booked_at: Option<String> =
        row.try_get("booked_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let updated_at: String =
        row.try_get("updated_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let lead_info = LeadInfo {
        name: row.try_get("lead_name").map_err(|e| RepositoryError::Decode(e.to_string()))?,
        company: row
            .try_get("lead_company")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        email: row.try_get("lead_email").map_err(|e| RepositoryError::Decode(e.to_string()))?,
        phone: row.try_get("lead_phone").map_err(|e| RepositoryError::Decode(e.to_string()))?,
        intent: row.try_get("lead_intent").map_err(|e| RepositoryError::Decode(e.to_string()))?,
    };

    let booking = match (meeting_id, booked_at) {
        (Some(meeting_id), Some(booked_at)) => Some(BookingResult {
            meeting_id: MeetingId(meeting_id),
            booked_at: parse_timestamp(&booked_at)?,
        }),
        _ => None,
    };

    Ok(Conversation {
        id: ConversationId(id),
        tenant_id: TenantId(tenant_id),
        profile_id: ProfileId(profile_id),
        visitor_id,
        messages: Vec::new(),
        lead_info,
        status: parse_status(&status),
        booking,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

fn row_to_message(row: &sqlx::sqlite::SqliteRow) -> Result<Message, RepositoryError> {
    let role: String = row.try_get("role").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let content: String =
        row.try_get("content").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let timestamp: String =
        row.try_get("timestamp").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let function_name: Option<String> =
        row.try_get("function_name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let function_arguments: Option<String> =
        row.try_get("function_arguments").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let function_result: Option<String> =
        row.try_get("function_result").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let function_call = match function_name {
        Some(name) => {
            let arguments = function_arguments
                .as_deref()
                .map(serde_json::from_str)
                .transpose()
                .map_err(|e| RepositoryError::Decode(format!("function_arguments: {e}")))?
                .unwrap_or(serde_json::Value::Null);
            let result = function_result
                .as_deref()
                .map(serde_json::from_str)
                .transpose()
                .map_err(|e| RepositoryError::Decode(format!("function_result: {e}")))?
                .unwrap_or(serde_json::Value::Null);
            Some(FunctionCallRecord { name, arguments, result })
        }
        None => None,
    };

    Ok(Message {
        role: parse_role(&role),
        content,
        timestamp: parse_timestamp(&timestamp)?,
        function_call,
    })
}

#[async_trait::async_trait]
impl ConversationRepository for SqlConversationRepository {
    async fn find_resumable(
        &self,
        profile_id: &ProfileId,
        visitor_id: &str,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, tenant_id, profile_id, visitor_id, lead_name, lead_company,
                    lead_email, lead_phone, lead_intent, status, meeting_id, booked_at,
                    created_at, updated_at
             FROM conversation
             WHERE profile_id = ? AND visitor_id = ? AND status IN ('active', 'qualified')
             ORDER BY created_at DESC LIMIT 1",
        )
        .bind(&profile_id.0)
        .bind(visitor_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(self.hydrate(r).await?)),
            None => Ok(None),
        }
    }

    async fn find_by_visitor(
        &self,
        profile_id: &ProfileId,
        visitor_id: &str,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, tenant_id, profile_id, visitor_id, lead_name, lead_company,
                    lead_email, lead_phone, lead_intent, status, meeting_id, booked_at,
                    created_at, updated_at
             FROM conversation
             WHERE profile_id = ? AND visitor_id = ?
             ORDER BY created_at DESC LIMIT 1",
        )
        .bind(&profile_id.0)
        .bind(visitor_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(self.hydrate(r).await?)),
            None => Ok(None),
        }
    }

    async fn find_by_id(
        &self,
        id: &ConversationId,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, tenant_id, profile_id, visitor_id, lead_name, lead_company,
                    lead_email, lead_phone, lead_intent, status, meeting_id, booked_at,
                    created_at, updated_at
             FROM conversation WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(self.hydrate(r).await?)),
            None => Ok(None),
        }
    }

    async fn save(&self, conversation: Conversation) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO conversation (id, tenant_id, profile_id, visitor_id, lead_name,
                                       lead_company, lead_email, lead_phone, lead_intent,
                                       status, meeting_id, booked_at, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 lead_name = excluded.lead_name,
                 lead_company = excluded.lead_company,
                 lead_email = excluded.lead_email,
                 lead_phone = excluded.lead_phone,
                 lead_intent = excluded.lead_intent,
                 status = excluded.status,
                 meeting_id = excluded.meeting_id,
                 booked_at = excluded.booked_at,
                 updated_at = excluded.updated_at",
        )
        .bind(&conversation.id.0)
        .bind(&conversation.tenant_id.0)
        .bind(&conversation.profile_id.0)
        .bind(&conversation.visitor_id)
        .bind(&conversation.lead_info.name)
        .bind(&conversation.lead_info.company)
        .bind(&conversation.lead_info.email)
        .bind(&conversation.lead_info.phone)
        .bind(&conversation.lead_info.intent)
        .bind(conversation.status.as_str())
        .bind(conversation.booking.as_ref().map(|b| b.meeting_id.0.clone()))
        .bind(conversation.booking.as_ref().map(|b| b.booked_at.to_rfc3339()))
        .bind(conversation.created_at.to_rfc3339())
        .bind(conversation.updated_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        // Transcript entries are append-only; re-inserting by (id, seq) is a
        // no-op for rows already stored.
        for (seq, message) in conversation.messages.iter().enumerate() {
            let (function_name, function_arguments, function_result) =
                match &message.function_call {
                    Some(record) => (
                        Some(record.name.clone()),
                        Some(record.arguments.to_string()),
                        Some(record.result.to_string()),
                    ),
                    None => (None, None, None),
                };

            sqlx::query(
                "INSERT INTO conversation_message (conversation_id, seq, role, content,
                                                   timestamp, function_name,
                                                   function_arguments, function_result)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT(conversation_id, seq) DO NOTHING",
            )
            .bind(&conversation.id.0)
            .bind(seq as i64)
            .bind(message.role.as_str())
            .bind(&message.content)
            .bind(message.timestamp.to_rfc3339())
            .bind(function_name)
            .bind(function_arguments)
            .bind(function_result)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use cardesk_core::domain::conversation::{
        Conversation, ConversationId, ConversationStatus, MessageRole,
    };
    use cardesk_core::domain::profile::ProfileId;
    use cardesk_core::domain::tenant::TenantId;

    use super::SqlConversationRepository;
    use crate::repositories::ConversationRepository;
    use crate::{connect_with_settings, migrations};

    fn conversation_fixture(id: &str, visitor: &str) -> Conversation {
        Conversation::new(
            ConversationId(id.to_string()),
            TenantId("t-1".to_string()),
            ProfileId("p-1".to_string()),
            visitor.to_string(),
        )
    }

    async fn pool() -> crate::DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");
        // Referenced rows for the foreign keys.
        sqlx::query(
            "INSERT INTO tenant (id, name, email, created_at)
             VALUES ('t-1', 'Acme', 'owner@acme.test', '2024-01-01T00:00:00Z')",
        )
        .execute(&pool)
        .await
        .expect("seed tenant");
        sqlx::query(
            "INSERT INTO profile (id, tenant_id, display_name, created_at)
             VALUES ('p-1', 't-1', 'Jane Doe', '2024-01-01T00:00:00Z')",
        )
        .execute(&pool)
        .await
        .expect("seed profile");
        pool
    }

    #[tokio::test]
    async fn transcript_round_trips_in_order() {
        let pool = pool().await;
        let repo = SqlConversationRepository::new(pool.clone());

        let mut conversation = conversation_fixture("c-1", "visitor-1");
        conversation.append_message(MessageRole::User, "hello");
        conversation.append_message(MessageRole::Assistant, "hi, how can I help?");
        conversation.append_message(MessageRole::User, "book me in");
        repo.save(conversation.clone()).await.expect("save");

        let found = repo
            .find_by_id(&ConversationId("c-1".to_string()))
            .await
            .expect("find")
            .expect("present");

        assert_eq!(found.messages.len(), 3);
        assert_eq!(found.messages[0].content, "hello");
        assert_eq!(found.messages[2].content, "book me in");
        assert_eq!(found.status, ConversationStatus::Active);

        pool.close().await;
    }

    #[tokio::test]
    async fn resumable_lookup_skips_absorbed_sessions() {
        let pool = pool().await;
        let repo = SqlConversationRepository::new(pool.clone());

        let mut escalated = conversation_fixture("c-old", "visitor-1");
        escalated.transition_to(ConversationStatus::Escalated).expect("escalate");
        repo.save(escalated).await.expect("save escalated");

        let found =
            repo.find_resumable(&ProfileId("p-1".to_string()), "visitor-1").await.expect("query");
        assert!(found.is_none(), "escalated sessions must not be resumed");

        repo.save(conversation_fixture("c-new", "visitor-1")).await.expect("save active");
        let found = repo
            .find_resumable(&ProfileId("p-1".to_string()), "visitor-1")
            .await
            .expect("query")
            .expect("present");
        assert_eq!(found.id.0, "c-new");

        pool.close().await;
    }

    #[tokio::test]
    async fn qualified_sessions_are_resumable() {
        let pool = pool().await;
        let repo = SqlConversationRepository::new(pool.clone());

        let mut conversation = conversation_fixture("c-q", "visitor-2");
        conversation.transition_to(ConversationStatus::Qualified).expect("qualify");
        repo.save(conversation).await.expect("save");

        let found = repo
            .find_resumable(&ProfileId("p-1".to_string()), "visitor-2")
            .await
            .expect("query")
            .expect("present");
        assert_eq!(found.status, ConversationStatus::Qualified);

        pool.close().await;
    }
}
