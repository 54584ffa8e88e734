use sqlx::Row;

use cardesk_core::domain::profile::{AiConfig, Profile, ProfileId};
use cardesk_core::domain::tenant::TenantId;

use super::tenant::parse_timestamp;
use super::{ProfileRepository, RepositoryError};
use crate::DbPool;

pub struct SqlProfileRepository {
    pool: DbPool,
}

impl SqlProfileRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_profile(row: &sqlx::sqlite::SqliteRow) -> Result<Profile, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let tenant_id: String =
        row.try_get("tenant_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let display_name: String =
        row.try_get("display_name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let title: String =
        row.try_get("title").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let company: String =
        row.try_get("company").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let timezone: String =
        row.try_get("timezone").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let ai_enabled: i64 =
        row.try_get("ai_enabled").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let ai_personality: String =
        row.try_get("ai_personality").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let ai_greeting: String =
        row.try_get("ai_greeting").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let questions_json: String = row
        .try_get("ai_qualification_questions")
        .map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let ai_auto_booking: i64 =
        row.try_get("ai_auto_booking").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let qualification_questions: Vec<String> = serde_json::from_str(&questions_json)
        .map_err(|e| RepositoryError::Decode(format!("ai_qualification_questions: {e}")))?;

    Ok(Profile {
        id: ProfileId(id),
        tenant_id: TenantId(tenant_id),
        display_name,
        title,
        company,
        timezone,
        ai_config: AiConfig {
            enabled: ai_enabled != 0,
            personality: ai_personality,
            greeting: ai_greeting,
            qualification_questions,
            auto_booking: ai_auto_booking != 0,
        },
        created_at: parse_timestamp(&created_at)?,
    })
}

#[async_trait::async_trait]
impl ProfileRepository for SqlProfileRepository {
    async fn find_by_id(&self, id: &ProfileId) -> Result<Option<Profile>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, tenant_id, display_name, title, company, timezone,
                    ai_enabled, ai_personality, ai_greeting,
                    ai_qualification_questions, ai_auto_booking, created_at
             FROM profile WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_profile(r)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, profile: Profile) -> Result<(), RepositoryError> {
        let questions_json = serde_json::to_string(&profile.ai_config.qualification_questions)
            .map_err(|e| RepositoryError::Decode(format!("ai_qualification_questions: {e}")))?;

        sqlx::query(
            "INSERT INTO profile (id, tenant_id, display_name, title, company, timezone,
                                  ai_enabled, ai_personality, ai_greeting,
                                  ai_qualification_questions, ai_auto_booking, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 display_name = excluded.display_name,
                 title = excluded.title,
                 company = excluded.company,
                 timezone = excluded.timezone,
                 ai_enabled = excluded.ai_enabled,
                 ai_personality = excluded.ai_personality,
                 ai_greeting = excluded.ai_greeting,
                 ai_qualification_questions = excluded.ai_qualification_questions,
                 ai_auto_booking = excluded.ai_auto_booking",
        )
        .bind(&profile.id.0)
        .bind(&profile.tenant_id.0)
        .bind(&profile.display_name)
        .bind(&profile.title)
        .bind(&profile.company)
        .bind(&profile.timezone)
        .bind(i64::from(profile.ai_config.enabled))
        .bind(&profile.ai_config.personality)
        .bind(&profile.ai_config.greeting)
        .bind(questions_json)
        .bind(i64::from(profile.ai_config.auto_booking))
        .bind(profile.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
