use sqlx::Row;

use cardesk_core::domain::conversation::ConversationId;
use cardesk_core::domain::lead::{CrmSyncStatus, Lead, LeadId, LeadSource, LeadStatus};
use cardesk_core::domain::profile::ProfileId;
use cardesk_core::domain::tenant::TenantId;

use super::tenant::parse_timestamp;
use super::{LeadRepository, RepositoryError};
use crate::DbPool;

pub struct SqlLeadRepository {
    pool: DbPool,
}

impl SqlLeadRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn parse_source(raw: &str) -> LeadSource {
    match raw {
        "qr" => LeadSource::Qr,
        "nfc" => LeadSource::Nfc,
        "link" => LeadSource::Link,
        _ => LeadSource::Chat,
    }
}

fn parse_status(raw: &str) -> LeadStatus {
    match raw {
        "contacted" => LeadStatus::Contacted,
        "qualified" => LeadStatus::Qualified,
        "converted" => LeadStatus::Converted,
        "lost" => LeadStatus::Lost,
        _ => LeadStatus::New,
    }
}

fn row_to_lead(row: &sqlx::sqlite::SqliteRow) -> Result<Lead, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let tenant_id: String =
        row.try_get("tenant_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let profile_id: String =
        row.try_get("profile_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let conversation_id: Option<String> =
        row.try_get("conversation_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let source: String =
        row.try_get("source").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let status: String =
        row.try_get("status").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let crm_last_sync: Option<String> =
        row.try_get("crm_last_sync_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(Lead {
        id: LeadId(id),
        tenant_id: TenantId(tenant_id),
        profile_id: ProfileId(profile_id),
        conversation_id: conversation_id.map(ConversationId),
        name: row.try_get("name").map_err(|e| RepositoryError::Decode(e.to_string()))?,
        email: row.try_get("email").map_err(|e| RepositoryError::Decode(e.to_string()))?,
        phone: row.try_get("phone").map_err(|e| RepositoryError::Decode(e.to_string()))?,
        company: row.try_get("company").map_err(|e| RepositoryError::Decode(e.to_string()))?,
        intent: row.try_get("intent").map_err(|e| RepositoryError::Decode(e.to_string()))?,
        source: parse_source(&source),
        status: parse_status(&status),
        notes: row.try_get("notes").map_err(|e| RepositoryError::Decode(e.to_string()))?,
        crm_sync: CrmSyncStatus {
            synced: row
                .try_get::<i64, _>("crm_synced")
                .map_err(|e| RepositoryError::Decode(e.to_string()))?
                != 0,
            contact_id: row
                .try_get("crm_contact_id")
                .map_err(|e| RepositoryError::Decode(e.to_string()))?,
            crm_lead_id: row
                .try_get("crm_lead_id")
                .map_err(|e| RepositoryError::Decode(e.to_string()))?,
            last_sync_at: crm_last_sync.as_deref().map(parse_timestamp).transpose()?,
            error: row
                .try_get("crm_error")
                .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        },
        created_at: parse_timestamp(&created_at)?,
    })
}

#[async_trait::async_trait]
impl LeadRepository for SqlLeadRepository {
    async fn find_by_id(&self, id: &LeadId) -> Result<Option<Lead>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, tenant_id, profile_id, conversation_id, name, email, phone, company,
                    intent, source, status, notes, crm_synced, crm_contact_id, crm_lead_id,
                    crm_last_sync_at, crm_error, created_at
             FROM lead WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_lead).transpose()
    }

    async fn save(&self, lead: Lead) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO lead (id, tenant_id, profile_id, conversation_id, name, email, phone,
                               company, intent, source, status, notes, crm_synced,
                               crm_contact_id, crm_lead_id, crm_last_sync_at, crm_error,
                               created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 email = excluded.email,
                 phone = excluded.phone,
                 company = excluded.company,
                 intent = excluded.intent,
                 status = excluded.status,
                 notes = excluded.notes,
                 crm_synced = excluded.crm_synced,
                 crm_contact_id = excluded.crm_contact_id,
                 crm_lead_id = excluded.crm_lead_id,
                 crm_last_sync_at = excluded.crm_last_sync_at,
                 crm_error = excluded.crm_error",
        )
        .bind(&lead.id.0)
        .bind(&lead.tenant_id.0)
        .bind(&lead.profile_id.0)
        .bind(lead.conversation_id.as_ref().map(|id| id.0.clone()))
        .bind(&lead.name)
        .bind(&lead.email)
        .bind(&lead.phone)
        .bind(&lead.company)
        .bind(&lead.intent)
        .bind(lead.source.as_str())
        .bind(lead.status.as_str())
        .bind(&lead.notes)
        .bind(lead.crm_sync.synced as i64)
        .bind(lead.crm_sync.contact_id)
        .bind(lead.crm_sync.crm_lead_id)
        .bind(lead.crm_sync.last_sync_at.map(|ts| ts.to_rfc3339()))
        .bind(&lead.crm_sync.error)
        .bind(lead.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
