use chrono::{DateTime, Utc};
use sqlx::Row;

use cardesk_core::domain::tenant::{
    CalendarIntegration, SubscriptionTier, Tenant, TenantId,
};

use super::{RepositoryError, TenantRepository};
use crate::DbPool;

pub struct SqlTenantRepository {
    pool: DbPool,
}

impl SqlTenantRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn parse_tier(raw: &str) -> SubscriptionTier {
    match raw {
        "pro" => SubscriptionTier::Pro,
        "enterprise" => SubscriptionTier::Enterprise,
        _ => SubscriptionTier::Free,
    }
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("timestamp {raw:?}: {e}")))
}

fn row_to_tenant(row: &sqlx::sqlite::SqliteRow) -> Result<Tenant, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let name: String = row.try_get("name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let email: String =
        row.try_get("email").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let tier: String = row.try_get("tier").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let ai_usage_limit: i64 =
        row.try_get("ai_usage_limit").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let ai_usage_count: i64 =
        row.try_get("ai_usage_count").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let integrations_json: String = row
        .try_get("calendar_integrations")
        .map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let crm_connected: i64 =
        row.try_get("crm_connected").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let calendar_integrations: Vec<CalendarIntegration> =
        serde_json::from_str(&integrations_json)
            .map_err(|e| RepositoryError::Decode(format!("calendar_integrations: {e}")))?;

    Ok(Tenant {
        id: TenantId(id),
        name,
        email,
        tier: parse_tier(&tier),
        ai_usage_limit,
        ai_usage_count,
        calendar_integrations,
        crm_connected: crm_connected != 0,
        created_at: parse_timestamp(&created_at)?,
    })
}

#[async_trait::async_trait]
impl TenantRepository for SqlTenantRepository {
    async fn find_by_id(&self, id: &TenantId) -> Result<Option<Tenant>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, name, email, tier, ai_usage_limit, ai_usage_count,
                    calendar_integrations, crm_connected, created_at
             FROM tenant WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_tenant(r)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, tenant: Tenant) -> Result<(), RepositoryError> {
        let integrations_json = serde_json::to_string(&tenant.calendar_integrations)
            .map_err(|e| RepositoryError::Decode(format!("calendar_integrations: {e}")))?;

        sqlx::query(
            "INSERT INTO tenant (id, name, email, tier, ai_usage_limit, ai_usage_count,
                                 calendar_integrations, crm_connected, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 email = excluded.email,
                 tier = excluded.tier,
                 ai_usage_limit = excluded.ai_usage_limit,
                 calendar_integrations = excluded.calendar_integrations,
                 crm_connected = excluded.crm_connected",
        )
        .bind(&tenant.id.0)
        .bind(&tenant.name)
        .bind(&tenant.email)
        .bind(tenant.tier.as_str())
        .bind(tenant.ai_usage_limit)
        .bind(tenant.ai_usage_count)
        .bind(integrations_json)
        .bind(i64::from(tenant.crm_connected))
        .bind(tenant.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn increment_ai_usage(&self, id: &TenantId) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE tenant SET ai_usage_count = ai_usage_count + 1 WHERE id = ?")
                .bind(&id.0)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("tenant {}", id.0)));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use cardesk_core::domain::tenant::{
        CalendarIntegration, CalendarProviderKind, SubscriptionTier, Tenant, TenantId,
    };

    use super::SqlTenantRepository;
    use crate::repositories::TenantRepository;
    use crate::{connect_with_settings, migrations};

    fn tenant_fixture() -> Tenant {
        Tenant {
            id: TenantId("t-1".to_string()),
            name: "Acme".to_string(),
            email: "owner@acme.test".to_string(),
            tier: SubscriptionTier::Pro,
            ai_usage_limit: 100,
            ai_usage_count: 0,
            calendar_integrations: vec![CalendarIntegration {
                provider: CalendarProviderKind::Google,
                access_token: "g-token".to_string(),
                refresh_token: Some("g-refresh".to_string()),
                expires_at: None,
            }],
            crm_connected: false,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn save_and_find_round_trip() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");
        let repo = SqlTenantRepository::new(pool.clone());

        let tenant = tenant_fixture();
        repo.save(tenant.clone()).await.expect("save");
        let found = repo.find_by_id(&tenant.id).await.expect("find").expect("present");

        assert_eq!(found.email, tenant.email);
        assert_eq!(found.tier, SubscriptionTier::Pro);
        assert_eq!(found.calendar_integrations.len(), 1);
        assert_eq!(found.calendar_integrations[0].provider, CalendarProviderKind::Google);

        pool.close().await;
    }

    #[tokio::test]
    async fn usage_increment_is_atomic_under_concurrency() {
        let pool =
            connect_with_settings("sqlite::memory:?cache=shared", 4, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");
        let repo = std::sync::Arc::new(SqlTenantRepository::new(pool.clone()));
        repo.save(tenant_fixture()).await.expect("save");

        let mut handles = Vec::new();
        for _ in 0..20 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                repo.increment_ai_usage(&TenantId("t-1".to_string())).await
            }));
        }
        for handle in handles {
            handle.await.expect("join").expect("increment");
        }

        let tenant = repo
            .find_by_id(&TenantId("t-1".to_string()))
            .await
            .expect("find")
            .expect("present");
        assert_eq!(tenant.ai_usage_count, 20);

        pool.close().await;
    }

    #[tokio::test]
    async fn malformed_timestamp_is_a_decode_error() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");
        sqlx::query(
            "INSERT INTO tenant (id, name, email, created_at)
             VALUES ('t-bad', 'Acme', 'owner@acme.test', 'yesterday-ish')",
        )
        .execute(&pool)
        .await
        .expect("seed tenant");

        let repo = SqlTenantRepository::new(pool.clone());
        let result = repo.find_by_id(&TenantId("t-bad".to_string())).await;
        assert!(matches!(result, Err(crate::repositories::RepositoryError::Decode(_))));

        pool.close().await;
    }

    #[tokio::test]
    async fn incrementing_missing_tenant_is_reported() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");
        let repo = SqlTenantRepository::new(pool.clone());

        let result = repo.increment_ai_usage(&TenantId("nobody".to_string())).await;
        assert!(result.is_err());

        pool.close().await;
    }
}
