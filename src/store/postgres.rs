use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::RefreshStore;
use crate::errors::StoreError;
use crate::models::RefreshRecord;

#[derive(Clone)]
pub struct PgRefreshStore {
    pool: PgPool,
}

impl PgRefreshStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run pending migrations from the migrations/ directory.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl RefreshStore for PgRefreshStore {
    async fn find_by_value(&self, token_value: &str) -> Result<Option<RefreshRecord>, StoreError> {
        let row = sqlx::query_as::<_, RefreshRecord>(
            "SELECT token_value, expiration FROM refresh_tokens WHERE token_value = $1",
        )
        .bind(token_value)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn insert(&self, record: RefreshRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"INSERT INTO refresh_tokens (token_value, expiration)
               VALUES ($1, $2)
               ON CONFLICT (token_value) DO UPDATE SET expiration = EXCLUDED.expiration"#,
        )
        .bind(&record.token_value)
        .bind(record.expiration)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_by_value(&self, token_value: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM refresh_tokens WHERE token_value = $1")
            .bind(token_value)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_expired_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expiration <= $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
