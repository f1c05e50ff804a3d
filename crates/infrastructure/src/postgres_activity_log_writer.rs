use async_trait::async_trait;
use sqlx::PgPool;
use vaultline_application::{ActivityLogEntry, ActivityLogWriter};
use vaultline_core::{AppError, AppResult};

/// PostgreSQL-backed activity log writer.
#[derive(Clone)]
pub struct PostgresActivityLogWriter {
    pool: PgPool,
}

impl PostgresActivityLogWriter {
    /// Creates an activity log writer with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityLogWriter for PostgresActivityLogWriter {
    async fn append_activity(&self, entry: ActivityLogEntry) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO activity_log (org_id, activity_type, feature, category, metadata)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(entry.org_id.as_uuid())
        .bind(entry.activity_type.as_str())
        .bind(entry.feature)
        .bind(entry.category)
        .bind(entry.metadata)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to append activity '{}' for org '{}': {error}",
                entry.activity_type, entry.org_id
            ))
        })?;

        Ok(())
    }
}
