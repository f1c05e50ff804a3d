use async_trait::async_trait;
use sqlx::PgPool;
use vaultline_application::{NewTask, TaskQueue};
use vaultline_core::{AppError, AppResult};

/// PostgreSQL-backed task queue. Rows are inserted as `pending`.
#[derive(Clone)]
pub struct PostgresTaskQueue {
    pool: PgPool,
}

impl PostgresTaskQueue {
    /// Creates a task queue with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskQueue for PostgresTaskQueue {
    async fn enqueue_task(&self, task: NewTask) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO tasks (org_id, task_type, status, source_playbook_id, metadata)
            VALUES ($1, $2, 'pending', $3, $4)
            "#,
        )
        .bind(task.org_id.as_uuid())
        .bind(task.task_type.as_str())
        .bind(task.source_playbook_id.map(|playbook_id| playbook_id.as_uuid()))
        .bind(task.metadata)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to enqueue task '{}' for org '{}': {error}",
                task.task_type, task.org_id
            ))
        })?;

        Ok(())
    }
}
