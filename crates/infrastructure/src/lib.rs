//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

use sqlx::PgPool;
use sqlx::migrate::Migrator;
use vaultline_core::{AppError, AppResult};

mod in_memory_collaborators;
mod in_memory_playbook_repository;
mod postgres_activity_log_writer;
mod postgres_playbook_repository;
mod postgres_task_queue;

pub use in_memory_collaborators::{InMemoryActivityLog, InMemoryTaskQueue};
pub use in_memory_playbook_repository::InMemoryPlaybookRepository;
pub use postgres_activity_log_writer::PostgresActivityLogWriter;
pub use postgres_playbook_repository::PostgresPlaybookRepository;
pub use postgres_task_queue::PostgresTaskQueue;

/// Embedded schema migrations for the playbook tables.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Applies pending schema migrations.
pub async fn run_migrations(pool: &PgPool) -> AppResult<()> {
    MIGRATOR
        .run(pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))
}
