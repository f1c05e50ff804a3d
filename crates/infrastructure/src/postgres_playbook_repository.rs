use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use tracing::warn;
use vaultline_application::{
    PlaybookRepository, PlaybookRun, PlaybookRunDraft, PlaybookRunListQuery, PlaybookRunStatus,
};
use vaultline_core::{AppError, AppResult, OrgId};
use vaultline_domain::{
    Playbook, PlaybookAction, PlaybookCondition, PlaybookId, PlaybookInput, PlaybookStatus,
    TriggerKind,
};

mod runs;

/// PostgreSQL-backed playbook repository.
#[derive(Clone)]
pub struct PostgresPlaybookRepository {
    pool: PgPool,
}

impl PostgresPlaybookRepository {
    /// Creates a playbook repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PlaybookRow {
    id: uuid::Uuid,
    org_id: uuid::Uuid,
    name: String,
    trigger_type: String,
    conditions: Value,
    actions: Value,
    status: String,
    last_run_at: Option<DateTime<Utc>>,
}

#[derive(Debug, FromRow)]
struct PlaybookRunRow {
    id: uuid::Uuid,
    playbook_id: uuid::Uuid,
    org_id: uuid::Uuid,
    trigger_event: Value,
    status: String,
    error: Option<String>,
    metrics: Value,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

#[async_trait]
impl PlaybookRepository for PostgresPlaybookRepository {
    async fn list_active_playbooks(
        &self,
        org_id: OrgId,
        trigger: TriggerKind,
    ) -> AppResult<Vec<Playbook>> {
        let rows = sqlx::query_as::<_, PlaybookRow>(
            r#"
            SELECT id, org_id, name, trigger_type, conditions, actions, status, last_run_at
            FROM playbooks
            WHERE org_id = $1
              AND trigger_type = $2
              AND status = 'active'
            ORDER BY created_at, id
            "#,
        )
        .bind(org_id.as_uuid())
        .bind(trigger.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to list active playbooks for org '{org_id}' trigger '{trigger}': {error}"
            ))
        })?;

        let mut playbooks = Vec::with_capacity(rows.len());
        for row in rows {
            let playbook_id = row.id;
            match playbook_from_row(row) {
                Ok(playbook) => playbooks.push(playbook),
                Err(error) => warn!(
                    org_id = %org_id,
                    playbook_id = %playbook_id,
                    error = %error,
                    "skipping malformed stored playbook"
                ),
            }
        }

        Ok(playbooks)
    }

    async fn find_playbook_by_name(
        &self,
        org_id: OrgId,
        name: &str,
    ) -> AppResult<Option<Playbook>> {
        let row = sqlx::query_as::<_, PlaybookRow>(
            r#"
            SELECT id, org_id, name, trigger_type, conditions, actions, status, last_run_at
            FROM playbooks
            WHERE org_id = $1 AND name = $2
            ORDER BY created_at, id
            LIMIT 1
            "#,
        )
        .bind(org_id.as_uuid())
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to find playbook '{name}' for org '{org_id}': {error}"
            ))
        })?;

        row.map(playbook_from_row).transpose()
    }

    async fn insert_playbook(&self, playbook: Playbook) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO playbooks (
                id,
                org_id,
                name,
                trigger_type,
                conditions,
                actions,
                status,
                last_run_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(playbook.id().as_uuid())
        .bind(playbook.org_id().as_uuid())
        .bind(playbook.name().as_str())
        .bind(playbook.trigger().as_str())
        .bind(conditions_to_json(playbook.conditions()))
        .bind(actions_to_json(playbook.actions()))
        .bind(playbook.status().as_str())
        .bind(playbook.last_run_at())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to insert playbook '{}' for org '{}': {error}",
                playbook.name(),
                playbook.org_id()
            ))
        })?;

        Ok(())
    }

    async fn set_playbook_status(
        &self,
        org_id: OrgId,
        playbook_id: PlaybookId,
        status: PlaybookStatus,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE playbooks
            SET status = $3, updated_at = now()
            WHERE org_id = $1 AND id = $2
            "#,
        )
        .bind(org_id.as_uuid())
        .bind(playbook_id.as_uuid())
        .bind(status.as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to update status of playbook '{playbook_id}' for org '{org_id}': {error}"
            ))
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "playbook '{playbook_id}' does not exist for org '{org_id}'"
            )));
        }

        Ok(())
    }

    async fn touch_last_run_at(
        &self,
        org_id: OrgId,
        playbook_id: PlaybookId,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE playbooks
            SET last_run_at = $3
            WHERE org_id = $1 AND id = $2
            "#,
        )
        .bind(org_id.as_uuid())
        .bind(playbook_id.as_uuid())
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to update last_run_at of playbook '{playbook_id}' for org '{org_id}': {error}"
            ))
        })?;

        Ok(())
    }

    async fn create_run(&self, draft: PlaybookRunDraft) -> AppResult<PlaybookRun> {
        self.create_run_impl(draft).await
    }

    async fn list_runs(
        &self,
        org_id: OrgId,
        query: PlaybookRunListQuery,
    ) -> AppResult<Vec<PlaybookRun>> {
        self.list_runs_impl(org_id, query).await
    }
}

fn playbook_from_row(row: PlaybookRow) -> AppResult<Playbook> {
    Playbook::new(PlaybookInput {
        id: PlaybookId::from_uuid(row.id),
        org_id: OrgId::from_uuid(row.org_id),
        name: row.name,
        trigger: row.trigger_type.parse()?,
        conditions: json_list(row.conditions, "conditions", PlaybookCondition::try_from)?,
        actions: json_list(row.actions, "actions", PlaybookAction::try_from)?,
        status: row.status.parse()?,
        last_run_at: row.last_run_at,
    })
}

fn json_list<T>(
    value: Value,
    column: &str,
    parse: impl Fn(Value) -> AppResult<T>,
) -> AppResult<Vec<T>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items.into_iter().map(parse).collect(),
        other => Err(AppError::Validation(format!(
            "stored playbook {column} must be a JSON array, got '{other}'"
        ))),
    }
}

fn conditions_to_json(conditions: &[PlaybookCondition]) -> Value {
    Value::Array(conditions.iter().cloned().map(Value::from).collect())
}

fn actions_to_json(actions: &[PlaybookAction]) -> Value {
    Value::Array(actions.iter().cloned().map(Value::from).collect())
}

fn playbook_run_from_row(row: PlaybookRunRow) -> AppResult<PlaybookRun> {
    Ok(PlaybookRun {
        id: row.id,
        playbook_id: PlaybookId::from_uuid(row.playbook_id),
        org_id: OrgId::from_uuid(row.org_id),
        trigger_event: row.trigger_event,
        status: PlaybookRunStatus::parse(row.status.as_str())?,
        error: row.error,
        metrics: row.metrics,
        created_at: row.created_at,
        completed_at: row.completed_at,
    })
}
