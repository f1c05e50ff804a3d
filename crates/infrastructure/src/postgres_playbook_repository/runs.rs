use super::*;

impl PostgresPlaybookRepository {
    pub(super) async fn create_run_impl(&self, draft: PlaybookRunDraft) -> AppResult<PlaybookRun> {
        let created_at = Utc::now();
        let completed_at = draft.completed_at(created_at);
        let playbook_id = draft.playbook_id;
        let org_id = draft.org_id;

        let row = sqlx::query_as::<_, PlaybookRunRow>(
            r#"
            INSERT INTO playbook_runs (
                playbook_id,
                org_id,
                trigger_event,
                status,
                error,
                metrics,
                created_at,
                completed_at
            )
            SELECT $1, $2, $3, $4, $5, $6, $7, $8
            WHERE EXISTS (
                SELECT 1 FROM playbooks WHERE id = $1 AND org_id = $2
            )
            RETURNING
                id,
                playbook_id,
                org_id,
                trigger_event,
                status,
                error,
                metrics,
                created_at,
                completed_at
            "#,
        )
        .bind(playbook_id.as_uuid())
        .bind(org_id.as_uuid())
        .bind(draft.trigger_event)
        .bind(draft.status.as_str())
        .bind(draft.error)
        .bind(draft.metrics)
        .bind(created_at)
        .bind(completed_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to create run for playbook '{playbook_id}' org '{org_id}': {error}"
            ))
        })?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "playbook '{playbook_id}' does not exist for org '{org_id}'"
            ))
        })?;

        playbook_run_from_row(row)
    }

    pub(super) async fn list_runs_impl(
        &self,
        org_id: OrgId,
        query: PlaybookRunListQuery,
    ) -> AppResult<Vec<PlaybookRun>> {
        let rows = sqlx::query_as::<_, PlaybookRunRow>(
            r#"
            SELECT
                id,
                playbook_id,
                org_id,
                trigger_event,
                status,
                error,
                metrics,
                created_at,
                completed_at
            FROM playbook_runs
            WHERE org_id = $1
              AND ($2::UUID IS NULL OR playbook_id = $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(org_id.as_uuid())
        .bind(query.playbook_id.map(|playbook_id| playbook_id.as_uuid()))
        .bind(i64::try_from(query.limit).map_err(|error| {
            AppError::Validation(format!("invalid playbook run list limit: {error}"))
        })?)
        .bind(i64::try_from(query.offset).map_err(|error| {
            AppError::Validation(format!("invalid playbook run list offset: {error}"))
        })?)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to list playbook runs for org '{org_id}': {error}"
            ))
        })?;

        rows.into_iter().map(playbook_run_from_row).collect()
    }
}
