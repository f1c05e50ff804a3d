use async_trait::async_trait;
use chrono::{DateTime, Utc};
use vaultline_core::{AppResult, OrgId};
use vaultline_domain::{Playbook, PlaybookId, PlaybookStatus, TriggerKind};

use super::runs::{PlaybookRun, PlaybookRunDraft, PlaybookRunListQuery};

/// Repository port for playbook definitions and run history.
#[async_trait]
pub trait PlaybookRepository: Send + Sync {
    /// Lists active playbooks of one organization subscribed to a trigger.
    async fn list_active_playbooks(
        &self,
        org_id: OrgId,
        trigger: TriggerKind,
    ) -> AppResult<Vec<Playbook>>;

    /// Returns one playbook by name within an organization.
    async fn find_playbook_by_name(
        &self,
        org_id: OrgId,
        name: &str,
    ) -> AppResult<Option<Playbook>>;

    /// Inserts one playbook definition.
    async fn insert_playbook(&self, playbook: Playbook) -> AppResult<()>;

    /// Updates the lifecycle status of one playbook.
    async fn set_playbook_status(
        &self,
        org_id: OrgId,
        playbook_id: PlaybookId,
        status: PlaybookStatus,
    ) -> AppResult<()>;

    /// Records the advisory last run timestamp of one playbook.
    async fn touch_last_run_at(
        &self,
        org_id: OrgId,
        playbook_id: PlaybookId,
        at: DateTime<Utc>,
    ) -> AppResult<()>;

    /// Persists one run. `completed_at` is set iff the draft status is terminal.
    async fn create_run(&self, draft: PlaybookRunDraft) -> AppResult<PlaybookRun>;

    /// Lists runs of one organization, newest first.
    async fn list_runs(
        &self,
        org_id: OrgId,
        query: PlaybookRunListQuery,
    ) -> AppResult<Vec<PlaybookRun>>;
}
