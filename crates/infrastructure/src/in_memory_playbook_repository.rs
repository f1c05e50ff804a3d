use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;
use vaultline_application::{
    PlaybookRepository, PlaybookRun, PlaybookRunDraft, PlaybookRunListQuery,
};
use vaultline_core::{AppError, AppResult, OrgId};
use vaultline_domain::{Playbook, PlaybookId, PlaybookStatus, TriggerKind};

/// In-memory playbook repository implementation.
///
/// Playbooks are kept in insertion order, which is also the evaluation order.
#[derive(Debug, Default)]
pub struct InMemoryPlaybookRepository {
    playbooks: RwLock<Vec<Playbook>>,
    runs: RwLock<Vec<PlaybookRun>>,
}

impl InMemoryPlaybookRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PlaybookRepository for InMemoryPlaybookRepository {
    async fn list_active_playbooks(
        &self,
        org_id: OrgId,
        trigger: TriggerKind,
    ) -> AppResult<Vec<Playbook>> {
        Ok(self
            .playbooks
            .read()
            .await
            .iter()
            .filter(|playbook| {
                playbook.org_id() == org_id && playbook.trigger() == trigger && playbook.is_active()
            })
            .cloned()
            .collect())
    }

    async fn find_playbook_by_name(
        &self,
        org_id: OrgId,
        name: &str,
    ) -> AppResult<Option<Playbook>> {
        Ok(self
            .playbooks
            .read()
            .await
            .iter()
            .find(|playbook| playbook.org_id() == org_id && playbook.name().as_str() == name)
            .cloned())
    }

    async fn insert_playbook(&self, playbook: Playbook) -> AppResult<()> {
        let mut playbooks = self.playbooks.write().await;

        if playbooks.iter().any(|stored| stored.id() == playbook.id()) {
            return Err(AppError::Conflict(format!(
                "playbook '{}' already exists",
                playbook.id()
            )));
        }

        playbooks.push(playbook);
        Ok(())
    }

    async fn set_playbook_status(
        &self,
        org_id: OrgId,
        playbook_id: PlaybookId,
        status: PlaybookStatus,
    ) -> AppResult<()> {
        let mut playbooks = self.playbooks.write().await;
        let playbook = playbooks
            .iter_mut()
            .find(|playbook| playbook.org_id() == org_id && playbook.id() == playbook_id)
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "playbook '{playbook_id}' does not exist for org '{org_id}'"
                ))
            })?;

        playbook.set_status(status);
        Ok(())
    }

    async fn touch_last_run_at(
        &self,
        org_id: OrgId,
        playbook_id: PlaybookId,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut playbooks = self.playbooks.write().await;
        if let Some(playbook) = playbooks
            .iter_mut()
            .find(|playbook| playbook.org_id() == org_id && playbook.id() == playbook_id)
        {
            playbook.set_last_run_at(at);
        }

        Ok(())
    }

    async fn create_run(&self, draft: PlaybookRunDraft) -> AppResult<PlaybookRun> {
        let owned_by_org = self.playbooks.read().await.iter().any(|playbook| {
            playbook.id() == draft.playbook_id && playbook.org_id() == draft.org_id
        });
        if !owned_by_org {
            return Err(AppError::NotFound(format!(
                "playbook '{}' does not exist for org '{}'",
                draft.playbook_id, draft.org_id
            )));
        }

        let created_at = Utc::now();
        let run = PlaybookRun {
            id: Uuid::new_v4(),
            completed_at: draft.completed_at(created_at),
            playbook_id: draft.playbook_id,
            org_id: draft.org_id,
            trigger_event: draft.trigger_event,
            status: draft.status,
            error: draft.error,
            metrics: draft.metrics,
            created_at,
        };

        self.runs.write().await.push(run.clone());
        Ok(run)
    }

    async fn list_runs(
        &self,
        org_id: OrgId,
        query: PlaybookRunListQuery,
    ) -> AppResult<Vec<PlaybookRun>> {
        Ok(self
            .runs
            .read()
            .await
            .iter()
            .rev()
            .filter(|run| run.org_id == org_id)
            .filter(|run| query.playbook_id.is_none_or(|id| run.playbook_id == id))
            .skip(query.offset)
            .take(query.limit)
            .cloned()
            .collect())
    }
}
