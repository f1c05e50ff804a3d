use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use uuid::Uuid;
use vaultline_core::{AppError, AppResult, OrgId};
use vaultline_domain::{
    Playbook, PlaybookAction, PlaybookCondition, PlaybookId, PlaybookInput, PlaybookStatus,
    TriggerKind,
};

use crate::playbook_ports::{
    ActivityLogEntry, ActivityLogWriter, NewTask, PlaybookRepository, PlaybookRun,
    PlaybookRunDraft, PlaybookRunListQuery, TaskQueue,
};

#[derive(Default)]
pub(crate) struct FakePlaybookRepository {
    pub(crate) playbooks: Mutex<Vec<Playbook>>,
    pub(crate) runs: Mutex<Vec<PlaybookRun>>,
    pub(crate) fail_list: bool,
    pub(crate) fail_lookup: bool,
    pub(crate) fail_create_run: bool,
}

#[async_trait]
impl PlaybookRepository for FakePlaybookRepository {
    async fn list_active_playbooks(
        &self,
        org_id: OrgId,
        trigger: TriggerKind,
    ) -> AppResult<Vec<Playbook>> {
        if self.fail_list {
            return Err(AppError::Internal("simulated playbook load failure".to_owned()));
        }

        Ok(self
            .playbooks
            .lock()
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
        if self.fail_lookup {
            return Err(AppError::Internal("simulated playbook lookup failure".to_owned()));
        }

        Ok(self
            .playbooks
            .lock()
            .await
            .iter()
            .find(|playbook| playbook.org_id() == org_id && playbook.name().as_str() == name)
            .cloned())
    }

    async fn insert_playbook(&self, playbook: Playbook) -> AppResult<()> {
        self.playbooks.lock().await.push(playbook);
        Ok(())
    }

    async fn set_playbook_status(
        &self,
        org_id: OrgId,
        playbook_id: PlaybookId,
        status: PlaybookStatus,
    ) -> AppResult<()> {
        let mut playbooks = self.playbooks.lock().await;
        let playbook = playbooks
            .iter_mut()
            .find(|playbook| playbook.org_id() == org_id && playbook.id() == playbook_id)
            .ok_or_else(|| AppError::NotFound(format!("playbook '{playbook_id}' not found")))?;
        playbook.set_status(status);
        Ok(())
    }

    async fn touch_last_run_at(
        &self,
        org_id: OrgId,
        playbook_id: PlaybookId,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut playbooks = self.playbooks.lock().await;
        if let Some(playbook) = playbooks
            .iter_mut()
            .find(|playbook| playbook.org_id() == org_id && playbook.id() == playbook_id)
        {
            playbook.set_last_run_at(at);
        }
        Ok(())
    }

    async fn create_run(&self, draft: PlaybookRunDraft) -> AppResult<PlaybookRun> {
        if self.fail_create_run {
            return Err(AppError::Internal("simulated run insert failure".to_owned()));
        }

        let now = Utc::now();
        let run = PlaybookRun {
            id: Uuid::new_v4(),
            playbook_id: draft.playbook_id,
            org_id: draft.org_id,
            trigger_event: draft.trigger_event.clone(),
            status: draft.status,
            error: draft.error.clone(),
            metrics: draft.metrics.clone(),
            created_at: now,
            completed_at: draft.completed_at(now),
        };
        self.runs.lock().await.push(run.clone());
        Ok(run)
    }

    async fn list_runs(
        &self,
        org_id: OrgId,
        query: PlaybookRunListQuery,
    ) -> AppResult<Vec<PlaybookRun>> {
        Ok(self
            .runs
            .lock()
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

#[derive(Default)]
pub(crate) struct RecordingActivityLog {
    pub(crate) entries: Mutex<Vec<ActivityLogEntry>>,
    pub(crate) failing_types: Vec<String>,
}

#[async_trait]
impl ActivityLogWriter for RecordingActivityLog {
    async fn append_activity(&self, entry: ActivityLogEntry) -> AppResult<()> {
        if self.failing_types.contains(&entry.activity_type) {
            return Err(AppError::Internal(format!(
                "simulated activity log failure for '{}'",
                entry.activity_type
            )));
        }

        self.entries.lock().await.push(entry);
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct RecordingTaskQueue {
    pub(crate) tasks: Mutex<Vec<NewTask>>,
    pub(crate) fail: bool,
}

#[async_trait]
impl TaskQueue for RecordingTaskQueue {
    async fn enqueue_task(&self, task: NewTask) -> AppResult<()> {
        if self.fail {
            return Err(AppError::Internal("simulated task queue failure".to_owned()));
        }

        self.tasks.lock().await.push(task);
        Ok(())
    }
}

pub(crate) fn params(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

pub(crate) fn log_activity(activity_type: &str) -> PlaybookAction {
    PlaybookAction::LogActivity {
        params: params(serde_json::json!({
            "type": activity_type,
            "feature": "contracts",
            "category": "automation",
        })),
    }
}

pub(crate) fn enqueue_task(task_type: &str) -> PlaybookAction {
    PlaybookAction::EnqueueTask {
        params: params(serde_json::json!({"taskType": task_type})),
    }
}

pub(crate) fn playbook(
    org_id: OrgId,
    name: &str,
    trigger: TriggerKind,
    conditions: Vec<PlaybookCondition>,
    actions: Vec<PlaybookAction>,
) -> Playbook {
    Playbook::new(PlaybookInput {
        id: PlaybookId::new(),
        org_id,
        name: name.to_owned(),
        trigger,
        conditions,
        actions,
        status: PlaybookStatus::Active,
        last_run_at: None,
    })
    .unwrap_or_else(|_| unreachable!())
}
