use async_trait::async_trait;
use tokio::sync::RwLock;
use vaultline_application::{ActivityLogEntry, ActivityLogWriter, NewTask, TaskQueue};
use vaultline_core::{AppResult, OrgId};

/// In-memory activity log.
#[derive(Debug, Default)]
pub struct InMemoryActivityLog {
    entries: RwLock<Vec<ActivityLogEntry>>,
}

impl InMemoryActivityLog {
    /// Creates an empty activity log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entries of one organization in append order.
    pub async fn entries_for_org(&self, org_id: OrgId) -> Vec<ActivityLogEntry> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|entry| entry.org_id == org_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ActivityLogWriter for InMemoryActivityLog {
    async fn append_activity(&self, entry: ActivityLogEntry) -> AppResult<()> {
        self.entries.write().await.push(entry);
        Ok(())
    }
}

/// In-memory task queue.
#[derive(Debug, Default)]
pub struct InMemoryTaskQueue {
    tasks: RwLock<Vec<NewTask>>,
}

impl InMemoryTaskQueue {
    /// Creates an empty task queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the queued tasks of one organization in insertion order.
    pub async fn tasks_for_org(&self, org_id: OrgId) -> Vec<NewTask> {
        self.tasks
            .read()
            .await
            .iter()
            .filter(|task| task.org_id == org_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl TaskQueue for InMemoryTaskQueue {
    async fn enqueue_task(&self, task: NewTask) -> AppResult<()> {
        self.tasks.write().await.push(task);
        Ok(())
    }
}
