use async_trait::async_trait;
use serde_json::Value;
use vaultline_core::{AppResult, OrgId};
use vaultline_domain::PlaybookId;

/// One append-only activity log entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityLogEntry {
    /// Owning organization.
    pub org_id: OrgId,
    /// Semantic event name.
    pub activity_type: String,
    /// Product feature classification.
    pub feature: Option<String>,
    /// Category classification.
    pub category: Option<String>,
    /// Context attached to the entry.
    pub metadata: Value,
}

/// Activity log gateway used by `log_activity` actions.
#[async_trait]
pub trait ActivityLogWriter: Send + Sync {
    /// Appends one entry.
    async fn append_activity(&self, entry: ActivityLogEntry) -> AppResult<()>;
}

/// One task queue insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    /// Owning organization.
    pub org_id: OrgId,
    /// Task kind consumed by downstream workers.
    pub task_type: String,
    /// Playbook that enqueued the task.
    pub source_playbook_id: Option<PlaybookId>,
    /// Task parameters.
    pub metadata: Value,
}

/// Task queue gateway used by `enqueue_task` actions.
#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// Inserts one task. Consumption is handled elsewhere.
    async fn enqueue_task(&self, task: NewTask) -> AppResult<()>;
}
