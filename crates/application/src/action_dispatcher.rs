use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;
use vaultline_core::{AppError, OrgId};
use vaultline_domain::{PlaybookAction, PlaybookId, TriggerKind};

use crate::playbook_ports::{ActivityLogEntry, ActivityLogWriter, NewTask, TaskQueue};

/// Event context shared by every action of one playbook evaluation.
#[derive(Debug, Clone, Copy)]
pub struct ActionContext<'a> {
    /// Owning organization.
    pub org_id: OrgId,
    /// Playbook being executed.
    pub playbook_id: PlaybookId,
    /// Playbook name, copied into audit metadata.
    pub playbook_name: &'a str,
    /// Trigger of the event.
    pub trigger: TriggerKind,
    /// Payload of the triggering event.
    pub trigger_event: &'a Value,
}

/// Failure of one dispatched action.
#[derive(Debug, Error)]
pub enum ActionError {
    /// Required parameter is missing or not a string.
    #[error("{action_type} requires string param '{param}'")]
    MissingParam {
        /// Action type that was dispatched.
        action_type: &'static str,
        /// Parameter name.
        param: &'static str,
    },

    /// Action type has no handler.
    #[error("unsupported action type '{0}'")]
    UnsupportedAction(String),

    /// Side-effect write failed.
    #[error(transparent)]
    SideEffect(#[from] AppError),

    /// Action handler panicked.
    #[error("panicked: {0}")]
    Panicked(String),
}

/// Executes declarative playbook actions against the collaborator ports.
#[derive(Clone)]
pub struct ActionDispatcher {
    activity_log: Arc<dyn ActivityLogWriter>,
    task_queue: Arc<dyn TaskQueue>,
}

impl ActionDispatcher {
    /// Creates an action dispatcher.
    #[must_use]
    pub fn new(activity_log: Arc<dyn ActivityLogWriter>, task_queue: Arc<dyn TaskQueue>) -> Self {
        Self {
            activity_log,
            task_queue,
        }
    }

    /// Executes one action and waits for its side effect to complete.
    pub async fn dispatch(
        &self,
        action: &PlaybookAction,
        context: ActionContext<'_>,
    ) -> Result<(), ActionError> {
        match action {
            PlaybookAction::LogActivity { params } => self.log_activity(params, context).await,
            PlaybookAction::EnqueueTask { params } => self.enqueue_task(params, context).await,
            PlaybookAction::Unsupported { action_type, .. } => {
                Err(ActionError::UnsupportedAction(action_type.clone()))
            }
        }
    }

    async fn log_activity(
        &self,
        params: &Map<String, Value>,
        context: ActionContext<'_>,
    ) -> Result<(), ActionError> {
        let activity_type = required_string(params, PlaybookAction::LOG_ACTIVITY, "type")?;
        let feature = optional_string(params, "feature");
        let category = optional_string(params, "category");

        let mut metadata = extra_params(params, &["type", "feature", "category"]);
        metadata.insert("source".to_owned(), Value::String("playbook".to_owned()));
        metadata.insert(
            "playbook_id".to_owned(),
            Value::String(context.playbook_id.to_string()),
        );
        metadata.insert(
            "playbook_name".to_owned(),
            Value::String(context.playbook_name.to_owned()),
        );
        metadata.insert(
            "trigger".to_owned(),
            Value::String(context.trigger.as_str().to_owned()),
        );
        metadata.insert("trigger_event".to_owned(), context.trigger_event.clone());

        self.activity_log
            .append_activity(ActivityLogEntry {
                org_id: context.org_id,
                activity_type,
                feature,
                category,
                metadata: Value::Object(metadata),
            })
            .await?;

        Ok(())
    }

    async fn enqueue_task(
        &self,
        params: &Map<String, Value>,
        context: ActionContext<'_>,
    ) -> Result<(), ActionError> {
        let task_type = required_string(params, PlaybookAction::ENQUEUE_TASK, "taskType")?;

        self.task_queue
            .enqueue_task(NewTask {
                org_id: context.org_id,
                task_type,
                source_playbook_id: Some(context.playbook_id),
                metadata: Value::Object(extra_params(params, &["taskType"])),
            })
            .await?;

        Ok(())
    }
}

fn required_string(
    params: &Map<String, Value>,
    action_type: &'static str,
    param: &'static str,
) -> Result<String, ActionError> {
    params
        .get(param)
        .and_then(Value::as_str)
        .filter(|value| !value.trim().is_empty())
        .map(ToOwned::to_owned)
        .ok_or(ActionError::MissingParam { action_type, param })
}

fn optional_string(params: &Map<String, Value>, param: &str) -> Option<String> {
    params
        .get(param)
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
}

fn extra_params(params: &Map<String, Value>, consumed: &[&str]) -> Map<String, Value> {
    params
        .iter()
        .filter(|(key, _)| !consumed.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

#[cfg(test)]
mod tests;
