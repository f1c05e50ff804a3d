use std::sync::Arc;

use serde_json::json;
use vaultline_core::OrgId;
use vaultline_domain::{PlaybookAction, PlaybookId, TriggerKind};

use super::{ActionContext, ActionDispatcher, ActionError};
use crate::test_support::{
    RecordingActivityLog, RecordingTaskQueue, enqueue_task, log_activity, params,
};

fn build_dispatcher(
    activity_log: Arc<RecordingActivityLog>,
    task_queue: Arc<RecordingTaskQueue>,
) -> ActionDispatcher {
    ActionDispatcher::new(activity_log, task_queue)
}

#[tokio::test]
async fn log_activity_writes_entry_with_event_back_reference() {
    let activity_log = Arc::new(RecordingActivityLog::default());
    let dispatcher = build_dispatcher(activity_log.clone(), Arc::default());
    let org_id = OrgId::new();
    let playbook_id = PlaybookId::new();
    let trigger_event = json!({"activity": {"type": "contract_signed"}});

    let result = dispatcher
        .dispatch(
            &PlaybookAction::LogActivity {
                params: params(json!({
                    "type": "contract_renewal_reminder_created",
                    "feature": "contracts",
                    "category": "automation",
                    "severity": "info",
                })),
            },
            ActionContext {
                org_id,
                playbook_id,
                playbook_name: "Contract renewal reminder",
                trigger: TriggerKind::ActivityEvent,
                trigger_event: &trigger_event,
            },
        )
        .await;
    assert!(result.is_ok());

    let entries = activity_log.entries.lock().await;
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.org_id, org_id);
    assert_eq!(entry.activity_type, "contract_renewal_reminder_created");
    assert_eq!(entry.feature.as_deref(), Some("contracts"));
    assert_eq!(entry.category.as_deref(), Some("automation"));
    assert_eq!(entry.metadata["severity"], json!("info"));
    assert_eq!(entry.metadata["source"], json!("playbook"));
    assert_eq!(entry.metadata["playbook_id"], json!(playbook_id.to_string()));
    assert_eq!(entry.metadata["trigger"], json!("activity_event"));
    assert_eq!(entry.metadata["trigger_event"], trigger_event);
}

#[tokio::test]
async fn enqueue_task_carries_params_verbatim() {
    let task_queue = Arc::new(RecordingTaskQueue::default());
    let dispatcher = build_dispatcher(Arc::default(), task_queue.clone());
    let org_id = OrgId::new();
    let playbook_id = PlaybookId::new();
    let trigger_event = json!({});

    let result = dispatcher
        .dispatch(
            &PlaybookAction::EnqueueTask {
                params: params(json!({
                    "taskType": "contract_renewal_reminder",
                    "channel": "email",
                    "lead_days": 30,
                })),
            },
            ActionContext {
                org_id,
                playbook_id,
                playbook_name: "Contract renewal reminder",
                trigger: TriggerKind::ActivityEvent,
                trigger_event: &trigger_event,
            },
        )
        .await;
    assert!(result.is_ok());

    let tasks = task_queue.tasks.lock().await;
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].task_type, "contract_renewal_reminder");
    assert_eq!(tasks[0].source_playbook_id, Some(playbook_id));
    assert_eq!(tasks[0].metadata, json!({"channel": "email", "lead_days": 30}));
}

#[tokio::test]
async fn missing_required_param_is_reported() {
    let dispatcher = build_dispatcher(Arc::default(), Arc::default());
    let trigger_event = json!({});
    let context = ActionContext {
        org_id: OrgId::new(),
        playbook_id: PlaybookId::new(),
        playbook_name: "Broken",
        trigger: TriggerKind::ActivityEvent,
        trigger_event: &trigger_event,
    };

    let result = dispatcher
        .dispatch(
            &PlaybookAction::EnqueueTask {
                params: params(json!({"channel": "email"})),
            },
            context,
        )
        .await;

    assert!(matches!(
        result,
        Err(ActionError::MissingParam {
            param: "taskType",
            ..
        })
    ));
}

#[tokio::test]
async fn unsupported_action_fails_without_side_effects() {
    let activity_log = Arc::new(RecordingActivityLog::default());
    let task_queue = Arc::new(RecordingTaskQueue::default());
    let dispatcher = build_dispatcher(activity_log.clone(), task_queue.clone());
    let trigger_event = json!({});

    let result = dispatcher
        .dispatch(
            &PlaybookAction::from_parts("send_sms", params(json!({"to": "+100"}))),
            ActionContext {
                org_id: OrgId::new(),
                playbook_id: PlaybookId::new(),
                playbook_name: "Sms",
                trigger: TriggerKind::ActivityEvent,
                trigger_event: &trigger_event,
            },
        )
        .await;

    assert!(matches!(result, Err(ActionError::UnsupportedAction(ref name)) if name == "send_sms"));
    assert!(activity_log.entries.lock().await.is_empty());
    assert!(task_queue.tasks.lock().await.is_empty());
}

#[tokio::test]
async fn collaborator_failure_surfaces_as_side_effect_error() {
    let task_queue = Arc::new(RecordingTaskQueue {
        fail: true,
        ..RecordingTaskQueue::default()
    });
    let dispatcher = build_dispatcher(Arc::default(), task_queue);
    let trigger_event = json!({});

    let result = dispatcher
        .dispatch(
            &enqueue_task("contract_renewal_reminder"),
            ActionContext {
                org_id: OrgId::new(),
                playbook_id: PlaybookId::new(),
                playbook_name: "Renewals",
                trigger: TriggerKind::ActivityEvent,
                trigger_event: &trigger_event,
            },
        )
        .await;

    assert!(matches!(result, Err(ActionError::SideEffect(_))));
}

#[tokio::test]
async fn log_activity_requires_type_param() {
    let dispatcher = build_dispatcher(Arc::default(), Arc::default());
    let trigger_event = json!({});
    let mut action = log_activity("placeholder");
    if let PlaybookAction::LogActivity { params } = &mut action {
        params.remove("type");
    }

    let result = dispatcher
        .dispatch(
            &action,
            ActionContext {
                org_id: OrgId::new(),
                playbook_id: PlaybookId::new(),
                playbook_name: "Renewals",
                trigger: TriggerKind::ActivityEvent,
                trigger_event: &trigger_event,
            },
        )
        .await;

    assert!(matches!(
        result,
        Err(ActionError::MissingParam { param: "type", .. })
    ));
}

#[tokio::test]
async fn required_params_are_stored_verbatim_and_blank_ones_rejected() {
    let activity_log = Arc::new(RecordingActivityLog::default());
    let task_queue = Arc::new(RecordingTaskQueue::default());
    let dispatcher = build_dispatcher(activity_log.clone(), task_queue.clone());
    let trigger_event = json!({});
    let context = ActionContext {
        org_id: OrgId::new(),
        playbook_id: PlaybookId::new(),
        playbook_name: "Padded",
        trigger: TriggerKind::ActivityEvent,
        trigger_event: &trigger_event,
    };

    let logged = dispatcher
        .dispatch(
            &PlaybookAction::LogActivity {
                params: params(json!({"type": " renewal_logged "})),
            },
            context,
        )
        .await;
    let queued = dispatcher
        .dispatch(
            &PlaybookAction::EnqueueTask {
                params: params(json!({"taskType": "renewal_call "})),
            },
            context,
        )
        .await;
    let blank = dispatcher
        .dispatch(
            &PlaybookAction::EnqueueTask {
                params: params(json!({"taskType": "   "})),
            },
            context,
        )
        .await;

    assert!(logged.is_ok());
    assert!(queued.is_ok());
    assert!(matches!(
        blank,
        Err(ActionError::MissingParam {
            param: "taskType",
            ..
        })
    ));
    assert_eq!(
        activity_log.entries.lock().await[0].activity_type,
        " renewal_logged "
    );
    let tasks = task_queue.tasks.lock().await;
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].task_type, "renewal_call ");
}
