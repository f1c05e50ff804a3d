use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::condition::resolve_path;
use crate::playbook::TriggerKind;

/// Domain event handed to the playbook engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybookEvent {
    /// Event class.
    pub trigger: TriggerKind,
    /// Event payload that conditions are evaluated against.
    pub payload: Value,
}

impl PlaybookEvent {
    /// Creates an event from an already-shaped payload.
    #[must_use]
    pub fn new(trigger: TriggerKind, payload: Value) -> Self {
        Self { trigger, payload }
    }

    /// Creates an `activity_event` with `activity.type` and `activity.metadata`.
    #[must_use]
    pub fn activity(activity_type: &str, metadata: Value) -> Self {
        Self::from_activity(serde_json::json!({
            "type": activity_type,
            "metadata": metadata,
        }))
    }

    /// Wraps a raw activity row as `{ "activity": row }`.
    #[must_use]
    pub fn from_activity(activity: Value) -> Self {
        Self {
            trigger: TriggerKind::ActivityEvent,
            payload: serde_json::json!({ "activity": activity }),
        }
    }

    /// Wraps accounts pack metrics as `{ "metrics": metrics }`.
    #[must_use]
    pub fn accounts_pack_run(metrics: Value) -> Self {
        Self {
            trigger: TriggerKind::AccountsPackRun,
            payload: serde_json::json!({ "metrics": metrics }),
        }
    }

    /// Returns `activity.type` when the payload carries one.
    #[must_use]
    pub fn activity_type(&self) -> Option<&str> {
        resolve_path(&self.payload, "activity.type").and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::PlaybookEvent;
    use crate::TriggerKind;

    #[test]
    fn activity_helper_shapes_payload() {
        let event = PlaybookEvent::activity("contract_signed", json!({"status": "active"}));
        assert_eq!(event.trigger, TriggerKind::ActivityEvent);
        assert_eq!(event.activity_type(), Some("contract_signed"));
        assert_eq!(event.payload["activity"]["metadata"]["status"], json!("active"));
    }

    #[test]
    fn accounts_pack_helper_nests_metrics() {
        let event = PlaybookEvent::accounts_pack_run(json!({"pack_type": "month_end"}));
        assert_eq!(event.trigger, TriggerKind::AccountsPackRun);
        assert_eq!(event.payload["metrics"]["pack_type"], json!("month_end"));
        assert_eq!(event.activity_type(), None);
    }
}
