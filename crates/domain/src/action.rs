use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use vaultline_core::AppError;

/// Declarative side effect performed when a playbook matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum PlaybookAction {
    /// Writes one audit entry to the activity log.
    LogActivity {
        /// Action parameters (`type`, `feature`, `category`, extras).
        params: Map<String, Value>,
    },
    /// Inserts one task into the task queue.
    EnqueueTask {
        /// Action parameters (`taskType` plus task metadata).
        params: Map<String, Value>,
    },
    /// Action type this engine does not know how to perform.
    Unsupported {
        /// Stored action type value.
        action_type: String,
        /// Stored action parameters.
        params: Map<String, Value>,
    },
}

impl PlaybookAction {
    /// Storage value for [`PlaybookAction::LogActivity`].
    pub const LOG_ACTIVITY: &'static str = "log_activity";
    /// Storage value for [`PlaybookAction::EnqueueTask`].
    pub const ENQUEUE_TASK: &'static str = "enqueue_task";

    /// Builds an action from its stored type and parameters.
    #[must_use]
    pub fn from_parts(action_type: &str, params: Map<String, Value>) -> Self {
        match action_type {
            Self::LOG_ACTIVITY => Self::LogActivity { params },
            Self::ENQUEUE_TASK => Self::EnqueueTask { params },
            other => Self::Unsupported {
                action_type: other.to_owned(),
                params,
            },
        }
    }

    /// Returns stable action type value.
    #[must_use]
    pub fn action_type(&self) -> &str {
        match self {
            Self::LogActivity { .. } => Self::LOG_ACTIVITY,
            Self::EnqueueTask { .. } => Self::ENQUEUE_TASK,
            Self::Unsupported { action_type, .. } => action_type.as_str(),
        }
    }

    /// Returns action parameters.
    #[must_use]
    pub fn params(&self) -> &Map<String, Value> {
        match self {
            Self::LogActivity { params }
            | Self::EnqueueTask { params }
            | Self::Unsupported { params, .. } => params,
        }
    }

    /// Returns one string parameter when present.
    #[must_use]
    pub fn string_param(&self, name: &str) -> Option<&str> {
        self.params().get(name).and_then(Value::as_str)
    }
}

impl TryFrom<Value> for PlaybookAction {
    type Error = AppError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let Value::Object(mut object) = value else {
            return Err(AppError::Validation(
                "playbook action must be a JSON object".to_owned(),
            ));
        };

        let action_type = match object.remove("type") {
            Some(Value::String(action_type)) if !action_type.trim().is_empty() => action_type,
            _ => {
                return Err(AppError::Validation(
                    "playbook action requires a non-empty 'type'".to_owned(),
                ));
            }
        };

        let params = match object.remove("params") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(params)) => params,
            Some(_) => {
                return Err(AppError::Validation(format!(
                    "playbook action '{action_type}' params must be a JSON object"
                )));
            }
        };

        Ok(Self::from_parts(action_type.as_str(), params))
    }
}

impl From<PlaybookAction> for Value {
    fn from(action: PlaybookAction) -> Self {
        let action_type = action.action_type().to_owned();
        let params = match action {
            PlaybookAction::LogActivity { params }
            | PlaybookAction::EnqueueTask { params }
            | PlaybookAction::Unsupported { params, .. } => params,
        };

        serde_json::json!({
            "type": action_type,
            "params": Value::Object(params),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::PlaybookAction;

    #[test]
    fn known_action_types_parse_to_variants() {
        let parsed = PlaybookAction::try_from(json!({
            "type": "enqueue_task",
            "params": {"taskType": "contract_renewal_reminder"},
        }));
        assert!(matches!(parsed, Ok(PlaybookAction::EnqueueTask { .. })));
    }

    #[test]
    fn unknown_action_type_is_preserved() {
        let parsed = PlaybookAction::try_from(json!({"type": "send_sms", "params": {"to": "x"}}));
        let parsed = parsed.unwrap_or_else(|_| unreachable!());
        assert_eq!(parsed.action_type(), "send_sms");
        assert_eq!(parsed.string_param("to"), Some("x"));
    }

    #[test]
    fn missing_params_default_to_empty_map() {
        let parsed = PlaybookAction::try_from(json!({"type": "log_activity"}));
        let parsed = parsed.unwrap_or_else(|_| unreachable!());
        assert!(parsed.params().is_empty());
    }

    #[test]
    fn non_object_params_are_rejected() {
        let parsed = PlaybookAction::try_from(json!({"type": "log_activity", "params": [1, 2]}));
        assert!(parsed.is_err());
    }

    #[test]
    fn action_serializes_to_stored_shape() {
        let action = PlaybookAction::from_parts(
            PlaybookAction::LOG_ACTIVITY,
            json!({"type": "contract_renewal_reminder_created"})
                .as_object()
                .cloned()
                .unwrap_or_default(),
        );
        assert_eq!(
            Value::from(action),
            json!({
                "type": "log_activity",
                "params": {"type": "contract_renewal_reminder_created"},
            })
        );
    }
}
