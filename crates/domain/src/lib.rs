//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod action;
mod condition;
mod event;
mod playbook;

pub use action::PlaybookAction;
pub use condition::{
    ConditionEvaluation, ConditionOperator, ConditionValue, PlaybookCondition,
    evaluate_conditions, evaluate_conditions_detailed, resolve_path,
};
pub use event::PlaybookEvent;
pub use playbook::{Playbook, PlaybookId, PlaybookInput, PlaybookStatus, TriggerKind};
