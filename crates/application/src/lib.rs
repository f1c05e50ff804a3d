//! Application services and ports.

#![forbid(unsafe_code)]

mod action_dispatcher;
mod playbook_engine;
mod playbook_ports;
mod run_recorder;
mod template_seeder;

#[cfg(test)]
mod test_support;

pub use action_dispatcher::{ActionContext, ActionDispatcher, ActionError};
pub use playbook_engine::PlaybookEngine;
pub use playbook_ports::{
    ActivityLogEntry, ActivityLogWriter, NewTask, PlaybookRepository, PlaybookRun,
    PlaybookRunDraft, PlaybookRunListQuery, PlaybookRunMetrics, PlaybookRunStatus, TaskQueue,
};
pub use run_recorder::{PlaybookRunOutcome, RunRecorder};
pub use template_seeder::{
    ACCOUNTS_PACK_CASH_RUNWAY, ACCOUNTS_PACK_MARGIN_REVIEW, CONTRACT_EXPIRY_ESCALATION,
    CONTRACT_RENEWAL_REMINDER, PlaybookTemplate, TemplateFamily, TemplateSeeder, all_templates,
    templates_for_event,
};
