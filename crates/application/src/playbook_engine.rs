use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{error, info, warn};
use vaultline_core::{AppResult, OrgId};
use vaultline_domain::PlaybookEvent;

use crate::action_dispatcher::ActionDispatcher;
use crate::playbook_ports::{ActivityLogWriter, PlaybookRepository, PlaybookRunStatus, TaskQueue};
use crate::run_recorder::RunRecorder;
use crate::template_seeder::TemplateSeeder;

mod evaluation;

/// Event-driven playbook engine.
///
/// One call per domain event. Every error below this boundary is logged and
/// recorded on run rows, never returned to the caller.
#[derive(Clone)]
pub struct PlaybookEngine {
    repository: Arc<dyn PlaybookRepository>,
    dispatcher: ActionDispatcher,
    recorder: RunRecorder,
    template_seeder: Option<TemplateSeeder>,
}

impl PlaybookEngine {
    /// Creates a playbook engine.
    #[must_use]
    pub fn new(
        repository: Arc<dyn PlaybookRepository>,
        activity_log: Arc<dyn ActivityLogWriter>,
        task_queue: Arc<dyn TaskQueue>,
    ) -> Self {
        Self {
            recorder: RunRecorder::new(repository.clone()),
            dispatcher: ActionDispatcher::new(activity_log, task_queue),
            repository,
            template_seeder: None,
        }
    }

    /// Seeds canonical playbooks before evaluating matching events.
    #[must_use]
    pub fn with_template_seeder(mut self, template_seeder: TemplateSeeder) -> Self {
        self.template_seeder = Some(template_seeder);
        self
    }

    /// Evaluates every active playbook of the organization against one event.
    pub async fn run_playbooks_for_event(&self, org_id: OrgId, event: PlaybookEvent) {
        let trigger = event.trigger;
        let result = AssertUnwindSafe(self.process_event(org_id, &event))
            .catch_unwind()
            .await;

        match result {
            Ok(Ok(summary)) => info!(
                org_id = %org_id,
                trigger = %trigger,
                candidates = summary.candidates,
                skipped = summary.skipped,
                succeeded = summary.succeeded,
                failed = summary.failed,
                unrecorded = summary.unrecorded,
                "playbook event processed"
            ),
            Ok(Err(error)) => error!(
                org_id = %org_id,
                trigger = %trigger,
                error = %error,
                "failed to load playbooks for event"
            ),
            Err(panic) => error!(
                org_id = %org_id,
                trigger = %trigger,
                panic = %panic_message(&*panic),
                "playbook engine panicked while processing event"
            ),
        }
    }

    async fn process_event(&self, org_id: OrgId, event: &PlaybookEvent) -> AppResult<EventSummary> {
        if let Some(template_seeder) = &self.template_seeder {
            template_seeder.seed_for_event(org_id, event).await;
        }

        let playbooks = self
            .repository
            .list_active_playbooks(org_id, event.trigger)
            .await?;

        let mut summary = EventSummary {
            candidates: playbooks.len(),
            ..EventSummary::default()
        };

        for playbook in &playbooks {
            if playbook.org_id() != org_id
                || playbook.trigger() != event.trigger
                || !playbook.is_active()
            {
                warn!(
                    org_id = %org_id,
                    playbook_id = %playbook.id(),
                    "repository returned a playbook outside the requested scope"
                );
                summary.unrecorded += 1;
                continue;
            }

            let evaluated = AssertUnwindSafe(self.evaluate_playbook(playbook, event))
                .catch_unwind()
                .await;

            match evaluated {
                Ok(Ok(status)) => summary.count(status),
                Ok(Err(error)) => {
                    summary.unrecorded += 1;
                    error!(
                        org_id = %org_id,
                        playbook_id = %playbook.id(),
                        error = %error,
                        "failed to record playbook run"
                    );
                }
                Err(panic) => {
                    summary.unrecorded += 1;
                    error!(
                        org_id = %org_id,
                        playbook_id = %playbook.id(),
                        panic = %panic_message(&*panic),
                        "playbook evaluation panicked"
                    );
                }
            }
        }

        Ok(summary)
    }
}

#[derive(Debug, Default)]
struct EventSummary {
    candidates: usize,
    skipped: usize,
    succeeded: usize,
    failed: usize,
    unrecorded: usize,
}

impl EventSummary {
    fn count(&mut self, status: PlaybookRunStatus) {
        match status {
            PlaybookRunStatus::Skipped => self.skipped += 1,
            PlaybookRunStatus::Success => self.succeeded += 1,
            PlaybookRunStatus::Failed => self.failed += 1,
            PlaybookRunStatus::Pending => {}
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        return (*message).to_owned();
    }

    if let Some(message) = panic.downcast_ref::<String>() {
        return message.clone();
    }

    "non-string panic payload".to_owned()
}
