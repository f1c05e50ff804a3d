use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Instant;

use chrono::Utc;
use futures::FutureExt;
use tracing::{debug, warn};
use vaultline_core::AppResult;
use vaultline_domain::{Playbook, PlaybookEvent, evaluate_conditions_detailed};

use super::{PlaybookEngine, panic_message};
use crate::action_dispatcher::{ActionContext, ActionError};
use crate::playbook_ports::{PlaybookRunMetrics, PlaybookRunStatus};
use crate::run_recorder::PlaybookRunOutcome;

impl PlaybookEngine {
    /// Evaluates one playbook and records exactly one run for it.
    pub(super) async fn evaluate_playbook(
        &self,
        playbook: &Playbook,
        event: &PlaybookEvent,
    ) -> AppResult<PlaybookRunStatus> {
        let started_at = Instant::now();
        let mut metrics = PlaybookRunMetrics::default();

        let evaluation = catch_unwind(AssertUnwindSafe(|| {
            evaluate_conditions_detailed(playbook.conditions(), &event.payload)
        }));

        let mut matched = false;
        let outcome = match evaluation {
            Err(panic) => PlaybookRunOutcome::Failed {
                error: format!(
                    "condition evaluation failed: {}",
                    panic_message(&*panic)
                ),
            },
            Ok(evaluation) => {
                metrics.conditions_checked = evaluation.checked;
                metrics.conditions_matched = evaluation.matched;

                if evaluation.is_match() {
                    matched = true;
                    self.execute_actions(playbook, event, &mut metrics).await
                } else {
                    debug!(
                        org_id = %playbook.org_id(),
                        playbook_id = %playbook.id(),
                        checked = evaluation.checked,
                        matched = evaluation.matched,
                        "playbook conditions did not match"
                    );
                    PlaybookRunOutcome::Skipped
                }
            }
        };

        metrics.duration_ms = u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX);
        let run = self
            .recorder
            .record(playbook, &event.payload, outcome, metrics)
            .await?;

        if matched {
            self.touch_last_run(playbook).await;
        }

        Ok(run.status)
    }

    async fn execute_actions(
        &self,
        playbook: &Playbook,
        event: &PlaybookEvent,
        metrics: &mut PlaybookRunMetrics,
    ) -> PlaybookRunOutcome {
        let context = ActionContext {
            org_id: playbook.org_id(),
            playbook_id: playbook.id(),
            playbook_name: playbook.name().as_str(),
            trigger: event.trigger,
            trigger_event: &event.payload,
        };

        let mut failures = Vec::new();
        for (index, action) in playbook.actions().iter().enumerate() {
            metrics.actions_attempted += 1;

            let dispatched = AssertUnwindSafe(self.dispatcher.dispatch(action, context))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| Err(ActionError::Panicked(panic_message(&*panic))));

            match dispatched {
                Ok(()) => metrics.actions_succeeded += 1,
                Err(error) => {
                    metrics.actions_failed += 1;
                    warn!(
                        org_id = %playbook.org_id(),
                        playbook_id = %playbook.id(),
                        action_index = index,
                        action_type = %action.action_type(),
                        error = %error,
                        "playbook action failed"
                    );
                    failures.push(format!("action[{index}] {}: {error}", action.action_type()));
                }
            }
        }

        if failures.is_empty() {
            PlaybookRunOutcome::Succeeded
        } else {
            PlaybookRunOutcome::Failed {
                error: failures.join("; "),
            }
        }
    }

    async fn touch_last_run(&self, playbook: &Playbook) {
        if let Err(error) = self
            .repository
            .touch_last_run_at(playbook.org_id(), playbook.id(), Utc::now())
            .await
        {
            warn!(
                org_id = %playbook.org_id(),
                playbook_id = %playbook.id(),
                error = %error,
                "failed to update playbook last_run_at"
            );
        }
    }
}
