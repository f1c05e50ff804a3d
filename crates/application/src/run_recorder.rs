use std::sync::Arc;

use serde_json::Value;
use vaultline_core::AppResult;
use vaultline_domain::Playbook;

use crate::playbook_ports::{
    PlaybookRepository, PlaybookRun, PlaybookRunDraft, PlaybookRunMetrics, PlaybookRunStatus,
};

/// Resolved outcome of one playbook evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybookRunOutcome {
    /// Conditions did not match.
    Skipped,
    /// Every action succeeded.
    Succeeded,
    /// Evaluation or at least one action failed.
    Failed {
        /// Summary of the failure(s).
        error: String,
    },
}

impl PlaybookRunOutcome {
    /// Returns the terminal run status for this outcome.
    #[must_use]
    pub fn status(&self) -> PlaybookRunStatus {
        match self {
            Self::Skipped => PlaybookRunStatus::Skipped,
            Self::Succeeded => PlaybookRunStatus::Success,
            Self::Failed { .. } => PlaybookRunStatus::Failed,
        }
    }
}

/// Appends one immutable run record per evaluation attempt.
#[derive(Clone)]
pub struct RunRecorder {
    repository: Arc<dyn PlaybookRepository>,
}

impl RunRecorder {
    /// Creates a run recorder.
    #[must_use]
    pub fn new(repository: Arc<dyn PlaybookRepository>) -> Self {
        Self { repository }
    }

    /// Persists a run already resolved to its terminal status.
    pub async fn record(
        &self,
        playbook: &Playbook,
        trigger_event: &Value,
        outcome: PlaybookRunOutcome,
        metrics: PlaybookRunMetrics,
    ) -> AppResult<PlaybookRun> {
        let status = outcome.status();
        let error = match outcome {
            PlaybookRunOutcome::Failed { error } => Some(error),
            PlaybookRunOutcome::Skipped | PlaybookRunOutcome::Succeeded => None,
        };

        let draft =
            PlaybookRunDraft::resolved(playbook, trigger_event.clone(), status, error, metrics)?;
        self.repository.create_run(draft).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use vaultline_core::OrgId;
    use vaultline_domain::TriggerKind;

    use super::{PlaybookRunOutcome, RunRecorder};
    use crate::playbook_ports::{PlaybookRunMetrics, PlaybookRunStatus};
    use crate::test_support::{FakePlaybookRepository, playbook};

    #[tokio::test]
    async fn recorded_runs_are_completed_on_creation() {
        let repository = Arc::new(FakePlaybookRepository::default());
        let recorder = RunRecorder::new(repository.clone());
        let playbook = playbook(
            OrgId::new(),
            "Renewals",
            TriggerKind::ActivityEvent,
            Vec::new(),
            Vec::new(),
        );
        let payload = json!({"activity": {"type": "contract_signed"}});

        let run = recorder
            .record(
                &playbook,
                &payload,
                PlaybookRunOutcome::Failed {
                    error: "action[1] enqueue_task: queue down".to_owned(),
                },
                PlaybookRunMetrics {
                    actions_attempted: 2,
                    actions_succeeded: 1,
                    actions_failed: 1,
                    ..PlaybookRunMetrics::default()
                },
            )
            .await;

        let run = run.unwrap_or_else(|_| unreachable!());
        assert_eq!(run.status, PlaybookRunStatus::Failed);
        assert_eq!(run.playbook_id, playbook.id());
        assert_eq!(run.org_id, playbook.org_id());
        assert_eq!(run.trigger_event, payload);
        assert!(run.completed_at.is_some());
        assert_eq!(run.metrics["actions_failed"], json!(1));
        assert_eq!(repository.runs.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn recording_twice_appends_two_rows() {
        let repository = Arc::new(FakePlaybookRepository::default());
        let recorder = RunRecorder::new(repository.clone());
        let playbook = playbook(
            OrgId::new(),
            "Renewals",
            TriggerKind::ActivityEvent,
            Vec::new(),
            Vec::new(),
        );

        for _ in 0..2 {
            let run = recorder
                .record(
                    &playbook,
                    &json!({}),
                    PlaybookRunOutcome::Skipped,
                    PlaybookRunMetrics::default(),
                )
                .await;
            assert!(run.is_ok());
        }

        let runs = repository.runs.lock().await;
        assert_eq!(runs.len(), 2);
        assert_ne!(runs[0].id, runs[1].id);
    }
}
