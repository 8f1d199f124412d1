use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
    time::Duration,
};

use hdl_judge_core::judge::{
    result::SimulationOutcome, SimulationRequest, SimulationRunner, SubmissionId,
    DEFAULT_COMPILE_TIMEOUT, DEFAULT_RUN_TIMEOUT,
};

use crate::store::{BeginRun, StoreError, Submission, SubmissionStore};

#[derive(Debug, thiserror::Error)]
pub enum EvaluateError {
    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JudgeTimeouts {
    pub compile: Duration,
    pub run: Duration,
}

impl Default for JudgeTimeouts {
    fn default() -> Self {
        Self {
            compile: DEFAULT_COMPILE_TIMEOUT,
            run: DEFAULT_RUN_TIMEOUT,
        }
    }
}

/// Drives one submission through `queued -> running -> terminal`.
///
/// Shared by the background worker and the on-demand endpoint. The store's
/// compare-and-set decides which caller actually runs a submission, so the
/// runner sees each submission at most once.
pub struct Evaluator {
    store: Arc<dyn SubmissionStore>,
    runner: Arc<dyn SimulationRunner>,
    timeouts: JudgeTimeouts,
}

impl Evaluator {
    pub fn new(
        store: Arc<dyn SubmissionStore>,
        runner: Arc<dyn SimulationRunner>,
        timeouts: JudgeTimeouts,
    ) -> Self {
        Self {
            store,
            runner,
            timeouts,
        }
    }

    pub fn store(&self) -> &Arc<dyn SubmissionStore> {
        &self.store
    }

    /// Blocking. Returns the submission as stored after this call.
    pub fn evaluate(&self, id: SubmissionId) -> Result<Submission, EvaluateError> {
        let submission = match self.store.begin_run(id)? {
            BeginRun::Started(submission) => submission,
            BeginRun::Unchanged(submission) if submission.status.is_terminal() => {
                log::debug!(
                    "Submission {} is already {}, nothing to do",
                    id,
                    submission.status
                );
                return Ok(submission);
            }
            BeginRun::Unchanged(submission) => {
                log::info!("Submission {} is being judged elsewhere", id);
                return Ok(submission);
            }
        };
        log::info!("Submission {} is running", id);

        let request = SimulationRequest {
            submission_id: submission.id,
            problem_id: submission.problem_id,
            source: submission.code,
            compile_timeout: self.timeouts.compile,
            run_timeout: self.timeouts.run,
        };
        let (outcome, diagnostic) =
            match panic::catch_unwind(AssertUnwindSafe(|| self.runner.run(&request))) {
                Ok(outcome) => (outcome, None),
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    log::error!("Runner panicked on submission {}: {}", id, message);
                    (
                        SimulationOutcome::unknown(),
                        Some(format!("Runner panicked: {}", message)),
                    )
                }
            };

        let submission = self.store.complete_run(id, &outcome, diagnostic)?;
        log::info!(
            "Submission {} is {} with {}",
            id,
            submission.status,
            outcome.error_code
        );
        Ok(submission)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
