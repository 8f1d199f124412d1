pub mod evaluator;
pub mod queue;

use std::sync::Arc;

use evaluator::Evaluator;
use queue::{Job, JobReceiver};

/// The single background consumer of the job queue.
pub struct JudgeWorker {
    evaluator: Arc<Evaluator>,
    receiver: JobReceiver,
}

impl JudgeWorker {
    pub fn new(evaluator: Arc<Evaluator>, receiver: JobReceiver) -> Self {
        Self {
            evaluator,
            receiver,
        }
    }

    /// Runs jobs one at a time until [`Job::Shutdown`] comes out of the queue.
    pub async fn run(mut self) {
        log::info!("Judge worker started");
        loop {
            let id = match self.receiver.dequeue().await {
                Job::Evaluate(id) => id,
                Job::Shutdown => break,
            };

            let evaluator = self.evaluator.clone();
            match tokio::task::spawn_blocking(move || evaluator.evaluate(id)).await {
                Ok(Ok(submission)) => {
                    log::debug!("Job for submission {} done: {}", id, submission.status)
                }
                Ok(Err(e)) => log::error!("Failed to evaluate submission {}: {}", id, e),
                Err(e) => log::error!("Evaluation of submission {} was lost: {}", id, e),
            }
        }
        log::info!("Judge worker stopped");
    }
}
