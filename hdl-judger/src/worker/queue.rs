use hdl_judge_core::judge::SubmissionId;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    Evaluate(SubmissionId),
    /// Stops the worker once everything enqueued before it is done.
    Shutdown,
}

/// Producer side of the job queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct JobQueue {
    sender: mpsc::UnboundedSender<Job>,
}

/// The single consumer side of the job queue.
#[derive(Debug)]
pub struct JobReceiver {
    receiver: mpsc::UnboundedReceiver<Job>,
}

pub fn channel() -> (JobQueue, JobReceiver) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (JobQueue { sender }, JobReceiver { receiver })
}

impl JobQueue {
    /// Never blocks. A job sent after the worker is gone is dropped.
    pub fn enqueue(&self, job: Job) {
        log::debug!("Enqueue {:?}", job);
        if let Err(e) = self.sender.send(job) {
            log::warn!("Judge worker is gone, dropping {:?}", e.0);
        }
    }
}

impl JobReceiver {
    /// Waits for the next job. Once every producer is dropped this yields
    /// [`Job::Shutdown`].
    pub async fn dequeue(&mut self) -> Job {
        self.receiver.recv().await.unwrap_or(Job::Shutdown)
    }
}

#[cfg(test)]
mod queue_test {
    use super::*;

    #[tokio::test]
    async fn test_jobs_come_out_in_order() {
        let (queue, mut receiver) = channel();
        for id in 1..=3 {
            queue.enqueue(Job::Evaluate(SubmissionId(id)));
        }
        queue.enqueue(Job::Shutdown);

        for id in 1..=3 {
            assert_eq!(receiver.dequeue().await, Job::Evaluate(SubmissionId(id)));
        }
        assert_eq!(receiver.dequeue().await, Job::Shutdown);
    }

    #[tokio::test]
    async fn test_dropped_producers_mean_shutdown() {
        let (queue, mut receiver) = channel();
        queue.enqueue(Job::Evaluate(SubmissionId(9)));
        drop(queue);

        assert_eq!(receiver.dequeue().await, Job::Evaluate(SubmissionId(9)));
        assert_eq!(receiver.dequeue().await, Job::Shutdown);
    }

    #[test]
    fn test_enqueue_after_consumer_is_gone() {
        let (queue, receiver) = channel();
        drop(receiver);
        queue.enqueue(Job::Evaluate(SubmissionId(1)));
    }
}
