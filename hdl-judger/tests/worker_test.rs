mod common;

use std::{sync::Arc, time::Duration};

use common::CountingRunner;
use hdl_judge_core::{
    judge::{result::ErrorCode, runner::SandboxRunner},
    vcd::{SignalValue, VcdDecoder, WaveformReport},
};
use hdl_judger::{
    store::SubmissionStatus,
    worker::{
        queue::{self, Job},
        JudgeWorker,
    },
};

#[tokio::test]
async fn test_worker_drains_queue_then_stops() {
    common::init_logger();
    let runner = Arc::new(CountingRunner::new(ErrorCode::Success, Duration::ZERO));
    let evaluator = common::evaluator_with(runner.clone());
    let ids: Vec<_> = (0..3)
        .map(|_| {
            evaluator
                .store()
                .create(common::new_submission(1))
                .unwrap()
                .id
        })
        .collect();

    let (job_queue, job_receiver) = queue::channel();
    for id in &ids {
        job_queue.enqueue(Job::Evaluate(*id));
    }
    // A duplicate job must not run the submission twice.
    job_queue.enqueue(Job::Evaluate(ids[0]));
    job_queue.enqueue(Job::Shutdown);

    JudgeWorker::new(evaluator.clone(), job_receiver).run().await;

    assert_eq!(runner.calls(), 3);
    assert_eq!(*runner.seen.lock().unwrap(), ids);
    for id in ids {
        assert_eq!(
            evaluator.store().get(id).unwrap().status,
            SubmissionStatus::Success
        );
    }
}

#[tokio::test]
async fn test_worker_survives_unknown_submission() {
    let runner = Arc::new(CountingRunner::new(ErrorCode::Success, Duration::ZERO));
    let evaluator = common::evaluator_with(runner.clone());
    let id = evaluator
        .store()
        .create(common::new_submission(1))
        .unwrap()
        .id;

    let (job_queue, job_receiver) = queue::channel();
    job_queue.enqueue(Job::Evaluate(hdl_judge_core::judge::SubmissionId(99)));
    job_queue.enqueue(Job::Evaluate(id));
    drop(job_queue);

    JudgeWorker::new(evaluator.clone(), job_receiver).run().await;
    assert_eq!(runner.calls(), 1);
}

#[tokio::test]
async fn test_end_to_end_passing_submission() {
    common::init_logger();
    let root = tempfile::tempdir().unwrap();
    let config = common::passing_simulation_config(root.path());
    let artifact_root = config.artifact_root.clone();
    let evaluator = common::evaluator_with(Arc::new(SandboxRunner::new(config)));
    let id = evaluator
        .store()
        .create(common::new_submission(1))
        .unwrap()
        .id;

    let (job_queue, job_receiver) = queue::channel();
    let worker = tokio::spawn(JudgeWorker::new(evaluator.clone(), job_receiver).run());
    job_queue.enqueue(Job::Evaluate(id));
    job_queue.enqueue(Job::Shutdown);
    worker.await.unwrap();

    let submission = evaluator.store().get(id).unwrap();
    assert_eq!(submission.status, SubmissionStatus::Success);
    assert_eq!(submission.error_code, Some(ErrorCode::Success));
    assert_eq!(
        submission.log_path,
        Some(artifact_root.join(format!("sim_{}.log", id)))
    );
    let waveform_path = submission.waveform_path.unwrap();
    assert!(submission.log_path.unwrap().is_file());

    match VcdDecoder::default().decode_file(&waveform_path) {
        WaveformReport::Timeline { signals } => {
            assert_eq!(
                signals["clk"],
                vec![(0, SignalValue::One), (5, SignalValue::Zero)]
            );
            assert_eq!(signals["rstn"], vec![(0, SignalValue::Zero)]);
        }
        other => panic!("unexpected waveform report {:?}", other),
    }
}
