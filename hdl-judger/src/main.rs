mod option;

use std::{fs, path::Path, sync::Arc};

use actix_web::{web::Data, App, HttpServer};
use hdl_judge_core::{
    judge::{
        runner::SandboxRunner, ProblemId, SimulationRequest, SimulationRunner, SubmissionId,
    },
    vcd::{VcdDecoder, WaveformReport},
};
use hdl_judger::{
    handler::{self, JudgeContext},
    store::{JsonSubmissionStore, MemorySubmissionStore, SubmissionStore},
    worker::{
        evaluator::Evaluator,
        queue::{self, Job},
        JudgeWorker,
    },
};
use option::{JudgerCommand, JudgerOpt};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let opt = option::load_option();

    match opt.cmd.clone() {
        JudgerCommand::Serve {
            port,
            disable_worker,
        } => serve(&opt, port, disable_worker).await,
        JudgerCommand::Judge {
            problem_id,
            src_path,
        } => judge(&opt, ProblemId(problem_id), &src_path),
        JudgerCommand::Wave { path } => wave(&path),
    }
}

async fn serve(opt: &JudgerOpt, port: u16, disable_worker: bool) -> anyhow::Result<()> {
    let store: Arc<dyn SubmissionStore> = match &opt.store_path {
        Some(store_path) => Arc::new(JsonSubmissionStore::open(store_path.clone())?),
        None => Arc::new(MemorySubmissionStore::new()),
    };
    let runner = Arc::new(SandboxRunner::new(opt.simulation_config()));
    let evaluator = Arc::new(Evaluator::new(store, runner, opt.timeouts()));

    let (job_queue, job_receiver) = queue::channel();
    let worker_handle = if disable_worker {
        log::info!("Background worker disabled, judging on demand only");
        None
    } else {
        let worker = JudgeWorker::new(evaluator.clone(), job_receiver);
        Some(tokio::spawn(worker.run()))
    };

    let context = Data::new(JudgeContext::new(
        evaluator,
        worker_handle.as_ref().map(|_| job_queue.clone()),
    ));
    log::info!("Listening on 0.0.0.0:{}", port);
    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .app_data(context.clone())
            .configure(handler::route)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await?;

    if let Some(worker_handle) = worker_handle {
        log::info!("Waiting for the judge worker to drain the queue");
        job_queue.enqueue(Job::Shutdown);
        worker_handle.await?;
    }
    Ok(())
}

fn judge(opt: &JudgerOpt, problem_id: ProblemId, src_path: &Path) -> anyhow::Result<()> {
    let source = fs::read_to_string(src_path)?;
    let timeouts = opt.timeouts();
    let runner = SandboxRunner::new(opt.simulation_config());
    let outcome = runner.run(&SimulationRequest {
        submission_id: SubmissionId(0),
        problem_id,
        source,
        compile_timeout: timeouts.compile,
        run_timeout: timeouts.run,
    });

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    std::process::exit(outcome.error_code.code());
}

fn wave(path: &Path) -> anyhow::Result<()> {
    let report = VcdDecoder::default().decode_file(path);
    println!("{}", serde_json::to_string_pretty(&report)?);
    match report {
        WaveformReport::Timeline { .. } => Ok(()),
        WaveformReport::Absent => anyhow::bail!("Waveform {:?} does not exist", path),
        WaveformReport::ParseError { message } => {
            anyhow::bail!("Failed to decode {:?}: {}", path, message)
        }
    }
}
