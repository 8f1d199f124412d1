use chrono::Local;
use std::{fs::OpenOptions, io::Write, path::PathBuf};

use super::{
    result::{check_compile_result, check_log, check_simulation_result, ErrorCode, SimulationOutcome},
    SimulationConfig, SimulationRequest, SimulationRunner,
};
use crate::{
    artifact::ArtifactStore,
    bundle::{ProjectBundle, SandboxLayout},
    compiler::Toolchain,
    error::JudgeCoreError,
    run::{
        process::{run_with_timeout, ProcessConfig, ProcessStatus},
        sandbox::Sandbox,
    },
    utils::{read_lossy, remove_if_exists},
};

/// Runs submissions through the real compiler and simulator inside a
/// throwaway sandbox directory.
pub struct SandboxRunner {
    config: SimulationConfig,
    artifacts: ArtifactStore,
}

impl SandboxRunner {
    pub fn new(config: SimulationConfig) -> Self {
        let artifacts = ArtifactStore::new(config.artifact_root.clone());
        Self { config, artifacts }
    }

    pub fn run_simulation(&self, request: &SimulationRequest) -> SimulationOutcome {
        log::info!(
            "Simulating submission {} for problem {}",
            request.submission_id,
            request.problem_id
        );
        match self.try_run(request) {
            Ok(outcome) => {
                log::info!(
                    "Submission {} finished with {}",
                    request.submission_id,
                    outcome.error_code
                );
                outcome
            }
            Err(e) => {
                log::error!(
                    "Submission {} hit an infrastructure error: {}",
                    request.submission_id,
                    e
                );
                SimulationOutcome::unknown()
            }
        }
    }

    fn try_run(&self, request: &SimulationRequest) -> Result<SimulationOutcome, JudgeCoreError> {
        let bundle = match ProjectBundle::locate(&self.config.problem_root, request.problem_id)? {
            Some(bundle) => bundle,
            None => {
                log::warn!(
                    "No project bundle for problem {} under {:?}",
                    request.problem_id,
                    self.config.problem_root
                );
                return Ok(SimulationOutcome::unknown());
            }
        };
        let layout = bundle.layout(&self.config.layout);

        // Dropping the sandbox removes it, on every return path below.
        let sandbox = Sandbox::create(&self.config.work_root)?;
        sandbox.populate_from(&bundle.path)?;
        remove_if_exists(&sandbox.join(&layout.log_file))?;
        remove_if_exists(&sandbox.join(&layout.waveform_file))?;
        sandbox.write_file(&layout.source_file, &request.source)?;

        let error_code = self.simulate(&sandbox, &layout, request)?;

        let (log_path, waveform_path) = self.artifacts.persist(
            request.submission_id,
            &sandbox.join(&layout.log_file),
            &sandbox.join(&layout.waveform_file),
        )?;

        Ok(SimulationOutcome {
            error_code,
            log_path,
            waveform_path,
        })
    }

    fn simulate(
        &self,
        sandbox: &Sandbox,
        layout: &SandboxLayout,
        request: &SimulationRequest,
    ) -> Result<ErrorCode, JudgeCoreError> {
        let sim_log = SimulationLog {
            path: sandbox.join(&layout.log_file),
        };
        sim_log.note(&format!("INFO: Start Sim at {}", Local::now().to_rfc3339()))?;

        sim_log.note("[1/3] Compiling...")?;
        let compile = run_with_timeout(
            &self.config.toolchain.compiler,
            &Toolchain::compile_args(&layout.compiled_file, &layout.testbench_top, &layout.file_list),
            &ProcessConfig {
                working_dir: sandbox.path(),
                log_path: &sim_log.path,
                timeout: request.compile_timeout,
                rlimit_configs: self.config.rlimit_configs,
            },
        )?;
        if let Some(error_code) = check_compile_result(compile.status) {
            sim_log.note(match compile.status {
                ProcessStatus::TimedOut => "ERROR: Compilation timeout",
                _ => "ERROR: Compilation failed",
            })?;
            return Ok(error_code);
        }

        sim_log.note(&format!(
            "[2/3] Running simulation (timeout: {:?})...",
            request.run_timeout
        ))?;
        let simulate = run_with_timeout(
            &self.config.toolchain.simulator,
            &Toolchain::simulate_args(&layout.compiled_file),
            &ProcessConfig {
                working_dir: sandbox.path(),
                log_path: &sim_log.path,
                timeout: request.run_timeout,
                rlimit_configs: self.config.rlimit_configs,
            },
        )?;
        log::debug!("Simulation took {:?}", simulate.real_time_cost);
        if let Some(error_code) = check_simulation_result(simulate.status) {
            match simulate.status {
                ProcessStatus::TimedOut => sim_log.note("ERROR: Simulation timeout")?,
                status => sim_log.note(&format!("ERROR: Simulation runtime error ({})", status))?,
            }
            return Ok(error_code);
        }

        sim_log.note("[3/3] Checking results...")?;
        let content = read_lossy(&sim_log.path)?;
        let waveform_exists = sandbox.join(&layout.waveform_file).is_file();
        let error_code = check_log(&content, waveform_exists);
        sim_log.note(match error_code {
            ErrorCode::Mismatch => "ERROR: Output mismatch",
            ErrorCode::SimLoadFail => "ERROR: VCD file not generated",
            ErrorCode::Success => "INFO: Simulation PASSED",
            _ => "ERROR: Unknown simulation result",
        })?;

        sim_log.note(&format!("INFO: End Sim at {}", Local::now().to_rfc3339()))?;
        Ok(error_code)
    }
}

impl SimulationRunner for SandboxRunner {
    fn run(&self, request: &SimulationRequest) -> SimulationOutcome {
        self.run_simulation(request)
    }
}

/// The judge's own progress lines, interleaved with tool output.
struct SimulationLog {
    path: PathBuf,
}

impl SimulationLog {
    fn note(&self, line: &str) -> Result<(), JudgeCoreError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }
}
