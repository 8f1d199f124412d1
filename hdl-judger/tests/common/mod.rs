#![allow(dead_code)]

use std::{
    fs,
    path::Path,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    thread,
    time::Duration,
};

use hdl_judge_core::{
    bundle::{ProjectBundle, SandboxLayout},
    compiler::Toolchain,
    judge::{
        result::{ErrorCode, SimulationOutcome},
        ProblemId, SimulationConfig, SimulationRequest, SimulationRunner, SubmissionId,
    },
    run::{executor::Executor, DEFAULT_TOOL_RLIMIT_CONFIGS},
};
use hdl_judger::{
    store::{MemorySubmissionStore, NewSubmission, SubmissionStore},
    worker::evaluator::{Evaluator, JudgeTimeouts},
};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Counts calls and answers with a fixed error code after a short pause.
pub struct CountingRunner {
    pub calls: AtomicUsize,
    pub seen: Mutex<Vec<SubmissionId>>,
    error_code: ErrorCode,
    delay: Duration,
}

impl CountingRunner {
    pub fn new(error_code: ErrorCode, delay: Duration) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            seen: Mutex::new(vec![]),
            error_code,
            delay,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SimulationRunner for CountingRunner {
    fn run(&self, request: &SimulationRequest) -> SimulationOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(request.submission_id);
        thread::sleep(self.delay);
        SimulationOutcome {
            error_code: self.error_code,
            log_path: None,
            waveform_path: None,
        }
    }
}

pub struct PanickingRunner;

impl SimulationRunner for PanickingRunner {
    fn run(&self, _request: &SimulationRequest) -> SimulationOutcome {
        panic!("simulator exploded");
    }
}

pub fn new_submission(problem_id: u32) -> NewSubmission {
    NewSubmission {
        user_id: 1,
        problem_id: ProblemId(problem_id),
        code: "module user_module(input clk, output out); endmodule".to_string(),
    }
}

pub fn evaluator_with(runner: Arc<dyn SimulationRunner>) -> Arc<Evaluator> {
    let store: Arc<dyn SubmissionStore> = Arc::new(MemorySubmissionStore::new());
    Arc::new(Evaluator::new(store, runner, JudgeTimeouts::default()))
}

const FAKE_COMPILER: &str = r#"
test -f "$6" || exit 2
test -f user_module.v || exit 2
echo "compiled $4" > "$2"
"#;

const FAKE_SIMULATOR: &str = r#"
test -f "$2" || exit 3
echo "TEST PASSED"
printf '$scope module test_bench $end\n$var wire 1 ! clk $end\n$var wire 1 " rstn $end\n$upscope $end\n$enddefinitions $end\n#0\n1!\n0"\n#5\n0!\n' > waveform.vcd
"#;

/// A problem root with bundle `exp1`, and a toolchain of shell scripts
/// that make every submission pass.
pub fn passing_simulation_config(root: &Path) -> SimulationConfig {
    let problem_root = root.join("Prob");
    let bundle = ProjectBundle::bundle_dir(&problem_root, ProblemId(1));
    fs::create_dir_all(&bundle).unwrap();
    fs::write(bundle.join("sim_file_list.f"), "test_bench.v\nuser_module.v\n").unwrap();
    fs::write(bundle.join("test_bench.v"), "module test_bench; endmodule\n").unwrap();

    let tools = root.join("tools");
    fs::create_dir_all(&tools).unwrap();
    fs::write(tools.join("fake_iverilog.sh"), FAKE_COMPILER).unwrap();
    fs::write(tools.join("fake_vvp.sh"), FAKE_SIMULATOR).unwrap();

    SimulationConfig {
        problem_root,
        work_root: root.join("work"),
        artifact_root: root.join("sub_data"),
        toolchain: Toolchain::new(
            sh(&tools.join("fake_iverilog.sh")),
            sh(&tools.join("fake_vvp.sh")),
        ),
        layout: SandboxLayout::default(),
        rlimit_configs: DEFAULT_TOOL_RLIMIT_CONFIGS,
    }
}

fn sh(script: &Path) -> Executor {
    Executor::new("/bin/sh").with_leading_args(vec![script.to_string_lossy().into_owned()])
}
