use std::{path::PathBuf, time::Duration};

use chrono::Local;
use hdl_judge_core::{
    bundle::SandboxLayout,
    compiler::Toolchain,
    judge::SimulationConfig,
    run::{executor::Executor, DEFAULT_TOOL_RLIMIT_CONFIGS},
};
use hdl_judger::worker::evaluator::JudgeTimeouts;
use std::io::Write;
use structopt::StructOpt;

#[derive(StructOpt, Debug, Clone)]
#[structopt(name = "hdl-judger")]
pub struct JudgerOpt {
    /// For loading Opt from .env file
    #[structopt(long, default_value = ".env")]
    pub env_path: PathBuf,
    #[structopt(long, default_value = "override.env")]
    pub override_env_path: PathBuf,

    #[structopt(subcommand)]
    pub cmd: JudgerCommand,

    /// Where `exp<problem_id>/project` bundles live
    #[structopt(long, env = "PROBLEM_ROOT", default_value = "Prob")]
    pub problem_root: PathBuf,
    /// Parent of per-run sandboxes, the system temp dir if unset
    #[structopt(long, env = "WORK_ROOT")]
    pub work_root: Option<PathBuf>,
    /// Where logs and waveforms of finished submissions are kept
    #[structopt(long, env = "ARTIFACT_ROOT", default_value = "sub_data")]
    pub artifact_root: PathBuf,
    #[structopt(long, env = "IVERILOG", default_value = "iverilog")]
    pub compiler: PathBuf,
    #[structopt(long, env = "VVP", default_value = "vvp")]
    pub simulator: PathBuf,
    /// Compile timeout in seconds
    #[structopt(long, env = "COMPILE_TIMEOUT", default_value = "6")]
    pub compile_timeout: u64,
    /// Simulation timeout in seconds
    #[structopt(long, env = "RUN_TIMEOUT", default_value = "6")]
    pub run_timeout: u64,
    /// Keep submissions in this JSON file instead of memory
    #[structopt(long, env = "SUBMISSION_STORE_PATH")]
    pub store_path: Option<PathBuf>,
}

#[derive(StructOpt, Debug, Clone)]
pub enum JudgerCommand {
    /// Serve the HTTP API, judging queued submissions in the background
    Serve {
        #[structopt(long, env = "PORT", default_value = "8000")]
        port: u16,
        /// Only judge on demand through the evaluate endpoint
        #[structopt(
            long,
            env = "DISABLE_WORKER",
            parse(try_from_str),
            default_value = "false"
        )]
        disable_worker: bool,
    },
    /// Runs a single simulation through command line
    Judge {
        #[structopt(short, long)]
        problem_id: u32,
        #[structopt(short, long)]
        src_path: PathBuf,
    },
    /// Decode a waveform file and print its signal timeline
    Wave {
        #[structopt(long)]
        path: PathBuf,
    },
}

impl JudgerOpt {
    pub fn simulation_config(&self) -> SimulationConfig {
        SimulationConfig {
            problem_root: self.problem_root.clone(),
            work_root: self.work_root.clone().unwrap_or_else(std::env::temp_dir),
            artifact_root: self.artifact_root.clone(),
            toolchain: Toolchain::new(
                Executor::new(&self.compiler),
                Executor::new(&self.simulator),
            ),
            layout: SandboxLayout::default(),
            rlimit_configs: DEFAULT_TOOL_RLIMIT_CONFIGS,
        }
    }

    pub fn timeouts(&self) -> JudgeTimeouts {
        JudgeTimeouts {
            compile: Duration::from_secs(self.compile_timeout),
            run: Duration::from_secs(self.run_timeout),
        }
    }
}

/// Try to load env from a .env file, if not found, fallback to ENV
pub fn load_option() -> JudgerOpt {
    // First load env_path from Args
    let opt = JudgerOpt::from_args();
    if opt.env_path.exists() {
        println!("loading env from file: {:?}", opt.env_path);
        dotenv::from_path(&opt.env_path).ok();
    } else {
        println!("loading env from ENV");
        dotenv::dotenv().ok();
    }
    if opt.override_env_path.exists() {
        println!(
            "loading override env from file: {:?}",
            opt.override_env_path
        );
        dotenv::from_path(&opt.override_env_path).ok();
    }

    setup_logger();

    // Load opt again with ENV
    let opt = JudgerOpt::from_args();
    log::debug!("load opt: {:?}", opt);
    opt
}

fn setup_logger() {
    let env = env_logger::Env::default().default_filter_or("info");
    env_logger::Builder::from_env(env)
        .format(|buf, record| {
            writeln!(
                buf,
                "{} {:5} [{}:{}] {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.file().unwrap_or("<unknown>"),
                record.line().unwrap_or(0),
                &record.args()
            )
        })
        .init();
}
