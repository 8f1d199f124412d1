use nix::{
    sys::signal::{killpg, Signal},
    unistd::Pid,
};
use std::{
    fmt,
    fs::OpenOptions,
    io,
    os::unix::process::{CommandExt, ExitStatusExt},
    path::Path,
    process::{Child, ExitStatus, Stdio},
    time::{Duration, Instant},
};
use wait_timeout::ChildExt;

use super::{executor::Executor, RlimitConfigs};
use crate::error::JudgeCoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    Exited(i32),
    Signaled(i32),
    TimedOut,
}

impl ProcessStatus {
    pub fn success(&self) -> bool {
        *self == ProcessStatus::Exited(0)
    }
}

impl From<ExitStatus> for ProcessStatus {
    fn from(status: ExitStatus) -> Self {
        match (status.code(), status.signal()) {
            (Some(code), _) => ProcessStatus::Exited(code),
            (None, Some(signal)) => ProcessStatus::Signaled(signal),
            (None, None) => ProcessStatus::Exited(-1),
        }
    }
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessStatus::Exited(code) => write!(f, "exit code {}", code),
            ProcessStatus::Signaled(signal) => write!(f, "killed by signal {}", signal),
            ProcessStatus::TimedOut => write!(f, "timed out"),
        }
    }
}

#[derive(Debug)]
pub struct RawRunResultInfo {
    pub status: ProcessStatus,
    pub real_time_cost: Duration,
}

pub struct ProcessConfig<'a> {
    pub working_dir: &'a Path,
    /// stdout and stderr are both appended here.
    pub log_path: &'a Path,
    pub timeout: Duration,
    pub rlimit_configs: RlimitConfigs,
}

/// Spawn `executor` in its own process group and wait at most `timeout`.
/// On expiry the whole group is killed, reaped, and reported as `TimedOut`.
pub fn run_with_timeout(
    executor: &Executor,
    args: &[String],
    config: &ProcessConfig,
) -> Result<RawRunResultInfo, JudgeCoreError> {
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(config.log_path)?;

    let mut command = executor.command(args);
    command
        .current_dir(config.working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::from(log_file.try_clone()?))
        .stderr(Stdio::from(log_file))
        .process_group(0);
    let rlimit_configs = config.rlimit_configs;
    // SAFETY: the hook only calls setrlimit, which is async-signal-safe.
    unsafe {
        command.pre_exec(move || load_rlimits_in_child(&rlimit_configs));
    }

    log::debug!(
        "Spawning `{}` in {:?} with timeout {:?}, rlimit {:?}",
        executor.describe(args),
        config.working_dir,
        config.timeout,
        config.rlimit_configs
    );
    let begin_time = Instant::now();
    let mut child = command.spawn()?;

    let status = match child.wait_timeout(config.timeout) {
        Ok(Some(status)) => ProcessStatus::from(status),
        Ok(None) => {
            log::info!(
                "Process {} exceeded {:?}, killing its group",
                child.id(),
                config.timeout
            );
            kill_process_group(&mut child);
            child.wait()?;
            ProcessStatus::TimedOut
        }
        Err(e) => {
            kill_process_group(&mut child);
            let _ = child.wait();
            return Err(e.into());
        }
    };

    log::debug!("Process {} finished: {}", child.id(), status);
    Ok(RawRunResultInfo {
        status,
        real_time_cost: begin_time.elapsed(),
    })
}

fn load_rlimits_in_child(rlimit_configs: &RlimitConfigs) -> io::Result<()> {
    match rlimit_configs.load() {
        Ok(()) => Ok(()),
        Err(JudgeCoreError::NixErrno(errno)) => Err(io::Error::from(errno)),
        Err(_) => Err(io::Error::from(io::ErrorKind::Other)),
    }
}

fn kill_process_group(child: &mut Child) {
    let pgid = Pid::from_raw(child.id() as i32);
    if let Err(errno) = killpg(pgid, Signal::SIGKILL) {
        log::warn!("killpg({}) failed: {}, killing leader only", pgid, errno);
        if let Err(e) = child.kill() {
            log::error!("Failed to kill process {}: {:?}", pgid, e);
        }
    }
}

#[cfg(test)]
mod process_test {
    use super::*;
    use std::fs;

    fn sh(script: &str) -> (Executor, Vec<String>) {
        (
            Executor::new("/bin/sh"),
            vec!["-c".to_string(), script.to_string()],
        )
    }

    fn run(script: &str, timeout: Duration) -> (RawRunResultInfo, String) {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("simulation.log");
        fs::write(&log_path, "header\n").unwrap();
        let (executor, args) = sh(script);
        let info = run_with_timeout(
            &executor,
            &args,
            &ProcessConfig {
                working_dir: dir.path(),
                log_path: &log_path,
                timeout,
                rlimit_configs: RlimitConfigs::unlimited(),
            },
        )
        .unwrap();
        (info, fs::read_to_string(&log_path).unwrap())
    }

    #[test]
    fn test_output_is_appended_to_log() {
        let (info, log) = run("echo out; echo err 1>&2", Duration::from_secs(5));
        assert!(info.status.success());
        assert!(log.starts_with("header\n"));
        assert!(log.contains("out\n"));
        assert!(log.contains("err\n"));
    }

    #[test]
    fn test_exit_code_is_reported() {
        let (info, _) = run("exit 3", Duration::from_secs(5));
        assert_eq!(info.status, ProcessStatus::Exited(3));
    }

    #[test]
    fn test_timeout_kills_process_group() {
        let (info, _) = run("sleep 10 & sleep 10; wait", Duration::from_millis(300));
        assert_eq!(info.status, ProcessStatus::TimedOut);
        assert!(info.real_time_cost < Duration::from_secs(5));
    }

    #[test]
    fn test_missing_program_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("simulation.log");
        let result = run_with_timeout(
            &Executor::new("/nonexistent/iverilog"),
            &[],
            &ProcessConfig {
                working_dir: dir.path(),
                log_path: &log_path,
                timeout: Duration::from_secs(1),
                rlimit_configs: RlimitConfigs::unlimited(),
            },
        );
        assert!(result.is_err());
    }
}
