use serde_derive::{Deserialize, Serialize};
use std::{fmt, path::PathBuf, time::Duration};

use crate::{bundle::SandboxLayout, compiler::Toolchain, run::RlimitConfigs};

use self::result::SimulationOutcome;

pub mod result;
pub mod runner;

pub const DEFAULT_COMPILE_TIMEOUT: Duration = Duration::from_secs(6);
pub const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(6);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(pub u64);

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProblemId(pub u32);

impl fmt::Display for ProblemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything one simulation run needs to know about the submission.
#[derive(Debug, Clone)]
pub struct SimulationRequest {
    pub submission_id: SubmissionId,
    pub problem_id: ProblemId,
    pub source: String,
    pub compile_timeout: Duration,
    pub run_timeout: Duration,
}

/// Deployment-wide settings of the sandbox runner.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Holds `exp<problem_id>/project` bundles.
    pub problem_root: PathBuf,
    /// Parent of the per-run sandbox directories.
    pub work_root: PathBuf,
    pub artifact_root: PathBuf,
    pub toolchain: Toolchain,
    pub layout: SandboxLayout,
    pub rlimit_configs: RlimitConfigs,
}

/// Executes one submission against its problem bundle.
///
/// Implementations must never panic or fail: every infrastructure problem is
/// folded into the returned outcome's error code.
pub trait SimulationRunner: Send + Sync {
    fn run(&self, request: &SimulationRequest) -> SimulationOutcome;
}
