use nix::sys::resource::{
    setrlimit,
    Resource::{RLIMIT_AS, RLIMIT_CPU, RLIMIT_FSIZE, RLIMIT_STACK},
};
use serde_derive::{Deserialize, Serialize};

use crate::error::JudgeCoreError;

pub mod executor;
pub mod process;
pub mod sandbox;

/// Limits applied to both the compiler and the simulator, behind the
/// wall-clock timeout.
pub static DEFAULT_TOOL_RLIMIT_CONFIGS: RlimitConfigs = RlimitConfigs {
    stack_limit: None,
    as_limit: Some((1024 * 1024 * 1024, 1024 * 1024 * 1024)),
    cpu_limit: Some((30, 60)),
    fsize_limit: Some((256 * 1024 * 1024, 256 * 1024 * 1024)),
};

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RlimitConfigs {
    pub stack_limit: Option<(u64, u64)>,
    pub as_limit: Option<(u64, u64)>,
    pub cpu_limit: Option<(u64, u64)>,
    pub fsize_limit: Option<(u64, u64)>,
}

impl RlimitConfigs {
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Runs in the forked child before exec, so it must not log or allocate.
    pub fn load(&self) -> Result<(), JudgeCoreError> {
        if let Some(stack_limit) = self.stack_limit {
            setrlimit(RLIMIT_STACK, stack_limit.0, stack_limit.1)?;
        }
        if let Some(as_limit) = self.as_limit {
            setrlimit(RLIMIT_AS, as_limit.0, as_limit.1)?;
        }
        if let Some(cpu_limit) = self.cpu_limit {
            setrlimit(RLIMIT_CPU, cpu_limit.0, cpu_limit.1)?;
        }
        if let Some(fsize_limit) = self.fsize_limit {
            setrlimit(RLIMIT_FSIZE, fsize_limit.0, fsize_limit.1)?;
        }
        Ok(())
    }
}
