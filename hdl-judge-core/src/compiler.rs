use serde_derive::{Deserialize, Serialize};

use crate::run::executor::Executor;

pub const DEFAULT_COMPILER: &str = "iverilog";
pub const DEFAULT_SIMULATOR: &str = "vvp";

/// The HDL compiler and the simulator that executes its output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toolchain {
    pub compiler: Executor,
    pub simulator: Executor,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            compiler: Executor::new(DEFAULT_COMPILER),
            simulator: Executor::new(DEFAULT_SIMULATOR),
        }
    }
}

impl Toolchain {
    pub fn new(compiler: Executor, simulator: Executor) -> Self {
        Self {
            compiler,
            simulator,
        }
    }

    /// `-o <output> -s <top_module> -f <file_list>`
    pub fn compile_args(output: &str, top_module: &str, file_list: &str) -> Vec<String> {
        vec![
            "-o".to_string(),
            output.to_string(),
            "-s".to_string(),
            top_module.to_string(),
            "-f".to_string(),
            file_list.to_string(),
        ]
    }

    /// `-n <output>`: non-interactive, `$stop` behaves like `$finish`.
    pub fn simulate_args(output: &str) -> Vec<String> {
        vec!["-n".to_string(), output.to_string()]
    }
}
