use serde_derive::{Deserialize, Serialize};
use std::{fmt, path::PathBuf, str::FromStr};

use crate::run::process::ProcessStatus;

/// Printed by testbenches; the judge and testbench authors agree on these.
pub const TEST_FAILED_MARKER: &str = "TEST FAILED";
pub const TEST_PASSED_MARKER: &str = "TEST PASSED";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    #[serde(rename = "SUCCESS")]
    Success,
    #[serde(rename = "ERROR_COMPILE_FAIL")]
    CompileFail,
    /// The simulation finished but left no waveform behind.
    #[serde(rename = "ERROR_SIM_LOAD_FAIL")]
    SimLoadFail,
    #[serde(rename = "ERROR_SIM_RUN_FAIL")]
    SimRunFail,
    #[serde(rename = "ERROR_SIM_TIMEOUT")]
    SimTimeout,
    /// The testbench reported a functional mismatch.
    #[serde(rename = "ERROR_MISMATCH")]
    Mismatch,
    #[serde(rename = "ERROR_UNKNOWN")]
    Unknown,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 7] = [
        ErrorCode::Success,
        ErrorCode::CompileFail,
        ErrorCode::SimLoadFail,
        ErrorCode::SimRunFail,
        ErrorCode::SimTimeout,
        ErrorCode::Mismatch,
        ErrorCode::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Success => "SUCCESS",
            ErrorCode::CompileFail => "ERROR_COMPILE_FAIL",
            ErrorCode::SimLoadFail => "ERROR_SIM_LOAD_FAIL",
            ErrorCode::SimRunFail => "ERROR_SIM_RUN_FAIL",
            ErrorCode::SimTimeout => "ERROR_SIM_TIMEOUT",
            ErrorCode::Mismatch => "ERROR_MISMATCH",
            ErrorCode::Unknown => "ERROR_UNKNOWN",
        }
    }

    /// Numeric code, also used as the exit status of a one-shot judge run.
    /// 6 is retired.
    pub fn code(&self) -> i32 {
        match self {
            ErrorCode::Success => 0,
            ErrorCode::CompileFail => 1,
            ErrorCode::SimLoadFail => 2,
            ErrorCode::SimRunFail => 3,
            ErrorCode::SimTimeout => 4,
            ErrorCode::Mismatch => 5,
            ErrorCode::Unknown => 7,
        }
    }

    pub fn is_success(&self) -> bool {
        *self == ErrorCode::Success
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorCode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ErrorCode::ALL
            .into_iter()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("ErrorCode not found: {}", s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationOutcome {
    pub error_code: ErrorCode,
    pub log_path: Option<PathBuf>,
    pub waveform_path: Option<PathBuf>,
}

impl SimulationOutcome {
    pub fn unknown() -> Self {
        Self {
            error_code: ErrorCode::Unknown,
            log_path: None,
            waveform_path: None,
        }
    }
}

pub fn check_compile_result(status: ProcessStatus) -> Option<ErrorCode> {
    log::debug!("Compiler status: {}", status);
    if status.success() {
        None
    } else {
        Some(ErrorCode::CompileFail)
    }
}

pub fn check_simulation_result(status: ProcessStatus) -> Option<ErrorCode> {
    log::debug!("Simulator status: {}", status);
    match status {
        _ if status.success() => None,
        ProcessStatus::TimedOut => Some(ErrorCode::SimTimeout),
        ProcessStatus::Exited(_) | ProcessStatus::Signaled(_) => Some(ErrorCode::SimRunFail),
    }
}

/// Classify a completed simulation from its accumulated log text.
/// A failure marker wins over a success marker.
pub fn check_log(log: &str, waveform_exists: bool) -> ErrorCode {
    if log.contains(TEST_FAILED_MARKER) {
        ErrorCode::Mismatch
    } else if !waveform_exists {
        ErrorCode::SimLoadFail
    } else if log.contains(TEST_PASSED_MARKER) {
        ErrorCode::Success
    } else {
        ErrorCode::Unknown
    }
}
