use serde_derive::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{error::JudgeCoreError, judge::ProblemId};

pub const MANIFEST_FILE_NAME: &str = "judge.yaml";

/// Well-known file names inside a sandbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxLayout {
    pub testbench_top: String,
    pub file_list: String,
    /// The module name the testbench and file list expect.
    pub source_file: String,
    pub compiled_file: String,
    pub log_file: String,
    pub waveform_file: String,
}

impl Default for SandboxLayout {
    fn default() -> Self {
        Self {
            testbench_top: "test_bench".to_string(),
            file_list: "sim_file_list.f".to_string(),
            source_file: "user_module.v".to_string(),
            compiled_file: "sim_exec".to_string(),
            log_file: "simulation.log".to_string(),
            waveform_file: "waveform.vcd".to_string(),
        }
    }
}

/// Optional per-problem overrides read from `judge.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BundleManifest {
    pub testbench_top: Option<String>,
    pub file_list: Option<String>,
    pub waveform_file: Option<String>,
}

/// A problem's testbench, reference model and file list. Read-only.
#[derive(Debug, Clone)]
pub struct ProjectBundle {
    pub problem_id: ProblemId,
    pub path: PathBuf,
    pub manifest: BundleManifest,
}

impl ProjectBundle {
    pub fn bundle_dir(problem_root: &Path, problem_id: ProblemId) -> PathBuf {
        problem_root
            .join(format!("exp{}", problem_id))
            .join("project")
    }

    /// `Ok(None)` when the problem has no bundle directory.
    pub fn locate(problem_root: &Path, problem_id: ProblemId) -> Result<Option<Self>, JudgeCoreError> {
        let path = Self::bundle_dir(problem_root, problem_id);
        if !path.is_dir() {
            return Ok(None);
        }

        let manifest_path = path.join(MANIFEST_FILE_NAME);
        let manifest = if manifest_path.is_file() {
            let content = fs::read_to_string(&manifest_path)?;
            serde_yaml::from_str(&content)?
        } else {
            BundleManifest::default()
        };
        log::debug!("Located bundle {:?} with manifest {:?}", path, manifest);

        Ok(Some(Self {
            problem_id,
            path,
            manifest,
        }))
    }

    pub fn layout(&self, base: &SandboxLayout) -> SandboxLayout {
        let mut layout = base.clone();
        if let Some(top) = &self.manifest.testbench_top {
            layout.testbench_top = top.clone();
        }
        if let Some(file_list) = &self.manifest.file_list {
            layout.file_list = file_list.clone();
        }
        if let Some(waveform_file) = &self.manifest.waveform_file {
            layout.waveform_file = waveform_file.clone();
        }
        layout
    }
}
