use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    error::JudgeCoreError,
    judge::SubmissionId,
    utils::{move_file, remove_if_exists},
};

/// Durable, write-once home of per-submission logs and waveforms.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn log_path(&self, submission_id: SubmissionId) -> PathBuf {
        self.root.join(format!("sim_{}.log", submission_id))
    }

    pub fn waveform_path(&self, submission_id: SubmissionId) -> PathBuf {
        self.root.join(format!("wave_{}.vcd", submission_id))
    }

    /// Move whichever of `log` and `waveform` exist into the store.
    /// If the second move fails the first one is rolled back.
    pub fn persist(
        &self,
        submission_id: SubmissionId,
        log: &Path,
        waveform: &Path,
    ) -> Result<(Option<PathBuf>, Option<PathBuf>), JudgeCoreError> {
        fs::create_dir_all(&self.root)?;

        let log_path = persist_one(log, self.log_path(submission_id))?;
        let waveform_path = match persist_one(waveform, self.waveform_path(submission_id)) {
            Ok(path) => path,
            Err(e) => {
                if let Some(log_path) = &log_path {
                    if let Err(rm) = remove_if_exists(log_path) {
                        log::warn!("Failed to roll back {:?}: {:?}", log_path, rm);
                    }
                }
                return Err(e);
            }
        };
        Ok((log_path, waveform_path))
    }
}

fn persist_one(src: &Path, dest: PathBuf) -> Result<Option<PathBuf>, JudgeCoreError> {
    if !src.is_file() {
        return Ok(None);
    }
    move_file(src, &dest)?;
    Ok(Some(dest))
}
