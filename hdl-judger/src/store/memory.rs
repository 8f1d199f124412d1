use std::sync::{Mutex, MutexGuard};

use hdl_judge_core::judge::{result::SimulationOutcome, SubmissionId};

use super::{BeginRun, NewSubmission, StoreError, Submission, SubmissionStore, SubmissionTable};

/// Keeps submissions for the lifetime of the process only.
#[derive(Debug, Default)]
pub struct MemorySubmissionStore {
    table: Mutex<SubmissionTable>,
}

impl MemorySubmissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, SubmissionTable>, StoreError> {
        self.table.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl SubmissionStore for MemorySubmissionStore {
    fn create(&self, new: NewSubmission) -> Result<Submission, StoreError> {
        Ok(self.lock()?.create(new))
    }

    fn get(&self, id: SubmissionId) -> Result<Submission, StoreError> {
        self.lock()?.get(id)
    }

    fn list_by_user(&self, user_id: u64) -> Result<Vec<Submission>, StoreError> {
        Ok(self.lock()?.list_by_user(user_id))
    }

    fn begin_run(&self, id: SubmissionId) -> Result<BeginRun, StoreError> {
        self.lock()?.begin_run(id)
    }

    fn complete_run(
        &self,
        id: SubmissionId,
        outcome: &SimulationOutcome,
        diagnostic: Option<String>,
    ) -> Result<Submission, StoreError> {
        self.lock()?.complete_run(id, outcome, diagnostic)
    }
}
