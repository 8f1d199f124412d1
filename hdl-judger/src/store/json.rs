use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use hdl_judge_core::judge::{result::SimulationOutcome, SubmissionId};

use super::{
    BeginRun, NewSubmission, StoreError, Submission, SubmissionStatus, SubmissionStore,
    SubmissionTable,
};

/// A submission table mirrored to one pretty-printed JSON file, rewritten
/// after every mutation.
#[derive(Debug)]
pub struct JsonSubmissionStore {
    file_path: PathBuf,
    table: Mutex<SubmissionTable>,
}

impl JsonSubmissionStore {
    /// Start a fresh store, replacing whatever is at `file_path`.
    pub fn init(file_path: PathBuf) -> Result<Self, StoreError> {
        let table = SubmissionTable::default();
        write_table_file(&file_path, &table)?;
        Ok(Self {
            file_path,
            table: Mutex::new(table),
        })
    }

    pub fn load(file_path: PathBuf) -> Result<Self, StoreError> {
        let table = load_table_file(&file_path)?;
        for submission in table.submissions() {
            if submission.status == SubmissionStatus::Running {
                log::warn!(
                    "Submission {} was interrupted while running and stays in running",
                    submission.id
                );
            }
        }
        Ok(Self {
            file_path,
            table: Mutex::new(table),
        })
    }

    /// Load `file_path` if it exists, otherwise initialise it.
    pub fn open(file_path: PathBuf) -> Result<Self, StoreError> {
        if file_path.is_file() {
            log::info!("Loading submission store from {:?}", file_path);
            Self::load(file_path)
        } else {
            log::info!("Creating submission store at {:?}", file_path);
            Self::init(file_path)
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, SubmissionTable>, StoreError> {
        self.table.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Apply `mutate` to a copy of the table and keep the copy only once it
    /// is written, all while holding the lock. A failed write leaves memory
    /// as it is on disk.
    fn mutate<T>(
        &self,
        mutate: impl FnOnce(&mut SubmissionTable) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut table = self.lock()?;
        let mut updated = table.clone();
        let value = mutate(&mut updated)?;
        write_table_file(&self.file_path, &updated)?;
        *table = updated;
        Ok(value)
    }
}

impl SubmissionStore for JsonSubmissionStore {
    fn create(&self, new: NewSubmission) -> Result<Submission, StoreError> {
        self.mutate(|table| Ok(table.create(new)))
    }

    fn get(&self, id: SubmissionId) -> Result<Submission, StoreError> {
        self.lock()?.get(id)
    }

    fn list_by_user(&self, user_id: u64) -> Result<Vec<Submission>, StoreError> {
        Ok(self.lock()?.list_by_user(user_id))
    }

    fn begin_run(&self, id: SubmissionId) -> Result<BeginRun, StoreError> {
        self.mutate(|table| table.begin_run(id))
    }

    fn complete_run(
        &self,
        id: SubmissionId,
        outcome: &SimulationOutcome,
        diagnostic: Option<String>,
    ) -> Result<Submission, StoreError> {
        self.mutate(|table| table.complete_run(id, outcome, diagnostic))
    }
}

fn load_table_file(file_path: &Path) -> Result<SubmissionTable, StoreError> {
    let content = fs::read_to_string(file_path)?;
    let table: SubmissionTable = serde_json::from_str(&content)?;
    Ok(table)
}

fn write_table_file(file_path: &Path, table: &SubmissionTable) -> Result<(), StoreError> {
    let content = serde_json::to_string_pretty(table)?;
    if let Some(parent) = file_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(file_path, content)?;
    Ok(())
}
