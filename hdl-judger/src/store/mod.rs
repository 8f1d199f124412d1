use chrono::{DateTime, Utc};
use hdl_judge_core::judge::{
    result::{ErrorCode, SimulationOutcome},
    ProblemId, SubmissionId,
};
use serde_derive::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, io, path::PathBuf};

pub mod json;
pub mod memory;

pub use json::JsonSubmissionStore;
pub use memory::MemorySubmissionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Queued,
    Running,
    Success,
    Failed,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Queued => "queued",
            SubmissionStatus::Running => "running",
            SubmissionStatus::Success => "success",
            SubmissionStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SubmissionStatus::Success | SubmissionStatus::Failed)
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub id: SubmissionId,
    pub user_id: u64,
    pub problem_id: ProblemId,
    pub code: String,
    pub status: SubmissionStatus,
    pub error_code: Option<ErrorCode>,
    pub log_path: Option<PathBuf>,
    pub waveform_path: Option<PathBuf>,
    /// Set when the run itself broke, e.g. the runner panicked.
    pub diagnostic: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// What intake knows about a submission before it has an id.
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub user_id: u64,
    pub problem_id: ProblemId,
    pub code: String,
}

impl Submission {
    fn new(id: SubmissionId, new: NewSubmission) -> Self {
        Self {
            id,
            user_id: new.user_id,
            problem_id: new.problem_id,
            code: new.code,
            status: SubmissionStatus::Queued,
            error_code: None,
            log_path: None,
            waveform_path: None,
            diagnostic: None,
            created_at: Utc::now(),
        }
    }

    fn transition(&mut self, to: SubmissionStatus) -> Result<(), StoreError> {
        let legal = matches!(
            (self.status, to),
            (SubmissionStatus::Queued, SubmissionStatus::Running)
                | (SubmissionStatus::Running, SubmissionStatus::Success)
                | (SubmissionStatus::Running, SubmissionStatus::Failed)
        );
        if !legal {
            return Err(StoreError::IllegalTransition {
                id: self.id,
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }

    fn finish(
        &mut self,
        outcome: &SimulationOutcome,
        diagnostic: Option<String>,
    ) -> Result<(), StoreError> {
        self.transition(if outcome.error_code.is_success() {
            SubmissionStatus::Success
        } else {
            SubmissionStatus::Failed
        })?;
        self.error_code = Some(outcome.error_code);
        self.log_path = outcome.log_path.clone();
        self.waveform_path = outcome.waveform_path.clone();
        self.diagnostic = diagnostic;
        Ok(())
    }
}

/// Result of the `queued -> running` compare-and-set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BeginRun {
    /// This caller won the transition and must run the submission.
    Started(Submission),
    /// Someone else already started or finished it.
    Unchanged(Submission),
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Submission {0} not found")]
    NotFound(SubmissionId),
    #[error("Illegal transition of submission {id} from {from} to {to}")]
    IllegalTransition {
        id: SubmissionId,
        from: SubmissionStatus,
        to: SubmissionStatus,
    },
    #[error("Store lock poisoned")]
    Poisoned,
    #[error("IO error: {0}")]
    IOError(#[from] io::Error),
    #[error("Serde error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

/// Holder of submission records. Every mutation of a single submission
/// happens inside the store's own critical section.
pub trait SubmissionStore: Send + Sync {
    fn create(&self, new: NewSubmission) -> Result<Submission, StoreError>;

    fn get(&self, id: SubmissionId) -> Result<Submission, StoreError>;

    /// Submissions of one user, newest first.
    fn list_by_user(&self, user_id: u64) -> Result<Vec<Submission>, StoreError>;

    /// Atomically moves a `queued` submission to `running`. Any other status
    /// is left alone and reported as [`BeginRun::Unchanged`].
    fn begin_run(&self, id: SubmissionId) -> Result<BeginRun, StoreError>;

    /// Records the outcome of a run and moves `running` to its terminal status.
    fn complete_run(
        &self,
        id: SubmissionId,
        outcome: &SimulationOutcome,
        diagnostic: Option<String>,
    ) -> Result<Submission, StoreError>;
}

/// The table both store flavours keep behind their lock.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "StoredTable", into = "StoredTable")]
pub(crate) struct SubmissionTable {
    next_id: u64,
    submissions: BTreeMap<SubmissionId, Submission>,
}

#[derive(Serialize, Deserialize)]
struct StoredTable {
    next_id: u64,
    submissions: Vec<Submission>,
}

impl From<StoredTable> for SubmissionTable {
    fn from(stored: StoredTable) -> Self {
        let submissions: BTreeMap<_, _> = stored
            .submissions
            .into_iter()
            .map(|submission| (submission.id, submission))
            .collect();
        let next_id = submissions
            .keys()
            .next_back()
            .map_or(stored.next_id, |last| stored.next_id.max(last.0 + 1));
        Self {
            next_id,
            submissions,
        }
    }
}

impl From<SubmissionTable> for StoredTable {
    fn from(table: SubmissionTable) -> Self {
        Self {
            next_id: table.next_id,
            submissions: table.submissions.into_values().collect(),
        }
    }
}

impl SubmissionTable {
    pub(crate) fn create(&mut self, new: NewSubmission) -> Submission {
        // Ids start at 1.
        self.next_id = self.next_id.max(1);
        let id = SubmissionId(self.next_id);
        self.next_id += 1;
        let submission = Submission::new(id, new);
        self.submissions.insert(id, submission.clone());
        submission
    }

    pub(crate) fn get(&self, id: SubmissionId) -> Result<Submission, StoreError> {
        self.submissions
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    pub(crate) fn list_by_user(&self, user_id: u64) -> Vec<Submission> {
        let mut submissions: Vec<Submission> = self
            .submissions
            .values()
            .filter(|submission| submission.user_id == user_id)
            .cloned()
            .collect();
        // Ids break ties between submissions created within the same instant.
        submissions.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        submissions
    }

    pub(crate) fn begin_run(&mut self, id: SubmissionId) -> Result<BeginRun, StoreError> {
        let submission = self
            .submissions
            .get_mut(&id)
            .ok_or(StoreError::NotFound(id))?;
        if submission.status != SubmissionStatus::Queued {
            return Ok(BeginRun::Unchanged(submission.clone()));
        }
        submission.transition(SubmissionStatus::Running)?;
        Ok(BeginRun::Started(submission.clone()))
    }

    pub(crate) fn complete_run(
        &mut self,
        id: SubmissionId,
        outcome: &SimulationOutcome,
        diagnostic: Option<String>,
    ) -> Result<Submission, StoreError> {
        let submission = self
            .submissions
            .get_mut(&id)
            .ok_or(StoreError::NotFound(id))?;
        submission.finish(outcome, diagnostic)?;
        Ok(submission.clone())
    }

    pub(crate) fn submissions(&self) -> impl Iterator<Item = &Submission> {
        self.submissions.values()
    }
}

#[cfg(test)]
mod store_test {
    use super::*;

    fn new_submission() -> NewSubmission {
        NewSubmission {
            user_id: 3,
            problem_id: ProblemId(1),
            code: "module user_module; endmodule".to_string(),
        }
    }

    #[test]
    fn test_ids_are_allocated_in_order() {
        let mut table = SubmissionTable::default();
        assert_eq!(table.create(new_submission()).id, SubmissionId(1));
        assert_eq!(table.create(new_submission()).id, SubmissionId(2));
    }

    #[test]
    fn test_only_forward_transitions_are_legal() {
        let mut table = SubmissionTable::default();
        let id = table.create(new_submission()).id;
        let outcome = SimulationOutcome::unknown();

        assert!(matches!(
            table.complete_run(id, &outcome, None),
            Err(StoreError::IllegalTransition { .. })
        ));
        assert!(matches!(table.begin_run(id).unwrap(), BeginRun::Started(_)));
        assert!(matches!(table.begin_run(id).unwrap(), BeginRun::Unchanged(_)));

        let done = table.complete_run(id, &outcome, None).unwrap();
        assert_eq!(done.status, SubmissionStatus::Failed);
        assert_eq!(done.error_code, Some(ErrorCode::Unknown));
        assert!(table.complete_run(id, &outcome, None).is_err());
        assert!(matches!(table.begin_run(id).unwrap(), BeginRun::Unchanged(_)));
    }

    #[test]
    fn test_list_by_user_is_newest_first() {
        let mut table = SubmissionTable::default();
        let first = table.create(new_submission()).id;
        let other = table.create(NewSubmission {
            user_id: 4,
            ..new_submission()
        });
        let second = table.create(new_submission()).id;
        table.begin_run(first).unwrap();

        let listed: Vec<_> = table.list_by_user(3).into_iter().map(|s| s.id).collect();
        assert_eq!(listed, vec![second, first]);
        assert_eq!(table.list_by_user(4), vec![other]);
        assert!(table.list_by_user(5).is_empty());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!SubmissionStatus::Queued.is_terminal());
        assert!(!SubmissionStatus::Running.is_terminal());
        assert!(SubmissionStatus::Success.is_terminal());
        assert!(SubmissionStatus::Failed.is_terminal());
    }

    #[test]
    fn test_stored_table_keeps_next_id_ahead() {
        let mut table = SubmissionTable::default();
        table.create(new_submission());
        table.create(new_submission());
        let mut json = serde_json::to_value(&table).unwrap();
        json["next_id"] = serde_json::json!(0);

        let mut reloaded: SubmissionTable = serde_json::from_value(json).unwrap();
        assert_eq!(reloaded.create(new_submission()).id, SubmissionId(3));
    }
}
