mod common;

use std::{fs, path::PathBuf};

use hdl_judge_core::judge::{
    result::{ErrorCode, SimulationOutcome},
    SubmissionId,
};
use hdl_judger::store::{
    BeginRun, JsonSubmissionStore, MemorySubmissionStore, StoreError, SubmissionStatus,
    SubmissionStore,
};

fn passed() -> SimulationOutcome {
    SimulationOutcome {
        error_code: ErrorCode::Success,
        log_path: Some(PathBuf::from("sub_data/sim_1.log")),
        waveform_path: Some(PathBuf::from("sub_data/wave_1.vcd")),
    }
}

#[test]
fn test_new_submission_is_queued_and_bare() {
    common::init_logger();
    let store = MemorySubmissionStore::new();
    let submission = store.create(common::new_submission(1)).unwrap();

    assert_eq!(submission.status, SubmissionStatus::Queued);
    assert_eq!(submission.error_code, None);
    assert_eq!(submission.log_path, None);
    assert_eq!(submission.waveform_path, None);
    assert_eq!(submission.diagnostic, None);
    assert_eq!(store.get(submission.id).unwrap(), submission);
}

#[test]
fn test_unknown_submission() {
    let store = MemorySubmissionStore::new();
    assert!(matches!(
        store.get(SubmissionId(5)),
        Err(StoreError::NotFound(SubmissionId(5)))
    ));
    assert!(matches!(
        store.begin_run(SubmissionId(5)),
        Err(StoreError::NotFound(_))
    ));
}

#[test]
fn test_terminal_submission_is_never_mutated() {
    let store = MemorySubmissionStore::new();
    let id = store.create(common::new_submission(1)).unwrap().id;

    assert!(matches!(store.begin_run(id).unwrap(), BeginRun::Started(_)));
    let done = store.complete_run(id, &passed(), None).unwrap();
    assert_eq!(done.status, SubmissionStatus::Success);
    assert_eq!(done.error_code, Some(ErrorCode::Success));

    assert!(matches!(
        store.complete_run(id, &SimulationOutcome::unknown(), Some("late".to_string())),
        Err(StoreError::IllegalTransition { .. })
    ));
    assert_eq!(store.begin_run(id).unwrap(), BeginRun::Unchanged(done.clone()));
    assert_eq!(store.get(id).unwrap(), done);
}

#[test]
fn test_failure_codes_end_as_failed() {
    let store = MemorySubmissionStore::new();
    let id = store.create(common::new_submission(1)).unwrap().id;
    store.begin_run(id).unwrap();

    let done = store
        .complete_run(
            id,
            &SimulationOutcome {
                error_code: ErrorCode::CompileFail,
                log_path: Some(PathBuf::from("sub_data/sim_1.log")),
                waveform_path: None,
            },
            None,
        )
        .unwrap();
    assert_eq!(done.status, SubmissionStatus::Failed);
    assert_eq!(done.error_code, Some(ErrorCode::CompileFail));
    assert_eq!(done.waveform_path, None);
}

#[test]
fn test_json_store_survives_reload() {
    common::init_logger();
    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("state").join("submissions.json");

    let store = JsonSubmissionStore::open(file_path.clone()).unwrap();
    let first = store.create(common::new_submission(1)).unwrap().id;
    let second = store.create(common::new_submission(2)).unwrap().id;
    store.begin_run(first).unwrap();
    store.complete_run(first, &passed(), None).unwrap();
    store.begin_run(second).unwrap();
    drop(store);

    let content = fs::read_to_string(&file_path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(json["next_id"], 3);
    assert_eq!(json["submissions"][0]["status"], "success");
    assert_eq!(json["submissions"][0]["error_code"], "SUCCESS");

    let store = JsonSubmissionStore::open(file_path).unwrap();
    assert_eq!(store.get(first).unwrap().status, SubmissionStatus::Success);
    // An interrupted run is reported, not repaired.
    assert_eq!(store.get(second).unwrap().status, SubmissionStatus::Running);
    assert_eq!(
        store.create(common::new_submission(1)).unwrap().id,
        SubmissionId(3)
    );
}

#[test]
fn test_json_store_rejects_garbage() {
    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("submissions.json");
    fs::write(&file_path, "{ not json").unwrap();

    assert!(matches!(
        JsonSubmissionStore::load(file_path),
        Err(StoreError::SerdeJsonError(_))
    ));
}

#[test]
fn test_json_store_failed_write_changes_nothing() {
    common::init_logger();
    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("submissions.json");
    let store = JsonSubmissionStore::open(file_path.clone()).unwrap();
    let id = store.create(common::new_submission(1)).unwrap().id;

    // A directory in place of the file makes every later write fail.
    fs::remove_file(&file_path).unwrap();
    fs::create_dir(&file_path).unwrap();

    assert!(matches!(store.begin_run(id), Err(StoreError::IOError(_))));
    assert_eq!(store.get(id).unwrap().status, SubmissionStatus::Queued);
    assert!(store.create(common::new_submission(1)).is_err());
    assert!(matches!(
        store.get(SubmissionId(2)),
        Err(StoreError::NotFound(_))
    ));

    fs::remove_dir(&file_path).unwrap();
    assert_eq!(
        store.create(common::new_submission(1)).unwrap().id,
        SubmissionId(2)
    );
    assert!(matches!(store.begin_run(id).unwrap(), BeginRun::Started(_)));
    let reloaded = JsonSubmissionStore::load(file_path).unwrap();
    assert_eq!(reloaded.get(id).unwrap().status, SubmissionStatus::Running);
}

#[test]
fn test_list_by_user_in_both_stores() {
    let dir = tempfile::tempdir().unwrap();
    let stores: Vec<Box<dyn SubmissionStore>> = vec![
        Box::new(MemorySubmissionStore::new()),
        Box::new(JsonSubmissionStore::open(dir.path().join("submissions.json")).unwrap()),
    ];
    for store in stores {
        let first = store.create(common::new_submission(1)).unwrap().id;
        let second = store.create(common::new_submission(2)).unwrap().id;
        store.begin_run(second).unwrap();

        let listed = store.list_by_user(1).unwrap();
        assert_eq!(
            listed.iter().map(|s| s.id).collect::<Vec<_>>(),
            vec![second, first]
        );
        assert_eq!(listed[0].status, SubmissionStatus::Running);
        assert!(store.list_by_user(99).unwrap().is_empty());
    }
}
