pub mod error;
/// HTTP front end
pub mod handler;
/// Submission records and their state machine
pub mod store;
/// Job queue, evaluator and the background judge worker
pub mod worker;
