use std::{fs, io};

use actix_web::{get, post, web, HttpResponse};
use hdl_judge_core::{
    judge::{ProblemId, SubmissionId},
    vcd::WaveformReport,
};
use serde_derive::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::JudgeContext;
use crate::{
    error::ServiceError,
    store::{NewSubmission, Submission},
    worker::queue::Job,
};

#[derive(utoipa::OpenApi)]
#[openapi(
    paths(
        create_submission,
        list_submissions,
        get_submission,
        evaluate_submission,
        get_submission_log,
        get_submission_waveform
    ),
    components(schemas(CreateSubmissionBody, SubmissionView, SubmissionSummary))
)]
pub struct SubmissionApiDoc;

pub fn route(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/submission")
            .service(create_submission)
            .service(list_submissions)
            .service(get_submission)
            .service(evaluate_submission)
            .service(get_submission_log)
            .service(get_submission_waveform),
    );
}

#[derive(Debug, ToSchema, Deserialize)]
pub struct CreateSubmissionBody {
    pub user_id: u64,
    pub problem_id: u32,
    pub code: String,
}

#[derive(Debug, ToSchema, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmissionView {
    pub id: u64,
    pub user_id: u64,
    pub problem_id: u32,
    pub status: String,
    pub error_code: Option<String>,
    pub log_path: Option<String>,
    pub waveform_path: Option<String>,
    pub diagnostic: Option<String>,
    pub created_at: String,
}

impl From<&Submission> for SubmissionView {
    fn from(submission: &Submission) -> Self {
        Self {
            id: submission.id.0,
            user_id: submission.user_id,
            problem_id: submission.problem_id.0,
            status: submission.status.to_string(),
            error_code: submission.error_code.map(|code| code.to_string()),
            log_path: submission
                .log_path
                .as_ref()
                .map(|path| path.to_string_lossy().into_owned()),
            waveform_path: submission
                .waveform_path
                .as_ref()
                .map(|path| path.to_string_lossy().into_owned()),
            diagnostic: submission.diagnostic.clone(),
            created_at: submission.created_at.to_rfc3339(),
        }
    }
}

/// One line of a user's submission history.
#[derive(Debug, ToSchema, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmissionSummary {
    pub submission_id: u64,
    pub created_at: String,
    pub status: String,
}

impl From<&Submission> for SubmissionSummary {
    fn from(submission: &Submission) -> Self {
        Self {
            submission_id: submission.id.0,
            created_at: submission.created_at.to_rfc3339(),
            status: submission.status.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListSubmissionsQuery {
    pub user_id: u64,
}

#[utoipa::path(
    context_path = "/api/v1/submission",
    request_body(content = CreateSubmissionBody, content_type = "application/json", description = "The source to judge and the problem it solves"),
    responses(
        (status = 200, description = "Submission queued", body = SubmissionView),
        (status = 400, description = "Invalid submission body")
    )
)]
#[post("")]
pub async fn create_submission(
    body: web::Json<CreateSubmissionBody>,
    context: web::Data<JudgeContext>,
) -> Result<HttpResponse, ServiceError> {
    let body = body.into_inner();
    log::debug!(
        "Receive submission of user {} for problem {}",
        body.user_id,
        body.problem_id
    );
    if body.code.trim().is_empty() {
        return Err(ServiceError::BadRequestWithMsg(
            anyhow::anyhow!("Empty code"),
            "Nothing to judge".to_string(),
        ));
    }

    let store = context.store().clone();
    let submission = web::block(move || {
        store.create(NewSubmission {
            user_id: body.user_id,
            problem_id: ProblemId(body.problem_id),
            code: body.code,
        })
    })
    .await??;
    log::info!(
        "Submission {} created for problem {}",
        submission.id,
        submission.problem_id
    );

    if let Some(queue) = &context.queue {
        queue.enqueue(Job::Evaluate(submission.id));
    }
    Ok(HttpResponse::Ok().json(SubmissionView::from(&submission)))
}

#[utoipa::path(
    context_path = "/api/v1/submission",
    params(("user_id" = u64, Query, description = "Owner of the submissions")),
    responses(
        (status = 200, description = "Submissions of the user, newest first", body = [SubmissionSummary]),
        (status = 400, description = "Missing or invalid user id")
    )
)]
#[get("")]
pub async fn list_submissions(
    query: web::Query<ListSubmissionsQuery>,
    context: web::Data<JudgeContext>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = query.into_inner().user_id;
    let store = context.store().clone();
    let submissions = web::block(move || store.list_by_user(user_id)).await??;
    log::debug!(
        "Found {} submissions of user {}",
        submissions.len(),
        user_id
    );
    Ok(HttpResponse::Ok().json(
        submissions
            .iter()
            .map(SubmissionSummary::from)
            .collect::<Vec<_>>(),
    ))
}

#[utoipa::path(
    context_path = "/api/v1/submission",
    params(("id", description = "Submission id")),
    responses(
        (status = 200, description = "Current state of the submission", body = SubmissionView),
        (status = 404, description = "No such submission")
    )
)]
#[get("/{id}")]
pub async fn get_submission(
    path: web::Path<u64>,
    context: web::Data<JudgeContext>,
) -> Result<HttpResponse, ServiceError> {
    let submission = load_submission(&context, SubmissionId(path.into_inner())).await?;
    Ok(HttpResponse::Ok().json(SubmissionView::from(&submission)))
}

/// Judge the submission now unless it is already running or finished.
#[utoipa::path(
    context_path = "/api/v1/submission",
    params(("id", description = "Submission id")),
    responses(
        (status = 200, description = "Submission after evaluation", body = SubmissionView),
        (status = 404, description = "No such submission")
    )
)]
#[post("/{id}/evaluate")]
pub async fn evaluate_submission(
    path: web::Path<u64>,
    context: web::Data<JudgeContext>,
) -> Result<HttpResponse, ServiceError> {
    let id = SubmissionId(path.into_inner());
    let evaluator = context.evaluator.clone();
    let submission = web::block(move || evaluator.evaluate(id)).await??;
    Ok(HttpResponse::Ok().json(SubmissionView::from(&submission)))
}

#[utoipa::path(
    context_path = "/api/v1/submission",
    params(("id", description = "Submission id")),
    responses(
        (status = 200, description = "Simulation log", body = String),
        (status = 404, description = "No such submission or no log")
    )
)]
#[get("/{id}/log")]
pub async fn get_submission_log(
    path: web::Path<u64>,
    context: web::Data<JudgeContext>,
) -> Result<HttpResponse, ServiceError> {
    let id = SubmissionId(path.into_inner());
    let log_path = load_submission(&context, id)
        .await?
        .log_path
        .ok_or_else(|| ServiceError::NotFound(format!("log of submission {}", id)))?;

    let content = match web::block(move || fs::read(log_path)).await? {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ServiceError::NotFound(format!("log of submission {}", id)))
        }
        Err(e) => return Err(ServiceError::InternalError(e.into())),
    };
    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(String::from_utf8_lossy(&content).into_owned()))
}

#[utoipa::path(
    context_path = "/api/v1/submission",
    params(("id", description = "Submission id")),
    responses(
        (status = 200, description = "Decoded signal timeline, `{\"signals\": {name: [[time, value]]}}`"),
        (status = 404, description = "No such submission or no waveform"),
        (status = 500, description = "The waveform could not be decoded")
    )
)]
#[get("/{id}/waveform")]
pub async fn get_submission_waveform(
    path: web::Path<u64>,
    context: web::Data<JudgeContext>,
) -> Result<HttpResponse, ServiceError> {
    let id = SubmissionId(path.into_inner());
    let waveform_path = load_submission(&context, id)
        .await?
        .waveform_path
        .ok_or_else(|| ServiceError::NotFound(format!("waveform of submission {}", id)))?;

    let decoder = context.decoder.clone();
    match web::block(move || decoder.decode_file(&waveform_path)).await? {
        WaveformReport::Timeline { signals } => {
            Ok(HttpResponse::Ok().json(serde_json::json!({ "signals": signals })))
        }
        WaveformReport::Absent => Err(ServiceError::NotFound(format!(
            "waveform of submission {}",
            id
        ))),
        WaveformReport::ParseError { message } => Err(ServiceError::InternalErrorWithMsg(
            anyhow::anyhow!("{}", message),
            "Failed to decode waveform".to_string(),
        )),
    }
}

/// Store reads may wait on a file write, so they leave the async workers.
async fn load_submission(
    context: &JudgeContext,
    id: SubmissionId,
) -> Result<Submission, ServiceError> {
    let store = context.store().clone();
    Ok(web::block(move || store.get(id)).await??)
}
