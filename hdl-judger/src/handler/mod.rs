pub mod submission;

use std::sync::Arc;

use actix_web::web;
use hdl_judge_core::vcd::VcdDecoder;
use utoipa::OpenApi;

use crate::{
    store::SubmissionStore,
    worker::{evaluator::Evaluator, queue::JobQueue},
};

#[derive(utoipa::OpenApi)]
#[openapi(external_docs(
    url = "/swagger-ui/?urls.primaryName=submission",
    description = "HDL judger API docs",
))]
pub struct ApiDoc;

/// Shared by every handler through `web::Data`.
pub struct JudgeContext {
    pub evaluator: Arc<Evaluator>,
    /// `None` when the background worker is disabled.
    pub queue: Option<JobQueue>,
    pub decoder: VcdDecoder,
}

impl JudgeContext {
    pub fn new(evaluator: Arc<Evaluator>, queue: Option<JobQueue>) -> Self {
        Self {
            evaluator,
            queue,
            decoder: VcdDecoder::default(),
        }
    }

    pub fn store(&self) -> &Arc<dyn SubmissionStore> {
        self.evaluator.store()
    }
}

pub fn route(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/api/v1").configure(submission::route))
        .service(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui/{_:.*}").urls(vec![
                (
                    utoipa_swagger_ui::Url::new("root", "/api-docs/openapi.json"),
                    ApiDoc::openapi(),
                ),
                (
                    utoipa_swagger_ui::Url::new("submission", "/api-docs/submission.json"),
                    submission::SubmissionApiDoc::openapi(),
                ),
            ]),
        );
}
