use actix_web::{error::BlockingError, HttpResponse, ResponseError};
use serde_derive::Serialize;

use crate::{store::StoreError, worker::evaluator::EvaluateError};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Internal Server Error: {0}")]
    InternalError(anyhow::Error),
    #[error("Internal Server Error: {0}, Msg: {1}")]
    InternalErrorWithMsg(anyhow::Error, String),

    #[error("BadRequest: {0}, Msg: {1}")]
    BadRequestWithMsg(anyhow::Error, String),

    #[error("NotFound: {0}")]
    NotFound(String),
}

#[derive(Serialize)]
struct ServiceErrorBody {
    msg: Option<String>,
}

impl ResponseError for ServiceError {
    fn error_response(&self) -> HttpResponse {
        match self {
            ServiceError::InternalError(ref err) => {
                let response_body = ServiceErrorBody {
                    msg: Some(format!("Internal Error: {}", err)),
                };
                HttpResponse::InternalServerError().json(response_body)
            }
            ServiceError::InternalErrorWithMsg(ref err, ref msg) => {
                let response_body = ServiceErrorBody {
                    msg: Some(format!("Internal Error: {}, Msg: {}", err, msg)),
                };
                HttpResponse::InternalServerError().json(response_body)
            }
            ServiceError::BadRequestWithMsg(ref err, ref msg) => {
                let response_body = ServiceErrorBody {
                    msg: Some(format!("BadRequest: {}, Msg: {}", err, msg)),
                };
                HttpResponse::BadRequest().json(response_body)
            }
            ServiceError::NotFound(ref what) => {
                let response_body = ServiceErrorBody {
                    msg: Some(format!("NotFound: {}", what)),
                };
                HttpResponse::NotFound().json(response_body)
            }
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(id) => Self::NotFound(format!("submission {}", id)),
            other => Self::InternalError(anyhow::anyhow!("{}", other)),
        }
    }
}

impl From<EvaluateError> for ServiceError {
    fn from(value: EvaluateError) -> Self {
        match value {
            EvaluateError::StoreError(e) => e.into(),
        }
    }
}

impl From<BlockingError> for ServiceError {
    fn from(value: BlockingError) -> Self {
        Self::InternalErrorWithMsg(anyhow::anyhow!("{}", value), "blocking task failed".to_string())
    }
}
