use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::error::{CrewError, LlmError, PlanError};

use super::page::render_error;

/// Web error type with HTTP status code and message, rendered as an HTML page
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message)
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Html(render_error(&self.message))).into_response()
    }
}

impl From<PlanError> for ApiError {
    fn from(err: PlanError) -> Self {
        let message = err.to_string();
        match err {
            PlanError::Trip(_) => Self::bad_request(message),
            PlanError::Crew(CrewError::Llm(LlmError::MissingCredentials { .. })) => {
                Self::unauthorized(message)
            }
            PlanError::Crew(CrewError::Llm(LlmError::RequestFailed { .. })) => {
                Self::bad_gateway(message)
            }
            PlanError::Crew(_) => Self::internal_server_error(message),
        }
    }
}
