use crate::core::client_message;
use crate::errors::Error;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;
use tracing::error;

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub message: String,
    pub code: u16,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiError({}, {})", self.code, self.message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::Json(self);
        (status, body).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match &err {
            Error::Validation(_) | Error::UnsupportedEngine(_) | Error::MalformedEnvelope(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::NotReady(_) => StatusCode::CONFLICT,
            Error::BackendInvocation(_) | Error::Timeout(_) | Error::HttpError(_) => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!("Request failed: {}", err);
        }
        let message = match &err {
            Error::MalformedEnvelope(_) => err.to_string(),
            _ => client_message(&err),
        };
        api_error(status, &message)
    }
}

/// Body extraction failures keep the JSON error shape
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let status = match rejection.status() {
            StatusCode::UNSUPPORTED_MEDIA_TYPE => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            _ => StatusCode::BAD_REQUEST,
        };
        api_error(status, &rejection.body_text())
    }
}

/// Helper function to create API errors
pub fn api_error(status: StatusCode, message: &str) -> ApiError {
    ApiError {
        message: message.to_string(),
        code: status.as_u16(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::GENERIC_FAILURE_MESSAGE;

    #[test]
    fn maps_errors_to_status_codes() {
        let cases = [
            (Error::Validation("x".into()), 400),
            (Error::UnsupportedEngine("solr".into()), 400),
            (Error::NotFound("Workspace".into()), 404),
            (Error::NotReady("creating".into()), 409),
            (Error::BackendInvocation("boom".into()), 502),
            (Error::Transport("job queue is closed".into()), 500),
        ];
        for (err, code) in cases {
            assert_eq!(ApiError::from(err).code, code);
        }
    }

    #[test]
    fn backend_details_are_hidden() {
        let err = ApiError::from(Error::BackendInvocation(
            "opensearch search error (500): cluster os-prod-7 red".into(),
        ));
        assert_eq!(err.message, GENERIC_FAILURE_MESSAGE);
    }
}
