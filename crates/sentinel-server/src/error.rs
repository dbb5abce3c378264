//! API error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use sentinel_core::{GatewayError, GenerationError};

/// An error ready to be rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    error_type: String,
    code: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: ErrorDetail<'a>,
}

#[derive(Serialize)]
struct ErrorDetail<'a> {
    message: &'a str,
    #[serde(rename = "type")]
    error_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'a str>,
}

impl ApiError {
    /// Builds an error with an explicit status.
    #[must_use]
    pub fn new(status: StatusCode, error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            error_type: error_type.into(),
            code: None,
        }
    }

    /// The HTTP status this error renders with.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<GatewayError> for ApiError {
    fn from(error: GatewayError) -> Self {
        match error {
            GatewayError::Validation {
                message,
                field,
                code,
            } => Self {
                status: StatusCode::BAD_REQUEST,
                message: match field {
                    Some(field) => format!("{message} (field: {field})"),
                    None => message,
                },
                error_type: "validation".to_string(),
                code: Some(code),
            },
            GatewayError::Configuration { message } => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message,
                error_type: "configuration".to_string(),
                code: None,
            },
            GatewayError::Generation(error) => {
                let status = match &error {
                    GenerationError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                    GenerationError::Quota { .. } => StatusCode::TOO_MANY_REQUESTS,
                    GenerationError::Authentication { .. }
                    | GenerationError::InvalidRegion { .. }
                    | GenerationError::Backend { .. } => StatusCode::BAD_GATEWAY,
                };
                Self {
                    status,
                    message: error.to_string(),
                    error_type: error.error_type().to_string(),
                    code: None,
                }
            }
            GatewayError::Internal { message } => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message,
                error_type: "internal".to_string(),
                code: None,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: ErrorDetail {
                message: &self.message,
                error_type: &self.error_type,
                code: self.code.as_deref(),
            },
        });
        (self.status, body).into_response()
    }
}
