//! HTTP error types
//!
//! [`HttpError`] covers the server itself. [`ApiError`] is what a request
//! handler can fail with, and decides what the client is allowed to see.

use std::any::Any;

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use missive_common::{RuntimeMode, incoming};
use missive_mail::{DispatchError, ValidationError};
use serde::Serialize;
use thiserror::Error;

use crate::OriginPatternError;

pub(crate) const DISPATCH_FAILED: &str = "Failed to send message. Please try again later.";
pub(crate) const INTERNAL_ERROR: &str = "Internal server error";
pub(crate) const MALFORMED_BODY: &str = "Invalid request body";

/// Errors that can occur while setting up or running the server
#[derive(Debug, Error)]
pub enum HttpError {
    /// Failed to bind to the specified address
    #[error("Failed to bind HTTP server to {address}: {source}")]
    BindError {
        address: String,
        source: std::io::Error,
    },

    /// A trusted origin pattern could not be parsed
    #[error("Invalid CORS configuration: {0}")]
    Cors(#[from] OriginPatternError),

    /// A configured header value is not valid in HTTP
    #[error("Invalid header value: {0}")]
    InvalidHeader(String),

    /// Server encountered a runtime error
    #[error("HTTP server error: {0}")]
    ServerError(String),
}

/// Everything a contact submission can fail with.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The caller's origin is not admitted. Answered with an empty 403.
    #[error("Origin not allowed")]
    OriginDenied,

    /// The body is not a JSON object of string fields.
    #[error("Invalid request body: {0}")]
    MalformedBody(#[from] JsonRejection),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The relay failed. The client only sees a generic message unless
    /// `expose_detail` is set.
    #[error("Failed to send message: {source}")]
    Dispatch {
        #[source]
        source: DispatchError,
        expose_detail: bool,
    },
}

impl ApiError {
    pub const fn dispatch(source: DispatchError, mode: RuntimeMode) -> Self {
        Self::Dispatch {
            source,
            expose_detail: mode.exposes_error_detail(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorBody<'a> {
    pub error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl<'a> ErrorBody<'a> {
    pub(crate) const fn new(error: &'a str) -> Self {
        Self {
            error,
            detail: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::OriginDenied => StatusCode::FORBIDDEN.into_response(),
            Self::MalformedBody(rejection) => {
                incoming!(level = DEBUG, reason = %rejection.body_text(), "Rejected request body");
                (StatusCode::BAD_REQUEST, Json(ErrorBody::new(MALFORMED_BODY))).into_response()
            }
            Self::Validation(error) => {
                incoming!(level = DEBUG, code = error.code(), "Submission failed validation");
                (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorBody::new(&error.to_string())),
                )
                    .into_response()
            }
            Self::Dispatch {
                source,
                expose_detail,
            } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    error: DISPATCH_FAILED,
                    detail: expose_detail.then(|| source.to_string()),
                }),
            )
                .into_response(),
        }
    }
}

/// Answer for a handler that panicked.
pub(crate) fn panic_response(panic: Box<dyn Any + Send + 'static>, mode: RuntimeMode) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic")
        .to_string();

    tracing::error!(panic = %detail, "Request handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            error: INTERNAL_ERROR,
            detail: mode.exposes_error_detail().then_some(detail),
        }),
    )
        .into_response()
}
