use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use missive_common::incoming;
use missive_mail::SubmissionCandidate;
use serde_json::json;

use crate::{ApiError, AppState, OriginDecision, error::ErrorBody};

const MESSAGE_SENT: &str = "Message sent successfully";

/// `POST /contact`
///
/// Origin, then body, then validation, then compose and dispatch. The first
/// failing step decides the answer.
pub(crate) async fn submit_contact(
    State(state): State<Arc<AppState>>,
    Extension(decision): Extension<OriginDecision>,
    payload: Result<Json<SubmissionCandidate>, JsonRejection>,
) -> Result<Response, ApiError> {
    if !decision.allowed() {
        incoming!(level = WARN, "Refused contact submission from a denied origin");
        return Err(ApiError::OriginDenied);
    }

    let Json(candidate) = payload?;
    let submission = candidate.validate()?;
    let message = state.composer.compose(&submission);

    incoming!(
        level = INFO,
        admission = ?decision.admission,
        "Contact submission accepted"
    );

    state
        .dispatcher
        .dispatch(message)
        .await
        .map_err(|e| ApiError::dispatch(e, state.mode))?;

    Ok((StatusCode::OK, Json(json!({ "message": MESSAGE_SENT }))).into_response())
}

/// `GET /health`
///
/// Answers 200 whenever the process can respond, even if the relay never
/// verified.
pub(crate) async fn liveness(State(state): State<Arc<AppState>>) -> Response {
    if state.health.is_alive() {
        (StatusCode::OK, Json(json!({ "status": "ok" }))).into_response()
    } else {
        StatusCode::SERVICE_UNAVAILABLE.into_response()
    }
}

/// `GET /health/ready`
pub(crate) async fn readiness(State(state): State<Arc<AppState>>) -> Response {
    let status = state.health.get_status();

    if status.relay_ready {
        (StatusCode::OK, Json(status)).into_response()
    } else {
        tracing::warn!(relay_ready = status.relay_ready, "Readiness probe failed");
        (StatusCode::SERVICE_UNAVAILABLE, Json(status)).into_response()
    }
}

pub(crate) async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(ErrorBody::new("Not found"))).into_response()
}
