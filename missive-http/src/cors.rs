//! Origin gate middleware.
//!
//! Runs before routing: preflights are answered here for every path, all
//! other requests carry their [`OriginDecision`] into the handler as a request
//! extension and get the CORS headers attached on the way out.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{Method, StatusCode, header::ORIGIN},
    middleware::Next,
    response::{IntoResponse, Response},
};
use missive_common::incoming;

use crate::{AppState, OriginDecision};

pub(crate) async fn origin_gate(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    // A header that is not valid UTF-8 cannot match anything, so it is
    // treated as an empty (and therefore denied) origin.
    let origin = request
        .headers()
        .get(ORIGIN)
        .map(|value| value.to_str().unwrap_or_default().to_string());

    let decision = state.policy.decide(origin.as_deref());
    let preflight = request.method() == Method::OPTIONS;

    incoming!(
        level = DEBUG,
        method = %request.method(),
        path = %request.uri().path(),
        origin = origin.as_deref().unwrap_or("-"),
        admission = ?decision.admission,
        "Origin checked"
    );

    if preflight {
        let mut response = StatusCode::NO_CONTENT.into_response();
        state.policy.apply(&decision, true, response.headers_mut());
        return response;
    }

    request.extensions_mut().insert::<OriginDecision>(decision.clone());

    let mut response = next.run(request).await;
    state.policy.apply(&decision, false, response.headers_mut());
    response
}
