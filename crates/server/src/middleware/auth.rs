//! # Login Required Middleware
//!
//! Redirects anonymous requests for protected entry points to the login page.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use error::ok_or_log;
use tower_sessions::Session;
use tracing::debug;

use crate::{
    redirect::{found, login_url_with_next},
    session::load_state,
    AppState,
};

/// Login-required middleware
///
/// Must run inside the session layer. The original path and query are
/// passed to the login page as `next`.
pub async fn login_required(State(state): State<AppState>, session: Session, request: Request, next: Next) -> Response {
    let authenticated = ok_or_log(load_state(&session).await).is_some_and(|s| s.is_authenticated());
    if authenticated {
        return next.run(request).await;
    }

    let target = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    debug!(target: "auth", path = %request.uri().path(), "Anonymous request redirected to login");
    found(&login_url_with_next(&state.settings.login_url, &target))
}
