//! # Router Configuration
//!
//! Configures the authentication routes of the session broker.

use axum::{
    extract::{Path, Query, State as AxumState},
    http::{HeaderMap, Uri},
    middleware,
    response::Response,
    routing::get,
    Json,
    Router,
};
use error::Result;
use serde_json::{json, Value};
use tower_sessions::{Session, SessionStore};

use crate::{
    auth::handlers,
    dto::auth::{CasLoginQuery, LoginPageQuery, LoginPayload, RedirectQuery},
    middleware::{auth::login_required, request_id::request_id_middleware},
    session::session_layer,
    AppState,
};

/// Creates the authentication router
///
/// Every route runs inside the session layer backed by `store`; the switch
/// routes also require a logged-in user.
pub fn create_router<S>(state: AppState, store: S) -> Router
where
    S: SessionStore + Clone,
{
    let sessions = session_layer(store, &state.settings.session);

    let protected_routes = Router::new()
        .route("/auth/switch/{tenant_id}", get(switch_tenant_handler))
        .route(
            "/auth/switch_services_region/{region_name}",
            get(switch_region_handler),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            login_required,
        ));

    let public_routes = Router::new()
        .route("/auth/login", get(login_page_handler).post(login_handler))
        .route("/auth/logout", get(logout_handler).post(logout_handler))
        .route("/auth/cas/login", get(cas_login_handler));

    public_routes
        .merge(protected_routes)
        .layer(sessions)
        .with_state(state)
}

/// Wrapper handler for the login page
async fn login_page_handler(
    AxumState(state): AxumState<AppState>,
    session: Session,
    headers: HeaderMap,
    Query(query): Query<LoginPageQuery>,
) -> Result<Response> {
    handlers::login_page_handler_inner(&state, &session, &headers, query).await
}

/// Wrapper handler for the login form submission
async fn login_handler(
    AxumState(state): AxumState<AppState>,
    session: Session,
    headers: HeaderMap,
    LoginPayload(req): LoginPayload,
) -> Result<Response> {
    handlers::login_handler_inner(&state, &session, &headers, req).await
}

/// Wrapper handler for logout
async fn logout_handler(AxumState(state): AxumState<AppState>, session: Session) -> Response {
    handlers::logout_handler_inner(&state, &session).await
}

/// Wrapper handler for tenant switching
async fn switch_tenant_handler(
    AxumState(state): AxumState<AppState>,
    session: Session,
    headers: HeaderMap,
    Path(tenant_id): Path<String>,
    Query(query): Query<RedirectQuery>,
) -> Result<Response> {
    handlers::switch_tenant_handler_inner(&state, &session, &headers, &tenant_id, query).await
}

/// Wrapper handler for region switching
async fn switch_region_handler(
    AxumState(state): AxumState<AppState>,
    session: Session,
    headers: HeaderMap,
    Path(region_name): Path<String>,
    Query(query): Query<RedirectQuery>,
) -> Result<Response> {
    handlers::switch_region_handler_inner(&state, &session, &headers, &region_name, query).await
}

/// Wrapper handler for the CAS login entry point
async fn cas_login_handler(
    AxumState(state): AxumState<AppState>,
    session: Session,
    headers: HeaderMap,
    uri: Uri,
    Query(query): Query<CasLoginQuery>,
) -> Result<Response> {
    handlers::cas_login_handler_inner(&state, &session, &headers, &uri, query).await
}

async fn health_handler(AxumState(state): AxumState<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "uptime_seconds": state.start_time.elapsed().as_secs(),
    }))
}

/// Creates the health check router
pub fn create_health_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Creates the main application router
///
/// Health checks plus the authentication routes, all tagged with a request id.
pub fn create_app_router<S>(state: AppState, store: S) -> Router
where
    S: SessionStore + Clone,
{
    Router::new()
        .merge(create_health_router(state.clone()))
        .merge(create_router(state, store))
        .layer(middleware::from_fn(request_id_middleware))
}
