//! # Authentication Handlers
//!
//! Login, logout, tenant and region switching, and the CAS ticket login.
//!
//! Every handler here takes `&AppState` and the request's [`Session`]; the
//! router supplies both. Switch and CAS failures never surface as error
//! pages: they end in a redirect, either back to the caller or through the
//! logout path. Only session store failures become error responses.

use std::collections::BTreeMap;

use axum::{
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use error::{ok_or_log, ApiResponse, AppError, Result, ResultExt};
use logging::{log_auth_event, log_security_event};
use secrecy::SecretString;
use tower_sessions::Session;
use tracing::{debug, error, info, warn};
use validator::Validate;

use super::backend::{KeystoneBackend, LoginFailure};
use crate::{
    dto::auth::{CasLoginQuery, LoginPage, LoginPageQuery, LoginRequest, RedirectQuery},
    reaper::spawn_reaper,
    redirect::{found, resolve_redirect},
    session::{load_state, record_login, save_state, set_session_from_user, SessionState, TokenPair},
    AppState,
};

/// Host the request was addressed to.
pub fn request_host(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|h| !h.is_empty())
}

fn is_ajax(headers: &HeaderMap) -> bool {
    headers
        .get("x-requested-with")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("XMLHttpRequest"))
}

fn login_page(state: &AppState, headers: &HeaderMap) -> LoginPage {
    LoginPage::new(
        state.settings.regions.iter().cloned().collect(),
        is_ajax(headers),
    )
}

fn page_response(status: StatusCode, page: LoginPage) -> Response {
    (
        status,
        [(header::CACHE_CONTROL, "no-store")],
        Json(ApiResponse::ok(page)),
    )
        .into_response()
}

fn redirect_after(state: &AppState, headers: &HeaderMap, next: Option<&str>) -> String {
    resolve_redirect(
        next,
        request_host(headers),
        &state.settings.login_redirect_url,
    )
}

/// Inner handler for the login page
pub async fn login_page_handler_inner(
    state: &AppState,
    session: &Session,
    headers: &HeaderMap,
    query: LoginPageQuery,
) -> Result<Response> {
    let current_region = load_state(session).await?.region_endpoint;
    let initial_region = query.region.filter(|requested| {
        state.settings.regions.contains_url(requested) && current_region.as_deref() != Some(requested.as_str())
    });

    let page = login_page(state, headers)
        .with_initial_region(initial_region)
        .with_next(query.next);
    Ok(page_response(StatusCode::OK, page))
}

/// Inner handler for the login form submission
pub async fn login_handler_inner(
    state: &AppState,
    session: &Session,
    headers: &HeaderMap,
    req: LoginRequest,
) -> Result<Response> {
    let page = login_page(state, headers).with_next(req.next.clone());

    if let Err(errors) = req.validate() {
        let err: AppError = errors.into();
        return Ok(page_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            page.with_error(err.message()),
        ));
    }

    let settings = &state.settings;
    let auth_url = match req.region.as_deref().filter(|r| !r.is_empty()) {
        Some(region) if settings.regions.contains_url(region) => region.to_string(),
        Some(region) if settings.regions.is_empty() && region == settings.keystone_url => region.to_string(),
        Some(_) => {
            return Ok(page_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                page.with_error("Select a valid region."),
            ));
        },
        None => settings.default_auth_url().to_string(),
    };

    let backend = KeystoneBackend::new(state.identity.as_ref(), settings);
    let password = SecretString::from(req.password);
    match backend
        .authenticate_password(&auth_url, &req.username, &password)
        .await
    {
        Ok(authenticated) => {
            let mut session_state = load_state(session).await?;
            record_login(session, &mut session_state, &authenticated.user).await?;
            set_session_from_user(
                &mut session_state,
                &authenticated.user,
                &settings.regions,
                Some(authenticated.region_tokens),
            );
            session_state.record_tokens(authenticated.issued);
            save_state(session, &session_state).await?;

            log_auth_event!("login", req.username, true, region = auth_url);
            Ok(found(&redirect_after(
                state,
                headers,
                req.next.as_deref(),
            )))
        },
        Err(LoginFailure {
            error,
            issued,
        }) => {
            if !issued.is_empty() {
                debug!(target: "auth", count = issued.len(), "Revoking tokens issued by a failed login");
                spawn_reaper(state.identity.clone(), issued);
            }
            match error {
                AppError::Unauthorized {
                    ..
                } |
                AppError::Identity {
                    ..
                } => {
                    log_auth_event!("login", req.username, false, region = auth_url);
                    Ok(page_response(
                        StatusCode::UNAUTHORIZED,
                        page.with_error(error.message()),
                    ))
                },
                other => Err(other),
            }
        },
    }
}

/// End the session and send the browser to the login page.
///
/// Always redirects; a session that cannot be read is treated as empty.
pub async fn logout_handler_inner(state: &AppState, session: &Session) -> Response {
    let previous = ok_or_log(load_state(session).await).unwrap_or_default();
    end_session(state, session, previous).await
}

/// Hand the tokens in `previous` to the reaper, flush the session and
/// redirect to the login page.
async fn end_session(state: &AppState, session: &Session, previous: SessionState) -> Response {
    let username = previous.username().unwrap_or_default();
    info!(target: "auth", "Logging out user \"{}\".", username);

    if !previous.token_list.is_empty() {
        spawn_reaper(state.identity.clone(), previous.token_list);
    }
    ok_or_log(session.flush().await.context("Flushing session"));

    found(&state.settings.login_url)
}

/// Inner handler for switching the current user to another tenant
pub async fn switch_tenant_handler_inner(
    state: &AppState,
    session: &Session,
    headers: &HeaderMap,
    tenant_id: &str,
    query: RedirectQuery,
) -> Result<Response> {
    let mut session_state = load_state(session).await?;
    let Some(user) = session_state.user.clone()
    else {
        return Ok(end_session(state, session, session_state).await);
    };
    debug!(target: "auth", "Switching to tenant {} for user \"{}\".", tenant_id, user.username);

    let backend = KeystoneBackend::new(state.identity.as_ref(), &state.settings);
    match backend
        .switch_tenant(&user.endpoint, &user.token.id, tenant_id)
        .await
    {
        Ok(switched) => {
            info!(target: "auth", "Tenant switch successful for user \"{}\".", user.username);
            set_session_from_user(
                &mut session_state,
                &switched,
                &state.settings.regions,
                None,
            );
            session_state.record_tokens([TokenPair::new(&switched.endpoint, &switched.token.id)]);
            save_state(session, &session_state).await?;
        },
        Err(err) => {
            warn!(target: "auth", "Tenant switch failed for user \"{}\".", user.username);
            error!(target: "auth", error = %err, "An error occurred while switching sessions.");
        },
    }

    Ok(found(&redirect_after(
        state,
        headers,
        query.next.as_deref(),
    )))
}

/// Inner handler for switching the services region
pub async fn switch_region_handler_inner(
    state: &AppState,
    session: &Session,
    headers: &HeaderMap,
    region_name: &str,
    query: RedirectQuery,
) -> Result<Response> {
    let session_state = load_state(session).await?;
    let username = session_state.username().unwrap_or_default().to_string();

    let Some(auth_url) = state.settings.regions.auth_url_for(region_name)
    else {
        log_security_event!(
            "switch_unconfigured_region",
            username,
            format!("region {}", region_name)
        );
        return Ok(end_session(state, session, session_state).await);
    };
    debug!(target: "auth", "Switching to {} at {}", region_name, auth_url);

    let Some(unscoped_token) = session_state.region_tokens.get(auth_url).cloned()
    else {
        warn!(target: "auth", region = %region_name, "No cached token for region");
        return Ok(end_session(state, session, session_state).await);
    };

    let region_tokens = session_state.region_tokens.clone();
    let redirect_to = redirect_after(state, headers, query.next.as_deref());
    unscoped_token_login(
        state,
        session,
        session_state,
        auth_url,
        &unscoped_token,
        Some(region_tokens),
        &redirect_to,
    )
    .await
}

/// Log in with an unscoped token and redirect to `redirect_to`.
///
/// `region_tokens`, when given, replaces the session's region token map after
/// the login. Any failure goes through the logout path.
pub async fn unscoped_token_login(
    state: &AppState,
    session: &Session,
    mut session_state: SessionState,
    auth_url: &str,
    unscoped_token: &str,
    region_tokens: Option<BTreeMap<String, String>>,
    redirect_to: &str,
) -> Result<Response> {
    let backend = KeystoneBackend::new(state.identity.as_ref(), &state.settings);
    let authenticated = match backend.authenticate_token(auth_url, unscoped_token).await {
        Ok(authenticated) => authenticated,
        Err(LoginFailure {
            error,
            issued,
        }) => {
            warn!(target: "auth", auth_url = %auth_url, error = %error, "Token login failed");
            session_state.record_tokens(issued);
            return Ok(end_session(state, session, session_state).await);
        },
    };

    record_login(session, &mut session_state, &authenticated.user).await?;
    set_session_from_user(
        &mut session_state,
        &authenticated.user,
        &state.settings.regions,
        region_tokens,
    );
    session_state.record_tokens(authenticated.issued);
    save_state(session, &session_state).await?;
    log_auth_event!(
        "token_login",
        authenticated.user.username,
        true,
        region = auth_url
    );

    debug!(target: "auth", "Redirecting to {}", redirect_to);
    Ok(found(redirect_to))
}

/// Absolute URL of the CAS login entry point, without the ticket.
///
/// `CAS_SERVICE_URL` wins when set. Otherwise the URL is rebuilt from the
/// request's `Host`; `X-Forwarded-Proto` is only honoured when
/// `TRUST_X_FORWARDED_PROTO` is enabled.
pub fn cas_service_url(state: &AppState, headers: &HeaderMap, uri: &Uri) -> String {
    if let Some(service) = &state.settings.cas_service_url {
        return service.clone();
    }
    let forwarded = state
        .settings
        .trust_forwarded_proto
        .then(|| headers.get("x-forwarded-proto"))
        .flatten()
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|proto| matches!(*proto, "http" | "https"));
    let scheme = forwarded.or_else(|| uri.scheme_str()).unwrap_or("http");
    let host = request_host(headers)
        .or_else(|| uri.authority().map(|a| a.as_str()))
        .unwrap_or("localhost");
    format!("{}://{}{}", scheme, host, uri.path())
}

/// Inner handler for the CAS login entry point
pub async fn cas_login_handler_inner(
    state: &AppState,
    session: &Session,
    headers: &HeaderMap,
    uri: &Uri,
    query: CasLoginQuery,
) -> Result<Response> {
    let service = cas_service_url(state, headers, uri);
    let auth_url = state.settings.keystone_url.as_str();
    let mut session_state = load_state(session).await?;

    match query.ticket.as_deref().filter(|t| !t.is_empty()) {
        Some(ticket) => {
            match state.identity.cas_token(auth_url, ticket, &service).await {
                Ok(token) => {
                    session_state.record_tokens([TokenPair::new(auth_url, &token)]);
                    let redirect_to = redirect_after(state, headers, query.next.as_deref());
                    unscoped_token_login(
                        state,
                        session,
                        session_state,
                        auth_url,
                        &token,
                        None,
                        &redirect_to,
                    )
                    .await
                },
                Err(err) => {
                    warn!(target: "auth", error = %err, "CAS ticket exchange failed");
                    Ok(end_session(state, session, session_state).await)
                },
            }
        },
        None => {
            match state.identity.cas_login_url(auth_url, &service).await {
                Ok(login_url) => Ok(found(&login_url)),
                Err(err) => {
                    warn!(target: "auth", error = %err, "Could not retrieve the CAS login URL");
                    Ok(end_session(state, session, session_state).await)
                },
            }
        },
    }
}
