//! # Authentication Data Transfer Objects
//!
//! Request and response types for the login, switch and CAS entry points.

use axum::{
    extract::{FromRequest, Request},
    http::header,
    Form,
    Json,
};
use error::AppError;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{redirect::REDIRECT_FIELD_NAME, settings::Region};

pub const LOGIN_TEMPLATE: &str = "auth/login.html";
pub const LOGIN_PARTIAL_TEMPLATE: &str = "auth/_login.html";

/// Credentials submitted to the login form.
#[derive(Clone, PartialEq, Eq, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 255, message = "User name is required"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,

    /// Auth URL of the region to log in to.
    #[serde(default)]
    pub region: Option<String>,

    #[serde(default)]
    pub next: Option<String>,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("region", &self.region)
            .field("next", &self.next)
            .finish()
    }
}

/// Accepts a [`LoginRequest`] as either a JSON body or a urlencoded form.
#[derive(Debug)]
pub struct LoginPayload(pub LoginRequest);

impl<S> FromRequest<S> for LoginPayload
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));

        let request = if is_json {
            Json::<LoginRequest>::from_request(req, state)
                .await
                .map_err(|e| AppError::bad_request(e.body_text()))?
                .0
        }
        else {
            Form::<LoginRequest>::from_request(req, state)
                .await
                .map_err(|e| AppError::bad_request(e.body_text()))?
                .0
        };
        Ok(Self(request))
    }
}

/// Query accepted by the login page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginPageQuery {
    /// Auth URL of the region to preselect.
    pub region: Option<String>,
    pub next:   Option<String>,
}

/// Post-action destination shared by the switch and logout entry points.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RedirectQuery {
    pub next: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CasLoginQuery {
    pub ticket: Option<String>,
    pub next:   Option<String>,
}

/// Document describing the login form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginPage {
    pub template:            &'static str,
    pub regions:             Vec<Region>,
    pub initial_region:      Option<String>,
    pub redirect_field_name: &'static str,
    pub next:                Option<String>,
    pub hide:                bool,
    pub error:               Option<String>,
}

impl LoginPage {
    pub fn new(regions: Vec<Region>, ajax: bool) -> Self {
        Self {
            template: if ajax {
                LOGIN_PARTIAL_TEMPLATE
            }
            else {
                LOGIN_TEMPLATE
            },
            regions,
            initial_region: None,
            redirect_field_name: REDIRECT_FIELD_NAME,
            next: None,
            hide: ajax,
            error: None,
        }
    }

    #[must_use]
    pub fn with_initial_region(mut self, region: Option<String>) -> Self {
        self.initial_region = region;
        self
    }

    #[must_use]
    pub fn with_next(mut self, next: Option<String>) -> Self {
        self.next = next;
        self
    }

    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_validation() {
        let valid = LoginRequest {
            username: "admin".to_string(),
            password: "secret".to_string(),
            region:   None,
            next:     None,
        };
        assert!(valid.validate().is_ok());

        let missing = LoginRequest {
            username: String::new(),
            password: String::new(),
            region:   None,
            next:     None,
        };
        let err: AppError = missing.validate().unwrap_err().into();
        assert_eq!(err.message(), "Password is required, User name is required");
    }

    #[test]
    fn test_login_request_debug_hides_password() {
        let req = LoginRequest {
            username: "admin".to_string(),
            password: "hunter2".to_string(),
            region:   None,
            next:     None,
        };
        assert!(!format!("{:?}", req).contains("hunter2"));
    }

    #[test]
    fn test_login_page_ajax() {
        let page = LoginPage::new(vec![], true);
        assert_eq!(page.template, LOGIN_PARTIAL_TEMPLATE);
        assert!(page.hide);

        let page = LoginPage::new(vec![], false).with_error("Invalid user name or password.");
        assert_eq!(page.template, LOGIN_TEMPLATE);
        assert!(!page.hide);
        assert_eq!(page.redirect_field_name, "next");
        assert!(page.error.is_some());
    }
}
