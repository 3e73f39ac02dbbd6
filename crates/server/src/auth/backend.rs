//! # Keystone Authentication Backend
//!
//! Turns credentials into an authenticated [`User`] bound to a project,
//! recording every token acquired along the way.

use std::collections::BTreeMap;

use error::{AppError, Result};
use keystone::{AccessInfo, Credentials, IdentityError, IdentityService, Tenant};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use super::user::{create_user_from_token, User};
use crate::{session::TokenPair, settings::AuthSettings};

pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid user name or password.";
pub const NO_PROJECTS_MESSAGE: &str = "You are not authorized for any projects.";
pub const SERVICE_ERROR_MESSAGE: &str = "An error occurred authenticating. Please try again later.";

/// A successful authentication.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub user:          User,
    /// Unscoped token per region auth URL. Empty for token logins.
    pub region_tokens: BTreeMap<String, String>,
    /// Tokens issued by this authentication, in acquisition order.
    pub issued:        Vec<TokenPair>,
}

/// A failed authentication.
#[derive(Debug)]
pub struct LoginFailure {
    pub error:  AppError,
    /// Tokens issued before the failure. Nothing else references them.
    pub issued: Vec<TokenPair>,
}

impl From<AppError> for LoginFailure {
    fn from(error: AppError) -> Self {
        Self {
            error,
            issued: Vec::new(),
        }
    }
}

/// Authentication backend over an [`IdentityService`].
pub struct KeystoneBackend<'a> {
    identity: &'a dyn IdentityService,
    settings: &'a AuthSettings,
}

impl<'a> KeystoneBackend<'a> {
    pub fn new(identity: &'a dyn IdentityService, settings: &'a AuthSettings) -> Self {
        Self {
            identity,
            settings,
        }
    }

    /// Log in with a user name and password at `auth_url`.
    ///
    /// Unscoped tokens are also requested from every other configured region;
    /// a region that refuses is left out of the returned map. On failure the
    /// tokens issued so far are returned with the error.
    pub async fn authenticate_password(
        &self,
        auth_url: &str,
        username: &str,
        password: &SecretString,
    ) -> std::result::Result<Authenticated, LoginFailure> {
        let mut issued = Vec::new();
        let mut region_tokens = BTreeMap::new();
        match self
            .password_login(auth_url, username, password, &mut issued, &mut region_tokens)
            .await
        {
            Ok(user) => {
                Ok(Authenticated {
                    user,
                    region_tokens,
                    issued,
                })
            },
            Err(error) => {
                Err(LoginFailure {
                    error,
                    issued,
                })
            },
        }
    }

    async fn password_login(
        &self,
        auth_url: &str,
        username: &str,
        password: &SecretString,
        issued: &mut Vec<TokenPair>,
        region_tokens: &mut BTreeMap<String, String>,
    ) -> Result<User> {
        let credentials = Credentials::password(username, password.expose_secret());
        let unscoped = self
            .identity
            .authenticate(auth_url, &credentials, None)
            .await
            .map_err(|e| map_login_error(e, "password authentication"))?;

        let unscoped_id = unscoped.token.id.clone();
        issued.push(TokenPair::new(auth_url, &unscoped_id));
        if self.settings.regions.contains_url(auth_url) {
            region_tokens.insert(auth_url.to_string(), unscoped_id.clone());
        }

        for region in self.settings.regions.iter() {
            if region.auth_url == auth_url {
                continue;
            }
            match self
                .identity
                .authenticate(&region.auth_url, &credentials, None)
                .await
            {
                Ok(access) => {
                    issued.push(TokenPair::new(&region.auth_url, &access.token.id));
                    region_tokens.insert(region.auth_url.clone(), access.token.id);
                },
                Err(e) => {
                    warn!(
                        target: "auth",
                        region = %region.name,
                        username = %username,
                        error = %e,
                        "Could not obtain an unscoped token for region"
                    );
                },
            }
        }

        let scoped = if unscoped.is_scoped() {
            unscoped
        }
        else {
            let scoped = self
                .scope_to_default_project(auth_url, &unscoped_id)
                .await?;
            issued.push(TokenPair::new(auth_url, &scoped.token.id));
            scoped
        };
        create_user_from_token(&scoped, auth_url)
    }

    /// Log in with an existing unscoped token at `auth_url`.
    ///
    /// Only the scoped token is reported as issued; the caller owns the
    /// unscoped one.
    pub async fn authenticate_token(
        &self,
        auth_url: &str,
        unscoped_token: &str,
    ) -> std::result::Result<Authenticated, LoginFailure> {
        let scoped = self
            .scope_to_default_project(auth_url, unscoped_token)
            .await?;
        let issued = vec![TokenPair::new(auth_url, &scoped.token.id)];
        let user = match create_user_from_token(&scoped, auth_url) {
            Ok(user) => user,
            Err(error) => {
                return Err(LoginFailure {
                    error,
                    issued,
                });
            },
        };
        debug!(target: "auth", username = %user.username, tenant = %user.tenant_name, "Token login scoped");

        Ok(Authenticated {
            issued,
            user,
            region_tokens: BTreeMap::new(),
        })
    }

    /// Scope `token_id` (the current user's token) to `tenant_id`.
    pub async fn switch_tenant(&self, auth_url: &str, token_id: &str, tenant_id: &str) -> Result<User> {
        let scoped = self
            .identity
            .authenticate(auth_url, &Credentials::token(token_id), Some(tenant_id))
            .await?;
        create_user_from_token(&scoped, auth_url)
    }

    async fn scope_to_default_project(&self, auth_url: &str, unscoped_token: &str) -> Result<AccessInfo> {
        let tenants = self
            .identity
            .list_tenants(auth_url, unscoped_token)
            .await
            .map_err(|e| map_login_error(e, "project listing"))?;
        let tenant = default_project(&tenants).ok_or_else(|| AppError::unauthorized(NO_PROJECTS_MESSAGE))?;

        self.identity
            .authenticate(
                auth_url,
                &Credentials::token(unscoped_token),
                Some(&tenant.id),
            )
            .await
            .map_err(|e| map_login_error(e, "project scoping"))
    }
}

/// First enabled project.
pub fn default_project(tenants: &[Tenant]) -> Option<&Tenant> { tenants.iter().find(|t| t.enabled) }

fn map_login_error(err: IdentityError, stage: &str) -> AppError {
    if err.is_unauthorized() {
        debug!(target: "auth", stage, error = %err, "Credentials rejected");
        AppError::unauthorized(INVALID_CREDENTIALS_MESSAGE)
    }
    else {
        warn!(target: "auth", stage, error = %err, "Identity service failure during login");
        AppError::identity(SERVICE_ERROR_MESSAGE)
    }
}
