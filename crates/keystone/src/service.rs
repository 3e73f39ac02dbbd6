//! # Identity Service
//!
//! The seam between the session broker and the identity service. Handlers
//! only ever talk to [`IdentityService`]; [`HttpIdentityService`] is the
//! production implementation and tests substitute their own.

use async_trait::async_trait;
use tracing::debug;

use crate::{
    cas::{retrieve_cas_login_url, retrieve_cas_token},
    client::{ClientOptions, KeystoneClient},
    error::IdentityError,
    types::{AccessInfo, Credentials, Tenant},
};

/// Operations the session broker needs from the identity service.
#[async_trait]
pub trait IdentityService: Send + Sync + 'static {
    /// Authenticate against `auth_url`, optionally scoped to `tenant_id`.
    async fn authenticate(
        &self,
        auth_url: &str,
        credentials: &Credentials,
        tenant_id: Option<&str>,
    ) -> Result<AccessInfo, IdentityError>;

    /// Projects the holder of `token_id` may scope to.
    async fn list_tenants(&self, auth_url: &str, token_id: &str) -> Result<Vec<Tenant>, IdentityError>;

    /// Revoke `token_id` at `endpoint`.
    async fn delete_token(&self, endpoint: &str, token_id: &str) -> Result<(), IdentityError>;

    /// Exchange a CAS ticket for an unscoped token id.
    async fn cas_token(&self, auth_url: &str, ticket: &str, service: &str) -> Result<String, IdentityError>;

    /// CAS login page for `service`.
    async fn cas_login_url(&self, auth_url: &str, service: &str) -> Result<String, IdentityError>;
}

/// [`IdentityService`] backed by Keystone v2.0 over HTTP.
///
/// A fresh [`KeystoneClient`] is built for every call, bound to the endpoint
/// and token of that call.
#[derive(Debug, Clone, Default)]
pub struct HttpIdentityService {
    options: ClientOptions,
}

impl HttpIdentityService {
    #[must_use]
    pub fn new(options: ClientOptions) -> Self {
        Self {
            options,
        }
    }

    /// Options every client is built with.
    pub fn options(&self) -> &ClientOptions { &self.options }

    fn client(&self, endpoint: &str, token: Option<&str>) -> Result<KeystoneClient, IdentityError> {
        KeystoneClient::new(endpoint, token, &self.options)
    }
}

#[async_trait]
impl IdentityService for HttpIdentityService {
    async fn authenticate(
        &self,
        auth_url: &str,
        credentials: &Credentials,
        tenant_id: Option<&str>,
    ) -> Result<AccessInfo, IdentityError> {
        self.client(auth_url, None)?
            .authenticate(credentials, tenant_id)
            .await
    }

    async fn list_tenants(&self, auth_url: &str, token_id: &str) -> Result<Vec<Tenant>, IdentityError> {
        self.client(auth_url, Some(token_id))?.tenants().await
    }

    async fn delete_token(&self, endpoint: &str, token_id: &str) -> Result<(), IdentityError> {
        self.client(endpoint, Some(token_id))?
            .delete_token(token_id)
            .await?;
        debug!(target: "keystone", endpoint = %endpoint, "Token deleted");
        Ok(())
    }

    async fn cas_token(&self, auth_url: &str, ticket: &str, service: &str) -> Result<String, IdentityError> {
        let client = self.client(auth_url, None)?;
        retrieve_cas_token(&client, ticket, service).await
    }

    async fn cas_login_url(&self, auth_url: &str, service: &str) -> Result<String, IdentityError> {
        let client = self.client(auth_url, None)?;
        retrieve_cas_login_url(&client, service).await
    }
}
