//! # Keystone HTTP Client
//!
//! Thin reqwest wrapper over the Keystone v2.0 tokens and tenants APIs.
//! A client is bound to one endpoint and, optionally, one token.

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::{
    error::IdentityError,
    types::{AccessEnvelope, AccessInfo, Credentials, Tenant, TenantList},
};

const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// Connection options shared by every client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Skip TLS certificate verification.
    pub insecure: bool,
    /// Per-request timeout.
    pub timeout:  Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            insecure: false,
            timeout:  Duration::from_secs(10),
        }
    }
}

/// Join an identity endpoint and an API path.
///
/// Trailing slashes on the base and leading slashes on the path are trimmed
/// so `http://ks:5000/v2.0` and `http://ks:5000/v2.0/` both become
/// `http://ks:5000/v2.0/tokens`. The version segment of the base is always kept.
pub fn endpoint_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Client for one identity endpoint.
#[derive(Debug, Clone)]
pub struct KeystoneClient {
    http:     reqwest::Client,
    endpoint: String,
    token:    Option<String>,
}

impl KeystoneClient {
    /// Create a client for `endpoint`, authenticating follow-up calls with `token`.
    pub fn new(endpoint: &str, token: Option<&str>, options: &ClientOptions) -> Result<Self, IdentityError> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(options.insecure)
            .timeout(options.timeout)
            .build()
            .map_err(|e| IdentityError::ClientBuild(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
            token: token.map(str::to_string),
        })
    }

    /// The endpoint this client talks to.
    pub fn endpoint(&self) -> &str { &self.endpoint }

    /// `POST /tokens` with the given credentials.
    pub async fn authenticate(
        &self,
        credentials: &Credentials,
        tenant_id: Option<&str>,
    ) -> Result<AccessInfo, IdentityError> {
        let body = credentials.to_request_body(tenant_id);
        let envelope: AccessEnvelope = self
            .send_json("authenticate", Method::POST, "tokens", Some(&body))
            .await?;

        debug!(
            target: "keystone",
            endpoint = %self.endpoint,
            user = %envelope.access.user.name,
            scoped = envelope.access.is_scoped(),
            "Authenticated against identity service"
        );
        Ok(envelope.access)
    }

    /// `GET /tenants` for the client's token.
    pub async fn tenants(&self) -> Result<Vec<Tenant>, IdentityError> {
        if self.token.is_none() {
            return Err(IdentityError::MissingToken("list tenants"));
        }
        let list: TenantList = self
            .send_json("list tenants", Method::GET, "tenants", None)
            .await?;
        Ok(list.tenants)
    }

    /// `DELETE /tokens/{id}`.
    pub async fn delete_token(&self, token_id: &str) -> Result<(), IdentityError> {
        const OPERATION: &str = "delete token";
        if self.token.is_none() {
            return Err(IdentityError::MissingToken(OPERATION));
        }
        let path = format!("tokens/{}", token_id);
        let response = self.send(OPERATION, Method::DELETE, &path, None).await?;
        check_status(OPERATION, response).await?;
        Ok(())
    }

    /// Raw `POST /tokens` returning the untyped response document.
    ///
    /// Used for credential types whose responses are not token documents,
    /// such as the CAS login-URL lookup.
    pub async fn post_tokens(&self, operation: &'static str, body: &Value) -> Result<Value, IdentityError> {
        self.send_json(operation, Method::POST, "tokens", Some(body))
            .await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = endpoint_url(&self.endpoint, path);
        let builder = self.http.request(method, url);
        match self.token {
            Some(ref token) => builder.header(AUTH_TOKEN_HEADER, token),
            None => builder,
        }
    }

    async fn send(
        &self,
        operation: &'static str,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Response, IdentityError> {
        let mut builder = self.request(method, path);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        builder.send().await.map_err(|e| {
            IdentityError::Transport {
                operation,
                message: e.without_url().to_string(),
            }
        })
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T, IdentityError> {
        let response = self.send(operation, method, path, body).await?;
        let response = check_status(operation, response).await?;
        response.json::<T>().await.map_err(|e| {
            IdentityError::Malformed {
                operation,
                message: e.without_url().to_string(),
            }
        })
    }
}

/// Turn non-2xx responses into [`IdentityError::Status`].
async fn check_status(operation: &'static str, response: Response) -> Result<Response, IdentityError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(IdentityError::Status {
        operation,
        status: status.as_u16(),
        message: error_message(status, &body),
    })
}

/// Extract `error.message` from a Keystone error document.
fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|doc| {
            doc.pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string()
        })
}
