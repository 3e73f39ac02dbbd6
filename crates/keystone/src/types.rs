//! # Keystone v2.0 Wire Types
//!
//! Request credentials and the response documents of the tokens and tenants APIs.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Credentials accepted by `POST /tokens`.
#[derive(Debug)]
pub enum Credentials {
    /// User name and password.
    Password {
        username: String,
        password: SecretString,
    },
    /// An existing (scoped or unscoped) token.
    Token {
        id: String,
    },
}

impl Credentials {
    /// Build password credentials.
    pub fn password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Password {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }

    /// Build token credentials.
    pub fn token(id: impl Into<String>) -> Self {
        Self::Token {
            id: id.into(),
        }
    }

    /// Request body for `POST /tokens`, optionally scoped to a tenant.
    pub fn to_request_body(&self, tenant_id: Option<&str>) -> Value {
        let mut auth = match self {
            Credentials::Password {
                username,
                password,
            } => {
                json!({
                    "passwordCredentials": {
                        "username": username,
                        "password": password.expose_secret(),
                    }
                })
            },
            Credentials::Token {
                id,
            } => json!({ "token": { "id": id } }),
        };
        if let Some(tenant_id) = tenant_id {
            auth["tenantId"] = Value::String(tenant_id.to_string());
        }
        json!({ "auth": auth })
    }
}

/// Body of a CAS credential exchange. Without a ticket the identity service
/// answers with the CAS login URL instead of a token.
pub fn cas_request_body(ticket: Option<&str>, service: &str) -> Value {
    let mut credentials = json!({ "service": service });
    if let Some(ticket) = ticket {
        credentials["ticket"] = Value::String(ticket.to_string());
    }
    json!({ "auth": { "casCredentials": credentials } })
}

/// `{"access": {...}}` envelope returned by `POST /tokens`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccessEnvelope {
    pub access: AccessInfo,
}

/// Token, user and catalog returned by a successful authentication.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AccessInfo {
    pub token: Token,
    pub user:  UserRef,
    #[serde(default, rename = "serviceCatalog")]
    pub service_catalog: Vec<CatalogEntry>,
}

impl AccessInfo {
    /// True when the token is bound to a tenant.
    pub fn is_scoped(&self) -> bool { self.token.tenant.is_some() }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Token {
    pub id:      String,
    #[serde(default)]
    pub expires: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tenant:  Option<Tenant>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Tenant {
    pub id:          String,
    pub name:        String,
    #[serde(default = "enabled_by_default")]
    pub enabled:     bool,
    #[serde(default)]
    pub description: Option<String>,
}

fn enabled_by_default() -> bool { true }

/// `{"tenants": [...]}` envelope returned by `GET /tenants`.
#[derive(Debug, Clone, Deserialize)]
pub struct TenantList {
    pub tenants: Vec<Tenant>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UserRef {
    pub id:    String,
    pub name:  String,
    #[serde(default)]
    pub roles: Vec<Role>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Role {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CatalogEntry {
    #[serde(rename = "type")]
    pub service_type: String,
    #[serde(default)]
    pub name:         String,
    #[serde(default)]
    pub endpoints:    Vec<CatalogEndpoint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CatalogEndpoint {
    #[serde(default)]
    pub region:     Option<String>,
    #[serde(default, rename = "publicURL")]
    pub public_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_body_shape() {
        let body = Credentials::password("admin", "s3cret").to_request_body(None);
        assert_eq!(body["auth"]["passwordCredentials"]["username"], "admin");
        assert_eq!(body["auth"]["passwordCredentials"]["password"], "s3cret");
        assert!(body["auth"].get("tenantId").is_none());
    }

    #[test]
    fn test_token_body_with_tenant() {
        let body = Credentials::token("abc").to_request_body(Some("t-2"));
        assert_eq!(body["auth"]["token"]["id"], "abc");
        assert_eq!(body["auth"]["tenantId"], "t-2");
    }

    #[test]
    fn test_password_is_redacted_in_debug() {
        let creds = Credentials::password("admin", "s3cret");
        assert!(!format!("{:?}", creds).contains("s3cret"));
    }

    #[test]
    fn test_cas_bodies() {
        let login = cas_request_body(None, "https://dash.example/auth/cas/login");
        assert!(login["auth"]["casCredentials"].get("ticket").is_none());
        let exchange = cas_request_body(Some("ST-1"), "https://dash.example/auth/cas/login");
        assert_eq!(exchange["auth"]["casCredentials"]["ticket"], "ST-1");
        assert_eq!(
            exchange["auth"]["casCredentials"]["service"],
            "https://dash.example/auth/cas/login"
        );
    }

    #[test]
    fn test_access_document_parses() {
        let doc = json!({
            "access": {
                "token": {
                    "id": "tok-1",
                    "expires": "2026-10-18T12:00:00Z",
                    "tenant": { "id": "t-1", "name": "demo" }
                },
                "user": { "id": "u-1", "name": "admin", "roles": [{ "name": "admin" }] },
                "serviceCatalog": [{
                    "type": "compute",
                    "name": "nova",
                    "endpoints": [{ "region": "RegionOne", "publicURL": "http://nova:8774/v2" }]
                }]
            }
        });
        let envelope: AccessEnvelope = serde_json::from_value(doc).unwrap();
        assert!(envelope.access.is_scoped());
        assert_eq!(envelope.access.user.roles[0].name, "admin");
        assert!(envelope.access.token.expires.is_some());
        assert!(envelope.access.token.tenant.as_ref().unwrap().enabled);
    }
}
