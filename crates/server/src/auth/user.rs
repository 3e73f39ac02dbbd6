//! # Authenticated User
//!
//! The identity kept in the session once a login succeeds.

use chrono::{DateTime, Utc};
use error::{AppError, Result};
use keystone::AccessInfo;
use serde::{Deserialize, Serialize};

/// Token bound to the user's current tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopedToken {
    pub id:      String,
    pub expires: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id:          String,
    pub username:    String,
    pub token:       ScopedToken,
    /// Auth URL of the region the token was issued by.
    pub endpoint:    String,
    pub tenant_id:   String,
    pub tenant_name: String,
    pub roles:       Vec<String>,
}

/// Build a [`User`] from a scoped authentication response.
///
/// # Errors
///
/// Returns an identity error when the token is not bound to a tenant.
pub fn create_user_from_token(access: &AccessInfo, endpoint: &str) -> Result<User> {
    let tenant = access
        .token
        .tenant
        .as_ref()
        .ok_or_else(|| AppError::identity("Identity service returned an unscoped token"))?;

    Ok(User {
        id:          access.user.id.clone(),
        username:    access.user.name.clone(),
        token:       ScopedToken {
            id:      access.token.id.clone(),
            expires: access.token.expires,
        },
        endpoint:    endpoint.to_string(),
        tenant_id:   tenant.id.clone(),
        tenant_name: tenant.name.clone(),
        roles:       access
            .user
            .roles
            .iter()
            .map(|r| r.name.clone())
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use keystone::{Role, Tenant, Token, UserRef};

    use super::*;

    fn access(tenant: Option<Tenant>) -> AccessInfo {
        AccessInfo {
            token:           Token {
                id: "tok-1".to_string(),
                expires: None,
                tenant,
            },
            user:            UserRef {
                id:    "u-1".to_string(),
                name:  "admin".to_string(),
                roles: vec![Role {
                    name: "admin".to_string(),
                }],
            },
            service_catalog: vec![],
        }
    }

    #[test]
    fn test_user_from_scoped_token() {
        let user = create_user_from_token(
            &access(Some(Tenant {
                id:          "t-1".to_string(),
                name:        "demo".to_string(),
                enabled:     true,
                description: None,
            })),
            "http://ks:5000/v2.0",
        )
        .unwrap();
        assert_eq!(user.username, "admin");
        assert_eq!(user.token.id, "tok-1");
        assert_eq!(user.tenant_id, "t-1");
        assert_eq!(user.endpoint, "http://ks:5000/v2.0");
        assert_eq!(user.roles, vec!["admin".to_string()]);
    }

    #[test]
    fn test_unscoped_token_is_rejected() {
        let err = create_user_from_token(&access(None), "http://ks:5000/v2.0").unwrap_err();
        assert_eq!(err.code(), "IDENTITY_SERVICE_ERROR");
    }
}
