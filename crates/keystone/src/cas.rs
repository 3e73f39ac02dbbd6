//! # CAS Bridge
//!
//! Exchanges CAS service tickets for Keystone tokens through the
//! `casCredentials` extension of `POST /tokens`.

use serde_json::Value;

use crate::{client::KeystoneClient, error::IdentityError, types::cas_request_body};

/// Exchange a CAS ticket for an unscoped token id.
pub async fn retrieve_cas_token(client: &KeystoneClient, ticket: &str, service: &str) -> Result<String, IdentityError> {
    const OPERATION: &str = "CAS ticket exchange";
    let body = cas_request_body(Some(ticket), service);
    let doc = client.post_tokens(OPERATION, &body).await?;
    string_at(&doc, "/access/token/id", OPERATION)
}

/// Ask the identity service where the CAS login page lives for `service`.
pub async fn retrieve_cas_login_url(client: &KeystoneClient, service: &str) -> Result<String, IdentityError> {
    const OPERATION: &str = "CAS login URL lookup";
    let body = cas_request_body(None, service);
    let doc = client.post_tokens(OPERATION, &body).await?;
    string_at(&doc, "/cas_login_url", OPERATION)
}

fn string_at(doc: &Value, pointer: &str, operation: &'static str) -> Result<String, IdentityError> {
    doc.pointer(pointer)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            IdentityError::Malformed {
                operation,
                message: format!("missing {}", pointer),
            }
        })
}
