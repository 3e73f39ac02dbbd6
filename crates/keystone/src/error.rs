//! # Identity Errors
//!
//! Failures reported by the identity client.

use error::AppError;
use thiserror::Error;

/// Errors returned by identity-service calls.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Failed to build identity client: {0}")]
    ClientBuild(String),

    #[error("{operation} request failed: {message}")]
    Transport {
        operation: &'static str,
        message:   String,
    },

    #[error("{operation} rejected with HTTP {status}: {message}")]
    Status {
        operation: &'static str,
        status:    u16,
        message:   String,
    },

    #[error("{operation} returned a malformed response: {message}")]
    Malformed {
        operation: &'static str,
        message:   String,
    },

    #[error("Operation {0} requires an authentication token")]
    MissingToken(&'static str),
}

impl IdentityError {
    /// True when the identity service refused the supplied credentials.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            IdentityError::Status {
                status: 401,
                ..
            }
        )
    }
}

impl From<IdentityError> for AppError {
    fn from(err: IdentityError) -> Self {
        if err.is_unauthorized() {
            AppError::unauthorized(err.to_string())
        }
        else {
            AppError::identity(err.to_string())
        }
    }
}
