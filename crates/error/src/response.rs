//! # API Response Types
//!
//! JSON envelope used for every non-redirect response.
//!
//! ```json
//! { "status": "success", "data": { ... } }
//! { "status": "error", "code": "UNAUTHORIZED", "message": "..." }
//! ```

use serde::{Deserialize, Serialize};

/// API response type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase", tag = "status")]
pub enum ApiResponse<T> {
    /// Success response.
    Success {
        /// Response data.
        data: T,
    },

    /// Error response.
    Error {
        /// Error code.
        code: String,

        /// Error message.
        message: String,

        /// Request ID for correlation.
        #[serde(skip_serializing_if = "Option::is_none", default)]
        request_id: Option<String>,
    },
}

impl<T> ApiResponse<T> {
    /// Create a success response.
    #[inline]
    pub fn ok(data: T) -> Self {
        Self::Success {
            data,
        }
    }

    /// Create an error response.
    #[inline]
    pub fn error(code: impl ToString, message: impl ToString) -> Self {
        Self::Error {
            code:       code.to_string(),
            message:    message.to_string(),
            request_id: None,
        }
    }

    /// Attach a request ID to an error response.
    #[must_use]
    pub fn with_request_id(self, id: impl ToString) -> Self {
        match self {
            Self::Error {
                code,
                message,
                ..
            } => {
                Self::Error {
                    code,
                    message,
                    request_id: Some(id.to_string()),
                }
            },
            other => other,
        }
    }

    /// Returns true for success responses.
    pub fn is_success(&self) -> bool { matches!(self, Self::Success { .. }) }

    /// Borrow the payload of a success response.
    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Success {
                data,
            } => Some(data),
            Self::Error {
                ..
            } => None,
        }
    }
}
