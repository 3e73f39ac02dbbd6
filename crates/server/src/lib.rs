//! # Session Broker Server
//!
//! Axum application mediating dashboard logins against a Keystone v2.0
//! identity service.
//!
//! ## Modules
//!
//! - [`auth`]: Login, logout, switching and CAS handlers
//! - [`dto`]: Request/response data transfer objects
//! - [`middleware`]: Login-required and request id middleware
//! - [`reaper`]: Background token revocation
//! - [`redirect`]: Redirect target safety checks
//! - [`router`]: Route configuration
//! - [`session`]: Session state, projector and `tower-sessions` layer
//! - [`settings`]: Environment configuration

use std::sync::Arc;

use keystone::IdentityService;

pub mod auth;
pub mod dto;
pub mod middleware;
pub mod reaper;
pub mod redirect;
pub mod router;
pub mod session;
pub mod settings;

pub use router::create_app_router;
pub use settings::AuthSettings;

/// Application state shared across request handlers
#[derive(Clone)]
pub struct AppState {
    pub settings:   Arc<AuthSettings>,
    /// Identity service every handler authenticates against
    pub identity:   Arc<dyn IdentityService>,
    /// Server start time for uptime calculation
    pub start_time: std::time::Instant,
}

impl AppState {
    #[must_use]
    pub fn new(settings: AuthSettings, identity: Arc<dyn IdentityService>) -> Self {
        Self {
            settings: Arc::new(settings),
            identity,
            start_time: std::time::Instant::now(),
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("settings", &self.settings)
            .field("start_time", &self.start_time)
            .finish_non_exhaustive()
    }
}

/// Server initialization result
#[derive(Debug)]
pub struct ServerResult {
    /// The address the server is bound to
    pub address:    String,
    /// Server start timestamp for logging
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl ServerResult {
    /// Creates a new server result
    #[must_use]
    pub fn new(address: &str) -> Self {
        Self {
            address:    address.to_string(),
            started_at: chrono::Utc::now(),
        }
    }
}
