//! # Sessions
//!
//! Typed session state stored through `tower-sessions`, the projector that
//! fills it from an authenticated user, and the session layer.

pub mod data;
pub mod layer;
pub mod projector;
pub mod state;

pub use data::{load_state, record_login, save_state, SESSION_STATE_KEY};
pub use layer::{redis_store, session_layer};
pub use projector::set_session_from_user;
pub use state::{SessionState, TokenPair};
