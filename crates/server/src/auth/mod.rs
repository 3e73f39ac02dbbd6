//! # Authentication
//!
//! The Keystone backend, the authenticated user and the HTTP handlers.

pub mod backend;
pub mod handlers;
pub mod user;

pub use backend::{Authenticated, KeystoneBackend, LoginFailure};
pub use user::{create_user_from_token, ScopedToken, User};
