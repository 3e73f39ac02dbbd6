//! # Data Transfer Objects
//!
//! Request and response shapes of the HTTP entry points.

pub mod auth;
