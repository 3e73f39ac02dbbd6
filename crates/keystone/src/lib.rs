//! # Keystone Identity Client
//!
//! Client side of the Keystone v2.0 identity API as used by the session broker:
//!
//! - [`client`]: HTTP client for the tokens and tenants APIs
//! - [`cas`]: CAS ticket exchange through `casCredentials`
//! - [`service`]: the [`IdentityService`] trait and its HTTP implementation
//! - [`types`]: request credentials and response documents

pub mod cas;
pub mod client;
pub mod error;
pub mod service;
pub mod types;

pub use client::{endpoint_url, ClientOptions, KeystoneClient};
pub use error::IdentityError;
pub use secrecy;
pub use service::{HttpIdentityService, IdentityService};
pub use types::{AccessInfo, Credentials, Role, Tenant, Token, UserRef};
