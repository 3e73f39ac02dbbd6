//! # Broker Settings
//!
//! Region list, identity endpoint, redirect targets and session options,
//! loaded from environment variables at startup.

use std::time::Duration;

use error::{AppError, Result};
use keystone::ClientOptions;
use serde::Serialize;

pub const DEFAULT_KEYSTONE_URL: &str = "http://127.0.0.1:5000/v2.0";
pub const DEFAULT_LOGIN_REDIRECT_URL: &str = "/";
pub const DEFAULT_LOGIN_URL: &str = "/auth/login";
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";
pub const DEFAULT_COOKIE_NAME: &str = "sessionid";
const DEFAULT_TIMEOUT_SECONDS: u64 = 10;
const DEFAULT_SESSION_TTL_SECONDS: u64 = 12 * 60 * 60;

/// An independently addressable deployment with its own identity endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Region {
    pub auth_url: String,
    pub name:     String,
}

/// Configured regions, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AvailableRegions(Vec<Region>);

impl AvailableRegions {
    pub fn new(regions: Vec<Region>) -> Self { Self(regions) }

    /// Parse the `[[auth_url, display_name], ...]` JSON form.
    pub fn from_json(raw: &str) -> Result<Self> {
        let pairs: Vec<(String, String)> = serde_json::from_str(raw)
            .map_err(|e| AppError::config(format!("AVAILABLE_REGIONS is not a list of [url, name] pairs: {}", e)))?;
        Ok(Self(
            pairs
                .into_iter()
                .map(|(auth_url, name)| {
                    Region {
                        auth_url,
                        name,
                    }
                })
                .collect(),
        ))
    }

    /// Display name of the region whose auth URL is `auth_url`.
    pub fn name_for(&self, auth_url: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|r| r.auth_url == auth_url)
            .map(|r| r.name.as_str())
    }

    /// Auth URL of the first region named `name`.
    pub fn auth_url_for(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.auth_url.as_str())
    }

    pub fn contains_url(&self, auth_url: &str) -> bool { self.name_for(auth_url).is_some() }

    pub fn first(&self) -> Option<&Region> { self.0.first() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn iter(&self) -> impl Iterator<Item = &Region> { self.0.iter() }
}

/// Where sessions are kept between requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionBackend {
    Memory,
    Redis,
}

impl std::str::FromStr for SessionBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "redis" => Ok(Self::Redis),
            other => {
                Err(AppError::config(format!(
                    "SESSION_BACKEND must be 'memory' or 'redis', got '{}'",
                    other
                )))
            },
        }
    }
}

impl std::fmt::Display for SessionBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionBackend::Memory => write!(f, "memory"),
            SessionBackend::Redis => write!(f, "redis"),
        }
    }
}

/// Session cookie and storage options.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub backend:       SessionBackend,
    pub redis_url:     String,
    pub cookie_name:   String,
    pub cookie_secure: bool,
    pub ttl:           Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            backend:       SessionBackend::Memory,
            redis_url:     DEFAULT_REDIS_URL.to_string(),
            cookie_name:   DEFAULT_COOKIE_NAME.to_string(),
            cookie_secure: false,
            ttl:           Duration::from_secs(DEFAULT_SESSION_TTL_SECONDS),
        }
    }
}

/// Settings consulted by the authentication views.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub regions:               AvailableRegions,
    pub keystone_url:          String,
    pub ssl_no_verify:         bool,
    pub login_redirect_url:    String,
    pub login_url:             String,
    pub timeout:               Duration,
    /// Fixed CAS service URL. Without it the URL is rebuilt from the
    /// request's `Host`, which deployments behind a proxy should not rely on.
    pub cas_service_url:       Option<String>,
    /// Take the scheme of a rebuilt CAS service URL from `X-Forwarded-Proto`.
    pub trust_forwarded_proto: bool,
    pub session:               SessionSettings,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            regions:               AvailableRegions::default(),
            keystone_url:          DEFAULT_KEYSTONE_URL.to_string(),
            ssl_no_verify:         false,
            login_redirect_url:    DEFAULT_LOGIN_REDIRECT_URL.to_string(),
            login_url:             DEFAULT_LOGIN_URL.to_string(),
            timeout:               Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
            cas_service_url:       None,
            trust_forwarded_proto: false,
            session:               SessionSettings::default(),
        }
    }
}

impl AuthSettings {
    /// Load settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns a config error naming the first variable that fails to parse.
    pub fn from_env() -> Result<Self> { Self::from_lookup(|key| std::env::var(key).ok()) }

    /// Load settings through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let regions = match get("AVAILABLE_REGIONS") {
            Some(raw) => AvailableRegions::from_json(&raw)?,
            None => defaults.regions,
        };

        let timeout_seconds = match get("OPENSTACK_TIMEOUT_SECONDS") {
            Some(raw) => {
                raw.trim()
                    .parse::<u64>()
                    .ok()
                    .filter(|secs| *secs > 0)
                    .ok_or_else(|| {
                        AppError::config(format!(
                            "OPENSTACK_TIMEOUT_SECONDS must be a positive integer, got '{}'",
                            raw
                        ))
                    })?
            },
            None => DEFAULT_TIMEOUT_SECONDS,
        };

        let ttl_seconds = match get("SESSION_TTL_SECONDS") {
            Some(raw) => {
                raw.trim()
                    .parse::<u64>()
                    .ok()
                    .filter(|secs| *secs > 0)
                    .ok_or_else(|| {
                        AppError::config(format!(
                            "SESSION_TTL_SECONDS must be a positive integer, got '{}'",
                            raw
                        ))
                    })?
            },
            None => DEFAULT_SESSION_TTL_SECONDS,
        };

        let session = SessionSettings {
            backend: match get("SESSION_BACKEND") {
                Some(raw) => raw.parse()?,
                None => defaults.session.backend,
            },
            redis_url: get("SESSION_REDIS_URL").unwrap_or(defaults.session.redis_url),
            cookie_name: get("SESSION_COOKIE_NAME").unwrap_or(defaults.session.cookie_name),
            cookie_secure: parse_bool("SESSION_COOKIE_SECURE", get("SESSION_COOKIE_SECURE"))?,
            ttl: Duration::from_secs(ttl_seconds),
        };

        let settings = Self {
            regions,
            keystone_url: get("OPENSTACK_KEYSTONE_URL").unwrap_or(defaults.keystone_url),
            ssl_no_verify: parse_bool("OPENSTACK_SSL_NO_VERIFY", get("OPENSTACK_SSL_NO_VERIFY"))?,
            login_redirect_url: get("LOGIN_REDIRECT_URL").unwrap_or(defaults.login_redirect_url),
            login_url: get("LOGIN_URL").unwrap_or(defaults.login_url),
            timeout: Duration::from_secs(timeout_seconds),
            cas_service_url: get("CAS_SERVICE_URL"),
            trust_forwarded_proto: parse_bool("TRUST_X_FORWARDED_PROTO", get("TRUST_X_FORWARDED_PROTO"))?,
            session,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<()> {
        for region in self.regions.iter() {
            url::Url::parse(&region.auth_url).map_err(|e| {
                AppError::config(format!(
                    "Region '{}' has an invalid auth URL '{}': {}",
                    region.name, region.auth_url, e
                ))
            })?;
        }
        url::Url::parse(&self.keystone_url).map_err(|e| {
            AppError::config(format!(
                "OPENSTACK_KEYSTONE_URL '{}' is invalid: {}",
                self.keystone_url, e
            ))
        })?;
        if let Some(service) = &self.cas_service_url {
            url::Url::parse(service)
                .map_err(|e| AppError::config(format!("CAS_SERVICE_URL '{}' is invalid: {}", service, e)))?;
        }
        if !self.login_url.starts_with('/') {
            return Err(AppError::config("LOGIN_URL must be an absolute path"));
        }
        if self.session.cookie_name.is_empty() ||
            self.session
                .cookie_name
                .chars()
                .any(|c| c.is_whitespace() || matches!(c, ';' | ',' | '='))
        {
            return Err(AppError::config(format!(
                "SESSION_COOKIE_NAME '{}' is not a valid cookie name",
                self.session.cookie_name
            )));
        }
        Ok(())
    }

    /// Auth URL used when a login does not name a region.
    pub fn default_auth_url(&self) -> &str {
        self.regions
            .first()
            .map(|r| r.auth_url.as_str())
            .unwrap_or(&self.keystone_url)
    }

    /// Options every identity client is built with.
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            insecure: self.ssl_no_verify,
            timeout:  self.timeout,
        }
    }
}

fn parse_bool(key: &str, value: Option<String>) -> Result<bool> {
    let Some(raw) = value
    else {
        return Ok(false);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(AppError::config(format!("{} must be a boolean, got '{}'", key, raw))),
    }
}
