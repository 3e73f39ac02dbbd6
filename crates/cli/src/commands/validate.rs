//! # CLI Validate Command
//!
//! Loads the broker configuration from the environment and reports what it
//! resolved to, or the first setting that is invalid.

use error::Result;
use server::{settings::SessionBackend, AuthSettings};

/// Validates the environment configuration
pub fn validate() -> Result<()> {
    let settings = AuthSettings::from_env()?;

    for line in summary(&settings) {
        println!("{}", line);
    }
    Ok(())
}

/// Human-readable description of `settings`.
pub fn summary(settings: &AuthSettings) -> Vec<String> {
    let mut lines = vec![format!("Identity endpoint: {}", settings.keystone_url)];
    if settings.regions.is_empty() {
        lines.push("Regions: none configured".to_string());
    }
    else {
        lines.push(format!("Regions ({}):", settings.regions.len()));
        lines.extend(
            settings
                .regions
                .iter()
                .map(|r| format!("  {} -> {}", r.name, r.auth_url)),
        );
    }
    lines.push(format!(
        "TLS verification: {}",
        if settings.ssl_no_verify {
            "disabled"
        }
        else {
            "enabled"
        }
    ));
    lines.push(format!(
        "Identity timeout: {}s",
        settings.timeout.as_secs()
    ));
    lines.push(format!("Login URL: {}", settings.login_url));
    lines.push(format!(
        "Login redirect URL: {}",
        settings.login_redirect_url
    ));
    if let Some(service) = &settings.cas_service_url {
        lines.push(format!("CAS service URL: {}", service));
    }
    lines.push(format!(
        "Session backend: {} (cookie '{}', ttl {}s)",
        settings.session.backend,
        settings.session.cookie_name,
        settings.session.ttl.as_secs()
    ));
    if settings.session.backend == SessionBackend::Redis {
        lines.push(format!("Redis URL: {}", settings.session.redis_url));
    }
    if settings.trust_forwarded_proto {
        lines.push("Trusting X-Forwarded-Proto for CAS service URLs".to_string());
    }
    lines
}
