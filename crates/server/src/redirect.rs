//! # Redirect Safety
//!
//! Only relative URLs and absolute URLs on the requesting host are followed;
//! everything else falls back to the configured default.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use url::Url;

/// Name of the request parameter carrying the post-action destination.
pub const REDIRECT_FIELD_NAME: &str = "next";

/// True when `url` may be used as a redirect target for a request on `host`.
pub fn is_safe_url(url: &str, host: Option<&str>) -> bool {
    let url = url.trim();
    if url.is_empty() || url.chars().any(char::is_control) {
        return false;
    }
    let normalized = url.replace('\\', "/");
    if normalized.starts_with("//") {
        return false;
    }

    match Url::parse(&normalized) {
        Ok(parsed) => {
            if !matches!(parsed.scheme(), "http" | "https") {
                return false;
            }
            let Some(target_host) = parsed.host_str()
            else {
                return false;
            };
            let netloc = match parsed.port() {
                Some(port) => format!("{}:{}", target_host, port),
                None => target_host.to_string(),
            };
            host.is_some_and(|host| netloc.eq_ignore_ascii_case(host))
        },
        Err(url::ParseError::RelativeUrlWithoutBase) => true,
        Err(_) => false,
    }
}

/// Pick `next` when it is safe for `host`, otherwise `default`.
pub fn resolve_redirect(next: Option<&str>, host: Option<&str>, default: &str) -> String {
    match next {
        Some(next) if is_safe_url(next, host) => next.to_string(),
        _ => default.to_string(),
    }
}

/// `302 Found` to `location`.
pub fn found(location: &str) -> Response {
    (
        StatusCode::FOUND,
        [(header::LOCATION, location.to_string())],
    )
        .into_response()
}

/// `login_url` carrying `next` as the redirect parameter.
pub fn login_url_with_next(login_url: &str, next: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(next.as_bytes()).collect();
    let separator = if login_url.contains('?') { '&' } else { '?' };
    format!("{}{}{}={}", login_url, separator, REDIRECT_FIELD_NAME, encoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOST: Option<&str> = Some("myapp.example");

    #[test]
    fn test_relative_paths_are_safe() {
        assert!(is_safe_url("/dashboard", HOST));
        assert!(is_safe_url("/project/instances?page=2", HOST));
        assert!(is_safe_url("settings", HOST));
        assert!(is_safe_url("/dashboard", None));
    }

    #[test]
    fn test_foreign_hosts_are_unsafe() {
        assert!(!is_safe_url("http://evil.example/x", HOST));
        assert!(!is_safe_url("https://myapp.example@evil.example/", HOST));
        assert!(!is_safe_url("http:evil.example", HOST));
        assert!(!is_safe_url("http://myapp.example/x", None));
    }

    #[test]
    fn test_same_host_absolute_is_safe() {
        assert!(is_safe_url("https://myapp.example/project/", HOST));
        assert!(is_safe_url("https://MyApp.Example/project/", HOST));
        assert!(is_safe_url("http://myapp.example:8080/", Some("myapp.example:8080")));
        assert!(!is_safe_url("http://myapp.example:8080/", HOST));
    }

    #[test]
    fn test_scheme_relative_and_backslashes_are_unsafe() {
        assert!(!is_safe_url("//evil.example/x", HOST));
        assert!(!is_safe_url("\\\\evil.example", HOST));
        assert!(!is_safe_url("/\\evil.example", HOST));
        assert!(!is_safe_url("\\/evil.example", HOST));
    }

    #[test]
    fn test_other_schemes_and_empty_are_unsafe() {
        assert!(!is_safe_url("", HOST));
        assert!(!is_safe_url("   ", HOST));
        assert!(!is_safe_url("javascript:alert(1)", HOST));
        assert!(!is_safe_url("ftp://myapp.example/file", HOST));
        assert!(!is_safe_url("/dash\nboard", HOST));
    }

    #[test]
    fn test_resolve_redirect() {
        assert_eq!(
            resolve_redirect(Some("http://evil.example/x"), HOST, "/"),
            "/"
        );
        assert_eq!(
            resolve_redirect(Some("/dashboard"), HOST, "/"),
            "/dashboard"
        );
        assert_eq!(resolve_redirect(None, HOST, "/home"), "/home");
    }

    #[test]
    fn test_login_url_with_next() {
        assert_eq!(
            login_url_with_next("/auth/login", "/auth/switch/t-2?next=/x"),
            "/auth/login?next=%2Fauth%2Fswitch%2Ft-2%3Fnext%3D%2Fx"
        );
        assert_eq!(
            login_url_with_next("/auth/login?sso=1", "/"),
            "/auth/login?sso=1&next=%2F"
        );
    }

    #[test]
    fn test_found() {
        let response = found("/auth/login");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/auth/login");
    }
}
