//! # Logging Macros
//!
//! Convenience macros for structured authentication logging.

/// Log an authentication event.
///
/// # Example
///
/// ```rust
/// logging::log_auth_event!("login", "admin", true);
/// ```
#[macro_export]
macro_rules! log_auth_event {
    ($event:expr, $username:expr, $success:expr) => {
        $crate::info!(
            target: "auth",
            event = %$event,
            username = %$username,
            success = $success,
            "Authentication event"
        )
    };
    ($event:expr, $username:expr, $success:expr, $($k:ident = $v:expr),+) => {
        $crate::info!(
            target: "auth",
            event = %$event,
            username = %$username,
            success = $success,
            $($k = %$v),+,
            "Authentication event"
        )
    };
}

/// Log a security event.
#[macro_export]
macro_rules! log_security_event {
    ($event:expr, $username:expr, $details:expr) => {
        $crate::warn!(
            target: "security",
            event = %$event,
            username = %$username,
            details = %$details,
            "Security event"
        )
    };
}
