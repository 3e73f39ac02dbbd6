//! # Session Layer
//!
//! Cookie and store configuration for the `tower-sessions` manager layer.

use error::{AppError, Result};
use time::Duration;
use tower_sessions::{cookie::SameSite, Expiry, SessionManagerLayer, SessionStore};
use tower_sessions_redis_store::{fred::prelude::Pool, RedisStore};
use tracing::info;

use crate::settings::SessionSettings;

const REDIS_POOL_SIZE: usize = 6;

/// Session manager layer over `store` using the configured cookie options.
///
/// Sessions expire after `ttl` of inactivity.
pub fn session_layer<S>(store: S, settings: &SessionSettings) -> SessionManagerLayer<S>
where
    S: SessionStore + Clone,
{
    let ttl = Duration::try_from(settings.ttl).unwrap_or(Duration::MAX);
    SessionManagerLayer::new(store)
        .with_name(settings.cookie_name.clone())
        .with_secure(settings.cookie_secure)
        .with_http_only(true)
        .with_same_site(SameSite::Lax)
        .with_path("/")
        .with_expiry(Expiry::OnInactivity(ttl))
}

/// Connect to the Redis session store at `url`.
pub async fn redis_store(url: &str) -> Result<RedisStore<Pool>> {
    use tower_sessions_redis_store::fred::prelude::*;

    let config =
        Config::from_url(url).map_err(|e| AppError::config(format!("SESSION_REDIS_URL is not valid: {}", e)))?;
    let pool = Pool::new(config, None, None, None, REDIS_POOL_SIZE)
        .map_err(|e| AppError::session(format!("Could not create Redis pool: {}", e)))?;
    let _connection = pool.connect();
    pool.wait_for_connect()
        .await
        .map_err(|e| AppError::session(format!("Could not connect to Redis: {}", e)))?;
    info!(target: "session", "Connected to Redis session store");
    Ok(RedisStore::new(pool))
}
