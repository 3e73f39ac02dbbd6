//! # Session Data
//!
//! Reads and writes the typed [`SessionState`] kept in a `tower-sessions`
//! session under a single key.

use error::{Result, ResultExt};
use tower_sessions::Session;

use super::state::SessionState;
use crate::auth::user::User;

/// Session key holding the serialized [`SessionState`].
pub const SESSION_STATE_KEY: &str = "keystone";

/// Current session state; a new session starts empty.
pub async fn load_state(session: &Session) -> Result<SessionState> {
    let state = session
        .get::<SessionState>(SESSION_STATE_KEY)
        .await
        .context("Loading session")?;
    Ok(state.unwrap_or_default())
}

pub async fn save_state(session: &Session, state: &SessionState) -> Result<()> {
    session
        .insert(SESSION_STATE_KEY, state)
        .await
        .context("Saving session")
}

/// Record a successful login of `user` and rotate the session id.
///
/// When a different user was logged in, the previous data is discarded
/// except the token list, which stays so that logout still revokes every
/// token this browser session acquired.
pub async fn record_login(session: &Session, state: &mut SessionState, user: &User) -> Result<()> {
    let same_user = state
        .username()
        .map_or(true, |current| current == user.username);
    if !same_user {
        let token_list = std::mem::take(&mut state.token_list);
        *state = SessionState {
            token_list,
            ..SessionState::default()
        };
    }
    state.user = Some(user.clone());
    session.cycle_id().await.context("Rotating session id")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;
    use crate::{auth::user::ScopedToken, session::state::TokenPair};

    fn user(name: &str) -> User {
        User {
            id:          format!("id-{}", name),
            username:    name.to_string(),
            token:       ScopedToken {
                id:      format!("tok-{}", name),
                expires: None,
            },
            endpoint:    "http://r1/v2.0".to_string(),
            tenant_id:   "t-1".to_string(),
            tenant_name: "demo".to_string(),
            roles:       vec![],
        }
    }

    fn session() -> Session { Session::new(None, Arc::new(MemoryStore::default()), None) }

    #[tokio::test]
    async fn test_new_session_is_empty() {
        let state = load_state(&session()).await.unwrap();
        assert_eq!(state, SessionState::default());
    }

    #[tokio::test]
    async fn test_state_round_trips_under_one_key() {
        let session = session();
        let mut state = SessionState::default();
        state.record_tokens([TokenPair::new("http://r1/v2.0", "u-1")]);
        save_state(&session, &state).await.unwrap();

        assert_eq!(load_state(&session).await.unwrap(), state);
        assert!(session
            .get_value(SESSION_STATE_KEY)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_login_as_other_user_keeps_only_token_list() {
        let session = session();
        let mut state = SessionState {
            region_endpoint: Some("http://r1/v2.0".to_string()),
            region_name: Some("RegionOne".to_string()),
            user: Some(user("alice")),
            ..SessionState::default()
        };
        state
            .region_tokens
            .insert("http://r1/v2.0".to_string(), "u-1".to_string());
        state.record_tokens([TokenPair::new("http://r1/v2.0", "u-1")]);

        record_login(&session, &mut state, &user("bob")).await.unwrap();

        assert_eq!(state.username(), Some("bob"));
        assert!(state.region_endpoint.is_none());
        assert!(state.region_tokens.is_empty());
        assert_eq!(state.token_list.len(), 1);
    }

    #[tokio::test]
    async fn test_login_as_same_user_keeps_data() {
        let session = session();
        let mut state = SessionState {
            region_name: Some("RegionOne".to_string()),
            user: Some(user("alice")),
            ..SessionState::default()
        };
        record_login(&session, &mut state, &user("alice")).await.unwrap();
        assert_eq!(state.region_name.as_deref(), Some("RegionOne"));
    }
}
