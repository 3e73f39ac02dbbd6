//! # Session Projector
//!
//! Writes an authenticated user into the session fields the dashboard reads.

use std::collections::BTreeMap;

use super::state::SessionState;
use crate::{auth::user::User, settings::AvailableRegions};

/// Project `user` into `state`.
///
/// Sets the user, the active region endpoint and its display name. The
/// region token map is replaced only when `region_tokens` is given.
pub fn set_session_from_user(
    state: &mut SessionState,
    user: &User,
    regions: &AvailableRegions,
    region_tokens: Option<BTreeMap<String, String>>,
) {
    state.user = Some(user.clone());
    state.region_endpoint = Some(user.endpoint.clone());
    state.region_name = regions.name_for(&user.endpoint).map(str::to_string);
    if let Some(region_tokens) = region_tokens {
        state.region_tokens = region_tokens;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::user::ScopedToken, settings::Region};

    fn user(endpoint: &str) -> User {
        User {
            id:          "u-1".to_string(),
            username:    "admin".to_string(),
            token:       ScopedToken {
                id:      "scoped".to_string(),
                expires: None,
            },
            endpoint:    endpoint.to_string(),
            tenant_id:   "t-1".to_string(),
            tenant_name: "demo".to_string(),
            roles:       vec![],
        }
    }

    fn regions() -> AvailableRegions {
        AvailableRegions::new(vec![Region {
            auth_url: "http://r1/v2.0".to_string(),
            name:     "RegionOne".to_string(),
        }])
    }

    #[test]
    fn test_projects_region_fields() {
        let mut state = SessionState::default();
        let mut tokens = BTreeMap::new();
        tokens.insert("http://r1/v2.0".to_string(), "u-1".to_string());

        set_session_from_user(&mut state, &user("http://r1/v2.0"), &regions(), Some(tokens.clone()));

        assert_eq!(state.region_endpoint.as_deref(), Some("http://r1/v2.0"));
        assert_eq!(state.region_name.as_deref(), Some("RegionOne"));
        assert_eq!(state.region_tokens, tokens);
        assert_eq!(state.username(), Some("admin"));
    }

    #[test]
    fn test_unknown_endpoint_has_no_name() {
        let mut state = SessionState {
            region_name: Some("RegionOne".to_string()),
            ..SessionState::default()
        };
        set_session_from_user(&mut state, &user("http://elsewhere/v2.0"), &regions(), None);
        assert!(state.region_name.is_none());
    }

    #[test]
    fn test_region_tokens_untouched_without_mapping() {
        let mut state = SessionState::default();
        state
            .region_tokens
            .insert("http://r1/v2.0".to_string(), "keep".to_string());
        set_session_from_user(&mut state, &user("http://r1/v2.0"), &regions(), None);
        assert_eq!(state.region_tokens["http://r1/v2.0"], "keep");
    }
}
