//! # Session State
//!
//! The typed contents of one browser session.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::auth::user::User;

/// A token acquired during the session, with the endpoint that issued it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub endpoint: String,
    pub token_id: String,
}

impl TokenPair {
    pub fn new(endpoint: impl Into<String>, token_id: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            token_id: token_id.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Auth URL of the active region.
    #[serde(default)]
    pub region_endpoint: Option<String>,
    /// Display name of the active region.
    #[serde(default)]
    pub region_name:     Option<String>,
    /// Unscoped token per region auth URL.
    #[serde(default)]
    pub region_tokens:   BTreeMap<String, String>,
    /// Every token acquired in this session, revoked on logout.
    #[serde(default)]
    pub token_list:      Vec<TokenPair>,
    #[serde(default)]
    pub user:            Option<User>,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool { self.user.is_some() }

    pub fn username(&self) -> Option<&str> { self.user.as_ref().map(|u| u.username.as_str()) }

    /// Append tokens, skipping ones already recorded.
    pub fn record_tokens(&mut self, tokens: impl IntoIterator<Item = TokenPair>) {
        for token in tokens {
            if !self.token_list.contains(&token) {
                self.token_list.push(token);
            }
        }
    }
}
