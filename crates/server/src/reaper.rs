//! # Token Reaper
//!
//! Best-effort revocation of every token a session acquired, run in the
//! background once the user logs out.

use std::sync::Arc;

use keystone::IdentityService;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::session::TokenPair;

/// Result of one deletion attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReapItem {
    pub endpoint: String,
    pub deleted:  bool,
}

/// Per-item results of a reaping run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReapReport {
    pub items: Vec<ReapItem>,
}

impl ReapReport {
    pub fn attempted(&self) -> usize { self.items.len() }

    pub fn deleted(&self) -> usize { self.items.iter().filter(|item| item.deleted).count() }

    pub fn failed(&self) -> usize { self.attempted() - self.deleted() }
}

/// Delete every token in `tokens`, one at a time.
///
/// A failure is logged and the run continues with the next token.
pub async fn delete_all_tokens(identity: &dyn IdentityService, tokens: Vec<TokenPair>) -> ReapReport {
    let mut report = ReapReport::default();
    for pair in tokens {
        let deleted = match identity
            .delete_token(&pair.endpoint, &pair.token_id)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                info!(target: "reaper", endpoint = %pair.endpoint, error = %e, "Could not delete token");
                false
            },
        };
        report.items.push(ReapItem {
            endpoint: pair.endpoint,
            deleted,
        });
    }
    debug!(
        target: "reaper",
        attempted = report.attempted(),
        failed = report.failed(),
        "Token reaping finished"
    );
    report
}

/// Start reaping `tokens` on a background task.
///
/// The caller is not expected to wait on the handle.
pub fn spawn_reaper(identity: Arc<dyn IdentityService>, tokens: Vec<TokenPair>) -> JoinHandle<ReapReport> {
    tokio::spawn(async move { delete_all_tokens(identity.as_ref(), tokens).await })
}
