//! Periodic sweep of expired refresh tokens and blacklist entries
//!
//! Expiry is already enforced at read time; this task only keeps the store
//! from growing without bound.

use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tw_shared::CleanupConfig;

use crate::repositories::TokenStore;

/// Configuration for token cleanup service
#[derive(Debug, Clone)]
pub struct TokenCleanupConfig {
    /// How often to run cleanup (in seconds)
    pub interval_seconds: u64,
    /// Whether to enable automatic cleanup
    pub enabled: bool,
}

impl Default for TokenCleanupConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 300,
            enabled: true,
        }
    }
}

impl From<&CleanupConfig> for TokenCleanupConfig {
    fn from(config: &CleanupConfig) -> Self {
        Self {
            interval_seconds: config.interval_seconds,
            enabled: config.enabled,
        }
    }
}

/// Service for cleaning up expired tokens and blacklist entries
pub struct TokenCleanupService {
    store: Arc<dyn TokenStore>,
    config: TokenCleanupConfig,
}

impl TokenCleanupService {
    /// Create a new token cleanup service
    pub fn new(store: Arc<dyn TokenStore>, config: TokenCleanupConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &TokenCleanupConfig {
        &self.config
    }

    /// Run a single cleanup cycle
    ///
    /// Failures of either sweep are collected in [`CleanupResult::errors`]
    /// rather than aborting the cycle.
    pub async fn run_cleanup(&self) -> CleanupResult {
        let now = Utc::now();
        let mut result = CleanupResult::default();

        match self.store.delete_expired_tokens(now).await {
            Ok(count) => result.expired_tokens_deleted = count,
            Err(e) => {
                error!("Failed to cleanup expired tokens: {}", e);
                result.errors.push(format!("Token cleanup error: {}", e));
            }
        }

        match self.store.cleanup_blacklist(now).await {
            Ok(count) => result.blacklist_entries_deleted = count,
            Err(e) => {
                error!("Failed to cleanup blacklist: {}", e);
                result.errors.push(format!("Blacklist cleanup error: {}", e));
            }
        }

        info!(
            "Token cleanup completed - Expired: {}, Blacklist: {}",
            result.expired_tokens_deleted, result.blacklist_entries_deleted
        );

        result
    }

    /// Start the cleanup loop as a background task
    ///
    /// The loop exits once `shutdown` is cancelled. Returns `None` when
    /// cleanup is disabled.
    pub fn start(self: Arc<Self>, shutdown: CancellationToken) -> Option<JoinHandle<()>> {
        if !self.config.enabled {
            warn!("Token cleanup service is disabled");
            return None;
        }

        let period = std::time::Duration::from_secs(self.config.interval_seconds.max(1));

        Some(tokio::spawn(async move {
            info!(
                "Token cleanup service started - will run every {} seconds",
                self.config.interval_seconds
            );

            let mut timer = tokio::time::interval(period);
            // The first tick completes immediately.
            timer.tick().await;

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        info!("Token cleanup service stopped");
                        break;
                    }
                    _ = timer.tick() => {
                        let result = self.run_cleanup().await;
                        if !result.is_success() {
                            warn!("Cleanup completed with errors: {:?}", result.errors);
                        }
                    }
                }
            }
        }))
    }
}

/// Result of a cleanup operation
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanupResult {
    /// Number of expired refresh tokens deleted
    pub expired_tokens_deleted: usize,
    /// Number of expired blacklist entries deleted
    pub blacklist_entries_deleted: usize,
    /// Any errors encountered during cleanup
    pub errors: Vec<String>,
}

impl CleanupResult {
    /// Check if the cleanup was successful (no errors)
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get total number of items cleaned up
    pub fn total_cleaned(&self) -> usize {
        self.expired_tokens_deleted + self.blacklist_entries_deleted
    }
}
