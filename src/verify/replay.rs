//! Replay guard for consumed rotating codes.
//!
//! Tracks `(code, venue, user)` triples that have already been accepted and
//! rejects re-use within the code's validity window. The check-and-mark is a
//! single atomic operation; a separate "check, then mark" would leave a
//! window where two concurrent requests both pass.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tokio::sync::RwLock;

use crate::domain::{UserId, VenueId};
use crate::infra::Result;
use crate::verify::policy::REPLAY_RETENTION_SECS;

/// Key for a consumed-code marker. Isolated by venue and user: the same
/// code value at a different venue, or from a different user, is fresh.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReplayKey {
    pub code: String,
    pub venue_id: VenueId,
    pub user_id: UserId,
}

impl ReplayKey {
    pub fn new(code: impl Into<String>, venue_id: VenueId, user_id: UserId) -> Self {
        Self {
            code: code.into(),
            venue_id,
            user_id,
        }
    }
}

/// Consumed-code index with test-and-set semantics.
///
/// In-process maps suffice for a single-instance deployment; a distributed
/// store (Redis SET NX with TTL, or similar) can be swapped in without
/// touching the orchestrator.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ReplayGuard: Send + Sync {
    /// Atomically check whether `key` was already consumed and mark it if
    /// not. Returns `true` when the key was fresh (and is now marked),
    /// `false` when it was already used.
    async fn check_and_mark(&self, key: ReplayKey) -> Result<bool>;

    /// Whether `key` is currently marked as used, without marking it.
    async fn is_used(&self, key: &ReplayKey) -> Result<bool>;
}

/// In-memory replay guard with TTL eviction.
pub struct InMemoryReplayGuard {
    retention: Duration,
    entries: RwLock<HashMap<ReplayKey, Instant>>,
}

impl InMemoryReplayGuard {
    pub fn new() -> Self {
        Self::with_retention(Duration::from_secs(REPLAY_RETENTION_SECS))
    }

    pub fn with_retention(retention: Duration) -> Self {
        Self {
            retention,
            entries: RwLock::new(HashMap::new()),
        }
    }

    fn is_live(&self, marked_at: &Instant) -> bool {
        marked_at.elapsed() < self.retention
    }

    /// Drop expired markers. Called opportunistically on writes; safe to
    /// call from a periodic sweep as well.
    pub async fn cleanup_expired(&self) {
        let mut entries = self.entries.write().await;
        let retention = self.retention;
        entries.retain(|_, marked_at| marked_at.elapsed() < retention);
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

impl Default for InMemoryReplayGuard {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReplayGuard for InMemoryReplayGuard {
    async fn check_and_mark(&self, key: ReplayKey) -> Result<bool> {
        // Single write lock spans the check and the mark, which is what
        // makes this a test-and-set rather than a racy check-then-mark.
        let mut entries = self.entries.write().await;

        if let Some(marked_at) = entries.get(&key) {
            if self.is_live(marked_at) {
                return Ok(false);
            }
            // Expired marker: the code itself can no longer verify, but the
            // slot is reusable.
        }

        entries.insert(key, Instant::now());

        // Keep the map bounded without a background task.
        if entries.len() > 4096 {
            let retention = self.retention;
            entries.retain(|_, marked_at| marked_at.elapsed() < retention);
        }

        Ok(true)
    }

    async fn is_used(&self, key: &ReplayKey) -> Result<bool> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).map(|t| self.is_live(t)).unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: &str) -> ReplayKey {
        ReplayKey::new(code, VenueId::new(), UserId::new())
    }

    #[tokio::test]
    async fn test_first_use_is_fresh() {
        let guard = InMemoryReplayGuard::new();
        assert!(guard.check_and_mark(key("123456")).await.unwrap());
    }

    #[tokio::test]
    async fn test_second_use_is_rejected() {
        let guard = InMemoryReplayGuard::new();
        let k = key("123456");
        assert!(guard.check_and_mark(k.clone()).await.unwrap());
        assert!(!guard.check_and_mark(k.clone()).await.unwrap());
        assert!(guard.is_used(&k).await.unwrap());
    }

    #[tokio::test]
    async fn test_keys_isolated_by_venue_and_user() {
        let guard = InMemoryReplayGuard::new();
        let venue = VenueId::new();
        let user = UserId::new();

        let k = ReplayKey::new("123456", venue, user);
        assert!(guard.check_and_mark(k).await.unwrap());

        // Same code, different venue: fresh.
        let other_venue = ReplayKey::new("123456", VenueId::new(), user);
        assert!(guard.check_and_mark(other_venue).await.unwrap());

        // Same code and venue, different user: fresh.
        let other_user = ReplayKey::new("123456", venue, UserId::new());
        assert!(guard.check_and_mark(other_user).await.unwrap());
    }

    #[tokio::test]
    async fn test_marker_expires_after_retention() {
        let guard = InMemoryReplayGuard::with_retention(Duration::from_millis(20));
        let k = key("123456");
        assert!(guard.check_and_mark(k.clone()).await.unwrap());
        assert!(!guard.check_and_mark(k.clone()).await.unwrap());

        tokio::time::sleep(Duration::from_millis(40)).await;

        assert!(!guard.is_used(&k).await.unwrap());
        assert!(guard.check_and_mark(k).await.unwrap());
    }

    #[tokio::test]
    async fn test_cleanup_removes_expired() {
        let guard = InMemoryReplayGuard::with_retention(Duration::from_millis(10));
        guard.check_and_mark(key("111111")).await.unwrap();
        guard.check_and_mark(key("222222")).await.unwrap();
        assert_eq!(guard.len().await, 2);

        tokio::time::sleep(Duration::from_millis(30)).await;
        guard.cleanup_expired().await;
        assert_eq!(guard.len().await, 0);
    }

    #[tokio::test]
    async fn test_concurrent_check_and_mark_admits_exactly_one() {
        use std::sync::Arc;

        let guard = Arc::new(InMemoryReplayGuard::new());
        let k = key("123456");

        let mut handles = Vec::new();
        for _ in 0..16 {
            let guard = guard.clone();
            let k = k.clone();
            handles.push(tokio::spawn(
                async move { guard.check_and_mark(k).await.unwrap() },
            ));
        }

        let mut fresh = 0;
        for handle in handles {
            if handle.await.unwrap() {
                fresh += 1;
            }
        }
        assert_eq!(fresh, 1);
    }
}
