//! Session-scoped cache of access decisions.
//!
//! Every refresh takes a sequence number before it awaits the store. When it
//! completes, its decision is stored only if no later-issued refresh has
//! already landed, so an out-of-order response never overwrites a fresher one.
//! Invalidation also takes a sequence number and records it as a floor for
//! the user: refreshes issued before it may still finish, but never repopulate
//! the entry. Failures leave the cached entry as it was.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::domain::access::{AccessDecision, AccessError};
use crate::domain::foundation::{Timestamp, UserId};

use super::AccessStatusResolver;

/// A cached decision with the instant and sequence it was resolved at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedDecision {
    pub decision: AccessDecision,
    pub resolved_at: Timestamp,
    pub sequence: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<UserId, CachedDecision>,
    /// Sequence of the last invalidation, kept until a later refresh lands.
    floors: HashMap<UserId, u64>,
}

/// Per-user decision cache in front of an [`AccessStatusResolver`].
pub struct AccessStatusCache {
    resolver: Arc<AccessStatusResolver>,
    state: RwLock<CacheState>,
    next_sequence: AtomicU64,
}

impl AccessStatusCache {
    pub fn new(resolver: Arc<AccessStatusResolver>) -> Self {
        Self {
            resolver,
            state: RwLock::new(CacheState::default()),
            next_sequence: AtomicU64::new(0),
        }
    }

    /// Last stored decision for `user_id`, if any.
    pub async fn current(&self, user_id: &UserId) -> Option<CachedDecision> {
        self.state.read().await.entries.get(user_id).copied()
    }

    /// Resolve again and store the result unless a later refresh or an
    /// invalidation already has.
    ///
    /// Returns the decision now cached for the user, or the freshly resolved
    /// one when the user was invalidated meanwhile. On error the cache is
    /// untouched and the error is returned.
    pub async fn refresh(
        &self,
        user_id: &UserId,
        now: Timestamp,
    ) -> Result<AccessDecision, AccessError> {
        let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst) + 1;

        let decision = match self.resolver.refresh(Some(user_id), now).await {
            Ok(decision) => decision,
            Err(err) => {
                warn!(user_id = %user_id, sequence, error = %err, "Refresh failed, keeping cached decision");
                return Err(err);
            }
        };

        let mut state = self.state.write().await;
        if let Some(&floor) = state.floors.get(user_id) {
            if sequence <= floor {
                debug!(
                    user_id = %user_id,
                    sequence,
                    floor,
                    "Discarding refresh issued before invalidation"
                );
                return Ok(decision);
            }
        }
        if let Some(existing) = state.entries.get(user_id) {
            if existing.sequence > sequence {
                debug!(
                    user_id = %user_id,
                    sequence,
                    cached_sequence = existing.sequence,
                    "Discarding superseded refresh"
                );
                return Ok(existing.decision);
            }
        }

        state.floors.remove(user_id);
        state.entries.insert(
            user_id.clone(),
            CachedDecision {
                decision,
                resolved_at: now,
                sequence,
            },
        );
        Ok(decision)
    }

    /// Cached decision, resolving on a miss.
    pub async fn get_or_refresh(
        &self,
        user_id: &UserId,
        now: Timestamp,
    ) -> Result<AccessDecision, AccessError> {
        if let Some(cached) = self.current(user_id).await {
            return Ok(cached.decision);
        }
        self.refresh(user_id, now).await
    }

    /// Drop the cached decision, e.g. on sign-out. Refreshes already in
    /// flight for the user will not store their result.
    pub async fn invalidate(&self, user_id: &UserId) {
        let floor = self.next_sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let mut state = self.state.write().await;
        state.entries.remove(user_id);
        state.floors.insert(user_id.clone(), floor);
    }
}
