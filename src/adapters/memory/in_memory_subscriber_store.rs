//! In-Memory Subscriber Store Adapter
//!
//! Implements both subscriber ports over a map for tests and local
//! experiments; the server binary always runs against Postgres. Counts
//! reader lookups and can be told to fail so callers can exercise their
//! error paths.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::access::SubscriberRecord;
use crate::domain::foundation::{normalize_email, DomainError, ErrorCode, UserId};
use crate::ports::{LookupError, SubscriberReader, SubscriberRepository};

/// In-memory subscriber storage.
#[derive(Debug, Clone, Default)]
pub struct InMemorySubscriberStore {
    records: Arc<RwLock<HashMap<UserId, SubscriberRecord>>>,
    failure: Arc<RwLock<Option<LookupError>>>,
    lookups: Arc<AtomicUsize>,
}

impl InMemorySubscriberStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record
    pub async fn seed(&self, record: SubscriberRecord) {
        self.records
            .write()
            .await
            .insert(record.user_id.clone(), record);
    }

    /// Current record for a user
    pub async fn get(&self, user_id: &UserId) -> Option<SubscriberRecord> {
        self.records.read().await.get(user_id).cloned()
    }

    /// Make every subsequent call fail with `error`
    pub async fn fail_with(&self, error: LookupError) {
        *self.failure.write().await = Some(error);
    }

    pub async fn clear_failure(&self) {
        *self.failure.write().await = None;
    }

    /// Number of `get_subscriber` calls so far
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    async fn write_failure(&self) -> Option<DomainError> {
        self.failure
            .read()
            .await
            .as_ref()
            .map(|e| DomainError::database(e.to_string()))
    }
}

#[async_trait]
impl SubscriberReader for InMemorySubscriberStore {
    async fn get_subscriber(
        &self,
        user_id: &UserId,
    ) -> Result<Option<SubscriberRecord>, LookupError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.failure.read().await.clone() {
            return Err(err);
        }
        Ok(self.records.read().await.get(user_id).cloned())
    }
}

#[async_trait]
impl SubscriberRepository for InMemorySubscriberStore {
    async fn find_by_user_id(
        &self,
        user_id: &UserId,
    ) -> Result<Option<SubscriberRecord>, DomainError> {
        if let Some(err) = self.write_failure().await {
            return Err(err);
        }
        Ok(self.records.read().await.get(user_id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<SubscriberRecord>, DomainError> {
        if let Some(err) = self.write_failure().await {
            return Err(err);
        }
        let wanted = normalize_email(email);
        let records = self.records.read().await;
        Ok(records
            .values()
            .filter(|r| r.email.as_deref().is_some_and(|e| normalize_email(e) == wanted))
            .min_by(|a, b| a.user_id.cmp(&b.user_id))
            .cloned())
    }

    async fn insert_if_absent(&self, record: &SubscriberRecord) -> Result<bool, DomainError> {
        if let Some(err) = self.write_failure().await {
            return Err(err);
        }
        let mut records = self.records.write().await;
        if records.contains_key(&record.user_id) {
            return Ok(false);
        }
        records.insert(record.user_id.clone(), record.clone());
        Ok(true)
    }

    async fn update(&self, record: &SubscriberRecord) -> Result<(), DomainError> {
        if let Some(err) = self.write_failure().await {
            return Err(err);
        }
        let mut records = self.records.write().await;
        match records.get_mut(&record.user_id) {
            Some(existing) => {
                *existing = record.clone();
                Ok(())
            }
            None => Err(DomainError::new(
                ErrorCode::SubscriberNotFound,
                format!("No subscriber for user {}", record.user_id),
            )),
        }
    }
}
