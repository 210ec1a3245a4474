use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::StoreError;
use crate::record::SessionRecord;
use crate::roles::Role;
use crate::token::hash_session_token;

/// Read side of the session/identity provider.
///
/// `get` must be a single lookup joining the session onto its user; the gate
/// bounds it with a timeout and never retries.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    async fn get(&self, token: &str) -> Result<Option<SessionRecord>, StoreError>;
}

#[async_trait]
impl<T: SessionStore + ?Sized> SessionStore for Arc<T> {
    async fn get(&self, token: &str) -> Result<Option<SessionRecord>, StoreError> {
        (**self).get(token).await
    }
}

/// Process-local store keyed by token hash.
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    inner: Arc<RwLock<HashMap<Vec<u8>, SessionRecord>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, token: &str, record: SessionRecord) {
        self.insert_hashed(hash_session_token(token), record);
    }

    pub fn insert_hashed(&self, token_hash: Vec<u8>, record: SessionRecord) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        guard.insert(token_hash, record);
    }

    /// Marks the session revoked. Returns false when the token is unknown or already revoked.
    pub fn revoke(&self, token: &str, at: DateTime<Utc>) -> bool {
        self.revoke_hashed(&hash_session_token(token), at)
    }

    pub fn revoke_hashed(&self, token_hash: &[u8], at: DateTime<Utc>) -> bool {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        match guard.get_mut(token_hash) {
            Some(record) if record.revoked_at.is_none() => {
                record.revoked_at = Some(at);
                true
            }
            _ => false,
        }
    }

    /// Applies a role change to every session of the user. Returns the number of sessions touched.
    pub fn update_user_role(&self, user_id: Uuid, role: Role) -> usize {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let mut touched = 0;
        for record in guard.values_mut().filter(|r| r.user.id == user_id) {
            record.user.role = role;
            touched += 1;
        }
        touched
    }

    pub fn set_user_active(&self, user_id: Uuid, active: bool) -> usize {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let mut touched = 0;
        for record in guard.values_mut().filter(|r| r.user.id == user_id) {
            record.user.is_active = active;
            touched += 1;
        }
        touched
    }

    /// Drops expired and revoked sessions.
    pub fn purge(&self, now: DateTime<Utc>) -> usize {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let before = guard.len();
        guard.retain(|_, record| !record.is_expired_at(now) && !record.is_revoked());
        before - guard.len()
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, token: &str) -> Result<Option<SessionRecord>, StoreError> {
        let hash = hash_session_token(token);
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(guard.get(&hash).cloned())
    }
}
