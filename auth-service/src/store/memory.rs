use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common_session::{
    hash_session_token, InMemorySessionStore, Role, SessionRecord, SessionStore, SessionUser,
    StoreError,
};
use uuid::Uuid;

use super::{AccountStore, Credentials, NewSession};

/// Account store kept in process memory. Used for development and tests.
#[derive(Clone, Default)]
pub struct MemoryAccountStore {
    users: Arc<RwLock<HashMap<Uuid, Credentials>>>,
    sessions: InMemorySessionStore,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(
        &self,
        email: &str,
        password_hash: String,
        role: Role,
        email_verified: bool,
    ) -> Result<SessionUser, StoreError> {
        let mut users = self.users.write().unwrap_or_else(PoisonError::into_inner);
        let normalized = email.trim().to_ascii_lowercase();
        if users.values().any(|c| c.user.email == normalized) {
            return Err(StoreError::Conflict(format!("email '{normalized}' already registered")));
        }
        let user = SessionUser {
            id: Uuid::new_v4(),
            email: normalized,
            role,
            email_verified,
            is_active: true,
        };
        users.insert(
            user.id,
            Credentials {
                user: user.clone(),
                password_hash,
            },
        );
        Ok(user)
    }

    pub fn deactivate_user(&self, user_id: Uuid) -> bool {
        let mut users = self.users.write().unwrap_or_else(PoisonError::into_inner);
        match users.get_mut(&user_id) {
            Some(creds) => {
                creds.user.is_active = false;
                self.sessions.set_user_active(user_id, false);
                true
            }
            None => false,
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

#[async_trait]
impl SessionStore for MemoryAccountStore {
    async fn get(&self, token: &str) -> Result<Option<SessionRecord>, StoreError> {
        self.sessions.get(token).await
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn find_credentials(&self, email: &str) -> Result<Option<Credentials>, StoreError> {
        let normalized = email.trim().to_ascii_lowercase();
        let users = self.users.read().unwrap_or_else(PoisonError::into_inner);
        Ok(users.values().find(|c| c.user.email == normalized).cloned())
    }

    async fn create_session(&self, session: NewSession) -> Result<SessionRecord, StoreError> {
        // Held until the session is inserted so a concurrent role or status
        // change cannot miss it.
        let users = self.users.read().unwrap_or_else(PoisonError::into_inner);
        let user = users
            .get(&session.user_id)
            .map(|c| c.user.clone())
            .ok_or_else(|| StoreError::Conflict(format!("unknown user {}", session.user_id)))?;
        let record = SessionRecord {
            session_id: Uuid::new_v4(),
            user,
            created_at: session.created_at,
            expires_at: session.expires_at,
            revoked_at: None,
        };
        self.sessions.insert_hashed(session.token_hash, record.clone());
        Ok(record)
    }

    async fn revoke_session(&self, token: &str) -> Result<bool, StoreError> {
        Ok(self.sessions.revoke_hashed(&hash_session_token(token), Utc::now()))
    }

    async fn find_user(&self, user_id: Uuid) -> Result<Option<SessionUser>, StoreError> {
        let users = self.users.read().unwrap_or_else(PoisonError::into_inner);
        Ok(users.get(&user_id).map(|c| c.user.clone()))
    }

    async fn set_role(&self, user_id: Uuid, role: Role) -> Result<Option<SessionUser>, StoreError> {
        let mut users = self.users.write().unwrap_or_else(PoisonError::into_inner);
        let Some(creds) = users.get_mut(&user_id) else {
            return Ok(None);
        };
        creds.user.role = role;
        self.sessions.update_user_role(user_id, role);
        Ok(Some(creds.user.clone()))
    }

    async fn purge_sessions(&self, before: DateTime<Utc>) -> Result<u64, StoreError> {
        Ok(self.sessions.purge(before) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_session(user_id: Uuid, token: &str) -> NewSession {
        let now = Utc::now();
        NewSession {
            user_id,
            token_hash: hash_session_token(token),
            created_at: now,
            expires_at: now + Duration::hours(1),
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let store = MemoryAccountStore::new();
        store.add_user("a@revivatech.test", "h".into(), Role::Customer, false).unwrap();
        let err = store
            .add_user(" A@RevivaTech.test ", "h".into(), Role::Customer, false)
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn sessions_created_during_demotion_carry_the_new_role() {
        let store = MemoryAccountStore::new();
        let user = store
            .add_user("tech@revivatech.test", "h".into(), Role::Admin, true)
            .unwrap();
        let user_id = user.id;

        let mut handles = Vec::new();
        for i in 0..200 {
            let task_store = store.clone();
            handles.push(tokio::spawn(async move {
                task_store.create_session(new_session(user_id, &format!("t{i}"))).await.unwrap();
            }));
            if i == 100 {
                let store = store.clone();
                handles.push(tokio::spawn(async move {
                    store.set_role(user_id, Role::Customer).await.unwrap();
                }));
            }
        }
        for handle in handles {
            handle.await.unwrap();
        }

        for i in 0..200 {
            let record = store.get(&format!("t{i}")).await.unwrap().unwrap();
            assert_eq!(record.user.role, Role::Customer, "session t{i}");
        }
    }

    #[tokio::test]
    async fn deactivation_reaches_existing_sessions() {
        let store = MemoryAccountStore::new();
        let user = store
            .add_user("cust@revivatech.test", "h".into(), Role::Customer, true)
            .unwrap();
        store.create_session(new_session(user.id, "tok")).await.unwrap();
        assert!(store.deactivate_user(user.id));
        assert!(!store.get("tok").await.unwrap().unwrap().user.is_active);
    }
}
