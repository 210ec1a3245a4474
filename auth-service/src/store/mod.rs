use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common_session::{Role, SessionRecord, SessionStore, SessionUser, StoreError};
use uuid::Uuid;

pub mod memory;
pub mod postgres;

pub use memory::MemoryAccountStore;
pub use postgres::PgAccountStore;

/// User row plus the stored Argon2 hash.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub user: SessionUser,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewSession {
    pub user_id: Uuid,
    pub token_hash: Vec<u8>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Write side of the identity provider used by sign-in, sign-out and role administration.
#[async_trait]
pub trait AccountStore: SessionStore {
    async fn find_credentials(&self, email: &str) -> Result<Option<Credentials>, StoreError>;

    async fn create_session(&self, session: NewSession) -> Result<SessionRecord, StoreError>;

    /// Returns false when no live session matched the token.
    async fn revoke_session(&self, token: &str) -> Result<bool, StoreError>;

    async fn find_user(&self, user_id: Uuid) -> Result<Option<SessionUser>, StoreError>;

    async fn set_role(&self, user_id: Uuid, role: Role) -> Result<Option<SessionUser>, StoreError>;

    /// Deletes sessions that expired or were revoked before `before`.
    async fn purge_sessions(&self, before: DateTime<Utc>) -> Result<u64, StoreError>;
}
