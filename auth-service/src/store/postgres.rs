use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common_session::{
    hash_session_token, Role, SessionRecord, SessionStore, SessionUser, StoreError,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{AccountStore, Credentials, NewSession};

/// Postgres-backed sessions and users. Tokens are stored as SHA-256 digests.
#[derive(Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

#[derive(FromRow)]
struct SessionRow {
    session_id: Uuid,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    revoked_at: Option<DateTime<Utc>>,
    user_id: Uuid,
    email: String,
    role: String,
    email_verified: bool,
    is_active: bool,
}

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    role: String,
    email_verified: bool,
    is_active: bool,
}

#[derive(FromRow)]
struct CredentialsRow {
    id: Uuid,
    email: String,
    role: String,
    email_verified: bool,
    is_active: bool,
    password_hash: String,
}

fn parse_role(raw: &str, user_id: Uuid) -> Result<Role, StoreError> {
    raw.parse::<Role>()
        .map_err(|err| StoreError::Corrupt(format!("user {user_id}: {err}")))
}

fn unavailable(err: sqlx::Error) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

impl TryFrom<UserRow> for SessionUser {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(SessionUser {
            id: row.id,
            role: parse_role(&row.role, row.id)?,
            email: row.email,
            email_verified: row.email_verified,
            is_active: row.is_active,
        })
    }
}

impl TryFrom<SessionRow> for SessionRecord {
    type Error = StoreError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        Ok(SessionRecord {
            session_id: row.session_id,
            user: SessionUser {
                id: row.user_id,
                role: parse_role(&row.role, row.user_id)?,
                email: row.email,
                email_verified: row.email_verified,
                is_active: row.is_active,
            },
            created_at: row.created_at,
            expires_at: row.expires_at,
            revoked_at: row.revoked_at,
        })
    }
}

const USER_COLUMNS: &str = "id, email, role, email_verified, is_active";

impl PgAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl SessionStore for PgAccountStore {
    async fn get(&self, token: &str) -> Result<Option<SessionRecord>, StoreError> {
        let hash = hash_session_token(token);
        let row = sqlx::query_as::<_, SessionRow>(
            r#"SELECT s.id AS session_id, s.created_at, s.expires_at, s.revoked_at,
                      u.id AS user_id, u.email, u.role, u.email_verified, u.is_active
               FROM auth_sessions s
               JOIN users u ON u.id = s.user_id
               WHERE s.token_hash = $1"#,
        )
        .bind(hash.as_slice())
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        row.map(SessionRecord::try_from).transpose()
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn find_credentials(&self, email: &str) -> Result<Option<Credentials>, StoreError> {
        let row = sqlx::query_as::<_, CredentialsRow>(
            "SELECT id, email, role, email_verified, is_active, password_hash FROM users WHERE lower(email) = lower($1)",
        )
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        match row {
            Some(row) => Ok(Some(Credentials {
                user: SessionUser {
                    id: row.id,
                    role: parse_role(&row.role, row.id)?,
                    email: row.email,
                    email_verified: row.email_verified,
                    is_active: row.is_active,
                },
                password_hash: row.password_hash,
            })),
            None => Ok(None),
        }
    }

    async fn create_session(&self, session: NewSession) -> Result<SessionRecord, StoreError> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"WITH inserted AS (
                   INSERT INTO auth_sessions (id, user_id, token_hash, created_at, expires_at)
                   VALUES ($1, $2, $3, $4, $5)
                   RETURNING id, user_id, created_at, expires_at, revoked_at
               )
               SELECT i.id AS session_id, i.created_at, i.expires_at, i.revoked_at,
                      u.id AS user_id, u.email, u.role, u.email_verified, u.is_active
               FROM inserted i
               JOIN users u ON u.id = i.user_id"#,
        )
        .bind(Uuid::new_v4())
        .bind(session.user_id)
        .bind(session.token_hash.as_slice())
        .bind(session.created_at)
        .bind(session.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(unavailable)?;

        SessionRecord::try_from(row)
    }

    async fn revoke_session(&self, token: &str) -> Result<bool, StoreError> {
        let hash = hash_session_token(token);
        let result = sqlx::query(
            "UPDATE auth_sessions SET revoked_at = now() WHERE token_hash = $1 AND revoked_at IS NULL",
        )
        .bind(hash.as_slice())
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_user(&self, user_id: Uuid) -> Result<Option<SessionUser>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;
        row.map(SessionUser::try_from).transpose()
    }

    async fn set_role(&self, user_id: Uuid, role: Role) -> Result<Option<SessionUser>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET role = $2, updated_at = now() WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(user_id)
        .bind(role.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;
        row.map(SessionUser::try_from).transpose()
    }

    async fn purge_sessions(&self, before: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "DELETE FROM auth_sessions WHERE expires_at <= $1 OR (revoked_at IS NOT NULL AND revoked_at <= $1)",
        )
        .bind(before)
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;
        Ok(result.rows_affected())
    }
}
