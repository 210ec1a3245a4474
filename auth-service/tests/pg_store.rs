mod support;

use anyhow::Result;
use chrono::{Duration, Utc};
use common_session::{generate_session_token, hash_session_token, Role, SessionStore};
use revivatech_auth::password::{hash_password, verify_password};
use revivatech_auth::store::{AccountStore, NewSession, PgAccountStore};
use support::TestDatabase;
use uuid::Uuid;

#[tokio::test(flavor = "multi_thread")]
#[cfg_attr(not(feature = "integration"), ignore = "enable with --features integration (requires Postgres)")]
async fn session_lifecycle_against_postgres() -> Result<()> {
    let Some(db) = TestDatabase::setup().await? else {
        return Ok(());
    };
    let store = PgAccountStore::new(db.pool_clone());

    let email = format!("pg-{}@revivatech.test", Uuid::new_v4());
    let hash = hash_password("Pg-Session-Test!")?;
    let user_id = db.insert_user(&email, &hash, "CUSTOMER").await?;

    let creds = store
        .find_credentials(&email.to_uppercase())
        .await?
        .expect("credentials by case-insensitive email");
    assert_eq!(creds.user.id, user_id);
    assert!(verify_password(&creds.password_hash, "Pg-Session-Test!"));

    let token = generate_session_token();
    let now = Utc::now();
    let record = store
        .create_session(NewSession {
            user_id,
            token_hash: hash_session_token(&token),
            created_at: now,
            expires_at: now + Duration::hours(1),
        })
        .await?;
    assert_eq!(record.user.role, Role::Customer);

    let fetched = store.get(&token).await?.expect("session by token");
    assert_eq!(fetched.session_id, record.session_id);
    assert!(fetched.revoked_at.is_none());

    let promoted = store.set_role(user_id, Role::Technician).await?.expect("user");
    assert_eq!(promoted.role, Role::Technician);
    let fetched = store.get(&token).await?.expect("session by token");
    assert_eq!(fetched.user.role, Role::Technician);

    assert!(store.revoke_session(&token).await?);
    assert!(!store.revoke_session(&token).await?);
    assert!(store.get(&token).await?.expect("revoked row").is_revoked());

    assert!(store.get("unknown-token").await?.is_none());
    assert!(store.set_role(Uuid::new_v4(), Role::Admin).await?.is_none());

    db.teardown(&[user_id]).await?;
    Ok(())
}
