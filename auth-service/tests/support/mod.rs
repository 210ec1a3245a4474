use std::env;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};

const SCHEMA: &str = include_str!("../../migrations/0001_users_and_sessions.sql");

pub struct TestDatabase {
    pool: PgPool,
}

impl TestDatabase {
    /// Connects to `AUTH_TEST_DATABASE_URL` and applies the schema, or returns
    /// `None` so the caller can skip.
    pub async fn setup() -> Result<Option<Self>> {
        let Ok(url) = env::var("AUTH_TEST_DATABASE_URL") else {
            eprintln!("Skipping revivatech-auth Postgres tests: set AUTH_TEST_DATABASE_URL to run them.");
            return Ok(None);
        };

        let pool = PgPoolOptions::new()
            .max_connections(4)
            .connect(&url)
            .await
            .context("Failed to connect to AUTH_TEST_DATABASE_URL")?;
        pool.execute(SCHEMA).await.context("Failed to apply schema")?;
        Ok(Some(Self { pool }))
    }

    pub fn pool_clone(&self) -> PgPool {
        self.pool.clone()
    }

    pub async fn insert_user(&self, email: &str, password_hash: &str, role: &str) -> Result<uuid::Uuid> {
        let id = uuid::Uuid::new_v4();
        sqlx::query(
            "INSERT INTO users (id, email, password_hash, role, email_verified) VALUES ($1, $2, $3, $4, TRUE)",
        )
        .bind(id)
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .execute(&self.pool)
        .await
        .context("Failed to insert test user")?;
        Ok(id)
    }

    pub async fn teardown(&self, user_ids: &[uuid::Uuid]) -> Result<()> {
        for id in user_ids {
            sqlx::query("DELETE FROM users WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }
}
