//! PostgreSQL one-time token store
//!
//! Tokens live in the `auth_links` table and are never deleted; redemption
//! only flips the used flag.
//!
//! # Atomicity
//!
//! `mark_used` is a single conditional UPDATE:
//! ```sql
//! UPDATE auth_links SET used = TRUE, used_at = NOW()
//! WHERE token = $1 AND used = FALSE
//! ```
//! The row count tells the caller whether it won the transition, so two
//! concurrent redemptions of the same token can never both succeed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;

use crate::domain::AuthLink;
use crate::infra::{Result, TokenStore};

/// PostgreSQL-backed token store.
pub struct PgTokenStore {
    pool: PgPool,
}

impl PgTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenStore for PgTokenStore {
    async fn put(&self, token: &str, email: &str, expires_at: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO auth_links (token, email, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(token)
        .bind(email)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, token: &str) -> Result<Option<AuthLink>> {
        let row: Option<(
            String,
            String,
            DateTime<Utc>,
            DateTime<Utc>,
            bool,
            Option<DateTime<Utc>>,
        )> = sqlx::query_as(
            r#"
            SELECT token, email, created_at, expires_at, used, used_at
            FROM auth_links
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(
            |(token, email, created_at, expires_at, used, used_at)| AuthLink {
                token,
                email,
                created_at,
                expires_at,
                used,
                used_at,
            },
        ))
    }

    async fn mark_used(&self, token: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE auth_links
            SET used = TRUE,
                used_at = NOW()
            WHERE token = $1 AND used = FALSE
            "#,
        )
        .bind(token)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
