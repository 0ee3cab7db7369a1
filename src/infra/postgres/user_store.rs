//! PostgreSQL user store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;

use crate::domain::User;
use crate::infra::{Result, StoreError, UserStore};

type UserRow = (
    i64,
    String,
    String,
    Option<String>,
    DateTime<Utc>,
    DateTime<Utc>,
);

fn user_from_row(row: UserRow) -> User {
    let (id, username, email, authorizations, created_at, updated_at) = row;
    User {
        id,
        username,
        email,
        authorizations,
        created_at,
        updated_at,
    }
}

/// PostgreSQL-backed user store.
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT id, username, email, authorizations, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(user_from_row))
    }

    async fn upsert<'a>(
        &self,
        username: &str,
        email: &str,
        authorizations: Option<&'a str>,
    ) -> Result<i64> {
        let row: (i64,) = sqlx::query_as(
            r#"
            INSERT INTO users (username, email, authorizations)
            VALUES ($1, $2, $3)
            ON CONFLICT (email) DO UPDATE
            SET username = EXCLUDED.username,
                authorizations = EXCLUDED.authorizations,
                updated_at = NOW()
            RETURNING id
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(authorizations)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    async fn update_authorizations(&self, email: &str, authorizations: &str) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET authorizations = $2,
                updated_at = NOW()
            WHERE email = $1
            "#,
        )
        .bind(email)
        .bind(authorizations)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::UserNotFound(email.to_string()));
        }

        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<User>> {
        let rows: Vec<UserRow> = sqlx::query_as(
            r#"
            SELECT id, username, email, authorizations, created_at, updated_at
            FROM users
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(user_from_row).collect())
    }
}
