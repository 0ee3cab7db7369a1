//! Trait definitions for the persistence layer.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
#[cfg(test)]
use mockall::automock;

use crate::domain::{AuthLink, Game, GamePage, GameSort, NewGame, User};

use super::Result;

/// Durable record of one-time login tokens.
///
/// Invariant: a token's used flag is set at most once, and `mark_used` is the
/// only mutation. Rows are kept after use for audit.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Persist a freshly issued token.
    async fn put(&self, token: &str, email: &str, expires_at: DateTime<Utc>) -> Result<()>;

    /// Look up a token by its exact string.
    async fn get(&self, token: &str) -> Result<Option<AuthLink>>;

    /// Conditionally mark a token used.
    ///
    /// Returns `true` only if this call performed the unused -> used
    /// transition. Must be atomic: two concurrent callers can never both
    /// observe `true` for the same token.
    async fn mark_used(&self, token: &str) -> Result<bool>;
}

/// User records, keyed by email.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Insert or update a user keyed by email. Returns the record id.
    async fn upsert<'a>(
        &self,
        username: &str,
        email: &str,
        authorizations: Option<&'a str>,
    ) -> Result<i64>;

    /// Replace a user's authorization string.
    async fn update_authorizations(&self, email: &str, authorizations: &str) -> Result<()>;

    /// All users, newest first.
    async fn list_all(&self) -> Result<Vec<User>>;
}

/// The game catalogue.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait GameStore: Send + Sync {
    /// Add a game, recording who contributed it. Returns the new game id.
    async fn add(&self, game: &NewGame, contributor_email: &str) -> Result<i64>;

    /// One page of the catalogue with the total count.
    async fn list(&self, limit: i64, offset: i64, sort: Option<GameSort>) -> Result<GamePage>;

    /// Look up a single game.
    async fn get(&self, id: i64) -> Result<Option<Game>>;
}
