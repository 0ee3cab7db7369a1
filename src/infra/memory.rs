//! In-memory store implementations
//!
//! Backing for development and tests. Same contracts as the PostgreSQL
//! stores, including the conditional `mark_used` transition.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::{AuthLink, Game, GamePage, GameSort, NewGame, User};

use super::{GameStore, Result, StoreError, TokenStore, UserStore};

/// In-memory token store.
#[derive(Default)]
pub struct MemoryTokenStore {
    links: RwLock<HashMap<String, AuthLink>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn put(&self, token: &str, email: &str, expires_at: DateTime<Utc>) -> Result<()> {
        let mut links = self
            .links
            .write()
            .map_err(|_| StoreError::Internal("token store lock poisoned".to_string()))?;
        links.insert(
            token.to_string(),
            AuthLink {
                token: token.to_string(),
                email: email.to_string(),
                created_at: Utc::now(),
                expires_at,
                used: false,
                used_at: None,
            },
        );
        Ok(())
    }

    async fn get(&self, token: &str) -> Result<Option<AuthLink>> {
        let links = self
            .links
            .read()
            .map_err(|_| StoreError::Internal("token store lock poisoned".to_string()))?;
        Ok(links.get(token).cloned())
    }

    async fn mark_used(&self, token: &str) -> Result<bool> {
        // Single write lock covers the check and the mutation, so the
        // unused -> used transition happens at most once.
        let mut links = self
            .links
            .write()
            .map_err(|_| StoreError::Internal("token store lock poisoned".to_string()))?;
        match links.get_mut(token) {
            Some(link) if !link.used => {
                link.used = true;
                link.used_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// In-memory user store.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<String, User>>,
    next_id: RwLock<i64>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = self
            .users
            .read()
            .map_err(|_| StoreError::Internal("user store lock poisoned".to_string()))?;
        Ok(users.get(email).cloned())
    }

    async fn upsert<'a>(
        &self,
        username: &str,
        email: &str,
        authorizations: Option<&'a str>,
    ) -> Result<i64> {
        let mut users = self
            .users
            .write()
            .map_err(|_| StoreError::Internal("user store lock poisoned".to_string()))?;
        let now = Utc::now();
        if let Some(user) = users.get_mut(email) {
            user.username = username.to_string();
            user.authorizations = authorizations.map(str::to_string);
            user.updated_at = now;
            return Ok(user.id);
        }
        let id = {
            let mut next = self
                .next_id
                .write()
                .map_err(|_| StoreError::Internal("user store lock poisoned".to_string()))?;
            *next += 1;
            *next
        };
        users.insert(
            email.to_string(),
            User {
                id,
                username: username.to_string(),
                email: email.to_string(),
                authorizations: authorizations.map(str::to_string),
                created_at: now,
                updated_at: now,
            },
        );
        Ok(id)
    }

    async fn update_authorizations(&self, email: &str, authorizations: &str) -> Result<()> {
        let mut users = self
            .users
            .write()
            .map_err(|_| StoreError::Internal("user store lock poisoned".to_string()))?;
        let user = users
            .get_mut(email)
            .ok_or_else(|| StoreError::UserNotFound(email.to_string()))?;
        user.authorizations = Some(authorizations.to_string());
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<User>> {
        let users = self
            .users
            .read()
            .map_err(|_| StoreError::Internal("user store lock poisoned".to_string()))?;
        let mut all: Vec<User> = users.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }
}

/// In-memory game catalogue.
#[derive(Default)]
pub struct MemoryGameStore {
    games: RwLock<Vec<Game>>,
}

impl MemoryGameStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GameStore for MemoryGameStore {
    async fn add(&self, game: &NewGame, contributor_email: &str) -> Result<i64> {
        let mut games = self
            .games
            .write()
            .map_err(|_| StoreError::Internal("game store lock poisoned".to_string()))?;
        let id = games.len() as i64 + 1;
        games.push(Game {
            id,
            title: game.title.clone(),
            owner: game.owner.clone(),
            min_players: game.min_players,
            max_players: game.max_players,
            description: game.description.clone(),
            tags: game.tags.clone(),
            image_url: game.image_url.clone(),
            bgg_link: game.bgg_link.clone(),
            bgg_rating: game.bgg_rating,
            contributor_email: contributor_email.to_string(),
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn list(&self, limit: i64, offset: i64, sort: Option<GameSort>) -> Result<GamePage> {
        let games = self
            .games
            .read()
            .map_err(|_| StoreError::Internal("game store lock poisoned".to_string()))?;
        let mut all: Vec<Game> = games.clone();
        match sort {
            Some(GameSort::Title) => all.sort_by(|a, b| a.title.cmp(&b.title)),
            Some(GameSort::Owner) => {
                all.sort_by(|a, b| a.owner.cmp(&b.owner).then(a.title.cmp(&b.title)))
            }
            Some(GameSort::MinPlayers) => {
                all.sort_by(|a, b| a.min_players.cmp(&b.min_players).then(a.title.cmp(&b.title)))
            }
            Some(GameSort::MaxPlayers) => {
                all.sort_by(|a, b| a.max_players.cmp(&b.max_players).then(a.title.cmp(&b.title)))
            }
            Some(GameSort::BggRating) => all.sort_by(|a, b| {
                a.bgg_rating
                    .partial_cmp(&b.bgg_rating)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.title.cmp(&b.title))
            }),
            Some(GameSort::CreatedAt) => {
                all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.title.cmp(&b.title)))
            }
            // Default ordering is newest first.
            None => all.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        }
        let total = all.len() as i64;
        let start = offset.max(0).min(total) as usize;
        let end = (start + limit.max(0) as usize).min(total as usize);
        Ok(GamePage {
            games: all[start..end].to_vec(),
            total,
            limit,
            offset,
        })
    }

    async fn get(&self, id: i64) -> Result<Option<Game>> {
        let games = self
            .games
            .read()
            .map_err(|_| StoreError::Internal("game store lock poisoned".to_string()))?;
        Ok(games.iter().find(|g| g.id == id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn mark_used_is_single_shot() {
        let store = MemoryTokenStore::new();
        store
            .put("tok-1", "alice@example.com", Utc::now() + Duration::minutes(15))
            .await
            .unwrap();

        assert!(store.mark_used("tok-1").await.unwrap());
        assert!(!store.mark_used("tok-1").await.unwrap());

        let link = store.get("tok-1").await.unwrap().unwrap();
        assert!(link.used);
        assert!(link.used_at.is_some());
    }

    #[tokio::test]
    async fn mark_used_missing_token_is_false() {
        let store = MemoryTokenStore::new();
        assert!(!store.mark_used("nope").await.unwrap());
    }

    #[tokio::test]
    async fn upsert_updates_existing_user() {
        let store = MemoryUserStore::new();
        let id = store
            .upsert("alice", "alice@example.com", Some("is_viewer"))
            .await
            .unwrap();
        let id2 = store
            .upsert("alice2", "alice@example.com", Some("is_admin"))
            .await
            .unwrap();
        assert_eq!(id, id2);

        let user = store.get_by_email("alice@example.com").await.unwrap().unwrap();
        assert_eq!(user.username, "alice2");
        assert_eq!(user.authorizations.as_deref(), Some("is_admin"));
    }

    #[tokio::test]
    async fn update_authorizations_requires_user() {
        let store = MemoryUserStore::new();
        let err = store
            .update_authorizations("ghost@example.com", "is_viewer")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UserNotFound(_)));
    }

    #[tokio::test]
    async fn game_listing_paginates_and_sorts() {
        let store = MemoryGameStore::new();
        for (title, min) in [("Carcassonne", 2), ("Azul", 2), ("Brass", 3)] {
            let game = NewGame {
                title: title.to_string(),
                owner: "alice".to_string(),
                min_players: min,
                max_players: 4,
                description: None,
                tags: None,
                image_url: None,
                bgg_link: None,
                bgg_rating: None,
            };
            store.add(&game, "alice@example.com").await.unwrap();
        }

        let page = store.list(2, 0, Some(GameSort::Title)).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.games.len(), 2);
        assert_eq!(page.games[0].title, "Azul");
        assert_eq!(page.games[1].title, "Brass");

        let rest = store.list(2, 2, Some(GameSort::Title)).await.unwrap();
        assert_eq!(rest.games.len(), 1);
        assert_eq!(rest.games[0].title, "Carcassonne");
    }
}
