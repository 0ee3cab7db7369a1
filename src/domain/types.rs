//! Domain types: one-time auth links, users, and catalogue games.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A one-time login token record.
///
/// Rows are never deleted; a link is logically dead once `used` is set or
/// `expires_at` has passed.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthLink {
    /// Opaque URL-safe token string, unique across all records.
    pub token: String,

    /// Email this link authenticates.
    pub email: String,

    pub created_at: DateTime<Utc>,

    pub expires_at: DateTime<Utc>,

    /// Set exactly once, on successful redemption. Never reverts.
    pub used: bool,

    pub used_at: Option<DateTime<Utc>>,
}

impl AuthLink {
    /// Whether the link has passed its expiry at the given instant.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// A group member, keyed by email.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    /// Comma-separated role tokens, e.g. `"is_viewer,is_contributor"`.
    pub authorizations: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A catalogued board game.
#[derive(Debug, Clone, Serialize)]
pub struct Game {
    pub id: i64,
    pub title: String,
    pub owner: String,
    pub min_players: i32,
    pub max_players: i32,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub image_url: Option<String>,
    pub bgg_link: Option<String>,
    pub bgg_rating: Option<f64>,
    /// Email of the member who added the game.
    pub contributor_email: String,
    pub created_at: DateTime<Utc>,
}

/// Fields for a game being added to the catalogue.
#[derive(Debug, Clone, Deserialize)]
pub struct NewGame {
    pub title: String,
    pub owner: String,
    pub min_players: i32,
    pub max_players: i32,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub bgg_link: Option<String>,
    #[serde(default)]
    pub bgg_rating: Option<f64>,
}

impl NewGame {
    /// Validate field constraints. Returns a human-readable reason on failure.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title must not be empty".to_string());
        }
        if self.owner.trim().is_empty() {
            return Err("owner must not be empty".to_string());
        }
        if self.min_players < 1 || self.max_players < 1 {
            return Err("player counts must be at least 1".to_string());
        }
        if self.min_players > self.max_players {
            return Err("minimum players cannot be greater than maximum players".to_string());
        }
        if let Some(rating) = self.bgg_rating {
            if !(0.0..=10.0).contains(&rating) {
                return Err("bgg_rating must be between 0 and 10".to_string());
            }
        }
        Ok(())
    }
}

/// One page of the game listing.
#[derive(Debug, Clone, Serialize)]
pub struct GamePage {
    pub games: Vec<Game>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Sortable columns for the game listing.
///
/// Parsed from the `sort_by` query parameter; anything unrecognized falls
/// back to the default newest-first ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameSort {
    Title,
    Owner,
    MinPlayers,
    MaxPlayers,
    BggRating,
    CreatedAt,
}

impl GameSort {
    /// Parse a query-parameter value. Unknown values yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "title" => Some(Self::Title),
            "owner" => Some(Self::Owner),
            "min_players" => Some(Self::MinPlayers),
            "max_players" => Some(Self::MaxPlayers),
            "bgg_rating" => Some(Self::BggRating),
            "created_at" => Some(Self::CreatedAt),
            _ => None,
        }
    }

    /// Column name for ORDER BY clauses. Fixed vocabulary, never interpolated
    /// from user input directly.
    pub fn column(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Owner => "owner",
            Self::MinPlayers => "min_players",
            Self::MaxPlayers => "max_players",
            Self::BggRating => "bgg_rating",
            Self::CreatedAt => "created_at",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_game() -> NewGame {
        NewGame {
            title: "Brass: Birmingham".to_string(),
            owner: "alice".to_string(),
            min_players: 2,
            max_players: 4,
            description: None,
            tags: Some(vec!["economic".to_string()]),
            image_url: None,
            bgg_link: None,
            bgg_rating: Some(8.6),
        }
    }

    #[test]
    fn valid_game_passes() {
        assert!(sample_game().validate().is_ok());
    }

    #[test]
    fn min_over_max_rejected() {
        let mut game = sample_game();
        game.min_players = 5;
        assert!(game.validate().is_err());
    }

    #[test]
    fn zero_players_rejected() {
        let mut game = sample_game();
        game.min_players = 0;
        assert!(game.validate().is_err());
    }

    #[test]
    fn rating_out_of_range_rejected() {
        let mut game = sample_game();
        game.bgg_rating = Some(11.0);
        assert!(game.validate().is_err());
    }

    #[test]
    fn sort_parse_known_and_unknown() {
        assert_eq!(GameSort::parse("title"), Some(GameSort::Title));
        assert_eq!(GameSort::parse("bgg_rating"), Some(GameSort::BggRating));
        assert_eq!(GameSort::parse("id; DROP TABLE games"), None);
    }
}
