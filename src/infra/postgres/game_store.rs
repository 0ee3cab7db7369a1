//! PostgreSQL game catalogue store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;

use crate::domain::{Game, GamePage, GameSort, NewGame};
use crate::infra::{GameStore, Result};

type GameRow = (
    i64,
    String,
    String,
    i32,
    i32,
    Option<String>,
    Option<Vec<String>>,
    Option<String>,
    Option<String>,
    Option<f64>,
    String,
    DateTime<Utc>,
);

fn game_from_row(row: GameRow) -> Game {
    let (
        id,
        title,
        owner,
        min_players,
        max_players,
        description,
        tags,
        image_url,
        bgg_link,
        bgg_rating,
        contributor_email,
        created_at,
    ) = row;
    Game {
        id,
        title,
        owner,
        min_players,
        max_players,
        description,
        tags,
        image_url,
        bgg_link,
        bgg_rating,
        contributor_email,
        created_at,
    }
}

const GAME_COLUMNS: &str = "id, title, owner, min_players, max_players, description, \
     tags, image_url, bgg_link, bgg_rating, contributor_email, created_at";

/// PostgreSQL-backed game store.
pub struct PgGameStore {
    pool: PgPool,
}

impl PgGameStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GameStore for PgGameStore {
    async fn add(&self, game: &NewGame, contributor_email: &str) -> Result<i64> {
        let row: (i64,) = sqlx::query_as(
            r#"
            INSERT INTO games (title, owner, min_players, max_players, description,
                               tags, image_url, bgg_link, bgg_rating, contributor_email)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id
            "#,
        )
        .bind(&game.title)
        .bind(&game.owner)
        .bind(game.min_players)
        .bind(game.max_players)
        .bind(&game.description)
        .bind(&game.tags)
        .bind(&game.image_url)
        .bind(&game.bgg_link)
        .bind(game.bgg_rating)
        .bind(contributor_email)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    async fn list(&self, limit: i64, offset: i64, sort: Option<GameSort>) -> Result<GamePage> {
        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM games")
            .fetch_one(&self.pool)
            .await?;

        // The ORDER BY column comes from the fixed GameSort vocabulary, never
        // straight from the request.
        let order_clause = match sort {
            Some(sort) => format!("ORDER BY {} ASC, title ASC", sort.column()),
            None => "ORDER BY created_at DESC".to_string(),
        };

        let rows: Vec<GameRow> = sqlx::query_as(&format!(
            "SELECT {GAME_COLUMNS} FROM games {order_clause} LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(GamePage {
            games: rows.into_iter().map(game_from_row).collect(),
            total: total.0,
            limit,
            offset,
        })
    }

    async fn get(&self, id: i64) -> Result<Option<Game>> {
        let row: Option<GameRow> =
            sqlx::query_as(&format!("SELECT {GAME_COLUMNS} FROM games WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(game_from_row))
    }
}
