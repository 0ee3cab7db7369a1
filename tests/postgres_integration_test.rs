//! PostgreSQL store integration tests.
//!
//! These require DATABASE_URL to be set and run with `cargo test -- --ignored`.

use chrono::{Duration, Utc};
use sqlx::postgres::PgPoolOptions;

use gamegroup_server::domain::{GameSort, NewGame};
use gamegroup_server::infra::{
    GameStore, PgGameStore, PgTokenStore, PgUserStore, TokenStore, UserStore,
};

async fn connect_db() -> Option<sqlx::PgPool> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .ok()?;
    gamegroup_server::migrations::run_postgres(&pool).await.ok()?;
    Some(pool)
}

fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", Utc::now().timestamp_nanos_opt().unwrap_or(0))
}

#[tokio::test]
#[ignore]
async fn token_store_round_trip_and_single_use() {
    let Some(pool) = connect_db().await else {
        eprintln!("DATABASE_URL not set, skipping");
        return;
    };
    let store = PgTokenStore::new(pool);

    let token = unique("tok");
    let email = format!("{}@example.com", unique("user"));
    store
        .put(&token, &email, Utc::now() + Duration::minutes(15))
        .await
        .unwrap();

    let link = store.get(&token).await.unwrap().unwrap();
    assert_eq!(link.email, email);
    assert!(!link.used);

    // Only the first transition succeeds.
    assert!(store.mark_used(&token).await.unwrap());
    assert!(!store.mark_used(&token).await.unwrap());

    let link = store.get(&token).await.unwrap().unwrap();
    assert!(link.used);
    assert!(link.used_at.is_some());
}

#[tokio::test]
#[ignore]
async fn concurrent_mark_used_yields_one_winner() {
    let Some(pool) = connect_db().await else {
        eprintln!("DATABASE_URL not set, skipping");
        return;
    };
    let store = std::sync::Arc::new(PgTokenStore::new(pool));

    let token = unique("tok-race");
    store
        .put(&token, "race@example.com", Utc::now() + Duration::minutes(15))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = store.clone();
        let token = token.clone();
        handles.push(tokio::spawn(async move { store.mark_used(&token).await }));
    }

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap().unwrap() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
}

#[tokio::test]
#[ignore]
async fn user_store_upsert_and_authorizations() {
    let Some(pool) = connect_db().await else {
        eprintln!("DATABASE_URL not set, skipping");
        return;
    };
    let store = PgUserStore::new(pool);

    let email = format!("{}@example.com", unique("alice"));
    let id = store
        .upsert("alice", &email, Some("is_viewer"))
        .await
        .unwrap();

    // Same email, same row.
    let id2 = store
        .upsert("alice-renamed", &email, Some("is_viewer,is_admin"))
        .await
        .unwrap();
    assert_eq!(id, id2);

    let user = store.get_by_email(&email).await.unwrap().unwrap();
    assert_eq!(user.username, "alice-renamed");
    assert_eq!(user.authorizations.as_deref(), Some("is_viewer,is_admin"));

    store
        .update_authorizations(&email, "is_viewer")
        .await
        .unwrap();
    let user = store.get_by_email(&email).await.unwrap().unwrap();
    assert_eq!(user.authorizations.as_deref(), Some("is_viewer"));

    let missing = store
        .update_authorizations("nobody@nowhere.invalid", "is_viewer")
        .await;
    assert!(missing.is_err());
}

#[tokio::test]
#[ignore]
async fn game_store_add_and_list() {
    let Some(pool) = connect_db().await else {
        eprintln!("DATABASE_URL not set, skipping");
        return;
    };
    let store = PgGameStore::new(pool);

    let title = unique("Brass");
    let game = NewGame {
        title: title.clone(),
        owner: "alice".to_string(),
        min_players: 2,
        max_players: 4,
        description: Some("Economic strategy".to_string()),
        tags: Some(vec!["economic".to_string(), "network".to_string()]),
        image_url: None,
        bgg_link: None,
        bgg_rating: Some(8.6),
    };
    let id = store.add(&game, "alice@example.com").await.unwrap();

    let fetched = store.get(id).await.unwrap().unwrap();
    assert_eq!(fetched.title, title);
    assert_eq!(fetched.tags.as_deref(), Some(&["economic".to_string(), "network".to_string()][..]));
    assert_eq!(fetched.bgg_rating, Some(8.6));
    assert_eq!(fetched.contributor_email, "alice@example.com");

    let page = store.list(10, 0, Some(GameSort::CreatedAt)).await.unwrap();
    assert!(page.total >= 1);
}
