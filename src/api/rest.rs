//! REST handlers and routers.
//!
//! Two routers: `public_router` carries the login-link endpoints, reachable
//! without credentials; `protected_router` sits behind the auth middleware
//! and gates each handler on a role flag.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    routing::{get, post, put},
    Extension, Json, Router,
};

use crate::auth::{ClaimsExt, RoleFlags};
use crate::domain::{GameSort, NewGame};
use crate::server::AppState;

use super::{
    ensure_admin, ensure_contributor, ensure_viewer, parse_games_csv, validation_error, ApiError,
    AuthRequest, AuthorizationsBody, ErrorCode, GameCreatedResponse, GamesQuery, GamesResponse,
    ImportResponse, MeResponse, MessageResponse, UpdateAuthorizationsRequest, UsersResponse,
    VerifyLinkQuery, VerifyLinkResponse,
};

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

/// Routes reachable without a session credential.
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/auth/request-link", post(request_link))
        .route("/auth/verify-link", get(verify_link))
}

/// Routes behind the auth middleware.
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/auth/me", get(me))
        .route("/games", get(list_games).post(create_game))
        .route("/games/import", post(import_games))
        .route("/admin/users", get(list_users))
        .route(
            "/admin/users/:email/authorizations",
            put(update_authorizations),
        )
}

/// POST /auth/request-link
///
/// Persist-then-notify: the token is durable before the send is attempted,
/// so a delivery failure surfaces as a 500 but the link stays redeemable.
async fn request_link(
    State(state): State<AppState>,
    Json(body): Json<AuthRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let email = body.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(validation_error("email", "a valid email address is required"));
    }

    let link = state.magic_links.issue(&email).await?;
    state.mailer.send_login_link(&email, &link).await?;

    Ok(Json(MessageResponse::new(
        "Login link sent! Check your email.",
    )))
}

/// GET /auth/verify-link?token=...
async fn verify_link(
    State(state): State<AppState>,
    Query(query): Query<VerifyLinkQuery>,
) -> Result<Json<VerifyLinkResponse>, ApiError> {
    let redemption = state.magic_links.redeem(&query.token).await?;

    Ok(Json(VerifyLinkResponse {
        message: "Login successful".to_string(),
        email: redemption.email,
        jwt: redemption.jwt,
    }))
}

/// GET /auth/me
async fn me(
    State(state): State<AppState>,
    Extension(ClaimsExt(claims)): Extension<ClaimsExt>,
) -> Result<Json<MeResponse>, ApiError> {
    let username = match state.user_store.get_by_email(&claims.email).await? {
        Some(user) => user.username,
        // Valid session for an email with no stored record yet.
        None => claims
            .email
            .split('@')
            .next()
            .unwrap_or_default()
            .to_string(),
    };

    Ok(Json(MeResponse {
        email: claims.email.clone(),
        username,
        authorizations: AuthorizationsBody::from(&claims.roles),
    }))
}

/// GET /games
async fn list_games(
    State(state): State<AppState>,
    Extension(ClaimsExt(claims)): Extension<ClaimsExt>,
    Query(query): Query<GamesQuery>,
) -> Result<Json<GamesResponse>, ApiError> {
    ensure_viewer(&claims)?;

    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0).max(0);
    let sort = query.sort_by.as_deref().and_then(GameSort::parse);

    let page = state.game_store.list(limit, offset, sort).await?;
    Ok(Json(GamesResponse::from(page)))
}

/// POST /games
async fn create_game(
    State(state): State<AppState>,
    Extension(ClaimsExt(claims)): Extension<ClaimsExt>,
    Json(game): Json<NewGame>,
) -> Result<Json<GameCreatedResponse>, ApiError> {
    ensure_contributor(&claims)?;

    game.validate()
        .map_err(|reason| ApiError::new(ErrorCode::InvalidFieldValue, reason))?;

    let game_id = state.game_store.add(&game, &claims.email).await?;
    tracing::info!(game_id, contributor = claims.email, "game added");

    Ok(Json(GameCreatedResponse {
        message: "Game added".to_string(),
        game_id,
    }))
}

/// POST /games/import
///
/// Body is raw CSV. Bad rows are skipped and reported; the response always
/// carries a per-row error list alongside the import count.
async fn import_games(
    State(state): State<AppState>,
    Extension(ClaimsExt(claims)): Extension<ClaimsExt>,
    body: Bytes,
) -> Result<Json<ImportResponse>, ApiError> {
    ensure_contributor(&claims)?;

    if body.is_empty() {
        return Err(ApiError::new(
            ErrorCode::InvalidRequestBody,
            "CSV body is empty",
        ));
    }

    let (games, errors) = parse_games_csv(&body);

    let mut games_added = 0;
    for game in &games {
        state.game_store.add(game, &claims.email).await?;
        games_added += 1;
    }

    tracing::info!(
        games_added,
        skipped = errors.len(),
        contributor = claims.email,
        "csv import finished"
    );

    Ok(Json(ImportResponse {
        message: format!("Imported {games_added} game(s)"),
        games_added,
        errors,
    }))
}

/// GET /admin/users
async fn list_users(
    State(state): State<AppState>,
    Extension(ClaimsExt(claims)): Extension<ClaimsExt>,
) -> Result<Json<UsersResponse>, ApiError> {
    ensure_admin(&claims)?;

    let users = state.user_store.list_all().await?;
    Ok(Json(UsersResponse {
        count: users.len(),
        users,
    }))
}

/// PUT /admin/users/:email/authorizations
///
/// The stored string is normalized to the canonical `is_`-prefixed form;
/// unknown tokens in the request are dropped rather than stored.
async fn update_authorizations(
    State(state): State<AppState>,
    Extension(ClaimsExt(claims)): Extension<ClaimsExt>,
    Path(email): Path<String>,
    Json(body): Json<UpdateAuthorizationsRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    ensure_admin(&claims)?;

    let flags = RoleFlags::parse(&body.authorizations);
    let mut names = Vec::new();
    if flags.viewer {
        names.push("is_viewer");
    }
    if flags.contributor {
        names.push("is_contributor");
    }
    if flags.admin {
        names.push("is_admin");
    }
    let stored = names.join(",");

    state
        .user_store
        .update_authorizations(&email, &stored)
        .await?;

    tracing::info!(email, authorizations = stored, admin = claims.email, "authorizations updated");
    Ok(Json(MessageResponse::new("Authorizations updated")))
}
