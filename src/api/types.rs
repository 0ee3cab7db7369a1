//! Request and response bodies for the REST API.

use serde::{Deserialize, Serialize};

use crate::auth::RoleFlags;
use crate::domain::{GamePage, User};

/// Body for requesting a login link.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthRequest {
    pub email: String,
}

/// Query string for link redemption.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyLinkQuery {
    pub token: String,
}

/// Generic acknowledgement body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Successful link redemption: the caller's new session credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyLinkResponse {
    pub message: String,
    pub email: String,
    pub jwt: String,
}

/// Role flags as they appear in response bodies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationsBody {
    pub viewer: bool,
    pub contributor: bool,
    pub admin: bool,
}

impl From<&RoleFlags> for AuthorizationsBody {
    fn from(flags: &RoleFlags) -> Self {
        Self {
            viewer: flags.viewer,
            contributor: flags.contributor,
            admin: flags.admin,
        }
    }
}

/// `GET /auth/me` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeResponse {
    pub email: String,
    pub username: String,
    pub authorizations: AuthorizationsBody,
}

/// Query parameters for the game listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GamesQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub sort_by: Option<String>,
}

/// `GET /games` response body.
#[derive(Debug, Clone, Serialize)]
pub struct GamesResponse {
    pub games: Vec<crate::domain::Game>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

impl From<GamePage> for GamesResponse {
    fn from(page: GamePage) -> Self {
        Self {
            games: page.games,
            total: page.total,
            limit: page.limit,
            offset: page.offset,
        }
    }
}

/// Successful game creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameCreatedResponse {
    pub message: String,
    pub game_id: i64,
}

/// CSV import summary: how many rows landed and what went wrong with the rest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportResponse {
    pub message: String,
    pub games_added: usize,
    pub errors: Vec<String>,
}

/// `GET /admin/users` response.
#[derive(Debug, Clone, Serialize)]
pub struct UsersResponse {
    pub users: Vec<User>,
    pub count: usize,
}

/// Body for replacing a user's role flags.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateAuthorizationsRequest {
    /// Comma-separated role tokens, bare or `is_`-prefixed.
    pub authorizations: String,
}
