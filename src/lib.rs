//! Game Group Server Library
//!
//! Board game catalogue service for a private group: passwordless magic-link
//! login, JWT sessions with independent role flags, and a role-gated HTTP API
//! over the game library.
//!
//! ## Modules
//!
//! - [`domain`] - Core domain types (auth links, users, games)
//! - [`auth`] - Magic-link issuance/redemption, JWT sessions, middleware
//! - [`infra`] - Store traits plus PostgreSQL and in-memory implementations
//! - [`notify`] - Outbound login-link email delivery
//! - [`api`] - REST API routes
//! - [`server`] - Configuration and HTTP server bootstrap

pub mod api;
pub mod auth;
pub mod domain;
pub mod infra;
pub mod migrations;
pub mod notify;
pub mod server;

// Re-export commonly used types
pub use auth::{AuthError, Role, RoleFlags, SessionClaims};
pub use domain::{AuthLink, Game, GamePage, GameSort, NewGame, User};
pub use infra::{GameStore, Result, StoreError, TokenStore, UserStore};
