//! Authentication and authorization for Game Group
//!
//! The login flow is passwordless:
//!
//! 1. A member requests a login link; a one-time token is persisted and the
//!    link is emailed out of band.
//! 2. Visiting the link redeems the token (single use, short expiry) and
//!    issues a signed session JWT.
//! 3. Every subsequent request carries the JWT as a bearer credential; role
//!    gates check the flags baked into its claims.
//!
//! # Authorization Model
//!
//! Roles are independent boolean flags, not a ranked hierarchy:
//! - `viewer`: browse the game library
//! - `contributor`: add games and run CSV imports
//! - `admin`: manage users
//!
//! Flags come from the user's stored authorization string at JWT issuance
//! time; changing a member's roles takes effect at their next login.
//!
//! # Configuration
//!
//! - `JWT_SECRET`: HMAC secret for session tokens (required)
//! - `BASE_URL`: public base for redemption links
//! - `LINK_EXPIRY_MINUTES` / `SESSION_EXPIRY_HOURS`: token lifetimes

mod jwt;
mod magic_link;
mod middleware;

pub use jwt::*;
pub use magic_link::*;
pub use middleware::*;

use chrono::{DateTime, Utc};
use std::fmt;

use crate::infra::StoreError;

/// A role a request can be gated on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Viewer,
    Contributor,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Viewer => write!(f, "viewer"),
            Role::Contributor => write!(f, "contributor"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

/// Independent role flags carried in a session.
///
/// Admin does not imply contributor or viewer; each flag is granted only when
/// the authorization string lists it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleFlags {
    pub viewer: bool,
    pub contributor: bool,
    pub admin: bool,
}

impl RoleFlags {
    /// Parse a comma-separated authorization string.
    ///
    /// Accepts both bare (`contributor`) and `is_`-prefixed
    /// (`is_contributor`) tokens. Unrecognized tokens are dropped.
    pub fn parse(authorizations: &str) -> Self {
        let mut flags = Self::default();
        for raw in authorizations.split(',') {
            let token = raw.trim();
            if token.is_empty() {
                continue;
            }
            match token.strip_prefix("is_").unwrap_or(token) {
                "viewer" => flags.viewer = true,
                "contributor" => flags.contributor = true,
                "admin" => flags.admin = true,
                other => {
                    tracing::warn!(role = other, "ignoring unrecognized role token");
                }
            }
        }
        flags
    }

    /// Render as the comma-separated form used inside JWT claims.
    pub fn to_claim_string(&self) -> String {
        let mut names = Vec::new();
        if self.viewer {
            names.push("viewer");
        }
        if self.contributor {
            names.push("contributor");
        }
        if self.admin {
            names.push("admin");
        }
        names.join(",")
    }

    pub fn has(&self, role: Role) -> bool {
        match role {
            Role::Viewer => self.viewer,
            Role::Contributor => self.contributor,
            Role::Admin => self.admin,
        }
    }

    pub fn all() -> Self {
        Self {
            viewer: true,
            contributor: true,
            admin: true,
        }
    }
}

/// Decoded session credential: who the caller is and what they may do.
///
/// Immutable once issued; a role change requires a fresh login.
#[derive(Debug, Clone)]
pub struct SessionClaims {
    /// Subject email.
    pub email: String,

    pub issued_at: DateTime<Utc>,

    pub expires_at: DateTime<Utc>,

    /// Role flags granted at issuance.
    pub roles: RoleFlags,
}

impl SessionClaims {
    /// Access gate: pass the claims through when the flag is set, otherwise
    /// fail with [`AuthError::Forbidden`].
    pub fn require(&self, role: Role) -> Result<&Self, AuthError> {
        if self.roles.has(role) {
            Ok(self)
        } else {
            Err(AuthError::Forbidden(role))
        }
    }
}

/// Authentication error
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing authentication")]
    MissingAuth,

    #[error("invalid token")]
    InvalidToken,

    #[error("token has already been used")]
    TokenAlreadyUsed,

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("invalid token claims")]
    InvalidClaims,

    #[error("{0} access required")]
    Forbidden(Role),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("persistence error: {0}")]
    Store(#[from] StoreError),

    #[error("delivery error: {0}")]
    Delivery(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_prefixed_tokens() {
        let flags = RoleFlags::parse("is_contributor,is_admin,is_viewer");
        assert!(flags.viewer);
        assert!(flags.contributor);
        assert!(flags.admin);
    }

    #[test]
    fn parse_bare_tokens_and_whitespace() {
        let flags = RoleFlags::parse(" viewer , contributor ");
        assert!(flags.viewer);
        assert!(flags.contributor);
        assert!(!flags.admin);
    }

    #[test]
    fn unrecognized_tokens_dropped() {
        let flags = RoleFlags::parse("superuser,is_owner,viewer");
        assert_eq!(
            flags,
            RoleFlags {
                viewer: true,
                contributor: false,
                admin: false
            }
        );
    }

    #[test]
    fn roles_are_independent() {
        let flags = RoleFlags::parse("is_admin");
        assert!(flags.has(Role::Admin));
        assert!(!flags.has(Role::Contributor));
        assert!(!flags.has(Role::Viewer));
    }

    #[test]
    fn claim_string_round_trip() {
        let flags = RoleFlags::parse("is_viewer,is_admin");
        assert_eq!(flags, RoleFlags::parse(&flags.to_claim_string()));
    }

    #[test]
    fn require_checks_single_flag() {
        let claims = SessionClaims {
            email: "alice@example.com".to_string(),
            issued_at: Utc::now(),
            expires_at: Utc::now(),
            roles: RoleFlags::parse("contributor"),
        };
        assert!(claims.require(Role::Contributor).is_ok());
        assert!(matches!(
            claims.require(Role::Admin),
            Err(AuthError::Forbidden(Role::Admin))
        ));
    }
}
