//! Role gates for handlers.
//!
//! Handlers receive decoded claims from the auth middleware and call one of
//! these before touching protected state. Each gate checks a single flag;
//! admin does not imply the others.

use crate::auth::{Role, SessionClaims};

use super::ApiError;

/// Require the viewer flag.
pub fn ensure_viewer(claims: &SessionClaims) -> Result<(), ApiError> {
    claims.require(Role::Viewer).map(|_| ()).map_err(ApiError::from)
}

/// Require the contributor flag.
pub fn ensure_contributor(claims: &SessionClaims) -> Result<(), ApiError> {
    claims
        .require(Role::Contributor)
        .map(|_| ())
        .map_err(ApiError::from)
}

/// Require the admin flag.
pub fn ensure_admin(claims: &SessionClaims) -> Result<(), ApiError> {
    claims.require(Role::Admin).map(|_| ()).map_err(ApiError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::RoleFlags;
    use chrono::Utc;

    fn claims_with(authorizations: &str) -> SessionClaims {
        SessionClaims {
            email: "alice@example.com".to_string(),
            issued_at: Utc::now(),
            expires_at: Utc::now(),
            roles: RoleFlags::parse(authorizations),
        }
    }

    #[test]
    fn contributor_passes_contributor_gate() {
        let claims = claims_with("is_contributor");
        assert!(ensure_contributor(&claims).is_ok());
    }

    #[test]
    fn contributor_fails_admin_gate() {
        let claims = claims_with("is_contributor");
        let err = ensure_admin(&claims).unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::FORBIDDEN);
    }

    #[test]
    fn admin_does_not_imply_viewer() {
        let claims = claims_with("is_admin");
        assert!(ensure_admin(&claims).is_ok());
        assert!(ensure_viewer(&claims).is_err());
    }
}
