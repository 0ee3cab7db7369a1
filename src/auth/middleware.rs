//! Authentication middleware for Axum
//!
//! Extracts the bearer session token from requests and exposes the decoded
//! claims to downstream handlers.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::{AuthError, SessionClaims, SessionTokens};

/// Validates inbound session credentials.
pub struct Authenticator {
    sessions: Arc<SessionTokens>,
}

impl Authenticator {
    pub fn new(sessions: Arc<SessionTokens>) -> Self {
        Self { sessions }
    }

    /// Authenticate a raw authorization header value.
    ///
    /// The header must carry the `Bearer ` scheme. A validly-signed token
    /// whose claims lack a subject email is rejected as malformed; such
    /// tokens can exist if an older issuer schema signed them.
    pub fn authenticate(&self, auth_header: Option<&str>) -> Result<SessionClaims, AuthError> {
        let header = auth_header.ok_or(AuthError::MissingAuth)?;

        let token = header.strip_prefix("Bearer ").ok_or(AuthError::MissingAuth)?;

        let claims = self.sessions.verify(token)?;

        if claims.email.is_empty() {
            return Err(AuthError::InvalidClaims);
        }

        Ok(claims)
    }
}

/// Claims extension inserted into authenticated requests.
#[derive(Clone)]
pub struct ClaimsExt(pub SessionClaims);

/// Authentication middleware
pub async fn auth_middleware(
    State(authenticator): State<Arc<Authenticator>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let claims = match authenticator.authenticate(auth_header) {
        Ok(claims) => claims,
        Err(e) => return auth_error_response(e),
    };

    request.extensions_mut().insert(ClaimsExt(claims));
    next.run(request).await
}

/// Convert auth error to HTTP response
pub fn auth_error_response(error: AuthError) -> Response {
    let (status, message) = match &error {
        AuthError::MissingAuth => (StatusCode::UNAUTHORIZED, "Not authenticated".to_string()),
        AuthError::InvalidToken | AuthError::InvalidSignature(_) => {
            (StatusCode::UNAUTHORIZED, "Invalid token".to_string())
        }
        AuthError::TokenExpired => (StatusCode::UNAUTHORIZED, "Token has expired".to_string()),
        AuthError::TokenAlreadyUsed => (
            StatusCode::UNAUTHORIZED,
            "Token has already been used".to_string(),
        ),
        AuthError::InvalidClaims => (StatusCode::UNAUTHORIZED, "Invalid token payload".to_string()),
        AuthError::Forbidden(role) => (StatusCode::FORBIDDEN, format!("{role} access required")),
        AuthError::Configuration(_) | AuthError::Store(_) | AuthError::Delivery(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        ),
    };

    (
        status,
        axum::Json(serde_json::json!({
            "error": message,
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::MemoryUserStore;
    use chrono::Duration;

    fn authenticator() -> (Arc<SessionTokens>, Authenticator) {
        let store = Arc::new(MemoryUserStore::new());
        let sessions =
            Arc::new(SessionTokens::new(b"test-secret-key", Duration::hours(1), store).unwrap());
        (sessions.clone(), Authenticator::new(sessions))
    }

    #[tokio::test]
    async fn missing_header_rejected() {
        let (_, auth) = authenticator();
        assert!(matches!(
            auth.authenticate(None),
            Err(AuthError::MissingAuth)
        ));
    }

    #[tokio::test]
    async fn wrong_scheme_rejected() {
        let (sessions, auth) = authenticator();
        let token = sessions.issue("alice@example.com").await.unwrap();
        assert!(matches!(
            auth.authenticate(Some(&format!("Basic {token}"))),
            Err(AuthError::MissingAuth)
        ));
    }

    #[tokio::test]
    async fn bearer_token_accepted() {
        let (sessions, auth) = authenticator();
        let token = sessions.issue("alice@example.com").await.unwrap();
        let claims = auth.authenticate(Some(&format!("Bearer {token}"))).unwrap();
        assert_eq!(claims.email, "alice@example.com");
    }

    #[tokio::test]
    async fn empty_subject_rejected() {
        let (sessions, auth) = authenticator();
        let token = sessions.issue("").await.unwrap();
        assert!(matches!(
            auth.authenticate(Some(&format!("Bearer {token}"))),
            Err(AuthError::InvalidClaims)
        ));
    }
}
