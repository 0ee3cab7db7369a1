//! JWT session credentials
//!
//! HS256-signed claims carrying the subject email and role flags. Claims are
//! fixed at issuance; expiry is enforced on every verification.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{AuthError, RoleFlags, SessionClaims};
use crate::infra::UserStore;

/// Wire form of the session claims.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// Subject (email)
    sub: String,

    /// Issued at (Unix timestamp)
    iat: i64,

    /// Expiration time (Unix timestamp)
    exp: i64,

    /// Role flags (comma-separated: viewer,contributor,admin)
    #[serde(default)]
    roles: String,
}

/// Session token issuer and verifier.
pub struct SessionTokens {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,

    /// Credential lifetime from issuance.
    ttl: Duration,

    user_store: Arc<dyn UserStore>,
}

impl SessionTokens {
    /// Create a session token service with a shared symmetric secret.
    ///
    /// An empty secret is a configuration error; there is deliberately no
    /// built-in fallback value.
    pub fn new(
        secret: &[u8],
        ttl: Duration,
        user_store: Arc<dyn UserStore>,
    ) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::Configuration(
                "JWT secret is not configured".to_string(),
            ));
        }
        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl,
            user_store,
        })
    }

    /// Issue a session token for an email.
    ///
    /// A missing user record is not an error; the credential simply carries
    /// no role flags. Unknown role tokens in the stored authorization string
    /// are dropped at this point, so claims only ever name known roles.
    pub async fn issue(&self, email: &str) -> Result<String, AuthError> {
        let roles = match self.user_store.get_by_email(email).await? {
            Some(user) => user
                .authorizations
                .as_deref()
                .map(RoleFlags::parse)
                .unwrap_or_default(),
            None => RoleFlags::default(),
        };

        let now = Utc::now();
        let claims = Claims {
            sub: email.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
            roles: roles.to_claim_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::InvalidSignature(e.to_string()))
    }

    /// Verify a session token and return the decoded claims.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let validation = Validation::default();

        let token_data =
            decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidSignature(e.to_string()),
            })?;

        let claims = token_data.claims;

        let issued_at = timestamp_to_datetime(claims.iat)?;
        let expires_at = timestamp_to_datetime(claims.exp)?;

        Ok(SessionClaims {
            email: claims.sub,
            issued_at,
            expires_at,
            roles: RoleFlags::parse(&claims.roles),
        })
    }
}

fn timestamp_to_datetime(ts: i64) -> Result<DateTime<Utc>, AuthError> {
    Utc.timestamp_opt(ts, 0)
        .single()
        .ok_or(AuthError::InvalidClaims)
}
