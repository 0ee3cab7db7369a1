//! Magic-link issuance and redemption
//!
//! A link carries a one-time token: 32 bytes from a CSPRNG, base64url
//! encoded (256 bits of entropy). Per token the lifecycle is
//! `ISSUED -> USED` on a valid redemption or `ISSUED -> EXPIRED` once the
//! window passes; both end states are terminal and later redemption attempts
//! fail. There is deliberately no request rate limiting here (known
//! hardening gap).

use base64::Engine;
use chrono::{Duration, Utc};
use rand::Rng;
use std::sync::Arc;

use super::{AuthError, SessionTokens};
use crate::infra::TokenStore;

/// Result of a successful redemption.
#[derive(Debug, Clone)]
pub struct Redemption {
    pub email: String,
    /// Session JWT issued for the redeemed email.
    pub jwt: String,
}

/// Issues and redeems one-time login links.
pub struct MagicLinkService {
    token_store: Arc<dyn TokenStore>,
    sessions: Arc<SessionTokens>,

    /// Public base for redemption URLs.
    base_url: String,

    /// Validity window for issued links.
    link_ttl: Duration,
}

impl MagicLinkService {
    pub fn new(
        token_store: Arc<dyn TokenStore>,
        sessions: Arc<SessionTokens>,
        base_url: impl Into<String>,
        link_ttl: Duration,
    ) -> Self {
        Self {
            token_store,
            sessions,
            base_url: base_url.into(),
            link_ttl,
        }
    }

    /// Generate an unguessable one-time token.
    fn generate_token() -> String {
        let mut rng = rand::thread_rng();
        let random_bytes: [u8; 32] = rng.gen();
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(random_bytes)
    }

    /// Issue a login link for an email.
    ///
    /// The token is persisted before the URL is returned; if the store write
    /// fails no link exists anywhere.
    pub async fn issue(&self, email: &str) -> Result<String, AuthError> {
        let token = Self::generate_token();
        let expires_at = Utc::now() + self.link_ttl;

        self.token_store.put(&token, email, expires_at).await?;

        tracing::debug!(email, "issued login link");
        Ok(format!("{}/auth/verify-link?token={token}", self.base_url))
    }

    /// Redeem a one-time token, returning the email and a session JWT.
    ///
    /// The used check comes before the expiry check, so a token that is both
    /// used and expired reports as already used. The unused -> used
    /// transition is a conditional store update; losing that race reports as
    /// already used even though this caller saw an unused row.
    pub async fn redeem(&self, token: &str) -> Result<Redemption, AuthError> {
        let link = self
            .token_store
            .get(token)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if link.used {
            return Err(AuthError::TokenAlreadyUsed);
        }

        if link.is_expired_at(Utc::now()) {
            return Err(AuthError::TokenExpired);
        }

        if !self.token_store.mark_used(token).await? {
            return Err(AuthError::TokenAlreadyUsed);
        }

        let jwt = self.sessions.issue(&link.email).await?;

        tracing::debug!(email = link.email, "login link redeemed");
        Ok(Redemption {
            email: link.email,
            jwt,
        })
    }
}
