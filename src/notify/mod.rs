//! Outbound login-link delivery
//!
//! Issuance is persist-then-notify: the token is stored before the send is
//! attempted, so a failed delivery fails the request but leaves the token
//! valid for its full window. A user who retries simply gets a fresh link.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use std::sync::Mutex;

use crate::auth::AuthError;

/// Delivers login links to members.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send a login link. Failures surface as [`AuthError::Delivery`].
    async fn send_login_link(&self, email: &str, link: &str) -> Result<(), AuthError>;
}

/// Mailer backed by a transactional-mail HTTP API.
pub struct HttpMailer {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    from: String,
}

impl HttpMailer {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        from: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.into(),
            api_key: api_key.into(),
            from: from.into(),
        }
    }

    fn text_body(link: &str) -> String {
        format!(
            "Hello!\n\n\
             Click the following link to log in to Game Group:\n\n\
             {link}\n\n\
             This link will expire in 15 minutes.\n\n\
             If you did not request this login link, please ignore this email.\n"
        )
    }

    fn html_body(link: &str) -> String {
        format!(
            "<html><body>\
             <h2>Game Group Login</h2>\
             <p><a href=\"{link}\">Login to Game Group</a></p>\
             <p>Or copy and paste this link into your browser:</p>\
             <p>{link}</p>\
             <p><em>This link will expire in 15 minutes.</em></p>\
             <p>If you did not request this login link, please ignore this email.</p>\
             </body></html>"
        )
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send_login_link(&self, email: &str, link: &str) -> Result<(), AuthError> {
        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "from": self.from,
                "to": email,
                "subject": "Your Game Group Login Link",
                "text": Self::text_body(link),
                "html": Self::html_body(link),
            }))
            .send()
            .await
            .map_err(|e| AuthError::Delivery(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::Delivery(format!(
                "mail API returned {}",
                response.status()
            )));
        }

        tracing::info!(email, "login link email sent");
        Ok(())
    }
}

/// Mailer for local development: writes the link to the log instead of
/// sending anything.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_login_link(&self, email: &str, link: &str) -> Result<(), AuthError> {
        tracing::info!(email, link, "mail delivery not configured; login link");
        Ok(())
    }
}

/// Mailer that captures outbound mail in memory, for development and tests.
#[derive(Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mailer whose sends always fail with a delivery error.
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// All (email, link) pairs sent so far.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send_login_link(&self, email: &str, link: &str) -> Result<(), AuthError> {
        if self.fail {
            return Err(AuthError::Delivery("simulated delivery failure".to_string()));
        }
        self.sent
            .lock()
            .map_err(|_| AuthError::Delivery("mailer lock poisoned".to_string()))?
            .push((email.to_string(), link.to_string()));
        Ok(())
    }
}
