//! Common test utilities and fixtures for integration tests

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::Duration;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use gamegroup_server::auth::{Authenticator, MagicLinkService, SessionTokens};
use gamegroup_server::infra::{
    GameStore, MemoryGameStore, MemoryTokenStore, MemoryUserStore, TokenStore, UserStore,
};
use gamegroup_server::notify::{Mailer, MemoryMailer};
use gamegroup_server::server::{build_router, AppState};

pub const TEST_BASE_URL: &str = "http://localhost:8080";

/// Full application wired against in-memory stores.
pub struct TestApp {
    pub router: Router,
    pub mailer: Arc<MemoryMailer>,
    pub token_store: Arc<MemoryTokenStore>,
    pub user_store: Arc<MemoryUserStore>,
    pub game_store: Arc<MemoryGameStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::build(Arc::new(MemoryMailer::new()))
    }

    /// An app whose mail deliveries always fail.
    pub fn with_failing_mail() -> Self {
        Self::build(Arc::new(MemoryMailer::failing()))
    }

    fn build(mailer: Arc<MemoryMailer>) -> Self {
        let token_store = Arc::new(MemoryTokenStore::new());
        let user_store = Arc::new(MemoryUserStore::new());
        let game_store = Arc::new(MemoryGameStore::new());

        let sessions = Arc::new(
            SessionTokens::new(
                b"integration-test-secret",
                Duration::hours(24),
                user_store.clone() as Arc<dyn UserStore>,
            )
            .unwrap(),
        );
        let magic_links = Arc::new(MagicLinkService::new(
            token_store.clone() as Arc<dyn TokenStore>,
            sessions.clone(),
            TEST_BASE_URL,
            Duration::minutes(15),
        ));
        let authenticator = Arc::new(Authenticator::new(sessions.clone()));

        let state = AppState {
            token_store: token_store.clone(),
            user_store: user_store.clone(),
            game_store: game_store.clone() as Arc<dyn GameStore>,
            mailer: mailer.clone() as Arc<dyn Mailer>,
            sessions,
            magic_links,
        };

        let router = build_router(authenticator).unwrap().with_state(state);

        Self {
            router,
            mailer,
            token_store,
            user_store,
            game_store,
        }
    }

    /// Insert a user with the given authorization string.
    pub async fn seed_user(&self, username: &str, email: &str, authorizations: &str) {
        self.user_store
            .upsert(username, email, Some(authorizations))
            .await
            .unwrap();
    }

    /// Run the whole login flow for an email and return the session JWT.
    pub async fn login(&self, email: &str) -> String {
        let (status, _) = self
            .post_json("/auth/request-link", None, json!({ "email": email }))
            .await;
        assert_eq!(status, StatusCode::OK);

        let link = self
            .mailer
            .sent()
            .last()
            .expect("login link was not delivered")
            .1
            .clone();
        let token = link.split("token=").nth(1).unwrap().to_string();

        let (status, body) = self
            .get(&format!("/auth/verify-link?token={token}"), None)
            .await;
        assert_eq!(status, StatusCode::OK, "redemption failed: {body}");
        body["jwt"].as_str().unwrap().to_string()
    }

    pub async fn get(&self, path: &str, bearer: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, path, bearer, None, None).await
    }

    pub async fn post_json(
        &self,
        path: &str,
        bearer: Option<&str>,
        body: Value,
    ) -> (StatusCode, Value) {
        self.request(
            Method::POST,
            path,
            bearer,
            Some(serde_json::to_vec(&body).unwrap()),
            Some("application/json"),
        )
        .await
    }

    pub async fn put_json(
        &self,
        path: &str,
        bearer: Option<&str>,
        body: Value,
    ) -> (StatusCode, Value) {
        self.request(
            Method::PUT,
            path,
            bearer,
            Some(serde_json::to_vec(&body).unwrap()),
            Some("application/json"),
        )
        .await
    }

    pub async fn post_csv(
        &self,
        path: &str,
        bearer: Option<&str>,
        csv: &str,
    ) -> (StatusCode, Value) {
        self.request(
            Method::POST,
            path,
            bearer,
            Some(csv.as_bytes().to_vec()),
            Some("text/csv"),
        )
        .await
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        bearer: Option<&str>,
        body: Option<Vec<u8>>,
        content_type: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(ct) = content_type {
            builder = builder.header(header::CONTENT_TYPE, ct);
        }

        let request = builder
            .body(body.map(Body::from).unwrap_or_else(Body::empty))
            .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract the error code from a structured error body.
pub fn error_code(body: &Value) -> &str {
    body["error"]["code"].as_str().unwrap_or("")
}
