//! Shared harness for the HTTP integration tests
//!
//! Builds the full router over in-memory stores and a mailer that records
//! outgoing messages instead of sending them.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{
        header::{CONTENT_TYPE, SET_COOKIE},
        HeaderMap, Method, Request, StatusCode,
    },
    Router,
};
use serde_json::Value;
use tower::util::ServiceExt;

use library_service::{
    api::{AppState, RouterBuilder},
    config::{AuthConfig, CookieConfig, JwtConfig},
    database::{MemoryBookRepository, MemoryUserRepository, UserRepository},
    models::{UserChanges, UserRole},
    service::{AuthService, BookService, DeliveryError, EmailTemplates, JwtService, Mailer, UserService},
    utils::security::PasswordHasher,
};

pub const PASSWORD: &str = "correct horse battery staple";

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingMailer {
    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// Token from the link in the most recent message sent to `to`
    pub fn token_for(&self, to: &str) -> Option<String> {
        let sent = self.sent.lock().unwrap();
        let (_, body) = sent.iter().rev().find(|(recipient, _)| recipient == to)?;
        let token = body.split("token=").nth(1)?.split('"').next()?;
        Some(token.to_string())
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, _subject: &str, html_body: &str) -> Result<(), DeliveryError> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), html_body.to_string()));
        Ok(())
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn set_cookies(&self) -> Vec<String> {
        self.headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .map(str::to_string)
            .collect()
    }

    /// `name=value` pair of a cookie set by this response
    pub fn cookie_pair(&self, name: &str) -> Option<String> {
        let prefix = format!("{}=", name);
        self.set_cookies()
            .into_iter()
            .find(|cookie| cookie.starts_with(&prefix))
            .and_then(|cookie| cookie.split(';').next().map(str::to_string))
    }

    pub fn error_code(&self) -> &str {
        self.body["error"].as_str().unwrap_or_default()
    }
}

pub struct TestApp {
    pub router: Router,
    pub users: MemoryUserRepository,
    pub mailer: Arc<RecordingMailer>,
    pub jwt: Arc<JwtService>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_verification_required(false)
    }

    pub fn with_verification_required(require_verified_email: bool) -> Self {
        let users = MemoryUserRepository::new();
        let mailer = Arc::new(RecordingMailer::default());
        let jwt = Arc::new(
            JwtService::new(&JwtConfig::with_secrets(
                "integration_access_secret",
                "integration_refresh_secret",
            ))
            .unwrap(),
        );

        let auth_service = AuthService::new(
            Arc::new(users.clone()),
            jwt.clone(),
            mailer.clone(),
            EmailTemplates::new("Test Library").unwrap(),
            PasswordHasher::with_cost(256, 1, 1).unwrap(),
            AuthConfig {
                app_base_url: "http://library.test".to_string(),
                require_verified_email,
            },
        );

        let state = AppState {
            auth_service: Arc::new(auth_service),
            user_service: Arc::new(UserService::new(Arc::new(users.clone()))),
            book_service: Arc::new(BookService::new(Arc::new(MemoryBookRepository::new()))),
            jwt_service: jwt.clone(),
            cookies: CookieConfig {
                secure: false,
                domain: None,
            },
        };

        Self {
            router: RouterBuilder::with_all_routes().build(state),
            users,
            mailer,
            jwt,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        headers: &[(&str, String)],
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, value);
        }

        let request = match body {
            Some(json) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, None, &[]).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::POST, uri, Some(body), &[]).await
    }

    pub async fn register(&self, email: &str, username: &str) -> TestResponse {
        self.post(
            "/auth/register",
            serde_json::json!({
                "email": email,
                "username": username,
                "password": PASSWORD,
            }),
        )
        .await
    }

    pub async fn login(&self, email: &str) -> TestResponse {
        self.post(
            "/auth/login",
            serde_json::json!({ "email": email, "password": PASSWORD }),
        )
        .await
    }

    /// Registers an account and returns its access token
    pub async fn signed_in(&self, email: &str, username: &str) -> String {
        assert_eq!(self.register(email, username).await.status, StatusCode::CREATED);
        let login = self.login(email).await;
        assert_eq!(login.status, StatusCode::OK);
        login.body["data"]["tokens"]["access_token"]
            .as_str()
            .unwrap()
            .to_string()
    }

    /// Registers an admin account and returns its access token
    pub async fn signed_in_admin(&self, email: &str, username: &str) -> String {
        assert_eq!(self.register(email, username).await.status, StatusCode::CREATED);

        let record = self.users.find_by_email(email).await.unwrap().unwrap();
        self.users
            .update_by_id(
                record.id,
                UserChanges {
                    role: Some(UserRole::Admin),
                    ..UserChanges::default()
                },
            )
            .await
            .unwrap();

        let login = self.login(email).await;
        assert_eq!(login.status, StatusCode::OK);
        login.body["data"]["tokens"]["access_token"]
            .as_str()
            .unwrap()
            .to_string()
    }
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("authorization", format!("Bearer {}", token))
}

pub fn cookie(pair: &str) -> (&'static str, String) {
    ("cookie", pair.to_string())
}
