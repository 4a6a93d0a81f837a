//! Shared infrastructure for API integration tests
//!
//! Every test gets a fresh router over an in-memory store, cheap Argon2
//! parameters and a notifier that records reset tokens instead of sending
//! them. Requests go straight through the router with `tower::Service`.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tokio::sync::Mutex;
use tower::Service as _;
use volunteer_api::{
    app::{build_router, AppState},
    config::{ApiConfig, Config, DatabaseConfig, JwtConfig, PasswordConfig},
};
use volunteer_shared::{
    auth::{
        jwt::TokenService,
        notifier::{NotifyError, ResetNotifier},
    },
    models::user::UserId,
    store::MemoryStore,
};

pub const TEST_SECRET: &str = "integration-test-secret-at-least-32-bytes";

/// Captures reset tokens handed to the notifier
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl ResetNotifier for RecordingNotifier {
    async fn deliver(&self, email: &str, token: &str) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .await
            .push((email.to_string(), token.to_string()));
        Ok(())
    }
}

impl RecordingNotifier {
    /// Last token sent to `email`
    ///
    /// Delivery runs on its own task, so this waits briefly before giving up.
    pub async fn last_token_for(&self, email: &str) -> Option<String> {
        for _ in 0..50 {
            let found = self
                .sent
                .lock()
                .await
                .iter()
                .rev()
                .find(|(to, _)| to == email)
                .map(|(_, token)| token.clone());
            if found.is_some() {
                return found;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        None
    }
}

/// A response reduced to what tests assert on
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Test context
pub struct TestContext {
    pub app: Router,
    pub config: Config,
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            production: false,
        },
        database: DatabaseConfig {
            url: String::new(),
            max_connections: 1,
        },
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
            issuer: "volunteer-hub-test".to_string(),
            access_token_ttl_minutes: 30,
            reset_token_ttl_minutes: 15,
        },
        password: PasswordConfig {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        },
    }
}

impl TestContext {
    /// Creates a context with an empty store
    pub fn new() -> Self {
        let config = test_config();
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::default());

        let state = AppState::new(store.clone(), config.clone(), notifier.clone())
            .expect("test config should be valid");

        Self {
            app: build_router(state),
            config,
            store,
            notifier,
        }
    }

    /// Token service with the same secret and issuer as the app
    pub fn tokens(&self) -> TokenService {
        self.config.token_service()
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().call(request).await.unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Value,
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    pub async fn empty(&self, method: Method, uri: &str, token: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn signup(&self, email: &str, password: &str) -> TestResponse {
        self.json(
            Method::POST,
            "/api/auth/signup",
            None,
            serde_json::json!({
                "email": email,
                "first_name": "Test",
                "last_name": "User",
                "password": password,
            }),
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> TestResponse {
        let form = format!(
            "username={}&password={}",
            email.replace('@', "%40"),
            password
        );

        self.send(
            Request::builder()
                .method(Method::POST)
                .uri("/api/auth/login")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form))
                .unwrap(),
        )
        .await
    }

    /// Signs up and logs in, returning the user ID and an access token
    pub async fn register(&self, email: &str) -> (UserId, String) {
        let signup = self.signup(email, "password1").await;
        assert_eq!(signup.status, StatusCode::CREATED, "signup failed: {}", signup.body);

        let login = self.login(email, "password1").await;
        assert_eq!(login.status, StatusCode::OK, "login failed: {}", login.body);

        (
            signup.body["user_id"].as_i64().unwrap(),
            login.body["access_token"].as_str().unwrap().to_string(),
        )
    }

    /// Creates an organization owned by the token's user
    pub async fn create_organization(&self, token: &str, name: &str) -> i64 {
        let response = self
            .json(
                Method::POST,
                "/api/organization",
                Some(token),
                serde_json::json!({ "name": name, "description": format!("{} description", name) }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "create failed: {}", response.body);

        response.body["organization_id"].as_i64().unwrap()
    }

    /// Adds `user_id` to an organization as a volunteer, acting as that user
    pub async fn join(&self, token: &str, organization_id: i64, user_id: UserId) {
        let response = self
            .json(
                Method::POST,
                &format!("/api/organization/{}/users", organization_id),
                Some(token),
                serde_json::json!({ "user_id": user_id }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "join failed: {}", response.body);
    }

    /// Creates an event as an admin of the organization
    pub async fn create_event(&self, token: &str, organization_id: i64, name: &str) -> i64 {
        let response = self
            .json(
                Method::POST,
                "/api/events",
                Some(token),
                serde_json::json!({
                    "organization_id": organization_id,
                    "name": name,
                    "location": "Community hall",
                    "starts_at": "2026-06-01T09:00:00Z",
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "create event failed: {}", response.body);

        response.body["event_id"].as_i64().unwrap()
    }
}
