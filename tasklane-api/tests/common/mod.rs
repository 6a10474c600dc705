//! Common test utilities for integration tests
//!
//! Builds the full router on top of a `MemoryStore` and drives it in-process
//! with `tower::ServiceExt::oneshot`. Users are created directly in the store
//! (skipping Argon2) and get a signed access token.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tasklane_api::app::{build_router, AppState};
use tasklane_api::config::{ApiConfig, Config, DatabaseConfig, JwtConfig};
use tasklane_shared::auth::jwt::{create_token, Claims, TokenType};
use tasklane_shared::models::{CreateUser, User};
use tasklane_shared::store::{EntityRepository, MemoryStore};
use tower::ServiceExt;

pub const JWT_SECRET: &str = "integration-test-secret-at-least-32-bytes";

/// A user with a valid access token
pub struct TestUser {
    pub user: User,
    pub token: String,
}

impl TestUser {
    pub fn id(&self) -> String {
        self.user.id.to_string()
    }
}

/// Test context: in-memory store plus the router built on it
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub app: Router,
    pub config: Config,
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
            url: "postgresql://unused".to_string(),
            max_connections: 1,
        },
        jwt: JwtConfig {
            secret: JWT_SECRET.to_string(),
        },
    }
}

impl TestContext {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let config = test_config();
        let app = build_router(AppState::new(store.clone(), config.clone()));

        Self { store, app, config }
    }

    /// Creates a user in the store and signs an access token for it
    pub async fn user(&self, username: &str) -> TestUser {
        let user = self
            .store
            .create_user(CreateUser {
                username: username.to_string(),
                email: format!("{username}@example.com"),
                password_hash: "not-a-real-hash".to_string(),
            })
            .await
            .unwrap();
        let token = create_token(&Claims::new(user.id, TokenType::Access), JWT_SECRET).unwrap();

        TestUser { user, token }
    }

    /// Sends a request and returns the status with the parsed JSON body
    ///
    /// An empty body comes back as `Value::Null`.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                panic!("non-JSON body: {}", String::from_utf8_lossy(&bytes))
            })
        };

        (status, json)
    }

    pub async fn get(&self, uri: &str, as_user: &TestUser) -> (StatusCode, Value) {
        self.send(Method::GET, uri, Some(&as_user.token), None).await
    }

    pub async fn post(&self, uri: &str, as_user: &TestUser, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(&as_user.token), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, as_user: &TestUser, body: Value) -> (StatusCode, Value) {
        self.send(Method::PATCH, uri, Some(&as_user.token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, as_user: &TestUser) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, Some(&as_user.token), None).await
    }

    /// Creates a project with the default sections; returns the project JSON
    pub async fn project(&self, owner: &TestUser, name: &str) -> Value {
        let (status, project) = self
            .post("/v1/projects", owner, json!({ "name": name }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{project}");
        project
    }

    /// First section of a project
    pub async fn first_section(&self, owner: &TestUser, project: &Value) -> Value {
        let uri = format!("/v1/projects/{}/sections", id_of(project));
        let (status, sections) = self.get(&uri, owner).await;
        assert_eq!(status, StatusCode::OK, "{sections}");
        sections[0].clone()
    }

    /// Creates a task in a section; returns the task JSON
    pub async fn task(&self, owner: &TestUser, section: &Value, name: &str) -> Value {
        let uri = format!("/v1/sections/{}/tasks", id_of(section));
        let (status, task) = self.post(&uri, owner, json!({ "name": name })).await;
        assert_eq!(status, StatusCode::CREATED, "{task}");
        task
    }
}

/// The `id` field of an entity as a string
pub fn id_of(entity: &Value) -> String {
    entity["id"].as_str().unwrap().to_string()
}
