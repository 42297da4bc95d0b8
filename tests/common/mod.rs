#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use cashflow_server::{
    AppState, app,
    auth::AuthService,
    database::Database,
    entries::{EntriesService, EntryStore},
    models::{EntryType, NewEntry},
    token::TokenService,
    users::UserStore,
};
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use time::{Duration, OffsetDateTime};
use tower::ServiceExt;

pub const TEST_SECRET: &str = "integration-test-secret-0123456789abcdef";
pub const TEST_PASSWORD: &str = "secret1";

/// An isolated database in a temporary directory. Keep the `TempDir` alive for
/// the duration of the test.
pub struct TestEnv {
    pub database: Database,
    pub state: AppState,
    pub tokens: Arc<TokenService>,
    _temp_dir: TempDir,
}

pub async fn setup_test_environment() -> TestEnv {
    let temp_dir = tempfile::tempdir().expect("Failed to create temporary directory");
    let data_path = temp_dir
        .path()
        .to_str()
        .expect("Failed to convert path to string")
        .to_string();

    let database = Database::open(&data_path)
        .await
        .unwrap_or_else(|e| panic!("Failed to open database at {}: {}", data_path, e));
    let tokens = Arc::new(TokenService::new(TEST_SECRET, Duration::days(7)));
    let state = AppState::with_tokens(database.handle(), Arc::clone(&tokens));

    TestEnv {
        database,
        state,
        tokens,
        _temp_dir: temp_dir,
    }
}

impl TestEnv {
    pub fn router(&self) -> Router {
        app(self.state.clone())
    }

    pub fn auth(&self) -> &AuthService {
        &self.state.auth
    }

    pub fn entries(&self) -> &EntriesService {
        &self.state.entries
    }

    pub fn users(&self) -> &UserStore {
        &self.state.users
    }

    pub fn entry_store(&self) -> EntryStore {
        EntryStore::new(self.database.handle())
    }

    /// Registers a user through the auth service and returns its id.
    pub async fn create_user(&self, username: &str) -> String {
        self.auth()
            .register(username, TEST_PASSWORD, None)
            .await
            .unwrap_or_else(|e| panic!("Failed to register test user '{}': {}", username, e))
            .user
            .id
    }

    pub async fn create_entry(
        &self,
        owner_id: &str,
        kind: EntryType,
        amount: f64,
        description: &str,
        occurred_at: OffsetDateTime,
    ) -> String {
        self.entries()
            .create(
                owner_id,
                NewEntry {
                    description: description.to_string(),
                    amount,
                    kind,
                    card_brand: None,
                    occurred_at: Some(occurred_at),
                },
            )
            .await
            .unwrap_or_else(|e| panic!("Failed to create test entry '{}': {}", description, e))
            .id
    }
}

/// Sends one request through the router and returns status plus parsed JSON body.
pub async fn send(
    router: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("Failed to build request");

    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("Router failed to respond");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|e| {
            panic!(
                "Response body is not JSON ({}): {}",
                e,
                String::from_utf8_lossy(&bytes)
            )
        })
    };
    (status, json)
}

/// Registers through HTTP and returns the bearer token.
pub async fn register_via_api(router: &Router, username: &str) -> String {
    let (status, body) = send(
        router,
        "POST",
        "/auth/register",
        None,
        Some(serde_json::json!({"username": username, "password": TEST_PASSWORD})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
    body["token"]
        .as_str()
        .expect("token missing from register response")
        .to_string()
}
