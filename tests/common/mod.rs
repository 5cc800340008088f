//! Shared helpers for integration tests.

#![allow(dead_code)]

use axum_test::TestServer;
use memberhub::{
    api::routes::app,
    types::Role,
    utils::toml_config::HubConfig,
    AppState, TursoClient,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;

pub const TEST_SECRET: &[u8] = b"integration-test-signing-key-0123456789";

/// Default configuration with argon2 cost turned down so tests stay fast.
pub fn test_config() -> HubConfig {
    let mut config = HubConfig::default();
    config.database.url = ":memory:".to_string();
    config.auth.argon2.memory_kib = 1024;
    config.auth.argon2.iterations = 1;
    config.auth.argon2.parallelism = 1;
    config
}

pub async fn create_test_client() -> Arc<TursoClient> {
    Arc::new(
        TursoClient::new_memory()
            .await
            .expect("Failed to create in-memory database"),
    )
}

/// Test server, the state behind it and its database.
pub async fn create_test_server_with_db() -> (TestServer, AppState, Arc<TursoClient>) {
    let turso = create_test_client().await;
    let state =
        AppState::new(test_config(), turso.clone(), TEST_SECRET).expect("Failed to build state");
    let server = TestServer::new(app(state.clone())).expect("Failed to create test server");
    (server, state, turso)
}

/// Test server plus the state behind it, for direct store access.
pub async fn create_test_server() -> (TestServer, AppState) {
    let (server, state, _) = create_test_server_with_db().await;
    (server, state)
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

/// Registers an account and returns `(token, user)`.
pub async fn register(server: &TestServer, name: &str, email: &str, password: &str) -> (String, Value) {
    let response = server
        .post("/api/auth/register")
        .json(&json!({
            "name": name,
            "email": email,
            "password": password
        }))
        .await;

    response.assert_status(axum::http::StatusCode::CREATED);
    let body: Value = response.json();
    let token = body["token"].as_str().expect("token in body").to_string();
    (token, body["user"].clone())
}

pub async fn login(server: &TestServer, email: &str, password: &str) -> String {
    let response = server
        .post("/api/auth/login")
        .json(&json!({ "email": email, "password": password }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    body["token"].as_str().expect("token in body").to_string()
}

/// Registers an account, promotes it to admin and logs in again.
pub async fn register_admin(server: &TestServer, state: &AppState, email: &str) -> (String, String) {
    let (_, user) = register(server, "Admin", email, "admin-password").await;
    let id = user["id"].as_str().expect("id in user").to_string();
    state
        .accounts
        .set_role(&id, Role::Admin)
        .await
        .expect("promote to admin");

    let token = login(server, email, "admin-password").await;
    (token, id)
}

// ============= Dependent records =============
//
// Content handlers own these tables. Tests write them directly so account
// deletion can be checked end to end.

pub async fn add_event_registration(db: &TursoClient, event_id: &str, user_id: &str) {
    db.connection()
        .expect("connection")
        .execute(
            "INSERT INTO event_registrations (event_id, user_id, registered_at) VALUES (?, ?, ?)",
            (event_id, user_id, Utc::now().timestamp()),
        )
        .await
        .expect("insert registration");
}

pub async fn record_review(db: &TursoClient, content_id: &str, content_kind: &str, reviewer_id: &str) {
    db.connection()
        .expect("connection")
        .execute(
            "INSERT INTO content_reviews (content_id, content_kind, reviewed_by, reviewed_at)
             VALUES (?, ?, ?, ?)",
            (content_id, content_kind, reviewer_id, Utc::now().timestamp()),
        )
        .await
        .expect("insert review");
}

async fn count(db: &TursoClient, sql: &str, user_id: &str) -> i64 {
    let mut rows = db
        .connection()
        .expect("connection")
        .query(sql, [user_id])
        .await
        .expect("count query");
    let row = rows.next().await.expect("row").expect("count row");
    row.get::<i64>(0).expect("count value")
}

pub async fn count_event_registrations(db: &TursoClient, user_id: &str) -> i64 {
    count(db, "SELECT COUNT(*) FROM event_registrations WHERE user_id = ?", user_id).await
}

pub async fn count_reviews_by(db: &TursoClient, user_id: &str) -> i64 {
    count(db, "SELECT COUNT(*) FROM content_reviews WHERE reviewed_by = ?", user_id).await
}

pub async fn count_user_sessions(db: &TursoClient, user_id: &str) -> i64 {
    count(db, "SELECT COUNT(*) FROM sessions WHERE user_id = ?", user_id).await
}
