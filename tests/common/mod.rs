#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use finmind::{
    app::build_app,
    auth::claims::{Claims, TokenKind},
    categories::seed::seed_defaults,
    config::{AppConfig, JwtConfig},
    state::AppState,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, PgPool};
use time::OffsetDateTime;
use tower::ServiceExt;
use uuid::Uuid;

/// Skip the current test when no database is configured.
#[macro_export]
macro_rules! require_db {
    () => {
        match common::test_state().await {
            Some(state) => state,
            None => {
                eprintln!("TEST_DATABASE_URL not set; skipping");
                return;
            }
        }
    };
}

pub fn create_test_app() -> Router {
    build_app(AppState::fake())
}

/// Sign a token with the key material `AppState::fake` uses.
pub fn token_for(user_id: Uuid, kind: TokenKind, exp_offset_secs: i64) -> String {
    let now = OffsetDateTime::now_utc();
    let claims = Claims {
        sub: user_id,
        email: "someone@example.com".into(),
        token_type: kind,
        iat: now.unix_timestamp() as usize,
        exp: (now.unix_timestamp() + exp_offset_secs) as usize,
        iss: "test-issuer".into(),
        aud: "test-aud".into(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"test-secret"),
    )
    .unwrap()
}

pub fn access_token() -> String {
    token_for(Uuid::new_v4(), TokenKind::Access, 3600)
}

pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let req = match body {
        Some(json) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };

    let res = app.oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

pub async fn test_pool() -> Option<PgPool> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("connect to TEST_DATABASE_URL");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("run migrations");
    seed_defaults(&pool).await.expect("seed categories");
    Some(pool)
}

pub async fn test_state() -> Option<AppState> {
    let pool = test_pool().await?;
    let config = Arc::new(AppConfig {
        database_url: String::new(),
        max_connections: 5,
        host: "127.0.0.1".into(),
        port: 0,
        jwt: JwtConfig {
            secret: "test-secret".into(),
            issuer: "test-issuer".into(),
            audience: "test-aud".into(),
            ttl_minutes: 60,
            refresh_ttl_minutes: 120,
        },
    });
    Some(AppState::from_parts(pool, config))
}

pub fn unique_email() -> String {
    format!("user-{}@example.com", Uuid::new_v4().simple())
}
