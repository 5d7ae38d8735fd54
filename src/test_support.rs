//! Helpers for driving the full router in tests.

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use crate::{
    app::build_app,
    state::AppState,
    users::{dto::UserCreate, services::create_user, User},
};

pub const PASSWORD: &str = "changethis123";

pub async fn seed_user(state: &AppState, name: &str, superuser: bool) -> User {
    create_user(
        state.users.as_ref(),
        UserCreate {
            name: name.into(),
            email: format!("{name}@example.com"),
            password: PASSWORD.into(),
            is_active: true,
            is_superuser: superuser,
        },
    )
    .await
    .expect("seed user")
}

pub fn app(state: &AppState) -> Router {
    build_app(state.clone())
}

pub async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.clone().oneshot(req).await.expect("router is infallible");
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.expect("read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}

pub fn request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    json: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match json {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Builds and sends one request, returning status and decoded body.
pub async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    json: Option<Value>,
) -> (StatusCode, Value) {
    send(app, request(method, uri, token, json)).await
}

pub async fn login(app: &Router, name: &str, password: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/login/access-token")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("username={name}&password={password}")))
        .unwrap();
    send(app, req).await
}

pub async fn token_for(app: &Router, name: &str, password: &str) -> String {
    let (status, body) = login(app, name, password).await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["access_token"].as_str().expect("access_token").to_string()
}
