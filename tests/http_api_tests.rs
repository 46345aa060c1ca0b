//! End-to-end tests for the HTTP API over the in-memory repository.
//!
//! Requests are driven through the real router with `tower::ServiceExt`,
//! so routing, extractors, status codes, and JSON bodies are all exercised
//! without binding a socket.

#![cfg(all(feature = "http-server", feature = "local-repo"))]

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use transit_catalog::auth::{AuthConfig, TokenService};
use transit_catalog::db::repositories::LocalRepository;
use transit_catalog::db::repository::FullRepository;
use transit_catalog::http::{create_router, AppState};

fn test_app() -> Router {
    let repo = Arc::new(LocalRepository::new()) as Arc<dyn FullRepository>;
    let tokens = TokenService::new(&AuthConfig::new("http-test-secret"));
    create_router(AppState::new(repo, tokens))
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn create_test_user(app: &Router, username: &str, email: &str, password: &str) -> Value {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/users",
            json!({ "username": username, "email": email, "password": password }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    response_json(response).await
}

async fn login(app: &Router, username: &str, password: &str) -> axum::response::Response {
    let form = format!("username={}&password={}", username, password);
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/token")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form))
                .unwrap(),
        )
        .await
        .unwrap()
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_health_endpoint() {
    let app = test_app();
    let response = app.oneshot(get_request("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "connected");
}

// ---------------------------------------------------------------------------
// Users and authentication
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_create_user_hides_password() {
    let app = test_app();
    let body = create_test_user(&app, "ada", "ada@example.com", "s3cret").await;

    assert_eq!(body["username"], "ada");
    assert_eq!(body["email"], "ada@example.com");
    assert!(body.get("hashed_password").is_none());
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn test_duplicate_email_returns_400() {
    let app = test_app();
    create_test_user(&app, "first", "dup@example.com", "pw").await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/users",
            json!({ "username": "second", "email": "dup@example.com", "password": "pw" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = response_json(response).await;
    assert_eq!(body["code"], "ALREADY_IN_USE");
}

#[tokio::test]
async fn test_login_and_users_me_flow() {
    let app = test_app();
    create_test_user(&app, "ada", "ada@example.com", "s3cret").await;

    let response = login(&app, "ada", "s3cret").await;
    assert_eq!(response.status(), StatusCode::OK);
    let token_body = response_json(response).await;
    assert_eq!(token_body["token_type"], "bearer");
    let token = token_body["access_token"].as_str().unwrap().to_string();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/users/me")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let me = response_json(response).await;
    assert_eq!(me["username"], "ada");
}

#[tokio::test]
async fn test_login_with_wrong_password_is_401() {
    let app = test_app();
    create_test_user(&app, "ada", "ada@example.com", "s3cret").await;

    let response = login(&app, "ada", "wrong").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_users_me_rejects_garbage_and_missing_tokens() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(get_request("/users/me"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/users/me")
                .header(header::AUTHORIZATION, "Bearer not-a-real-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_update_user_changes_password() {
    let app = test_app();
    let created = create_test_user(&app, "ada", "ada@example.com", "old-pw").await;
    let id = created["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/update/users/{}", id),
            json!({ "password": "new-pw" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(
        login(&app, "ada", "old-pw").await.status(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(login(&app, "ada", "new-pw").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_allusers_includes_password_digest() {
    let app = test_app();
    create_test_user(&app, "ada", "ada@example.com", "s3cret").await;

    let response = app.oneshot(get_request("/allusers")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    let users = body.as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert!(users[0]["hashed_password"].as_str().unwrap().len() > 0);
}

#[tokio::test]
async fn test_delete_user_then_get_is_404() {
    let app = test_app();
    let created = create_test_user(&app, "temp", "temp@example.com", "pw").await;
    let id = created["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/delete/users/{}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["user"]["username"], "temp");

    let response = app
        .oneshot(get_request(&format!("/users/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

async fn create_category(app: &Router, name: &str) -> i64 {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/creat/category",
            json!({ "name": name }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    response_json(response).await["id"].as_i64().unwrap()
}

async fn create_line(app: &Router, name: &str, category_id: i64) -> i64 {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/creat/line",
            json!({ "name": name, "category_id": category_id }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    response_json(response).await["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_category_crud_over_http() {
    let app = test_app();
    let id = create_category(&app, "Bus").await;

    let response = app
        .clone()
        .oneshot(get_request(&format!("/api/category/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["name"], "Bus");

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/update/category/{}", id),
            json!({ "name": "Autobus" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["category"]["name"], "Autobus");

    let response = app
        .clone()
        .oneshot(get_request("/api/allcategory"))
        .await
        .unwrap();
    let listing = response_json(response).await;
    assert_eq!(listing.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_duplicate_category_name_returns_400() {
    let app = test_app();
    create_category(&app, "Tram").await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/creat/category",
            json!({ "name": "Tram" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_json(response).await["code"], "ALREADY_IN_USE");
}

#[tokio::test]
async fn test_line_with_unknown_category_returns_404() {
    let app = test_app();

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/creat/line",
            json!({ "name": "Ghost", "category_id": 123 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_line_defaults_and_listing() {
    let app = test_app();
    let cat = create_category(&app, "Tram").await;
    create_line(&app, "T1", cat).await;

    let response = app.oneshot(get_request("/api/allline")).await.unwrap();
    let lines = response_json(response).await;
    assert_eq!(lines[0]["start_time"], "05:00:00");
    assert_eq!(lines[0]["end_time"], "23:00:00");
}

#[tokio::test]
async fn test_stop_lifecycle_over_http() {
    let app = test_app();
    let cat = create_category(&app, "Métro").await;
    let line = create_line(&app, "Ligne A", cat).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/creat/stop",
            json!({
                "line_id": line,
                "name": "Bellecour",
                "latitude": 45.757,
                "longitude": 4.832,
                "stop_order": 1
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let stop_id = response_json(response).await["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/update/stop/{}", stop_id),
            json!({ "stop_order": 2 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["stop"]["stop_order"], 2);
    assert_eq!(body["stop"]["name"], "Bellecour");

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/delete/stop/{}", stop_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_deleting_category_leaves_lines_and_stops_readable() {
    let app = test_app();
    let metro = create_category(&app, "Métro").await;
    let ligne_b = create_line(&app, "Ligne B", metro).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/creat/stop",
            json!({
                "line_id": ligne_b,
                "name": "Gare Centrale",
                "latitude": 45.76,
                "longitude": 4.86,
                "stop_order": 1
            }),
        ))
        .await
        .unwrap();
    let gare = response_json(response).await["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/delete/category/{}", metro))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The line still reads back and still names the deleted category.
    let response = app
        .clone()
        .oneshot(get_request(&format!("/api/line/{}", ligne_b)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["category_id"], metro);

    // The stop is untouched.
    let response = app
        .clone()
        .oneshot(get_request(&format!("/api/stop/{}", gare)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // And the category itself is gone.
    let response = app
        .oneshot(get_request(&format!("/api/category/{}", metro)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_ids_return_404_with_error_body() {
    let app = test_app();

    for uri in ["/users/99", "/api/category/99", "/api/line/99", "/api/stop/99"] {
        let response = app.clone().oneshot(get_request(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "uri: {}", uri);
        let body = response_json(response).await;
        assert_eq!(body["code"], "NOT_FOUND");
    }
}
