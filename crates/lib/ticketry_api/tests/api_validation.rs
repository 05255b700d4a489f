//! Integration tests for routing, auth middleware, and request validation.
//!
//! These use a lazily-connected pool, so only paths that are rejected before
//! any query runs are exercised here. Anything that needs a live database
//! belongs in a test that provisions one.

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use uuid::Uuid;

use ticketry_api::{AppState, config::ApiConfig, router};
use ticketry_core::auth::jwt::generate_access_token;

const JWT_SECRET: &str = "test-secret";

fn test_app() -> axum::Router {
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://localhost:5432/ticketry_test")
        .expect("lazy pool");
    let state = AppState {
        pool,
        config: ApiConfig {
            bind_addr: "127.0.0.1:0".into(),
            pg_connection_url: "postgres://localhost:5432/ticketry_test".into(),
            jwt_secret: JWT_SECRET.into(),
        },
    };
    router(state)
}

fn bearer() -> String {
    let user_id = Uuid::now_v7();
    let token = generate_access_token(&user_id.to_string(), "tester@example.com", JWT_SECRET.as_bytes())
        .expect("token");
    format!("Bearer {token}")
}

async fn body_json(resp: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse JSON")
}

#[tokio::test]
async fn health_is_public() {
    let resp = test_app()
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("request");

    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["message"], "Ticketry API running");
    assert_eq!(json["status"], "active");
}

#[tokio::test]
async fn protected_route_requires_authorization_header() {
    let resp = test_app()
        .oneshot(
            Request::builder()
                .uri("/api/projects")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("request");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(resp).await;
    assert_eq!(json["message"], "Missing authorization header");
}

#[tokio::test]
async fn non_bearer_scheme_is_rejected() {
    let resp = test_app()
        .oneshot(
            Request::builder()
                .uri("/api/tickets/kanban")
                .header(header::AUTHORIZATION, "Basic dXNlcjpwdw==")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("request");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(resp).await;
    assert_eq!(json["message"], "Invalid authorization scheme");
}

#[tokio::test]
async fn forged_token_is_rejected() {
    let forged = generate_access_token(
        &Uuid::now_v7().to_string(),
        "tester@example.com",
        b"some-other-secret",
    )
    .expect("token");

    let resp = test_app()
        .oneshot(
            Request::builder()
                .uri("/api/notifications")
                .header(header::AUTHORIZATION, format!("Bearer {forged}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("request");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(resp).await;
    assert_eq!(json["message"], "Invalid or expired token");
}

#[tokio::test]
async fn malformed_project_id_in_path_is_a_bad_request() {
    let resp = test_app()
        .oneshot(
            Request::builder()
                .uri("/api/projects/not-a-uuid")
                .header(header::AUTHORIZATION, bearer())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("request");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json = body_json(resp).await;
    assert_eq!(json["message"], "Invalid project ID");
}

#[tokio::test]
async fn ticket_creation_requires_a_project_id() {
    let resp = test_app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/tickets")
                .header(header::AUTHORIZATION, bearer())
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"title": "Fix login"}"#))
                .unwrap(),
        )
        .await
        .expect("request");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json = body_json(resp).await;
    assert_eq!(json["message"], "Project ID is required");
}

#[tokio::test]
async fn unknown_status_is_rejected_before_the_ticket_lookup() {
    let ticket_id = Uuid::now_v7();
    let resp = test_app()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/api/tickets/{ticket_id}/status"))
                .header(header::AUTHORIZATION, bearer())
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"status": "Archived"}"#))
                .unwrap(),
        )
        .await
        .expect("request");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json = body_json(resp).await;
    assert_eq!(json["message"], "Invalid status");
}

#[tokio::test]
async fn empty_comment_text_is_rejected() {
    let resp = test_app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/comments")
                .header(header::AUTHORIZATION, bearer())
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"ticketId": "abc", "text": "   "}"#))
                .unwrap(),
        )
        .await
        .expect("request");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json = body_json(resp).await;
    assert_eq!(json["message"], "Comment text is required");
}

#[tokio::test]
async fn member_add_rejects_malformed_ids() {
    let project_id = Uuid::now_v7();
    let resp = test_app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/projects/{project_id}/members"))
                .header(header::AUTHORIZATION, bearer())
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"userId": "not-a-uuid"}"#))
                .unwrap(),
        )
        .await
        .expect("request");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json = body_json(resp).await;
    assert_eq!(json["message"], "Invalid ID provided");
}
