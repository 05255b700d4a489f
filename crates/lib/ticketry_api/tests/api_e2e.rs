//! End-to-end test: ephemeral PostgreSQL, real router, full request flows.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use tower::ServiceExt;

use ticketry_api::{AppState, config::ApiConfig, router};
use ticketry_core::db::DbManager;

const JWT_SECRET: &str = "test-secret";

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let req = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let resp = app.clone().oneshot(req).await.expect("request");
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("parse JSON")
    };
    (status, json)
}

/// Register a user and return their access token and id.
async fn register(app: &Router, name: &str, email: &str) -> (String, String) {
    let (status, json) = send(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(serde_json::json!({
            "name": name,
            "email": email,
            "password": "correct horse",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "register failed: {json}");
    (
        json["accessToken"].as_str().expect("access token").to_string(),
        json["user"]["id"].as_str().expect("user id").to_string(),
    )
}

#[tokio::test]
async fn membership_and_status_flows_end_to_end() {
    let mut db = DbManager::ephemeral().await.expect("ephemeral DbManager");
    db.setup().await.expect("db setup");
    db.start().await.expect("db start");

    let pool = sqlx::PgPool::connect(&db.connection_url())
        .await
        .expect("connect to ephemeral PG");
    ticketry_api::migrate(&pool).await.expect("migrate");

    let app = router(AppState {
        pool,
        config: ApiConfig {
            bind_addr: "127.0.0.1:0".into(),
            pg_connection_url: db.connection_url(),
            jwt_secret: JWT_SECRET.into(),
        },
    });

    let (u1_token, _) = register(&app, "U1", "u1@example.com").await;
    let (u2_token, u2_id) = register(&app, "U2", "u2@example.com").await;
    let (u3_token, _) = register(&app, "U3", "u3@example.com").await;

    // U1 creates a project and becomes owner + member.
    let (status, json) = send(
        &app,
        "POST",
        "/api/projects",
        Some(&u1_token),
        Some(serde_json::json!({"title": "Apollo"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create project: {json}");
    let project_id = json["project"]["id"].as_str().expect("project id").to_string();
    assert_eq!(json["project"]["members"].as_array().unwrap().len(), 1);

    // U2 is not a member yet: ticket creation is forbidden.
    let (status, json) = send(
        &app,
        "POST",
        "/api/tickets",
        Some(&u2_token),
        Some(serde_json::json!({"projectId": project_id, "title": "Second"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["message"], "Access denied to this project");

    // U1 adds U2; the same request now succeeds.
    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/projects/{project_id}/members"),
        Some(&u1_token),
        Some(serde_json::json!({"userId": u2_id})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = send(
        &app,
        "POST",
        "/api/tickets",
        Some(&u2_token),
        Some(serde_json::json!({"projectId": project_id, "title": "Second"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "member create ticket: {json}");
    assert_eq!(json["ticket"]["status"], "Todo");
    assert_eq!(json["ticket"]["priority"], "Medium");

    // U1 creates a ticket assigned to U2; U3, who has no relation to the
    // project at all, can still move it to Done.
    let (status, json) = send(
        &app,
        "POST",
        "/api/tickets",
        Some(&u1_token),
        Some(serde_json::json!({
            "projectId": project_id,
            "title": "Fix login",
            "assignee": u2_id,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "assigned ticket: {json}");
    let ticket_id = json["ticket"]["id"].as_str().expect("ticket id").to_string();

    let (status, json) = send(
        &app,
        "PUT",
        &format!("/api/tickets/{ticket_id}/status"),
        Some(&u3_token),
        Some(serde_json::json!({"status": "Done"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "status update: {json}");
    assert_eq!(json["ticket"]["status"], "Done");

    db.stop().await.expect("db stop");
}
