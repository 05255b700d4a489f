//! # ticketry_api
//!
//! HTTP API library for Ticketry.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use axum::Router;
use axum::routing::{delete, get, post, put};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};

use crate::config::ApiConfig;
use crate::handlers::{auth, comments, dashboard, health, notifications, projects, tickets, users};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool.
    pub pool: PgPool,
    /// API configuration.
    pub config: ApiConfig,
}

/// Run embedded database migrations.
///
/// Delegates to `ticketry_core::migrate::migrate()` which owns the migration
/// files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    ticketry_core::migrate::migrate(pool).await
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let public = Router::new()
        .route("/api/health", get(health::health_handler))
        .route("/api/auth/register", post(auth::register_handler))
        .route("/api/auth/login", post(auth::login_handler))
        .route("/api/auth/refresh", post(auth::refresh_handler))
        .route("/api/auth/logout", post(auth::logout_handler));

    // Protected routes (require auth)
    let protected = Router::new()
        .route(
            "/api/projects",
            post(projects::create_project_handler).get(projects::list_projects_handler),
        )
        .route(
            "/api/projects/{id}",
            get(projects::get_project_handler)
                .put(projects::update_project_handler)
                .delete(projects::delete_project_handler),
        )
        .route(
            "/api/projects/{id}/members",
            post(projects::add_member_handler).delete(projects::remove_member_handler),
        )
        .route("/api/tickets", post(tickets::create_ticket_handler))
        .route("/api/tickets/all", get(tickets::all_user_tickets_handler))
        .route("/api/tickets/kanban", get(tickets::kanban_handler))
        .route(
            "/api/tickets/project/{project_id}",
            get(tickets::project_tickets_handler),
        )
        .route(
            "/api/tickets/{id}",
            put(tickets::update_ticket_handler).delete(tickets::delete_ticket_handler),
        )
        .route("/api/tickets/{id}/status", put(tickets::update_status_handler))
        .route("/api/tickets/{id}/assign", put(tickets::assign_ticket_handler))
        .route("/api/comments", post(comments::create_comment_handler))
        .route(
            "/api/comments/ticket/{ticket_id}",
            get(comments::ticket_comments_handler),
        )
        .route(
            "/api/comments/{id}",
            put(comments::update_comment_handler).delete(comments::delete_comment_handler),
        )
        .route(
            "/api/notifications",
            get(notifications::list_notifications_handler),
        )
        .route(
            "/api/notifications/read-all",
            put(notifications::mark_all_read_handler),
        )
        .route(
            "/api/notifications/{id}/read",
            put(notifications::mark_read_handler),
        )
        .route(
            "/api/notifications/{id}",
            delete(notifications::delete_notification_handler),
        )
        .route("/api/dashboard/stats", get(dashboard::stats_handler))
        .route("/api/dashboard/chart", get(dashboard::chart_handler))
        .route("/api/users", get(users::list_users_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(cors)
        .with_state(state)
}
