//! Health check handler.

use axum::Json;
use chrono::Utc;

/// `GET /api/health` — liveness probe, no auth required.
pub async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Ticketry API running",
        "status": "active",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
