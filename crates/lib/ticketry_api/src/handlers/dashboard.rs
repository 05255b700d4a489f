//! Dashboard request handlers.

use axum::Json;
use axum::extract::{Query, State};

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::CurrentUser;
use crate::models::{BarPoint, ChartResponse, LinePoint, ProjectScopeQuery, StatsResponse};
use ticketry_core::tracker::dashboard;
use ticketry_core::tracker::tickets::TicketStatus;

/// `GET /api/dashboard/stats?projectId=` — counts of the requester's
/// tickets grouped by status.
pub async fn stats_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<CurrentUser>,
    Query(query): Query<ProjectScopeQuery>,
) -> AppResult<Json<StatsResponse>> {
    let counts = dashboard::stats(&state.pool, &user.id, query.project_filter()).await?;
    Ok(Json(counts.into()))
}

/// `GET /api/dashboard/chart?projectId=` — the trailing 7-day creation
/// series and the status distribution.
pub async fn chart_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<CurrentUser>,
    Query(query): Query<ProjectScopeQuery>,
) -> AppResult<Json<ChartResponse>> {
    let (series, counts) =
        dashboard::chart(&state.pool, &user.id, query.project_filter()).await?;

    let bar_chart = vec![
        BarPoint {
            status: TicketStatus::Todo.label().to_string(),
            count: counts.todo,
        },
        BarPoint {
            status: TicketStatus::InProgress.label().to_string(),
            count: counts.in_progress,
        },
        BarPoint {
            status: TicketStatus::Done.label().to_string(),
            count: counts.done,
        },
    ];

    Ok(Json(ChartResponse {
        line_chart: series.into_iter().map(LinePoint::from).collect(),
        bar_chart,
    }))
}
