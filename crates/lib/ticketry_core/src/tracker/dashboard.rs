//! Dashboard aggregates: status counts and the 7-day creation series.
//!
//! Day bucketing uses UTC calendar days so the series is reproducible
//! regardless of server locale.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::tickets::TicketStatus;
use super::TrackerError;

/// Ticket counts grouped by status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct StatusCounts {
    pub total: i64,
    pub todo: i64,
    pub in_progress: i64,
    pub done: i64,
}

/// One day of the creation-trend series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayCount {
    pub date: NaiveDate,
    pub tickets: i64,
}

/// Build the trailing 7-day series ending at `today`, oldest first,
/// zero-filled. Creation timestamps outside the window are ignored.
pub fn daily_series(today: NaiveDate, created: &[DateTime<Utc>]) -> Vec<DayCount> {
    let mut series: Vec<DayCount> = (0..7)
        .map(|i| DayCount {
            date: today - Duration::days(6 - i),
            tickets: 0,
        })
        .collect();

    for ts in created {
        let day = ts.date_naive();
        if let Some(entry) = series.iter_mut().find(|e| e.date == day) {
            entry.tickets += 1;
        }
    }
    series
}

async fn status_counts(
    pool: &PgPool,
    requester: &Uuid,
    project_id: Option<Uuid>,
) -> Result<StatusCounts, TrackerError> {
    let counts = sqlx::query_as::<_, StatusCounts>(
        "SELECT COUNT(*) AS total, \
                COUNT(*) FILTER (WHERE status = $3) AS todo, \
                COUNT(*) FILTER (WHERE status = $4) AS in_progress, \
                COUNT(*) FILTER (WHERE status = $5) AS done \
         FROM tickets \
         WHERE created_by = $1 AND ($2::uuid IS NULL OR project_id = $2)",
    )
    .bind(requester)
    .bind(project_id)
    .bind(TicketStatus::Todo.as_str())
    .bind(TicketStatus::InProgress.as_str())
    .bind(TicketStatus::Done.as_str())
    .fetch_one(pool)
    .await?;
    Ok(counts)
}

/// Status counts over the requester's tickets, optionally scoped to one
/// project.
pub async fn stats(
    pool: &PgPool,
    requester: &Uuid,
    project_id: Option<Uuid>,
) -> Result<StatusCounts, TrackerError> {
    status_counts(pool, requester, project_id).await
}

/// Chart data: the 7-day creation series (built from a 30-day window) and
/// the status distribution over all matching tickets.
pub async fn chart(
    pool: &PgPool,
    requester: &Uuid,
    project_id: Option<Uuid>,
) -> Result<(Vec<DayCount>, StatusCounts), TrackerError> {
    let created = sqlx::query_scalar::<_, DateTime<Utc>>(
        "SELECT created_at FROM tickets \
         WHERE created_by = $1 AND ($2::uuid IS NULL OR project_id = $2) \
           AND created_at >= now() - interval '30 days' \
         ORDER BY created_at ASC",
    )
    .bind(requester)
    .bind(project_id)
    .fetch_all(pool)
    .await?;

    let series = daily_series(Utc::now().date_naive(), &created);
    let counts = status_counts(pool, requester, project_id).await?;
    Ok((series, counts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn empty_series_is_seven_zeros_ending_today() {
        let today = day(2026, 8, 29);
        let series = daily_series(today, &[]);

        assert_eq!(series.len(), 7);
        assert_eq!(series.first().unwrap().date, day(2026, 8, 23));
        assert_eq!(series.last().unwrap().date, today);
        assert!(series.iter().all(|e| e.tickets == 0));
        // oldest to newest
        assert!(series.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn creations_bucket_by_utc_day() {
        let today = day(2026, 8, 29);
        let created = vec![
            at(2026, 8, 29, 0),
            at(2026, 8, 29, 23),
            at(2026, 8, 27, 12),
        ];
        let series = daily_series(today, &created);

        assert_eq!(series[6].tickets, 2);
        assert_eq!(series[4].tickets, 1);
        assert_eq!(series.iter().map(|e| e.tickets).sum::<i64>(), 3);
    }

    #[test]
    fn creations_outside_window_are_ignored() {
        let today = day(2026, 8, 29);
        // 10 days old: within the 30-day fetch window but outside the series
        let series = daily_series(today, &[at(2026, 8, 19, 9), at(2026, 9, 1, 9)]);
        assert!(series.iter().all(|e| e.tickets == 0));
    }
}
