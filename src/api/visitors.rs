//! Visitor tracking and analytics endpoints.

use axum::{
    extract::{Query, State},
    http::StatusCode,
};
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};

use super::{success, ApiResult};
use crate::stats::{self, MonthlyCount};
use crate::AppState;

/// Today's day key (`YYYY-MM-DD`, UTC).
pub fn today_key() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

/// Year selector for the stats endpoints; defaults to the current year.
#[derive(Debug, Deserialize)]
pub struct YearQuery {
    pub year: Option<i32>,
}

impl YearQuery {
    fn resolve(&self) -> i32 {
        self.year.unwrap_or_else(|| Utc::now().year())
    }
}

/// POST /api/visits - Record one page view for today.
///
/// Tracking must never break page rendering: failures are logged and the
/// endpoint always answers 204.
pub async fn track_visit(State(state): State<AppState>) -> StatusCode {
    if let Err(e) = state.repo.track_visit(&today_key()).await {
        tracing::warn!("Visit tracking failed: {}", e);
    }
    StatusCode::NO_CONTENT
}

/// GET /api/admin/stats/visitors?year= - Monthly visitor series for a year.
///
/// Fails soft: a backend error yields the all-zero series so the dashboard
/// still renders.
pub async fn visitor_stats(
    State(state): State<AppState>,
    Query(query): Query<YearQuery>,
) -> ApiResult<Vec<MonthlyCount>> {
    let year = query.resolve();
    let series = match state
        .repo
        .visitor_days_between(&year_start(year), &year_start(year + 1))
        .await
    {
        Ok(days) => stats::monthly_series(year, days.iter().map(|d| (d.date.as_str(), d.count))),
        Err(e) => {
            tracing::warn!("Visitor stats query failed for {}: {}", year, e);
            stats::zero_series()
        }
    };
    success(series)
}

/// GET /api/admin/stats/subscribers?year= - Monthly signup series for a year.
pub async fn subscriber_stats(
    State(state): State<AppState>,
    Query(query): Query<YearQuery>,
) -> ApiResult<Vec<MonthlyCount>> {
    let year = query.resolve();
    let series = match state
        .repo
        .subscribers_between(&year_start(year), &year_start(year + 1))
        .await
    {
        Ok(subscribers) => stats::monthly_series(
            year,
            subscribers.iter().map(|s| (s.subscribed_at.as_str(), 1)),
        ),
        Err(e) => {
            tracing::warn!("Subscriber stats query failed for {}: {}", year, e);
            stats::zero_series()
        }
    };
    success(series)
}

/// Headline numbers for the analytics dashboard.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    pub total_visitors: i64,
    pub today_visitors: i64,
    pub total_subscribers: i64,
    /// Years with any visitor or signup data, descending.
    pub years: Vec<i32>,
}

/// GET /api/admin/stats/summary - Dashboard totals. Each figure fails soft
/// to zero/empty on backend errors.
pub async fn stats_summary(State(state): State<AppState>) -> ApiResult<StatsSummary> {
    let total_visitors = state.repo.total_visitors().await.unwrap_or_else(|e| {
        tracing::warn!("Total visitors query failed: {}", e);
        0
    });
    let today_visitors = state.repo.visitors_on(&today_key()).await.unwrap_or_else(|e| {
        tracing::warn!("Today visitors query failed: {}", e);
        0
    });
    let total_subscribers = state
        .repo
        .total_active_subscribers()
        .await
        .unwrap_or_else(|e| {
            tracing::warn!("Subscriber count query failed: {}", e);
            0
        });

    let mut years = state.repo.visitor_years().await.unwrap_or_default();
    for year in state.repo.subscriber_years().await.unwrap_or_default() {
        if !years.contains(&year) {
            years.push(year);
        }
    }
    years.sort_unstable_by(|a, b| b.cmp(a));
    if years.is_empty() {
        years.push(Utc::now().year());
    }

    success(StatsSummary {
        total_visitors,
        today_visitors,
        total_subscribers,
        years,
    })
}

fn year_start(year: i32) -> String {
    format!("{:04}-01-01", year)
}
