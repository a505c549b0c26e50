//! Newsletter subscriber endpoints, including CSV export.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{is_valid_email, SubscribeOutcome, SubscribeRequest, Subscriber};
use crate::AppState;

/// POST /api/subscribers - Newsletter signup.
///
/// A duplicate active subscription is a declined outcome, not an error; a
/// backend failure also degrades to a declined outcome so the signup form
/// never crashes.
pub async fn subscribe(
    State(state): State<AppState>,
    Json(request): Json<SubscribeRequest>,
) -> ApiResult<SubscribeOutcome> {
    let email = request.email.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(AppError::Validation(
            "Please enter a valid email address".to_string(),
        ));
    }

    let outcome = match state.repo.subscribe(&email).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::warn!("Subscription failed for {}: {}", email, e);
            SubscribeOutcome::failed()
        }
    };
    success(outcome)
}

/// GET /api/admin/subscribers - Active subscribers, newest first.
///
/// Fails soft to an empty list so the analytics view still renders.
pub async fn list_subscribers(State(state): State<AppState>) -> ApiResult<Vec<Subscriber>> {
    let subscribers = state
        .repo
        .list_active_subscribers()
        .await
        .unwrap_or_else(|e| {
            tracing::warn!("Subscriber list query failed: {}", e);
            Vec::new()
        });
    success(subscribers)
}

/// POST /api/admin/subscribers/:id/unsubscribe - Deactivate a subscription.
pub async fn unsubscribe(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    state.repo.unsubscribe(&id).await?;
    success(())
}

/// DELETE /api/admin/subscribers/:id - Remove a subscriber record.
pub async fn delete_subscriber(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    state.repo.delete_subscriber(&id).await?;
    success(())
}

/// GET /api/admin/subscribers/export - Current subscriber list as CSV.
pub async fn export_subscribers(State(state): State<AppState>) -> Result<Response, AppError> {
    let subscribers = state.repo.list_active_subscribers().await?;
    let csv = subscribers_csv(&subscribers);

    let filename = format!(
        "newsletter_subscribers_{}.csv",
        super::today_key()
    );
    let disposition = format!("attachment; filename=\"{}\"", filename);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    )
        .into_response())
}

/// Serialize subscribers with columns email, subscription date, status.
fn subscribers_csv(subscribers: &[Subscriber]) -> String {
    let mut out = String::from("email,subscribedAt,status\n");
    for subscriber in subscribers {
        out.push_str(&format!(
            "{},{},{}\n",
            csv_field(&subscriber.email),
            csv_field(&subscriber.subscribed_at),
            if subscriber.active { "active" } else { "inactive" },
        ));
    }
    out
}

/// Quote a field when it contains a separator, quote, or newline.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subscriber(email: &str, active: bool) -> Subscriber {
        Subscriber {
            id: "s1".to_string(),
            email: email.to_string(),
            subscribed_at: "2025-03-01T10:00:00+00:00".to_string(),
            active,
        }
    }

    #[test]
    fn test_csv_header_and_rows() {
        let csv = subscribers_csv(&[subscriber("a@x.com", true)]);
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("email,subscribedAt,status"));
        assert_eq!(
            lines.next(),
            Some("a@x.com,2025-03-01T10:00:00+00:00,active")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_csv_quotes_embedded_separators() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
