//! Newsletter subscriber model.

use serde::{Deserialize, Serialize};

/// A newsletter subscriber.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscriber {
    pub id: String,
    pub email: String,
    pub subscribed_at: String,
    pub active: bool,
}

/// Request body for a newsletter signup.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscribeRequest {
    pub email: String,
}

/// Outcome of a signup attempt.
///
/// A duplicate subscription is a declined outcome, not an error: the call
/// succeeds and carries a user-facing message either way.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeOutcome {
    pub subscribed: bool,
    pub message: String,
}

impl SubscribeOutcome {
    pub fn created() -> Self {
        Self {
            subscribed: true,
            message: "Thank you for subscribing! You will receive our next newsletters."
                .to_string(),
        }
    }

    pub fn reactivated() -> Self {
        Self {
            subscribed: true,
            message: "Your subscription has been reactivated.".to_string(),
        }
    }

    pub fn already_subscribed() -> Self {
        Self {
            subscribed: false,
            message: "This email is already subscribed to the newsletter.".to_string(),
        }
    }

    pub fn failed() -> Self {
        Self {
            subscribed: false,
            message: "Something went wrong. Please try again.".to_string(),
        }
    }
}

/// Minimal email shape check: one `@`, no whitespace, dotted domain.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((name, tld)) => !name.is_empty() && !tld.is_empty(),
        None => false,
    }
}
