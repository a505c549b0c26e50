//! Visitor day-counter model.

use serde::{Deserialize, Serialize};

/// One page-view counter per calendar date (`YYYY-MM-DD`), at most one row per date.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorDay {
    pub id: String,
    pub date: String,
    pub count: i64,
}
