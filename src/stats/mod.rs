//! Monthly aggregation of timestamped event counts.
//!
//! Both visitor counters and subscriber signups chart as a fixed 12-month
//! series: group records by `YYYY-MM`, always emit January through December in
//! calendar order, zero-filled where no data exists.

use serde::{Deserialize, Serialize};

/// Month labels in calendar order.
pub const MONTH_LABELS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// One bucket of the yearly series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyCount {
    pub month: String,
    pub total: i64,
}

/// Build the 12-entry series for `year` from `(date_key, count)` pairs.
///
/// Date keys must start with `YYYY-MM` (day keys and RFC 3339 timestamps both
/// qualify). Records outside `year` and malformed keys are ignored. The result
/// always has exactly 12 entries, January through December, regardless of
/// which months had data.
pub fn monthly_series<'a, I>(year: i32, records: I) -> Vec<MonthlyCount>
where
    I: IntoIterator<Item = (&'a str, i64)>,
{
    let mut totals = [0i64; 12];

    for (date, count) in records {
        let Some((y, rest)) = date.split_once('-') else {
            continue;
        };
        let Ok(y) = y.parse::<i32>() else {
            continue;
        };
        if y != year {
            continue;
        }
        let Some(month) = rest.get(..2).and_then(|m| m.parse::<usize>().ok()) else {
            continue;
        };
        if !(1..=12).contains(&month) {
            continue;
        }
        totals[month - 1] += count;
    }

    MONTH_LABELS
        .iter()
        .zip(totals)
        .map(|(label, total)| MonthlyCount {
            month: (*label).to_string(),
            total,
        })
        .collect()
}

/// The all-zero series, used as the fail-soft fallback when the backing
/// query fails: the dashboard renders an empty chart instead of crashing.
pub fn zero_series() -> Vec<MonthlyCount> {
    monthly_series(0, std::iter::empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_yields_twelve_zero_months() {
        let series = monthly_series(2024, std::iter::empty());
        assert_eq!(series.len(), 12);
        assert_eq!(series[0].month, "January");
        assert_eq!(series[11].month, "December");
        assert!(series.iter().all(|m| m.total == 0));
    }

    #[test]
    fn test_visitor_day_scenario() {
        let records = [
            ("2025-03-01", 5),
            ("2025-03-15", 3),
            ("2025-06-01", 2),
        ];
        let series = monthly_series(2025, records.iter().copied());

        assert_eq!(series.len(), 12);
        assert_eq!(series[2].month, "March");
        assert_eq!(series[2].total, 8);
        assert_eq!(series[5].month, "June");
        assert_eq!(series[5].total, 2);

        let other: i64 = series
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != 2 && *i != 5)
            .map(|(_, m)| m.total)
            .sum();
        assert_eq!(other, 0);
    }

    #[test]
    fn test_records_outside_year_are_excluded() {
        let records = [("2024-12-31", 7), ("2025-01-01", 1), ("2026-01-01", 9)];
        let series = monthly_series(2025, records.iter().copied());
        assert_eq!(series[0].total, 1);
        assert_eq!(series.iter().map(|m| m.total).sum::<i64>(), 1);
    }

    #[test]
    fn test_sum_of_months_equals_sum_of_counts_in_year() {
        let records = [
            ("2025-01-05", 4),
            ("2025-01-20", 6),
            ("2025-07-04", 1),
            ("2025-12-31", 2),
        ];
        let series = monthly_series(2025, records.iter().copied());
        let total: i64 = series.iter().map(|m| m.total).sum();
        assert_eq!(total, 13);
    }

    #[test]
    fn test_rfc3339_timestamps_bucket_by_month() {
        let records = [
            ("2025-02-10T08:30:00+00:00", 1),
            ("2025-02-28T23:59:59+00:00", 1),
        ];
        let series = monthly_series(2025, records.iter().copied());
        assert_eq!(series[1].month, "February");
        assert_eq!(series[1].total, 2);
    }

    #[test]
    fn test_malformed_keys_are_ignored() {
        let records = [("garbage", 5), ("2025", 5), ("2025-xx-01", 5)];
        let series = monthly_series(2025, records.iter().copied());
        assert!(series.iter().all(|m| m.total == 0));
    }

    #[test]
    fn test_zero_series_shape() {
        let series = zero_series();
        assert_eq!(series.len(), 12);
        assert!(series.iter().all(|m| m.total == 0));
    }
}
