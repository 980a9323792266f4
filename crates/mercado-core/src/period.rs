//! # Report Periods
//!
//! The single place where report-window keywords become concrete date
//! ranges. Every reporting operation - sales, profit, cash balance,
//! journal - consumes the same resolver, so "week" means the same thing
//! everywhere.
//!
//! ## Resolution Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  Period::Day    today 00:00          ..  tomorrow 00:00             │
//! │  Period::Week   Monday-of-week 00:00 ..  tomorrow 00:00             │
//! │  Period::Month  1st-of-month 00:00   ..  tomorrow 00:00             │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Ranges are half-open `[start, end)` timestamps. Resolution is a pure
//! function of the reference date, so reports are reproducible given a
//! fixed "today".

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Period
// =============================================================================

/// A report window keyword, resolved relative to a reference date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// Today only.
    Day,
    /// Monday of the current week through today.
    Week,
    /// First of the current month through today.
    Month,
}

impl Period {
    /// Resolves this period against a reference date.
    ///
    /// Pure: the same `today` always yields the same range.
    pub fn resolve(self, today: NaiveDate) -> DateRange {
        let start_date = match self {
            Period::Day => today,
            Period::Week => {
                let back = today.weekday().num_days_from_monday() as u64;
                today.checked_sub_days(Days::new(back)).unwrap_or(today)
            }
            Period::Month => today.with_day(1).unwrap_or(today),
        };
        DateRange::days(start_date, today)
    }

    /// Resolves this period against the current UTC date.
    pub fn current(self) -> DateRange {
        self.resolve(Utc::now().date_naive())
    }
}

// =============================================================================
// Date Range
// =============================================================================

/// A half-open `[start, end)` timestamp window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// Builds the range covering `first` through `last` inclusive, as
    /// calendar days.
    pub fn days(first: NaiveDate, last: NaiveDate) -> Self {
        let end_date = last.checked_add_days(Days::new(1)).unwrap_or(last);
        DateRange {
            start: start_of_day(first),
            end: start_of_day(end_date),
        }
    }

    /// The range covering a single calendar day.
    pub fn single_day(date: NaiveDate) -> Self {
        DateRange::days(date, date)
    }

    /// Whether a timestamp falls inside the window.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at < self.end
    }
}

/// Midnight at the start of a calendar day, in UTC.
fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// The last `n` calendar days ending at `today`, oldest first.
///
/// Used by the daily sales trend.
pub fn last_n_days(today: NaiveDate, n: u32) -> Vec<NaiveDate> {
    (0..n)
        .rev()
        .map(|back| {
            today
                .checked_sub_days(Days::new(back as u64))
                .unwrap_or(today)
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_day_resolves_to_single_day() {
        let range = Period::Day.resolve(date(2026, 8, 19));
        assert_eq!(range.start, Utc.with_ymd_and_hms(2026, 8, 19, 0, 0, 0).unwrap());
        assert_eq!(range.end, Utc.with_ymd_and_hms(2026, 8, 20, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_week_starts_on_monday() {
        // 2026-08-19 is a Wednesday; its week started Monday the 17th.
        let range = Period::Week.resolve(date(2026, 8, 19));
        assert_eq!(range.start, Utc.with_ymd_and_hms(2026, 8, 17, 0, 0, 0).unwrap());
        assert_eq!(range.end, Utc.with_ymd_and_hms(2026, 8, 20, 0, 0, 0).unwrap());

        // On a Monday the week range is just that day.
        let monday = Period::Week.resolve(date(2026, 8, 17));
        assert_eq!(monday.start, Utc.with_ymd_and_hms(2026, 8, 17, 0, 0, 0).unwrap());
        assert_eq!(monday.end, Utc.with_ymd_and_hms(2026, 8, 18, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_month_starts_on_first() {
        let range = Period::Month.resolve(date(2026, 8, 19));
        assert_eq!(range.start, Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap());
        assert_eq!(range.end, Utc.with_ymd_and_hms(2026, 8, 20, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_resolution_is_reproducible() {
        let today = date(2026, 2, 14);
        assert_eq!(Period::Week.resolve(today), Period::Week.resolve(today));
    }

    #[test]
    fn test_contains_is_half_open() {
        let range = Period::Day.resolve(date(2026, 8, 19));
        assert!(range.contains(Utc.with_ymd_and_hms(2026, 8, 19, 0, 0, 0).unwrap()));
        assert!(range.contains(Utc.with_ymd_and_hms(2026, 8, 19, 23, 59, 59).unwrap()));
        assert!(!range.contains(Utc.with_ymd_and_hms(2026, 8, 20, 0, 0, 0).unwrap()));
    }

    #[test]
    fn test_last_n_days_oldest_first() {
        let days = last_n_days(date(2026, 8, 19), 3);
        assert_eq!(days, vec![date(2026, 8, 17), date(2026, 8, 18), date(2026, 8, 19)]);
    }
}
