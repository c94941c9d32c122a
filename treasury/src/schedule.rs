//! Monthly windows and the run-day guard.

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use votepower_core::{Error, Result, TreasuryScheduleConfig};

const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// One balance-history request range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Whether the tally should run on `today`.
pub fn is_due(today: NaiveDate, config: &TreasuryScheduleConfig) -> bool {
    today.day() == config.run_day
}

/// Trailing monthly windows ending with the current month, oldest first.
///
/// Each window is anchored on `anchor_day` of its month and covers that single
/// day.
pub fn month_windows(today: NaiveDate, config: &TreasuryScheduleConfig) -> Result<Vec<MonthWindow>> {
    let first_of_month = today.with_day(1).unwrap_or(today);

    (0..config.window_count)
        .rev()
        .map(|back| {
            let month = first_of_month
                .checked_sub_months(Months::new(back))
                .ok_or_else(|| Error::Config(format!("{} months before {} is out of range", back, today)))?;
            let anchor = month.with_day(config.anchor_day).ok_or_else(|| {
                Error::Config(format!(
                    "anchor day {} is not valid for {}",
                    config.anchor_day,
                    month.format("%Y-%m")
                ))
            })?;
            Ok(MonthWindow {
                start: anchor,
                end: anchor,
            })
        })
        .collect()
}

/// Lowercase English month name, independent of locale.
pub fn month_name(date: NaiveDate) -> &'static str {
    MONTH_NAMES[date.month0() as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_is_due_only_on_run_day() {
        let config = TreasuryScheduleConfig::default();
        assert!(is_due(date(2024, 3, 2), &config));
        assert!(!is_due(date(2024, 3, 1), &config));
        assert!(!is_due(date(2024, 3, 3), &config));
    }

    #[test]
    fn test_windows_cross_year_boundary() {
        let config = TreasuryScheduleConfig::default();
        let windows = month_windows(date(2024, 3, 2), &config).unwrap();

        assert_eq!(windows.len(), 7);
        assert_eq!(windows[0].start, date(2023, 9, 3));
        assert_eq!(windows[3].start, date(2023, 12, 3));
        assert_eq!(windows[4].start, date(2024, 1, 3));
        assert_eq!(windows[6].start, date(2024, 3, 3));
        assert!(windows.iter().all(|w| w.start == w.end));
    }

    #[test]
    fn test_invalid_anchor_is_config_error() {
        let config = TreasuryScheduleConfig {
            anchor_day: 31,
            ..Default::default()
        };
        let result = month_windows(date(2024, 3, 2), &config);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_month_name() {
        assert_eq!(month_name(date(2024, 1, 15)), "january");
        assert_eq!(month_name(date(2023, 12, 3)), "december");
    }
}
