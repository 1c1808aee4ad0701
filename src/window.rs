use anyhow::Result;
use chrono::{Duration, Local, NaiveDate};
use std::fmt;

/// Date range the statistics are requested for.
///
/// `start` is the day being reported on. `end` is exclusive for the daily and
/// hourly rollups and inclusive (midnight) for the detail query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl QueryWindow {
    /// Yesterday and today relative to `today`.
    pub fn ending_on(today: NaiveDate) -> Self {
        Self {
            start: today - Duration::days(1),
            end: today,
        }
    }

    /// Apply explicit overrides on top of the local-clock default.
    pub fn resolve(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Self> {
        Self::resolve_from(Local::now().date_naive(), start, end)
    }

    pub fn resolve_from(
        today: NaiveDate,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Self> {
        let default = Self::ending_on(today);
        let window = Self {
            start: start.unwrap_or(default.start),
            end: end.unwrap_or(default.end),
        };

        if window.end < window.start {
            anyhow::bail!(
                "Window end {} is before window start {}",
                window.end,
                window.start
            );
        }

        Ok(window)
    }

    /// `YYYY-MM-DD` of the first day, used for dates and file names.
    pub fn start_date(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    /// Midnight UTC of the first day, RFC 3339.
    pub fn start_datetime(&self) -> String {
        format!("{}T00:00:00Z", self.start.format("%Y-%m-%d"))
    }

    /// Midnight UTC of the end day, RFC 3339.
    pub fn end_datetime(&self) -> String {
        format!("{}T00:00:00Z", self.end.format("%Y-%m-%d"))
    }
}

impl fmt::Display for QueryWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn default_window_is_yesterday_to_today() {
        let window = QueryWindow::resolve_from(date(2024, 3, 1), None, None).unwrap();
        assert_eq!(window.start, date(2024, 2, 29));
        assert_eq!(window.end, date(2024, 3, 1));
    }

    #[test]
    fn overrides_replace_each_side_independently() {
        let window = QueryWindow::resolve_from(date(2024, 3, 10), Some(date(2024, 3, 1)), None)
            .unwrap();
        assert_eq!(window.start, date(2024, 3, 1));
        assert_eq!(window.end, date(2024, 3, 10));
    }

    #[test]
    fn reversed_window_is_rejected() {
        let result = QueryWindow::resolve_from(
            date(2024, 3, 10),
            Some(date(2024, 3, 5)),
            Some(date(2024, 3, 4)),
        );
        assert!(result.is_err());
    }

    #[test]
    fn formatted_bounds() {
        let window = QueryWindow::ending_on(date(2024, 1, 2));
        assert_eq!(window.start_date(), "2024-01-01");
        assert_eq!(window.start_datetime(), "2024-01-01T00:00:00Z");
        assert_eq!(window.end_datetime(), "2024-01-02T00:00:00Z");
        assert_eq!(window.to_string(), "2024-01-01 to 2024-01-02");
    }
}
