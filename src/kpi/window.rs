use chrono::{DateTime, Duration, Utc};

/// Window applied when the caller omits `from`: the last 30 days ending now.
pub const DEFAULT_WINDOW_DAYS: i64 = 30;

/// A concrete reporting window. Both endpoints are inclusive when filtering
/// (`created_at BETWEEN start AND end`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ReportWindow {
    /// Resolve optional `from`/`to` into a concrete window.
    ///
    /// Absent `from` defaults to `now - 30 days`, absent `to` to `now`, where
    /// `now` is read at call time. Ordering is deliberately not validated: an
    /// inverted window passes through unchanged and simply matches nothing.
    pub fn normalize(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        Self {
            start: from.unwrap_or_else(|| Utc::now() - Duration::days(DEFAULT_WINDOW_DAYS)),
            end: to.unwrap_or_else(Utc::now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_last_30_days_ending_now() {
        let before = Utc::now();
        let window = ReportWindow::normalize(None, None);
        let after = Utc::now();

        assert!(window.end >= before && window.end <= after);
        let span = window.end - window.start;
        // Tolerate the two independent clock reads inside normalize().
        assert!((span - Duration::days(DEFAULT_WINDOW_DAYS)).num_seconds().abs() <= 1);
    }

    #[test]
    fn explicit_endpoints_pass_through() {
        let from = Utc::now() - Duration::days(7);
        let to = Utc::now() - Duration::days(1);
        let window = ReportWindow::normalize(Some(from), Some(to));
        assert_eq!(window.start, from);
        assert_eq!(window.end, to);
    }

    #[test]
    fn inverted_window_is_not_rejected() {
        let from = Utc::now();
        let to = from - Duration::days(3);
        let window = ReportWindow::normalize(Some(from), Some(to));
        assert!(window.start > window.end);
    }
}
