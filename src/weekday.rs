//! Weekday grouping
//!
//! Buckets the recent part of a daily series by day of the week and averages
//! each bucket. Output is always in Sunday-first week order so charts render
//! the same way on every call; weekdays with no points are left out.

use crate::types::{Series, WeekdayBucket};
use chrono::{Duration, Weekday};
use tracing::debug;

/// Default grouping window in calendar days
pub const DEFAULT_WEEKDAY_WINDOW_DAYS: u32 = 28;

/// Canonical week order used for output
pub const WEEK_ORDER: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

/// Groups a series by weekday
pub struct WeekdayGrouper;

impl WeekdayGrouper {
    /// Mean value per weekday over the most recent `window_days` calendar days.
    ///
    /// The window ends at the latest point of the series, so results do not
    /// depend on the wall clock.
    pub fn weekday_averages(series: &Series, window_days: u32) -> Vec<WeekdayBucket> {
        let Some(latest) = series.latest() else {
            return Vec::new();
        };
        if window_days == 0 {
            return Vec::new();
        }

        // `since` is inclusive of both ends, so step back one day less
        let window = series.since(latest.date, window_days - 1);

        let mut sums = [0.0f64; 7];
        let mut counts = [0usize; 7];
        for point in window {
            let slot = point.weekday().num_days_from_sunday() as usize;
            sums[slot] += point.value;
            counts[slot] += 1;
        }

        let buckets: Vec<WeekdayBucket> = WEEK_ORDER
            .iter()
            .enumerate()
            .filter(|(slot, _)| counts[*slot] > 0)
            .map(|(slot, weekday)| WeekdayBucket {
                weekday: *weekday,
                mean_value: sums[slot] / counts[slot] as f64,
                days: counts[slot],
            })
            .collect();

        debug!(
            window_points = window.len(),
            buckets = buckets.len(),
            window_start = ?latest
                .date
                .checked_sub_signed(Duration::days(i64::from(window_days - 1))),
            "computed weekday averages"
        );

        buckets
    }

    /// Bucket for `weekday`, if the window contained any points for it
    pub fn bucket_for(buckets: &[WeekdayBucket], weekday: Weekday) -> Option<&WeekdayBucket> {
        buckets.iter().find(|b| b.weekday == weekday)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DailyPoint;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// 2024-01-01 is a Monday
    fn daily_series(days: u32, value: impl Fn(u32) -> f64) -> Series {
        let start = date(2024, 1, 1);
        let points = (0..days)
            .map(|i| DailyPoint::new(start + Duration::days(i64::from(i)), value(i)))
            .collect();
        Series::from_points(points).unwrap()
    }

    #[test]
    fn test_canonical_order_sunday_first() {
        let series = daily_series(14, |i| i as f64);
        let buckets = WeekdayGrouper::weekday_averages(&series, 28);

        let order: Vec<Weekday> = buckets.iter().map(|b| b.weekday).collect();
        assert_eq!(order, WEEK_ORDER.to_vec());
    }

    #[test]
    fn test_mean_per_weekday() {
        // Mondays are day 0 and day 7
        let series = daily_series(14, |i| i as f64);
        let buckets = WeekdayGrouper::weekday_averages(&series, 28);

        let monday = WeekdayGrouper::bucket_for(&buckets, Weekday::Mon).unwrap();
        assert_eq!(monday.days, 2);
        assert!((monday.mean_value - 3.5).abs() < 1e-9);
    }

    #[test]
    fn test_missing_weekdays_omitted() {
        // Monday, Wednesday, Friday only
        let series = Series::from_points(vec![
            DailyPoint::new(date(2024, 1, 1), 100.0),
            DailyPoint::new(date(2024, 1, 3), 200.0),
            DailyPoint::new(date(2024, 1, 5), 300.0),
        ])
        .unwrap();

        let buckets = WeekdayGrouper::weekday_averages(&series, 28);
        let order: Vec<Weekday> = buckets.iter().map(|b| b.weekday).collect();
        assert_eq!(order, vec![Weekday::Mon, Weekday::Wed, Weekday::Fri]);
        assert!(WeekdayGrouper::bucket_for(&buckets, Weekday::Sun).is_none());
    }

    #[test]
    fn test_window_excludes_old_points() {
        // 35 days: the first 7 fall outside a 28-day window
        let series = daily_series(35, |i| if i < 7 { 1000.0 } else { 10.0 });
        let buckets = WeekdayGrouper::weekday_averages(&series, 28);

        assert_eq!(buckets.len(), 7);
        for bucket in &buckets {
            assert_eq!(bucket.days, 4);
            assert!((bucket.mean_value - 10.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_window_counts_calendar_days_not_points() {
        // Two points 30 days apart: only the latest is inside 28 days
        let series = Series::from_points(vec![
            DailyPoint::new(date(2024, 1, 1), 5.0),
            DailyPoint::new(date(2024, 1, 31), 7.0),
        ])
        .unwrap();

        let buckets = WeekdayGrouper::weekday_averages(&series, 28);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].weekday, Weekday::Wed);
    }

    #[test]
    fn test_empty_series_and_zero_window() {
        assert!(WeekdayGrouper::weekday_averages(&Series::default(), 28).is_empty());

        let series = daily_series(3, |_| 1.0);
        assert!(WeekdayGrouper::weekday_averages(&series, 0).is_empty());
    }

    #[test]
    fn test_huge_window_covers_whole_series() {
        let series = daily_series(10, |_| 2.0);
        let buckets = WeekdayGrouper::weekday_averages(&series, u32::MAX);

        assert_eq!(buckets.len(), 7);
        let days: usize = buckets.iter().map(|b| b.days).sum();
        assert_eq!(days, 10);
    }

    #[test]
    fn test_stable_across_calls() {
        let series = daily_series(20, |i| (i * 37 % 11) as f64);
        let first = WeekdayGrouper::weekday_averages(&series, 28);
        let second = WeekdayGrouper::weekday_averages(&series, 28);
        assert_eq!(first, second);
    }
}
