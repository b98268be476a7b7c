//! Series aggregation
//!
//! This module turns raw, irregularly sampled observations into one point per
//! calendar day and computes rolling-window statistics over the result:
//! - Per-day reduction by sum, latest value, or mean
//! - Window mean/min/max over the most recent N points
//!
//! Calendar days are resolved in the caller's time zone, so the same samples
//! can land on different days for different users.

use crate::error::ComputeError;
use crate::types::{AggregationPolicy, DailyPoint, Sample, Series, WindowStats};
use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Aggregator for building daily series from raw samples
pub struct SeriesAggregator;

impl SeriesAggregator {
    /// Group samples by calendar day in `tz` and reduce each day with `policy`.
    ///
    /// Input order does not matter. Non-finite values are dropped. Empty input
    /// yields an empty series.
    pub fn aggregate<Tz: TimeZone>(
        samples: &[Sample],
        policy: AggregationPolicy,
        tz: &Tz,
    ) -> Series {
        let mut by_day: BTreeMap<NaiveDate, DayAccumulator> = BTreeMap::new();
        let mut dropped = 0usize;

        for sample in samples {
            if !sample.value.is_finite() {
                dropped += 1;
                continue;
            }
            let date = sample.timestamp.with_timezone(tz).date_naive();
            by_day.entry(date).or_default().add(sample);
        }

        if dropped > 0 {
            warn!(dropped, "dropped non-finite samples during aggregation");
        }

        let points: Vec<DailyPoint> = by_day
            .into_iter()
            .map(|(date, acc)| DailyPoint::new(date, acc.reduce(policy)))
            .collect();

        debug!(
            samples = samples.len(),
            days = points.len(),
            ?policy,
            "aggregated samples into daily points"
        );

        Series::from_sorted_unchecked(points)
    }

    /// Aggregate using the device's local calendar
    pub fn aggregate_local(samples: &[Sample], policy: AggregationPolicy) -> Series {
        Self::aggregate(samples, policy, &Local)
    }
}

/// Running per-day totals
#[derive(Default)]
struct DayAccumulator {
    sum: f64,
    count: usize,
    latest: Option<(DateTime<Utc>, f64)>,
}

impl DayAccumulator {
    fn add(&mut self, sample: &Sample) {
        self.sum += sample.value;
        self.count += 1;
        // Later input wins on equal timestamps
        match self.latest {
            Some((ts, _)) if ts > sample.timestamp => {}
            _ => self.latest = Some((sample.timestamp, sample.value)),
        }
    }

    fn reduce(&self, policy: AggregationPolicy) -> f64 {
        match policy {
            AggregationPolicy::Sum => self.sum,
            AggregationPolicy::Mean => self.sum / self.count as f64,
            AggregationPolicy::Latest => self.latest.map(|(_, v)| v).unwrap_or(self.sum),
        }
    }
}

/// Mean of the last `n` points, or of all points if the series is shorter.
///
/// An empty window has a mean of 0; use [`window_stats`] or
/// [`try_window_mean`] when "no data" must be told apart from a real zero.
pub fn window_mean(series: &Series, n: usize) -> f64 {
    mean(series.last_n(n)).unwrap_or(0.0)
}

/// Mean of the last `n` points, failing on an empty window
pub fn try_window_mean(series: &Series, n: usize) -> Result<f64, ComputeError> {
    mean(series.last_n(n))
        .ok_or_else(|| ComputeError::EmptyInput(format!("no points in a window of {n}")))
}

/// Minimum of the last `n` points; `None` when the window is empty
pub fn window_min(series: &Series, n: usize) -> Option<f64> {
    series.last_n(n).iter().map(|p| p.value).reduce(f64::min)
}

/// Maximum of the last `n` points; `None` when the window is empty
pub fn window_max(series: &Series, n: usize) -> Option<f64> {
    series.last_n(n).iter().map(|p| p.value).reduce(f64::max)
}

/// Mean, min and max of the last `n` points in one pass
pub fn window_stats(series: &Series, n: usize) -> WindowStats {
    let window = series.last_n(n);
    if window.is_empty() {
        return WindowStats::empty();
    }

    let (sum, min, max) = window.iter().fold(
        (0.0, f64::INFINITY, f64::NEG_INFINITY),
        |(sum, min, max), p| (sum + p.value, min.min(p.value), max.max(p.value)),
    );

    WindowStats {
        count: window.len(),
        mean: sum / window.len() as f64,
        min: Some(min),
        max: Some(max),
    }
}

fn mean(points: &[DailyPoint]) -> Option<f64> {
    if points.is_empty() {
        return None;
    }
    let sum: f64 = points.iter().map(|p| p.value).sum();
    Some(sum / points.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveDate};
    use pretty_assertions::assert_eq;

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn series(values: &[f64]) -> Series {
        let points = values
            .iter()
            .enumerate()
            .map(|(i, v)| DailyPoint::new(day(i as u32 + 1), *v))
            .collect();
        Series::from_points(points).unwrap()
    }

    #[test]
    fn test_sum_policy_single_day() {
        let samples = vec![
            Sample::new(ts("2024-01-15T08:00:00Z"), 100.0),
            Sample::new(ts("2024-01-15T18:00:00Z"), 200.0),
        ];

        let result = SeriesAggregator::aggregate(&samples, AggregationPolicy::Sum, &Utc);

        assert_eq!(
            result.points(),
            &[DailyPoint::new(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(), 300.0)]
        );
    }

    #[test]
    fn test_latest_and_mean_policies() {
        let samples = vec![
            Sample::new(ts("2024-01-15T18:00:00Z"), 72.0),
            Sample::new(ts("2024-01-15T08:00:00Z"), 70.0),
            Sample::new(ts("2024-01-15T12:00:00Z"), 80.0),
        ];

        let latest = SeriesAggregator::aggregate(&samples, AggregationPolicy::Latest, &Utc);
        assert_eq!(latest.points()[0].value, 72.0);

        let mean = SeriesAggregator::aggregate(&samples, AggregationPolicy::Mean, &Utc);
        assert!((mean.points()[0].value - 74.0).abs() < 1e-9);
    }

    #[test]
    fn test_unordered_input_sorted_by_day() {
        let samples = vec![
            Sample::new(ts("2024-01-17T10:00:00Z"), 3.0),
            Sample::new(ts("2024-01-15T10:00:00Z"), 1.0),
            Sample::new(ts("2024-01-16T10:00:00Z"), 2.0),
        ];

        let result = SeriesAggregator::aggregate(&samples, AggregationPolicy::Sum, &Utc);
        let values: Vec<f64> = result.values().collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_days_follow_time_zone() {
        // 23:30 UTC is already the next day at UTC+02:00
        let samples = vec![
            Sample::new(ts("2024-01-15T10:00:00Z"), 1.0),
            Sample::new(ts("2024-01-15T23:30:00Z"), 1.0),
        ];

        let utc = SeriesAggregator::aggregate(&samples, AggregationPolicy::Sum, &Utc);
        assert_eq!(utc.len(), 1);

        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let shifted = SeriesAggregator::aggregate(&samples, AggregationPolicy::Sum, &plus_two);
        assert_eq!(shifted.len(), 2);
    }

    #[test]
    fn test_empty_input() {
        let result = SeriesAggregator::aggregate(&[], AggregationPolicy::Sum, &Utc);
        assert!(result.is_empty());
    }

    #[test]
    fn test_non_finite_samples_dropped() {
        let samples = vec![
            Sample::new(ts("2024-01-15T10:00:00Z"), f64::NAN),
            Sample::new(ts("2024-01-15T11:00:00Z"), 5.0),
        ];
        let result = SeriesAggregator::aggregate(&samples, AggregationPolicy::Sum, &Utc);
        assert_eq!(result.points()[0].value, 5.0);
    }

    #[test]
    fn test_window_mean_shorter_series() {
        let s = series(&[10.0, 20.0, 30.0]);
        assert!((window_mean(&s, 28) - 20.0).abs() < 1e-9);
        assert!((window_mean(&s, 2) - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_window_min_max() {
        let s = series(&[5.0, 1.0, 9.0, 4.0]);
        assert_eq!(window_min(&s, 28), Some(1.0));
        assert_eq!(window_max(&s, 28), Some(9.0));
        assert_eq!(window_min(&s, 2), Some(4.0));
    }

    #[test]
    fn test_empty_window_reports_no_data() {
        let empty = Series::default();
        assert_eq!(window_mean(&empty, 28), 0.0);
        assert_eq!(window_min(&empty, 28), None);
        assert_eq!(window_max(&empty, 28), None);
        assert!(try_window_mean(&empty, 28).is_err());

        let stats = window_stats(&empty, 28);
        assert!(!stats.has_data());
    }

    #[test]
    fn test_zero_values_are_data() {
        let s = series(&[0.0, 0.0]);
        let stats = window_stats(&s, 28);
        assert!(stats.has_data());
        assert_eq!(stats.min, Some(0.0));
        assert_eq!(try_window_mean(&s, 28).unwrap(), 0.0);
    }

    #[test]
    fn test_window_stats_matches_individual_reductions() {
        let s = series(&[3.0, 8.0, 2.0, 7.0]);
        let stats = window_stats(&s, 3);
        assert_eq!(stats.count, 3);
        assert!((stats.mean - window_mean(&s, 3)).abs() < 1e-12);
        assert_eq!(stats.min, window_min(&s, 3));
        assert_eq!(stats.max, window_max(&s, 3));
    }
}
