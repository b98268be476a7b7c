//! Proportional partitioning
//!
//! Divides a full circle among weighted items for donut-style charts. Spans
//! are laid out in input order with a running angle, so the last slice ends
//! at 360° up to floating-point rounding.

use crate::types::{AngularSlice, DailyPoint, WeekdayBucket};
use tracing::debug;

/// Degrees in a full circle
pub const FULL_CIRCLE_DEGREES: f64 = 360.0;

/// Items that carry a weight for partitioning
pub trait Weighted {
    fn weight(&self) -> f64;
}

impl Weighted for DailyPoint {
    fn weight(&self) -> f64 {
        self.value
    }
}

impl Weighted for WeekdayBucket {
    fn weight(&self) -> f64 {
        self.mean_value
    }
}

impl<T: Weighted + ?Sized> Weighted for &T {
    fn weight(&self) -> f64 {
        (**self).weight()
    }
}

/// Split 360° among `items` proportionally to their weights.
///
/// Negative and non-finite weights count as zero. When the total weight is
/// zero every slice has a zero span at angle 0.
pub fn partition<T: Weighted + Clone>(items: &[T]) -> Vec<AngularSlice<T>> {
    let total: f64 = items.iter().map(effective_weight).sum();

    let mut current = 0.0;
    let slices: Vec<AngularSlice<T>> = items
        .iter()
        .map(|item| {
            let span = if total > 0.0 {
                FULL_CIRCLE_DEGREES * effective_weight(item) / total
            } else {
                0.0
            };
            let slice = AngularSlice {
                item: item.clone(),
                start_angle: current,
                end_angle: current + span,
            };
            current += span;
            slice
        })
        .collect();

    debug!(items = items.len(), total, "partitioned items into slices");
    slices
}

/// Slice covering `degrees`, measured clockwise from the top of the circle.
///
/// Angles outside `[0, 360)` wrap around. Zero-span slices never match.
pub fn slice_at<T>(slices: &[AngularSlice<T>], degrees: f64) -> Option<&AngularSlice<T>> {
    if !degrees.is_finite() {
        return None;
    }
    let angle = degrees.rem_euclid(FULL_CIRCLE_DEGREES);
    slices
        .iter()
        .find(|s| s.contains(angle))
        // Rounding can leave the final end a hair below 360
        .or_else(|| slices.iter().rev().find(|s| s.span() > 0.0 && angle >= s.start_angle))
}

fn effective_weight<T: Weighted>(item: &T) -> f64 {
    let w = item.weight();
    if w.is_finite() && w > 0.0 {
        w
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn points(values: &[f64]) -> Vec<DailyPoint> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, v)| DailyPoint::new(start + Duration::days(i as i64), *v))
            .collect()
    }

    #[test]
    fn test_spans_sum_to_full_circle() {
        let items = points(&[8123.0, 6402.0, 9981.0, 7344.0, 5012.0, 11020.0, 4377.0]);
        let slices = partition(&items);

        let total: f64 = slices.iter().map(|s| s.span()).sum();
        assert!((total - 360.0).abs() < 1e-6);
        assert!((slices.last().unwrap().end_angle - 360.0).abs() < 1e-6);
    }

    #[test]
    fn test_slices_contiguous_in_input_order() {
        let items = points(&[1.0, 3.0, 2.0]);
        let slices = partition(&items);

        assert_eq!(slices[0].start_angle, 0.0);
        for pair in slices.windows(2) {
            assert_eq!(pair[0].end_angle, pair[1].start_angle);
        }
        assert!((slices[0].span() - 60.0).abs() < 1e-9);
        assert!((slices[1].span() - 180.0).abs() < 1e-9);
        assert!((slices[2].span() - 120.0).abs() < 1e-9);
        assert_eq!(slices[1].item, items[1]);
    }

    #[test]
    fn test_empty_input() {
        let slices = partition::<DailyPoint>(&[]);
        assert!(slices.is_empty());
    }

    #[test]
    fn test_zero_total_degenerates() {
        let items = points(&[0.0, 0.0, 0.0]);
        let slices = partition(&items);

        assert_eq!(slices.len(), 3);
        for slice in &slices {
            assert_eq!(slice.start_angle, 0.0);
            assert_eq!(slice.span(), 0.0);
        }
    }

    #[test]
    fn test_negative_weights_get_no_span() {
        let items = points(&[-5.0, 10.0, f64::NAN]);
        let slices = partition(&items);

        assert_eq!(slices[0].span(), 0.0);
        assert!((slices[1].span() - 360.0).abs() < 1e-9);
        assert_eq!(slices[2].span(), 0.0);
    }

    #[test]
    fn test_single_item_takes_full_circle() {
        let slices = partition(&points(&[42.0]));
        assert_eq!(slices[0].start_angle, 0.0);
        assert!((slices[0].end_angle - 360.0).abs() < 1e-9);
    }

    #[test]
    fn test_partition_weekday_buckets() {
        let buckets = vec![
            WeekdayBucket {
                weekday: chrono::Weekday::Sun,
                mean_value: 1.0,
                days: 4,
            },
            WeekdayBucket {
                weekday: chrono::Weekday::Mon,
                mean_value: 1.0,
                days: 4,
            },
        ];
        let slices = partition(&buckets);
        assert!((slices[0].end_angle - 180.0).abs() < 1e-9);
        assert_eq!(slices[1].item.weekday, chrono::Weekday::Mon);
    }

    #[test]
    fn test_slice_at_hit_testing() {
        let items = points(&[1.0, 1.0, 2.0]);
        let slices = partition(&items);

        assert_eq!(slice_at(&slices, 10.0).unwrap().item, items[0]);
        assert_eq!(slice_at(&slices, 90.0).unwrap().item, items[1]);
        assert_eq!(slice_at(&slices, 359.9).unwrap().item, items[2]);
        assert_eq!(slice_at(&slices, 370.0).unwrap().item, items[0]);
        assert_eq!(slice_at(&slices, -10.0).unwrap().item, items[2]);
        assert!(slice_at(&slices, f64::NAN).is_none());
    }

    #[test]
    fn test_slice_at_degenerate_partition() {
        let slices = partition(&points(&[0.0, 0.0]));
        assert!(slice_at(&slices, 0.0).is_none());
    }
}
