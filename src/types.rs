//! Core types for the Pulseplan engine
//!
//! This module defines the data structures that flow between the engine stages:
//! raw samples, per-day points, series, and the derived display structures.

use crate::error::ComputeError;
use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// Health metric kinds read from the device health store
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthMetric {
    Steps,
    Weight,
    Height,
    HeartRate,
    Sleep,
}

impl HealthMetric {
    pub const ALL: [HealthMetric; 5] = [
        HealthMetric::Steps,
        HealthMetric::Weight,
        HealthMetric::Height,
        HealthMetric::HeartRate,
        HealthMetric::Sleep,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthMetric::Steps => "steps",
            HealthMetric::Weight => "weight",
            HealthMetric::Height => "height",
            HealthMetric::HeartRate => "heart_rate",
            HealthMetric::Sleep => "sleep",
        }
    }

    /// Display title
    pub fn title(&self) -> &'static str {
        match self {
            HealthMetric::Steps => "Steps",
            HealthMetric::Weight => "Weight",
            HealthMetric::Height => "Height",
            HealthMetric::HeartRate => "Heart",
            HealthMetric::Sleep => "Sleep",
        }
    }

    /// Unit the values are expressed in
    pub fn unit(&self) -> &'static str {
        match self {
            HealthMetric::Steps => "steps",
            HealthMetric::Weight => "kg",
            HealthMetric::Height => "m",
            HealthMetric::HeartRate => "bpm",
            HealthMetric::Sleep => "h",
        }
    }

    /// Number of fraction digits used when displaying values
    pub fn fraction_digits(&self) -> usize {
        match self {
            HealthMetric::Weight => 1,
            _ => 0,
        }
    }

    /// Per-day reduction used when the caller does not supply one.
    ///
    /// Steps and sleep hours accumulate over a day; body measurements keep
    /// the latest reading; heart rate is averaged.
    pub fn default_policy(&self) -> AggregationPolicy {
        match self {
            HealthMetric::Steps | HealthMetric::Sleep => AggregationPolicy::Sum,
            HealthMetric::Weight | HealthMetric::Height => AggregationPolicy::Latest,
            HealthMetric::HeartRate => AggregationPolicy::Mean,
        }
    }
}

impl std::str::FromStr for HealthMetric {
    type Err = ComputeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "steps" => Ok(HealthMetric::Steps),
            "weight" => Ok(HealthMetric::Weight),
            "height" => Ok(HealthMetric::Height),
            "heart_rate" | "heartrate" | "heart" => Ok(HealthMetric::HeartRate),
            "sleep" => Ok(HealthMetric::Sleep),
            other => Err(ComputeError::ParseError(format!("unknown metric: {other}"))),
        }
    }
}

/// How the samples of a single calendar day are reduced to one value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationPolicy {
    /// Sum of all samples (cumulative metrics)
    Sum,
    /// Value of the sample with the latest timestamp
    Latest,
    /// Arithmetic mean of all samples
    Mean,
}

/// A single raw health observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// One calendar day's aggregated value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub value: f64,
}

impl DailyPoint {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }

    pub fn weekday(&self) -> Weekday {
        self.date.weekday()
    }
}

/// Chronologically ascending daily points with unique dates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<DailyPoint>", into = "Vec<DailyPoint>")]
pub struct Series {
    points: Vec<DailyPoint>,
}

impl Series {
    /// Build a series from points in any order.
    ///
    /// Points are sorted by date; two points on the same date are rejected.
    pub fn from_points(mut points: Vec<DailyPoint>) -> Result<Self, ComputeError> {
        points.sort_by_key(|p| p.date);
        if let Some(pair) = points.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(ComputeError::DuplicateDate(pair[0].date.to_string()));
        }
        Ok(Self { points })
    }

    /// Caller guarantees ascending, unique dates.
    pub(crate) fn from_sorted_unchecked(points: Vec<DailyPoint>) -> Self {
        debug_assert!(points.windows(2).all(|w| w[0].date < w[1].date));
        Self { points }
    }

    pub fn points(&self) -> &[DailyPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&DailyPoint> {
        self.points.first()
    }

    pub fn latest(&self) -> Option<&DailyPoint> {
        self.points.last()
    }

    /// The most recent `n` points, or all of them if the series is shorter
    pub fn last_n(&self, n: usize) -> &[DailyPoint] {
        let start = self.points.len().saturating_sub(n);
        &self.points[start..]
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.value)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DailyPoint> {
        self.points.iter()
    }

    /// Point recorded on `date`, if any
    pub fn point_on(&self, date: NaiveDate) -> Option<&DailyPoint> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|i| &self.points[i])
    }

    /// Points dated within `days` calendar days before `reference`, inclusive
    /// of both ends.
    ///
    /// A window reaching past the earliest representable date covers every
    /// point up to `reference`.
    pub fn since(&self, reference: NaiveDate, days: u32) -> &[DailyPoint] {
        let start = match reference.checked_sub_signed(chrono::Duration::days(i64::from(days))) {
            Some(cutoff) => self.points.partition_point(|p| p.date < cutoff),
            None => 0,
        };
        let end = self.points.partition_point(|p| p.date <= reference);
        &self.points[start..end.max(start)]
    }

    /// Direction of each point relative to the previous one; the first point
    /// is always `Flat`.
    pub fn day_changes(&self) -> Vec<DayChange> {
        let mut changes = Vec::with_capacity(self.points.len());
        let mut previous: Option<f64> = None;
        for point in &self.points {
            let change = match previous {
                Some(prev) if point.value > prev => DayChange::Up,
                Some(prev) if point.value < prev => DayChange::Down,
                _ => DayChange::Flat,
            };
            changes.push(change);
            previous = Some(point.value);
        }
        changes
    }
}

impl TryFrom<Vec<DailyPoint>> for Series {
    type Error = ComputeError;

    fn try_from(points: Vec<DailyPoint>) -> Result<Self, Self::Error> {
        Series::from_points(points)
    }
}

impl From<Series> for Vec<DailyPoint> {
    fn from(series: Series) -> Self {
        series.points
    }
}

impl<'a> IntoIterator for &'a Series {
    type Item = &'a DailyPoint;
    type IntoIter = std::slice::Iter<'a, DailyPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

/// Rolling-window statistics over the most recent points of a series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowStats {
    /// Number of points in the window
    pub count: usize,
    /// Arithmetic mean (0 when the window is empty)
    pub mean: f64,
    /// Minimum value, absent when the window is empty
    pub min: Option<f64>,
    /// Maximum value, absent when the window is empty
    pub max: Option<f64>,
}

impl WindowStats {
    pub fn empty() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            min: None,
            max: None,
        }
    }

    pub fn has_data(&self) -> bool {
        self.count > 0
    }
}

/// Direction of a point relative to the previous day's point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayChange {
    Up,
    Down,
    Flat,
}

/// Mean value of a metric for one day of the week
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeekdayBucket {
    pub weekday: Weekday,
    pub mean_value: f64,
    /// Number of daily points that contributed to the mean
    pub days: usize,
}

/// Contiguous angular span assigned to one weighted item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AngularSlice<T> {
    pub item: T,
    /// Start angle in degrees
    pub start_angle: f64,
    /// End angle in degrees
    pub end_angle: f64,
}

impl<T> AngularSlice<T> {
    pub fn span(&self) -> f64 {
        self.end_angle - self.start_angle
    }

    /// Whether `degrees` falls inside `[start, end)`
    pub fn contains(&self, degrees: f64) -> bool {
        degrees >= self.start_angle && degrees < self.end_angle
    }
}
