//! Trend and tip classification
//!
//! Pure classifiers that map aggregate statistics to categories. Callers pick
//! display text for each category; `message()` gives a default wording.
//!
//! Multi-branch tips are expressed as a [`ThresholdTable`]: an ordered list of
//! `(bound, category)` rows scanned once, first match wins.

use crate::types::{Series, WindowStats};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Step-count delta that counts as a real change
pub const DEFAULT_STEP_DELTA_THRESHOLD: f64 = 500.0;

/// Change in metres below which two height readings are the same
pub const DEFAULT_HEIGHT_TOLERANCE_M: f64 = 0.01;

const INCHES_PER_METRE: f64 = 39.3701;

/// Direction of change between the first and last point of a window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
}

impl Trend {
    /// Default step-count tip
    pub fn message(&self) -> &'static str {
        match self {
            Trend::Improving => "Great momentum! Keep going!",
            Trend::Declining => "Stay active daily!",
            Trend::Stable => "Consistency is power!",
        }
    }
}

/// Position of a value relative to a low/high band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeCategory {
    Low,
    Normal,
    High,
}

/// Classify `last - first` against a symmetric absolute threshold.
///
/// A change must strictly exceed `threshold` to count as improving or
/// declining.
pub fn classify_delta(first: f64, last: f64, threshold: f64) -> Trend {
    let diff = last - first;
    if diff > threshold {
        Trend::Improving
    } else if diff < -threshold {
        Trend::Declining
    } else {
        Trend::Stable
    }
}

/// Trend over the last `window` points; `None` with fewer than two points.
///
/// The change between the window edges is truncated to a whole unit before
/// it is compared, so a drift under one unit never counts as a trend.
pub fn window_trend(series: &Series, window: usize, threshold: f64) -> Option<Trend> {
    let points = series.last_n(window);
    match (points.first(), points.last()) {
        (Some(first), Some(last)) if points.len() >= 2 => {
            let diff = (last.value - first.value).trunc();
            Some(classify_delta(0.0, diff, threshold))
        }
        _ => None,
    }
}

/// `Low` below `low`, `High` at or above `high`, otherwise `Normal`
pub fn classify_range(value: f64, low: f64, high: f64) -> RangeCategory {
    ThresholdTable::new(RangeCategory::Normal)
        .row(Bound::AtLeast(high), RangeCategory::High)
        .row(Bound::Below(low), RangeCategory::Low)
        .classify(value)
}

/// Comparison applied by one table row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op", content = "value")]
pub enum Bound {
    AtLeast(f64),
    Above(f64),
    Below(f64),
}

impl Bound {
    pub fn matches(&self, value: f64) -> bool {
        match *self {
            Bound::AtLeast(t) => value >= t,
            Bound::Above(t) => value > t,
            Bound::Below(t) => value < t,
        }
    }
}

/// Ordered `(bound, category)` rows with a fallback category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdTable<C> {
    rows: Vec<(Bound, C)>,
    fallback: C,
}

impl<C: Copy> ThresholdTable<C> {
    pub fn new(fallback: C) -> Self {
        Self {
            rows: Vec::new(),
            fallback,
        }
    }

    pub fn row(mut self, bound: Bound, category: C) -> Self {
        self.rows.push((bound, category));
        self
    }

    /// Category of the first matching row, or the fallback
    pub fn classify(&self, value: f64) -> C {
        self.rows
            .iter()
            .find(|(bound, _)| bound.matches(value))
            .map(|(_, category)| *category)
            .unwrap_or(self.fallback)
    }
}

/// Resting heart-rate status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeartRateStatus {
    High,
    Normal,
    Athletic,
}

impl HeartRateStatus {
    pub fn table() -> ThresholdTable<Self> {
        ThresholdTable::new(HeartRateStatus::Normal)
            .row(Bound::AtLeast(100.0), HeartRateStatus::High)
            .row(Bound::Below(60.0), HeartRateStatus::Athletic)
    }

    pub fn message(&self) -> &'static str {
        match self {
            HeartRateStatus::High => "High HR - consider relaxation",
            HeartRateStatus::Normal => "Normal range",
            HeartRateStatus::Athletic => "Excellent cardio health",
        }
    }
}

/// Lifestyle advice keyed on average heart rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeartRateAdvice {
    Rest,
    Hydrate,
    LightCardio,
    Excellent,
}

impl HeartRateAdvice {
    pub fn table() -> ThresholdTable<Self> {
        ThresholdTable::new(HeartRateAdvice::Excellent)
            .row(Bound::Above(100.0), HeartRateAdvice::Rest)
            .row(Bound::Above(85.0), HeartRateAdvice::Hydrate)
            .row(Bound::Above(70.0), HeartRateAdvice::LightCardio)
    }

    pub fn message(&self) -> &'static str {
        match self {
            HeartRateAdvice::Rest => "Relax and rest more!",
            HeartRateAdvice::Hydrate => "Stay hydrated!",
            HeartRateAdvice::LightCardio => "Great! Add light cardio!",
            HeartRateAdvice::Excellent => "Excellent cardiovascular health!",
        }
    }
}

/// Sleep quality keyed on average hours per night
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SleepQuality {
    Great,
    Fair,
    Insufficient,
}

impl SleepQuality {
    pub fn table() -> ThresholdTable<Self> {
        ThresholdTable::new(SleepQuality::Insufficient)
            .row(Bound::AtLeast(8.0), SleepQuality::Great)
            .row(Bound::AtLeast(6.0), SleepQuality::Fair)
    }

    pub fn message(&self) -> &'static str {
        match self {
            SleepQuality::Great => "Great sleep habits!",
            SleepQuality::Fair => "Try to get a bit more rest.",
            SleepQuality::Insufficient => "Warning: insufficient sleep!",
        }
    }
}

/// Direction of body-weight change over a window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightDirection {
    Gaining,
    Losing,
    Steady,
}

impl WeightDirection {
    pub fn message(&self) -> &'static str {
        match self {
            WeightDirection::Gaining => "Building strength!",
            WeightDirection::Losing => "Fitness progress!",
            WeightDirection::Steady => "Stable and steady!",
        }
    }
}

/// Weight direction over the last `window` points; `None` with fewer than two.
///
/// Changes under a whole kilogram are `Steady`.
pub fn weight_direction(series: &Series, window: usize) -> Option<WeightDirection> {
    window_trend(series, window, 0.0).map(|trend| match trend {
        Trend::Improving => WeightDirection::Gaining,
        Trend::Declining => WeightDirection::Losing,
        Trend::Stable => WeightDirection::Steady,
    })
}

/// Change between the two most recent height readings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeightChange {
    Increased,
    Decreased,
    Same,
}

/// Compare the two latest readings; `None` with fewer than two
pub fn height_change(series: &Series, tolerance_m: f64) -> Option<HeightChange> {
    let recent = series.last_n(2);
    if recent.len() < 2 {
        return None;
    }
    let delta = recent[1].value - recent[0].value;
    Some(if delta > tolerance_m {
        HeightChange::Increased
    } else if delta < -tolerance_m {
        HeightChange::Decreased
    } else {
        HeightChange::Same
    })
}

/// Whether height readings in the window vary by less than `tolerance_m`
pub fn height_is_stable(stats: &WindowStats, tolerance_m: f64) -> Option<bool> {
    match (stats.min, stats.max) {
        (Some(min), Some(max)) => Some(max - min < tolerance_m),
        _ => None,
    }
}

/// `100 - 5 x` the number of distinct whole-inch readings in the last
/// `window` points, floored at 0. Heights are in metres.
pub fn height_consistency_score(series: &Series, window: usize) -> Option<u32> {
    let points = series.last_n(window);
    if points.is_empty() {
        return None;
    }
    let distinct: BTreeSet<i64> = points
        .iter()
        .map(|p| (p.value * INCHES_PER_METRE).trunc() as i64)
        .collect();
    Some(100u32.saturating_sub(5 * distinct.len() as u32))
}

/// Percent progress toward keeping the average heart rate at or below
/// `goal_bpm`, capped at 100. `None` without data or with a zero average.
pub fn heart_rate_goal_progress(stats: &WindowStats, goal_bpm: f64) -> Option<f64> {
    if !stats.has_data() || stats.mean <= 0.0 {
        return None;
    }
    Some((goal_bpm / stats.mean * 100.0).min(100.0))
}

/// A night shorter than `threshold_hours`
pub fn is_short_sleep(hours: f64, threshold_hours: f64) -> bool {
    hours < threshold_hours
}
