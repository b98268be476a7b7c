//! Dashboard orchestration
//!
//! This module provides the high-level API consumed by the presentation layer.
//! It runs each metric through the engine stages and bundles the results.

use crate::aggregator::{window_stats, SeriesAggregator};
use crate::config::EngineConfig;
use crate::error::ComputeError;
use crate::nutrition::{BiometricProfile, BodyComposition, NutritionPlan, NutritionPlanner};
use crate::partition::partition;
use crate::suggestions::{default_exercises, exercise_estimates, ExerciseEstimate, MealPlanKey};
use crate::trend::{
    height_change, height_consistency_score, height_is_stable, heart_rate_goal_progress,
    is_short_sleep, weight_direction, window_trend, HeartRateAdvice, HeartRateStatus,
    HeightChange, SleepQuality, Trend, WeightDirection,
};
use crate::types::{
    AggregationPolicy, AngularSlice, DailyPoint, DayChange, HealthMetric, Sample, Series,
    WeekdayBucket, WindowStats,
};
use crate::weekday::WeekdayGrouper;
use chrono::TimeZone;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Metric-specific classification results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetricInsight {
    Steps {
        trend: Option<Trend>,
    },
    Weight {
        direction: Option<WeightDirection>,
    },
    Height {
        change: Option<HeightChange>,
        stable: Option<bool>,
        consistency_score: Option<u32>,
    },
    HeartRate {
        status: Option<HeartRateStatus>,
        advice: Option<HeartRateAdvice>,
        goal_progress_pct: Option<f64>,
    },
    Sleep {
        quality: Option<SleepQuality>,
        short_nights: usize,
    },
}

impl MetricInsight {
    /// Headline tip, or `None` when there is not enough data
    pub fn tip(&self) -> Option<&'static str> {
        match self {
            MetricInsight::Steps { trend } => trend.map(|t| t.message()),
            MetricInsight::Weight { direction } => direction.map(|d| d.message()),
            MetricInsight::Height { stable, .. } => stable.map(|s| {
                if s {
                    "Stable height over the last month"
                } else {
                    "Height data fluctuates slightly"
                }
            }),
            MetricInsight::HeartRate { status, .. } => status.map(|s| s.message()),
            MetricInsight::Sleep { quality, .. } => quality.map(|q| q.message()),
        }
    }
}

/// Everything the dashboard shows for one metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub metric: HealthMetric,
    pub policy: AggregationPolicy,
    pub series: Series,
    /// Statistics over the configured rolling window
    pub stats: WindowStats,
    /// Points inside the short window, ending at the latest point
    pub recent: Vec<DailyPoint>,
    /// Change of each series point against the previous one
    pub day_changes: Vec<DayChange>,
    pub weekday_averages: Vec<WeekdayBucket>,
    pub weekday_slices: Vec<AngularSlice<WeekdayBucket>>,
    pub insight: MetricInsight,
}

impl MetricSummary {
    pub fn has_data(&self) -> bool {
        !self.series.is_empty()
    }
}

/// Nutrition results bundled for the diet screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionReport {
    pub profile: BiometricProfile,
    pub plan: NutritionPlan,
    pub body: BodyComposition,
    pub meal_plan: MealPlanKey,
    pub exercises: Vec<ExerciseEstimate>,
}

/// Processor that applies one configuration to every metric
#[derive(Debug, Clone, Default)]
pub struct DashboardProcessor {
    config: EngineConfig,
}

impl DashboardProcessor {
    /// Create a processor, rejecting an invalid configuration
    pub fn new(config: EngineConfig) -> Result<Self, ComputeError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Aggregate raw samples in `tz` and summarize them.
    ///
    /// `policy` overrides the metric's default per-day reduction.
    pub fn summarize<Tz: TimeZone>(
        &self,
        metric: HealthMetric,
        samples: &[Sample],
        policy: Option<AggregationPolicy>,
        tz: &Tz,
    ) -> MetricSummary {
        let policy = policy.unwrap_or_else(|| metric.default_policy());
        let series = SeriesAggregator::aggregate(samples, policy, tz);
        self.summarize_series(metric, policy, series)
    }

    /// Summarize an already aggregated series
    pub fn summarize_series(
        &self,
        metric: HealthMetric,
        policy: AggregationPolicy,
        series: Series,
    ) -> MetricSummary {
        let window = self.config.window_points();
        let stats = window_stats(&series, window);

        let recent = match series.latest() {
            Some(latest) => series
                .since(latest.date, self.config.short_window_days.saturating_sub(1))
                .to_vec(),
            None => Vec::new(),
        };

        let weekday_averages = WeekdayGrouper::weekday_averages(&series, self.config.window_days);
        let weekday_slices = partition(&weekday_averages);
        let insight = self.insight(metric, &series, &stats);

        debug!(
            metric = metric.as_str(),
            days = series.len(),
            window_points = stats.count,
            "summarized metric"
        );

        MetricSummary {
            metric,
            policy,
            day_changes: series.day_changes(),
            series,
            stats,
            recent,
            weekday_averages,
            weekday_slices,
            insight,
        }
    }

    /// Summarize every metric in `grouped` with its default policy
    pub fn summarize_all<Tz: TimeZone>(
        &self,
        grouped: &BTreeMap<HealthMetric, Vec<Sample>>,
        tz: &Tz,
    ) -> Vec<MetricSummary> {
        grouped
            .iter()
            .map(|(metric, samples)| self.summarize(*metric, samples, None, tz))
            .collect()
    }

    /// Plan, body composition and suggestion keys for `profile`
    pub fn nutrition(&self, profile: &BiometricProfile) -> Result<NutritionReport, ComputeError> {
        let plan = NutritionPlanner::plan(profile)?;
        let body = NutritionPlanner::body_composition(profile)?;
        let exercises =
            exercise_estimates(&default_exercises(), profile.weight_kg, plan.daily_adjustment());

        Ok(NutritionReport {
            profile: profile.clone(),
            meal_plan: MealPlanKey::for_plan(&plan, profile.vegetarian),
            plan,
            body,
            exercises,
        })
    }

    fn insight(&self, metric: HealthMetric, series: &Series, stats: &WindowStats) -> MetricInsight {
        let window = self.config.window_points();
        // Tables classify the whole-number average; an empty window has none
        let mean = stats.has_data().then_some(stats.mean.trunc());

        match metric {
            HealthMetric::Steps => MetricInsight::Steps {
                trend: window_trend(series, window, self.config.step_delta_threshold),
            },
            HealthMetric::Weight => MetricInsight::Weight {
                direction: weight_direction(series, window),
            },
            HealthMetric::Height => MetricInsight::Height {
                change: height_change(series, self.config.height_tolerance_m),
                stable: height_is_stable(stats, self.config.height_tolerance_m),
                consistency_score: height_consistency_score(series, window),
            },
            HealthMetric::HeartRate => MetricInsight::HeartRate {
                status: mean.map(|m| HeartRateStatus::table().classify(m)),
                advice: mean.map(|m| HeartRateAdvice::table().classify(m)),
                goal_progress_pct: heart_rate_goal_progress(stats, self.config.heart_rate_goal_bpm),
            },
            HealthMetric::Sleep => MetricInsight::Sleep {
                quality: mean.map(|m| SleepQuality::table().classify(m)),
                short_nights: series
                    .last_n(window)
                    .iter()
                    .filter(|p| is_short_sleep(p.value, self.config.short_sleep_hours))
                    .count(),
            },
        }
    }
}
