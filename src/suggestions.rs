//! Meal and exercise suggestion inputs
//!
//! The meal and exercise catalogues themselves live with the host app. This
//! module computes the keys and estimates they are looked up with: the meal
//! tier for a calorie target and MET-based burn estimates.

use crate::nutrition::NutritionPlan;
use serde::{Deserialize, Serialize};

/// Upper bound (exclusive) of the low-calorie meal tier
pub const LOW_TIER_MAX_KCAL: f64 = 1600.0;

/// Upper bound (inclusive) of the moderate meal tier
pub const MODERATE_TIER_MAX_KCAL: f64 = 2200.0;

/// Calorie band of a meal plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealTier {
    Low,
    Moderate,
    High,
}

impl MealTier {
    pub fn for_calories(daily_calories: f64) -> Self {
        if daily_calories < LOW_TIER_MAX_KCAL {
            MealTier::Low
        } else if daily_calories <= MODERATE_TIER_MAX_KCAL {
            MealTier::Moderate
        } else {
            MealTier::High
        }
    }
}

/// Key into the host's meal table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MealPlanKey {
    pub tier: MealTier,
    pub vegetarian: bool,
}

impl MealPlanKey {
    pub fn for_plan(plan: &NutritionPlan, vegetarian: bool) -> Self {
        Self {
            tier: MealTier::for_calories(plan.daily_calories),
            vegetarian,
        }
    }
}

/// An exercise with its metabolic equivalent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub name: String,
    pub met: f64,
    /// Repetitions that burn roughly 100 kcal, for rep-based exercises
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reps_per_100_kcal: Option<u32>,
}

impl Exercise {
    pub fn new(name: &str, met: f64, reps_per_100_kcal: Option<u32>) -> Self {
        Self {
            name: name.to_string(),
            met,
            reps_per_100_kcal,
        }
    }

    /// Whole kcal burned in `minutes` by someone weighing `weight_kg`
    pub fn calories_burned(&self, weight_kg: f64, minutes: u32) -> u32 {
        calories_burned(self.met, weight_kg, minutes)
    }

    /// Minutes needed to burn `target_kcal`, rounded up; `None` if the
    /// exercise burns nothing
    pub fn minutes_for(&self, weight_kg: f64, target_kcal: f64) -> Option<u32> {
        let per_minute = self.met * weight_kg / 60.0;
        if !(per_minute.is_finite() && per_minute > 0.0) || target_kcal <= 0.0 {
            return None;
        }
        Some((target_kcal / per_minute).ceil() as u32)
    }
}

/// `floor(met x weight_kg x hours)`
pub fn calories_burned(met: f64, weight_kg: f64, minutes: u32) -> u32 {
    let hours = f64::from(minutes) / 60.0;
    let kcal = (met * weight_kg * hours).floor();
    if kcal.is_finite() && kcal > 0.0 {
        kcal as u32
    } else {
        0
    }
}

/// Built-in exercise list
pub fn default_exercises() -> Vec<Exercise> {
    vec![
        Exercise::new("Jump Rope", 10.0, Some(850)),
        Exercise::new("Running (5 mph)", 7.0, None),
        Exercise::new("Cycling", 6.0, None),
        Exercise::new("Yoga", 2.5, None),
    ]
}

/// Burn estimate for one exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseEstimate {
    pub exercise: Exercise,
    pub kcal_15_min: u32,
    pub kcal_30_min: u32,
    /// Minutes to cover the plan's daily adjustment
    pub minutes_for_target: Option<u32>,
}

/// Estimates for every exercise at `weight_kg`, targeting `target_kcal` a day
pub fn exercise_estimates(
    exercises: &[Exercise],
    weight_kg: f64,
    target_kcal: f64,
) -> Vec<ExerciseEstimate> {
    exercises
        .iter()
        .map(|exercise| ExerciseEstimate {
            exercise: exercise.clone(),
            kcal_15_min: exercise.calories_burned(weight_kg, 15),
            kcal_30_min: exercise.calories_burned(weight_kg, 30),
            minutes_for_target: exercise.minutes_for(weight_kg, target_kcal),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meal_tier_bounds() {
        assert_eq!(MealTier::for_calories(1599.9), MealTier::Low);
        assert_eq!(MealTier::for_calories(1600.0), MealTier::Moderate);
        assert_eq!(MealTier::for_calories(2200.0), MealTier::Moderate);
        assert_eq!(MealTier::for_calories(2200.1), MealTier::High);
    }

    #[test]
    fn test_calories_burned() {
        // 10 MET x 65 kg x 0.25 h = 162.5
        assert_eq!(calories_burned(10.0, 65.0, 15), 162);
        assert_eq!(calories_burned(2.5, 65.0, 30), 81);
        assert_eq!(calories_burned(7.0, 0.0, 30), 0);
    }

    #[test]
    fn test_minutes_for_target() {
        let running = Exercise::new("Running", 6.0, None);
        // 6 x 60 / 60 = 6 kcal per minute
        assert_eq!(running.minutes_for(60.0, 550.0), Some(92));
        assert_eq!(running.minutes_for(60.0, 0.0), None);
    }

    #[test]
    fn test_exercise_estimates() {
        let estimates = exercise_estimates(&default_exercises(), 65.0, 550.0);
        assert_eq!(estimates.len(), 4);
        assert_eq!(estimates[0].exercise.reps_per_100_kcal, Some(850));
        assert_eq!(estimates[0].kcal_30_min, 325);
    }
}
