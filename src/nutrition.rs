//! Nutrition planning
//!
//! Computes a daily calorie target and macro split from a biometric profile:
//! 1. Basal metabolic rate (Mifflin-St Jeor)
//! 2. Maintenance energy = BMR x activity factor
//! 3. Goal adjustment spreading `target_delta_kg x 7700 kcal` over the target weeks
//! 4. Fixed 40/30/30 carbs/protein/fat split
//!
//! BMI and the healthy-weight range are provided alongside as auxiliary
//! guidance.

use crate::error::ComputeError;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

/// Approximate energy content of one kilogram of body mass (kcal)
pub const KCAL_PER_KG: f64 = 7700.0;

/// Lower BMI bound of the healthy range
pub const HEALTHY_BMI_MIN: f64 = 18.5;

/// Upper BMI bound of the healthy range
pub const HEALTHY_BMI_MAX: f64 = 24.9;

const CARBS_SHARE: f64 = 0.40;
const PROTEIN_SHARE: f64 = 0.30;
const FAT_SHARE: f64 = 0.30;
const KCAL_PER_GRAM_CARBS: f64 = 4.0;
const KCAL_PER_GRAM_PROTEIN: f64 = 4.0;
const KCAL_PER_GRAM_FAT: f64 = 9.0;

/// Activity level with its fixed multiplier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    #[default]
    LightlyActive,
    ModeratelyActive,
    VeryActive,
    SuperActive,
}

impl ActivityLevel {
    pub const ALL: [ActivityLevel; 5] = [
        ActivityLevel::Sedentary,
        ActivityLevel::LightlyActive,
        ActivityLevel::ModeratelyActive,
        ActivityLevel::VeryActive,
        ActivityLevel::SuperActive,
    ];

    pub fn factor(&self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::LightlyActive => 1.375,
            ActivityLevel::ModeratelyActive => 1.55,
            ActivityLevel::VeryActive => 1.725,
            ActivityLevel::SuperActive => 1.9,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "Sedentary",
            ActivityLevel::LightlyActive => "Lightly Active",
            ActivityLevel::ModeratelyActive => "Moderately Active",
            ActivityLevel::VeryActive => "Very Active",
            ActivityLevel::SuperActive => "Super Active",
        }
    }

    /// Level whose factor equals `factor`, rejecting anything else
    pub fn try_from_factor(factor: f64) -> Result<Self, ComputeError> {
        Self::ALL
            .into_iter()
            .find(|level| (level.factor() - factor).abs() < 1e-9)
            .ok_or(ComputeError::InvalidActivityFactor(factor))
    }

    /// Level whose factor is closest to `factor`.
    ///
    /// Values below or above the enumeration clamp to its ends.
    pub fn nearest(factor: f64) -> Self {
        if let Ok(level) = Self::try_from_factor(factor) {
            return level;
        }
        let level = if factor.is_nan() {
            ActivityLevel::Sedentary
        } else {
            Self::ALL
                .into_iter()
                .min_by(|a, b| {
                    (a.factor() - factor)
                        .abs()
                        .total_cmp(&(b.factor() - factor).abs())
                })
                .unwrap_or(ActivityLevel::Sedentary)
        };
        warn!(factor, clamped = level.factor(), "activity factor clamped");
        level
    }
}

/// Weight goal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Goal {
    Lose,
    #[default]
    Maintain,
    Gain,
}

/// Biological sex used by the BMR equation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
}

/// User biometrics and goal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiometricProfile {
    pub height_cm: f64,
    pub weight_kg: f64,
    pub age_years: u32,
    pub sex: Sex,
    /// Level name or its exact multiplier; unlisted multipliers are rejected
    #[serde(
        default,
        alias = "activity_factor",
        deserialize_with = "deserialize_activity"
    )]
    pub activity: ActivityLevel,
    #[serde(default)]
    pub goal: Goal,
    /// Kilograms to lose or gain
    #[serde(default)]
    pub target_delta_kg: f64,
    #[serde(default)]
    pub weeks_to_target: u32,
    #[serde(default)]
    pub vegetarian: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ActivityInput {
    Level(ActivityLevel),
    Factor(f64),
}

fn deserialize_activity<'de, D>(deserializer: D) -> Result<ActivityLevel, D::Error>
where
    D: Deserializer<'de>,
{
    match ActivityInput::deserialize(deserializer)? {
        ActivityInput::Level(level) => Ok(level),
        ActivityInput::Factor(factor) => {
            ActivityLevel::try_from_factor(factor).map_err(serde::de::Error::custom)
        }
    }
}

impl Default for BiometricProfile {
    fn default() -> Self {
        Self {
            height_cm: 170.0,
            weight_kg: 65.0,
            age_years: 25,
            sex: Sex::Male,
            activity: ActivityLevel::LightlyActive,
            goal: Goal::Maintain,
            target_delta_kg: 2.0,
            weeks_to_target: 4,
            vegetarian: true,
        }
    }
}

impl BiometricProfile {
    pub fn is_male(&self) -> bool {
        self.sex == Sex::Male
    }

    /// Check the positivity assumptions on height, weight and age
    pub fn validate(&self) -> Result<(), ComputeError> {
        if !(self.height_cm.is_finite() && self.height_cm > 0.0) {
            return Err(ComputeError::InvalidProfile(format!(
                "height must be positive, got {}",
                self.height_cm
            )));
        }
        if !(self.weight_kg.is_finite() && self.weight_kg > 0.0) {
            return Err(ComputeError::InvalidProfile(format!(
                "weight must be positive, got {}",
                self.weight_kg
            )));
        }
        if self.age_years == 0 {
            return Err(ComputeError::InvalidProfile("age must be positive".to_string()));
        }
        Ok(())
    }
}

/// Daily macro targets in whole grams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Macros {
    pub carbs_grams: u32,
    pub protein_grams: u32,
    pub fat_grams: u32,
}

/// Daily energy and macro plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionPlan {
    pub bmr: f64,
    pub maintenance_calories: f64,
    pub daily_calories: f64,
    pub carbs_grams: u32,
    pub protein_grams: u32,
    pub fat_grams: u32,
    /// False when a lose/gain goal fell back to maintenance because the
    /// target delta or weeks were not positive
    pub goal_applied: bool,
}

impl NutritionPlan {
    /// Calories per day above or below maintenance
    pub fn daily_adjustment(&self) -> f64 {
        (self.daily_calories - self.maintenance_calories).abs()
    }

    pub fn macros(&self) -> Macros {
        Macros {
            carbs_grams: self.carbs_grams,
            protein_grams: self.protein_grams,
            fat_grams: self.fat_grams,
        }
    }
}

/// Mifflin-St Jeor basal metabolic rate (kcal/day)
pub fn calculate_bmr(weight_kg: f64, height_cm: f64, age_years: u32, is_male: bool) -> f64 {
    let base = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * f64::from(age_years);
    if is_male {
        base + 5.0
    } else {
        base - 161.0
    }
}

/// BMR scaled by the activity multiplier
pub fn maintenance_calories(bmr: f64, activity: ActivityLevel) -> f64 {
    bmr * activity.factor()
}

/// Daily calorie change needed to reach the goal, or `None` when the goal is
/// to maintain or its parameters are not positive
pub fn daily_adjustment(goal: Goal, target_delta_kg: f64, weeks_to_target: u32) -> Option<f64> {
    if goal == Goal::Maintain {
        return None;
    }
    if !(target_delta_kg.is_finite() && target_delta_kg > 0.0) || weeks_to_target == 0 {
        warn!(
            ?goal,
            target_delta_kg, weeks_to_target, "goal parameters not positive, using maintenance"
        );
        return None;
    }
    let total_kcal = target_delta_kg * KCAL_PER_KG;
    Some(total_kcal / (f64::from(weeks_to_target) * 7.0))
}

/// Maintenance energy shifted by the goal adjustment
pub fn daily_calories(maintenance: f64, goal: Goal, target_delta_kg: f64, weeks: u32) -> f64 {
    apply_adjustment(maintenance, goal, daily_adjustment(goal, target_delta_kg, weeks))
}

fn apply_adjustment(maintenance: f64, goal: Goal, adjustment: Option<f64>) -> f64 {
    match (goal, adjustment) {
        (Goal::Lose, Some(adjustment)) => maintenance - adjustment,
        (Goal::Gain, Some(adjustment)) => maintenance + adjustment,
        _ => maintenance,
    }
}

/// 40/30/30 carbs/protein/fat split, floored to whole grams.
///
/// Non-positive calorie targets yield zero grams.
pub fn macro_split(daily_calories: f64) -> Macros {
    let grams = |share: f64, kcal_per_gram: f64| -> u32 {
        let g = (daily_calories * share / kcal_per_gram).floor();
        if g.is_finite() && g > 0.0 {
            g as u32
        } else {
            0
        }
    };
    Macros {
        carbs_grams: grams(CARBS_SHARE, KCAL_PER_GRAM_CARBS),
        protein_grams: grams(PROTEIN_SHARE, KCAL_PER_GRAM_PROTEIN),
        fat_grams: grams(FAT_SHARE, KCAL_PER_GRAM_FAT),
    }
}

/// Nutrition planner
pub struct NutritionPlanner;

impl NutritionPlanner {
    /// Build the full plan for `profile`
    pub fn plan(profile: &BiometricProfile) -> Result<NutritionPlan, ComputeError> {
        profile.validate()?;

        let bmr = calculate_bmr(
            profile.weight_kg,
            profile.height_cm,
            profile.age_years,
            profile.is_male(),
        );
        let maintenance = maintenance_calories(bmr, profile.activity);
        let adjustment =
            daily_adjustment(profile.goal, profile.target_delta_kg, profile.weeks_to_target);
        let calories = apply_adjustment(maintenance, profile.goal, adjustment);
        let macros = macro_split(calories);

        Ok(NutritionPlan {
            bmr,
            maintenance_calories: maintenance,
            daily_calories: calories,
            carbs_grams: macros.carbs_grams,
            protein_grams: macros.protein_grams,
            fat_grams: macros.fat_grams,
            goal_applied: adjustment.is_some() || profile.goal == Goal::Maintain,
        })
    }

    /// BMI and healthy-range guidance for `profile`
    pub fn body_composition(profile: &BiometricProfile) -> Result<BodyComposition, ComputeError> {
        profile.validate()?;
        Ok(BodyComposition::new(profile.height_cm, profile.weight_kg))
    }
}

/// Direction of the recommended weight change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentDirection {
    Gain,
    Lose,
    None,
}

/// Distance to the nearest bound of the healthy-weight range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightAdjustment {
    pub direction: AdjustmentDirection,
    /// Kilograms to the nearest bound; 0 when inside the range
    pub amount_kg: f64,
}

/// BMI and healthy-weight range for a height/weight pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyComposition {
    pub bmi: f64,
    pub healthy_min_kg: f64,
    pub healthy_max_kg: f64,
    pub adjustment: WeightAdjustment,
}

impl BodyComposition {
    pub fn new(height_cm: f64, weight_kg: f64) -> Self {
        let height_m = height_cm / 100.0;
        let height_sq = height_m * height_m;
        let healthy_min_kg = HEALTHY_BMI_MIN * height_sq;
        let healthy_max_kg = HEALTHY_BMI_MAX * height_sq;

        let adjustment = if weight_kg < healthy_min_kg {
            WeightAdjustment {
                direction: AdjustmentDirection::Gain,
                amount_kg: healthy_min_kg - weight_kg,
            }
        } else if weight_kg > healthy_max_kg {
            WeightAdjustment {
                direction: AdjustmentDirection::Lose,
                amount_kg: weight_kg - healthy_max_kg,
            }
        } else {
            WeightAdjustment {
                direction: AdjustmentDirection::None,
                amount_kg: 0.0,
            }
        };

        Self {
            bmi: weight_kg / height_sq,
            healthy_min_kg,
            healthy_max_kg,
            adjustment,
        }
    }

    /// Signed change toward the range: positive to gain, negative to lose
    pub fn signed_adjustment_kg(&self) -> f64 {
        match self.adjustment.direction {
            AdjustmentDirection::Gain => self.adjustment.amount_kg,
            AdjustmentDirection::Lose => -self.adjustment.amount_kg,
            AdjustmentDirection::None => 0.0,
        }
    }
}
