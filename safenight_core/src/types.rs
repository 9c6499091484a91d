//! Core domain types for SafeNight drink tracking.
//!
//! This module defines the fundamental types used throughout the system:
//! - Drinks and their alcohol classification
//! - The user profile the BAC engine needs
//! - BAC estimates and safety tiers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::bac::{CAUTION_THRESHOLD, DANGER_THRESHOLD, LEGAL_LIMIT};
use crate::Error;

// ============================================================================
// Drink Types
// ============================================================================

/// Broad classification bucket for a drink
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AlcoholType {
    Beer,
    Wine,
    Liquor,
    Cocktail,
    Shot,
    Other,
}

impl AlcoholType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlcoholType::Beer => "beer",
            AlcoholType::Wine => "wine",
            AlcoholType::Liquor => "liquor",
            AlcoholType::Cocktail => "cocktail",
            AlcoholType::Shot => "shot",
            AlcoholType::Other => "other",
        }
    }
}

impl fmt::Display for AlcoholType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlcoholType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beer" => Ok(AlcoholType::Beer),
            "wine" => Ok(AlcoholType::Wine),
            "liquor" => Ok(AlcoholType::Liquor),
            "cocktail" => Ok(AlcoholType::Cocktail),
            "shot" => Ok(AlcoholType::Shot),
            "other" => Ok(AlcoholType::Other),
            other => Err(Error::InvalidDrink(format!("unknown alcohol type '{}'", other))),
        }
    }
}

/// A logged alcohol-consumption event
///
/// Drinks are immutable once created. `estimated_abv` is a decimal fraction
/// (0.05 for 5%), and `logged_at` is treated as the instant of consumption.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Drink {
    pub id: Uuid,
    pub user_id: String,
    pub plan_id: Option<String>,
    pub name: String,
    pub alcohol_type: AlcoholType,
    pub estimated_oz: f64,
    pub estimated_abv: f64,
    pub logged_at: DateTime<Utc>,
}

impl Drink {
    /// Check the ingestion invariants: positive volume, ABV in `[0, 1)`
    pub fn validate(&self) -> crate::Result<()> {
        validate_volume_and_abv(self.estimated_oz, self.estimated_abv)
    }
}

pub(crate) fn validate_volume_and_abv(oz: f64, abv: f64) -> crate::Result<()> {
    if !oz.is_finite() || oz <= 0.0 {
        return Err(Error::InvalidDrink(format!(
            "volume must be positive, got {} oz",
            oz
        )));
    }
    if !abv.is_finite() || !(0.0..1.0).contains(&abv) {
        return Err(Error::InvalidDrink(format!(
            "ABV must be a fraction in [0, 1), got {}",
            abv
        )));
    }
    Ok(())
}

// ============================================================================
// Profile Types
// ============================================================================

/// Sex category used for the Widmark distribution ratio
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    #[default]
    Female,
    Other,
}

impl Sex {
    /// Widmark distribution ratio for this category
    ///
    /// Every category resolves to the female ratio; estimates stay on the
    /// conservative side for all users.
    pub fn distribution_ratio(&self) -> f64 {
        match self {
            Sex::Female | Sex::Other => crate::bac::FEMALE_DISTRIBUTION_RATIO,
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sex::Female => f.write_str("female"),
            Sex::Other => f.write_str("other"),
        }
    }
}

impl FromStr for Sex {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "female" => Ok(Sex::Female),
            "other" => Ok(Sex::Other),
            other => Err(Error::Config(format!(
                "unknown sex '{}' (expected female or other)",
                other
            ))),
        }
    }
}

/// The per-user inputs the BAC engine needs
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub user_id: String,
    pub weight_lbs: f64,
    #[serde(default)]
    pub sex: Sex,
}

impl UserProfile {
    pub fn validate(&self) -> crate::Result<()> {
        if !self.weight_lbs.is_finite() || self.weight_lbs <= 0.0 {
            return Err(Error::State(format!(
                "weight must be positive, got {} lbs",
                self.weight_lbs
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Estimate Types
// ============================================================================

/// Discrete safety tier derived from BAC
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SafetyLevel {
    Safe,
    Caution,
    Warning,
    Danger,
}

impl SafetyLevel {
    /// Classify a BAC value; each tier's lower bound is inclusive
    pub fn from_bac(bac: f64) -> Self {
        if bac < CAUTION_THRESHOLD {
            SafetyLevel::Safe
        } else if bac < LEGAL_LIMIT {
            SafetyLevel::Caution
        } else if bac < DANGER_THRESHOLD {
            SafetyLevel::Warning
        } else {
            SafetyLevel::Danger
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            SafetyLevel::Safe => {
                "You're doing great! Stay hydrated and continue to enjoy your evening responsibly."
            }
            SafetyLevel::Caution => {
                "You're approaching the legal limit. Consider slowing down, drinking water, and make sure you have a safe ride home planned."
            }
            SafetyLevel::Warning => {
                "You're above the legal limit. Please stop drinking alcohol, drink water, eat food if available, and do NOT drive. Consider texting your emergency contact."
            }
            SafetyLevel::Danger => {
                "Your BAC is dangerously high. Stop drinking immediately, stay with trusted friends, and seek medical attention if you feel unwell. Do not leave with anyone you don't know well."
            }
        }
    }

    /// Hex colour used by front ends to render the tier
    pub fn color(&self) -> &'static str {
        match self {
            SafetyLevel::Safe => "#22c55e",
            SafetyLevel::Caution => "#eab308",
            SafetyLevel::Warning => "#f97316",
            SafetyLevel::Danger => "#ef4444",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SafetyLevel::Safe => "Safe",
            SafetyLevel::Caution => "Caution",
            SafetyLevel::Warning => "Warning",
            SafetyLevel::Danger => "Danger",
        }
    }
}

/// A display-ready snapshot of the engine's output
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BacEstimate {
    /// BAC in percentage points (0.08 is the legal limit)
    pub bac: f64,
    /// Minutes until BAC reaches zero
    pub time_to_sober: u32,
    /// Minutes until BAC drops to the legal limit
    pub time_to_legal_limit: u32,
    pub safety_level: SafetyLevel,
    pub recommendation: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alcohol_type_parse() {
        assert_eq!("Cocktail".parse::<AlcoholType>().unwrap(), AlcoholType::Cocktail);
        assert_eq!(" wine ".parse::<AlcoholType>().unwrap(), AlcoholType::Wine);
        assert!("juice".parse::<AlcoholType>().is_err());
    }

    #[test]
    fn test_alcohol_type_serde_is_lowercase() {
        let json = serde_json::to_string(&AlcoholType::Liquor).unwrap();
        assert_eq!(json, "\"liquor\"");
    }

    #[test]
    fn test_sex_ratio_is_female_for_all() {
        assert_eq!(Sex::Female.distribution_ratio(), 0.55);
        assert_eq!(Sex::Other.distribution_ratio(), 0.55);
    }

    #[test]
    fn test_safety_levels_are_ordered() {
        assert!(SafetyLevel::Safe < SafetyLevel::Caution);
        assert!(SafetyLevel::Caution < SafetyLevel::Warning);
        assert!(SafetyLevel::Warning < SafetyLevel::Danger);
    }

    #[test]
    fn test_profile_rejects_non_positive_weight() {
        let profile = UserProfile {
            user_id: "u1".into(),
            weight_lbs: 0.0,
            sex: Sex::Female,
        };
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_validate_volume_and_abv_bounds() {
        assert!(validate_volume_and_abv(12.0, 0.0).is_ok());
        assert!(validate_volume_and_abv(12.0, 0.999).is_ok());
        assert!(validate_volume_and_abv(12.0, 1.0).is_err());
        assert!(validate_volume_and_abv(0.0, 0.05).is_err());
        assert!(validate_volume_and_abv(-1.0, 0.05).is_err());
        assert!(validate_volume_and_abv(12.0, -0.01).is_err());
    }
}
