//! Blood-alcohol estimation engine.
//!
//! Implements a Widmark model with linear elimination:
//!
//! ```text
//! drink_bac = grams / (weight_grams * r) * 100
//! remaining = max(0, drink_bac - 0.015 * hours_since_drink)
//! ```
//!
//! Each drink is absorbed instantly at its `logged_at` and eliminated
//! independently; the current BAC is the sum of what every drink still
//! contributes. Everything here is pure arithmetic over a borrowed snapshot
//! and never fails.

use crate::{BacEstimate, Drink, SafetyLevel, Sex};
use chrono::{DateTime, Utc};

/// BAC percentage points eliminated per hour
pub const METABOLISM_RATE: f64 = 0.015;
/// Density of ethanol in g/mL
pub const ALCOHOL_DENSITY: f64 = 0.789;
pub const ML_PER_OZ: f64 = 29.5735;
pub const GRAMS_PER_LB: f64 = 453.592;
/// Widmark distribution ratio applied to every user
pub const FEMALE_DISTRIBUTION_RATIO: f64 = 0.55;

/// Legal driving limit, also the lower bound of the warning tier
pub const LEGAL_LIMIT: f64 = 0.08;
pub const CAUTION_THRESHOLD: f64 = 0.04;
pub const DANGER_THRESHOLD: f64 = 0.12;

const MS_PER_HOUR: f64 = 3_600_000.0;
/// Rounding noise tolerated before taking the ceiling of a minute projection
const MINUTE_EPSILON: f64 = 1e-9;

/// Inputs for one estimation call
///
/// `now` is captured once and used for every drink in the snapshot.
#[derive(Clone, Copy, Debug)]
pub struct BacInput<'a> {
    pub drinks: &'a [Drink],
    pub weight_lbs: f64,
    pub sex: Sex,
    pub now: DateTime<Utc>,
}

impl<'a> BacInput<'a> {
    /// Build an input evaluated at the current wall-clock instant
    pub fn new(drinks: &'a [Drink], weight_lbs: f64, sex: Sex) -> Self {
        Self {
            drinks,
            weight_lbs,
            sex,
            now: Utc::now(),
        }
    }

    /// Evaluate at a specific instant instead of now
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }
}

/// Grams of pure ethanol in a drink
pub fn alcohol_grams(drink: &Drink) -> f64 {
    drink.estimated_oz * ML_PER_OZ * drink.estimated_abv * ALCOHOL_DENSITY
}

/// Fractional hours from `logged_at` to `now` (negative for future drinks)
pub fn hours_elapsed(logged_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (now - logged_at).num_milliseconds() as f64 / MS_PER_HOUR
}

/// BAC a single drink still contributes at `now`
///
/// Drinks logged after `now` have not been consumed yet and contribute zero.
pub fn drink_contribution(drink: &Drink, weight_lbs: f64, sex: Sex, now: DateTime<Utc>) -> f64 {
    let hours = hours_elapsed(drink.logged_at, now);
    if hours < 0.0 {
        return 0.0;
    }

    let weight_grams = weight_lbs * GRAMS_PER_LB;
    let r = sex.distribution_ratio();

    let drink_bac = (alcohol_grams(drink) / (weight_grams * r)) * 100.0;
    let metabolized = METABOLISM_RATE * hours;

    (drink_bac - metabolized).max(0.0)
}

/// Current BAC for a snapshot of drinks
pub fn calculate_bac(input: &BacInput<'_>) -> f64 {
    if input.drinks.is_empty() {
        return 0.0;
    }

    let total: f64 = input
        .drinks
        .iter()
        .map(|d| drink_contribution(d, input.weight_lbs, input.sex, input.now))
        .sum();

    total.max(0.0)
}

/// Minutes until BAC reaches zero at the constant elimination rate
pub fn estimate_time_to_sober(bac: f64) -> u32 {
    if bac <= 0.0 {
        return 0;
    }
    ceil_minutes((bac / METABOLISM_RATE) * 60.0)
}

/// Minutes until BAC drops to the legal limit, 0 when already at or under it
pub fn estimate_time_to_legal_limit(bac: f64) -> u32 {
    if bac <= LEGAL_LIMIT {
        return 0;
    }
    ceil_minutes(((bac - LEGAL_LIMIT) / METABOLISM_RATE) * 60.0)
}

/// Round a positive projection up to whole minutes, never below one
fn ceil_minutes(minutes: f64) -> u32 {
    (minutes - MINUTE_EPSILON).ceil().max(1.0) as u32
}

pub fn safety_level(bac: f64) -> SafetyLevel {
    SafetyLevel::from_bac(bac)
}

pub fn recommendation(bac: f64) -> &'static str {
    safety_level(bac).recommendation()
}

/// Compose BAC, projections and tier into one display-ready estimate
pub fn full_estimate(input: &BacInput<'_>) -> BacEstimate {
    let bac = calculate_bac(input);
    let level = safety_level(bac);

    tracing::debug!(
        "Estimated BAC {:.4} ({:?}) from {} drinks",
        bac,
        level,
        input.drinks.len()
    );

    BacEstimate {
        bac,
        time_to_sober: estimate_time_to_sober(bac),
        time_to_legal_limit: estimate_time_to_legal_limit(bac),
        safety_level: level,
        recommendation: level.recommendation().to_string(),
    }
}
