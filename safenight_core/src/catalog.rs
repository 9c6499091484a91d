//! Standard-drink reference table and quick logging.
//!
//! Each row pairs a canonical drink kind with its reference volume and
//! strength and the broader alcohol bucket it is logged under.

use crate::{AlcoholType, Drink, Error};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Canonical quick-log keys
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum DrinkKind {
    Beer,
    LightBeer,
    Ipa,
    Wine,
    Champagne,
    Shot,
    Cocktail,
    Margarita,
    LongIsland,
    Martini,
}

/// One row of the reference table
#[derive(Clone, Debug, PartialEq)]
pub struct StandardDrink {
    pub kind: DrinkKind,
    pub key: &'static str,
    pub name: &'static str,
    pub oz: f64,
    pub abv: f64,
    pub alcohol_type: AlcoholType,
}

const fn row(
    kind: DrinkKind,
    key: &'static str,
    name: &'static str,
    oz: f64,
    abv: f64,
    alcohol_type: AlcoholType,
) -> StandardDrink {
    StandardDrink {
        kind,
        key,
        name,
        oz,
        abv,
        alcohol_type,
    }
}

/// The reference table, in quick-select display order
pub static STANDARD_DRINKS: [StandardDrink; 10] = [
    row(DrinkKind::Beer, "beer", "Beer", 12.0, 0.05, AlcoholType::Beer),
    row(DrinkKind::LightBeer, "lightBeer", "Light Beer", 12.0, 0.042, AlcoholType::Beer),
    row(DrinkKind::Ipa, "ipa", "Ipa", 12.0, 0.065, AlcoholType::Beer),
    row(DrinkKind::Wine, "wine", "Wine", 5.0, 0.12, AlcoholType::Wine),
    row(DrinkKind::Champagne, "champagne", "Champagne", 5.0, 0.12, AlcoholType::Wine),
    row(DrinkKind::Shot, "shot", "Shot", 1.5, 0.4, AlcoholType::Shot),
    row(DrinkKind::Cocktail, "cocktail", "Cocktail", 4.0, 0.15, AlcoholType::Cocktail),
    row(DrinkKind::Margarita, "margarita", "Margarita", 6.0, 0.13, AlcoholType::Cocktail),
    row(DrinkKind::LongIsland, "longIsland", "Long Island", 8.0, 0.22, AlcoholType::Cocktail),
    row(DrinkKind::Martini, "martini", "Martini", 3.0, 0.3, AlcoholType::Cocktail),
];

/// Lookup by normalized key ("longisland", "lightbeer", ...)
static BY_KEY: Lazy<HashMap<String, &'static StandardDrink>> = Lazy::new(|| {
    STANDARD_DRINKS
        .iter()
        .map(|d| (normalize_key(d.key), d))
        .collect()
});

fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| *c != '_' && *c != '-' && !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

impl DrinkKind {
    pub fn all() -> impl Iterator<Item = DrinkKind> {
        STANDARD_DRINKS.iter().map(|d| d.kind)
    }

    /// Reference row for this kind
    pub fn standard(&self) -> &'static StandardDrink {
        standard_drink(*self)
    }

    pub fn key(&self) -> &'static str {
        self.standard().key
    }
}

impl fmt::Display for DrinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for DrinkKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BY_KEY
            .get(&normalize_key(s))
            .map(|d| d.kind)
            .ok_or_else(|| Error::UnknownDrinkKind(s.to_string()))
    }
}

/// Reference values for a drink kind
pub fn standard_drink(kind: DrinkKind) -> &'static StandardDrink {
    // Rows are declared in enum order
    &STANDARD_DRINKS[kind as usize]
}

/// Build a drink from the reference table, logged at `now`
pub fn quick_log_drink(
    kind: DrinkKind,
    user_id: &str,
    plan_id: Option<String>,
    now: DateTime<Utc>,
) -> Drink {
    let standard = standard_drink(kind);
    Drink {
        id: Uuid::new_v4(),
        user_id: user_id.to_string(),
        plan_id,
        name: standard.name.to_string(),
        alcohol_type: standard.alcohol_type,
        estimated_oz: standard.oz,
        estimated_abv: standard.abv,
        logged_at: now,
    }
}

/// Quick-log at the current wall-clock instant
pub fn quick_log_drink_now(kind: DrinkKind, user_id: &str, plan_id: Option<String>) -> Drink {
    quick_log_drink(kind, user_id, plan_id, Utc::now())
}

/// Validate the reference table for consistency
///
/// Returns a list of validation errors, or empty Vec if valid.
pub fn validate_catalog() -> Vec<String> {
    validate_rows(&STANDARD_DRINKS)
}

fn validate_rows(rows: &[StandardDrink]) -> Vec<String> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for (idx, d) in rows.iter().enumerate() {
        if d.key.is_empty() {
            errors.push(format!("Row {} has an empty key", idx));
        }
        if !seen.insert(normalize_key(d.key)) {
            errors.push(format!("Duplicate drink key '{}'", d.key));
        }
        if d.kind as usize != idx {
            errors.push(format!("Drink '{}' is out of enum order", d.key));
        }
        if d.name.is_empty() {
            errors.push(format!("Drink '{}' has empty name", d.key));
        }
        if let Err(e) = crate::types::validate_volume_and_abv(d.oz, d.abv) {
            errors.push(format!("Drink '{}': {}", d.key, e));
        }
    }

    errors
}
