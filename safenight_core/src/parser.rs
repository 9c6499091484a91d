//! Output contract of the external free-text drink parser.
//!
//! The parser (an LLM prompt) replies with a JSON object such as
//! `{"name":"Margarita","alcoholType":"cocktail","estimatedOz":6,"estimatedABV":0.13}`.
//! Replies that are not valid JSON fall back to a generic mid-strength drink
//! named after the user's description.

use crate::types::validate_volume_and_abv;
use crate::{AlcoholType, Drink, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const FALLBACK_OZ: f64 = 4.0;
const FALLBACK_ABV: f64 = 0.1;

/// A drink description as produced by the parser
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParsedDrink {
    pub name: String,
    pub alcohol_type: AlcoholType,
    pub estimated_oz: f64,
    #[serde(rename = "estimatedABV")]
    pub estimated_abv: f64,
}

impl ParsedDrink {
    /// Placeholder used when the parser reply cannot be read
    pub fn fallback(description: &str) -> Self {
        Self {
            name: description.to_string(),
            alcohol_type: AlcoholType::Other,
            estimated_oz: FALLBACK_OZ,
            estimated_abv: FALLBACK_ABV,
        }
    }

    /// Enforce the drink invariants before anything is logged
    pub fn validate(&self) -> Result<()> {
        validate_volume_and_abv(self.estimated_oz, self.estimated_abv)
    }

    /// Validate and stamp an id and timestamp
    pub fn into_drink(
        self,
        user_id: &str,
        plan_id: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Drink> {
        self.validate()?;
        Ok(Drink {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            plan_id,
            name: self.name,
            alcohol_type: self.alcohol_type,
            estimated_oz: self.estimated_oz,
            estimated_abv: self.estimated_abv,
            logged_at: now,
        })
    }
}

/// Read a parser reply, falling back when it is not the expected JSON
pub fn parse_drink_response(description: &str, raw: &str) -> ParsedDrink {
    match serde_json::from_str::<ParsedDrink>(raw.trim()) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(
                "Could not read drink parser reply for {:?}: {}. Using fallback.",
                description,
                e
            );
            ParsedDrink::fallback(description)
        }
    }
}
