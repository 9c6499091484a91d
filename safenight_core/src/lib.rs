#![forbid(unsafe_code)]

//! Core domain model and business logic for SafeNight drink tracking.
//!
//! This crate provides:
//! - Domain types (drinks, profiles, BAC estimates, safety tiers)
//! - The standard-drink catalog and quick logging
//! - The Widmark-based BAC estimation engine
//! - The drink store that recomputes estimates on every mutation
//! - Persistence (WAL, CSV archive, profile state)

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod bac;
pub mod display;
pub mod parser;
pub mod store;
pub mod wal;
pub mod history;
pub mod rollup;
pub mod state;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{quick_log_drink, quick_log_drink_now, standard_drink, DrinkKind, StandardDrink};
pub use config::Config;
pub use bac::{calculate_bac, full_estimate, BacInput};
pub use display::{format_bac, format_time_to_sober};
pub use parser::{parse_drink_response, ParsedDrink};
pub use store::DrinkStore;
pub use wal::{DrinkLogEntry, DrinkSink, JsonlSink};
pub use history::{load_drinks, load_recent_drinks};
