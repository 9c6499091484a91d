//! In-memory drink store.
//!
//! The store owns the authoritative drink list and the user profile, and keeps
//! the latest BAC snapshot. Every mutation recomputes the snapshot through the
//! stateless engine, using the single `now` the caller passes in.

use crate::bac::{full_estimate, BacInput};
use crate::{BacEstimate, Drink, ParsedDrink, Result, UserProfile};
use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

/// Default rolling window for drinks that count toward BAC
pub const DEFAULT_WINDOW_HOURS: i64 = 12;

/// Longest accepted window; BAC from older drinks is long gone
pub const MAX_WINDOW_HOURS: i64 = 24 * 7;

/// Window as a duration, clamped to `0..=MAX_WINDOW_HOURS`
pub(crate) fn window_duration(window_hours: i64) -> Duration {
    Duration::hours(window_hours.clamp(0, MAX_WINDOW_HOURS))
}

#[derive(Clone, Debug)]
pub struct DrinkStore {
    drinks: Vec<Drink>,
    profile: UserProfile,
    window: Duration,
    current: Option<BacEstimate>,
}

impl DrinkStore {
    pub fn new(profile: UserProfile) -> Self {
        Self::with_window(profile, DEFAULT_WINDOW_HOURS)
    }

    pub fn with_window(profile: UserProfile, window_hours: i64) -> Self {
        Self {
            drinks: Vec::new(),
            profile,
            window: window_duration(window_hours),
            current: None,
        }
    }

    /// Build a store from previously persisted drinks and compute the snapshot
    pub fn from_drinks(
        profile: UserProfile,
        window_hours: i64,
        drinks: Vec<Drink>,
        now: DateTime<Utc>,
    ) -> Self {
        let mut store = Self::with_window(profile, window_hours);
        store.drinks = drinks;
        store.recalculate(now);
        store
    }

    pub fn drinks(&self) -> &[Drink] {
        &self.drinks
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    /// Latest snapshot, `None` when no drink falls inside the window
    pub fn current_estimate(&self) -> Option<&BacEstimate> {
        self.current.as_ref()
    }

    pub fn set_user_profile(&mut self, profile: UserProfile, now: DateTime<Utc>) {
        self.profile = profile;
        self.recalculate(now);
    }

    /// Add a drink and refresh the snapshot
    pub fn log_drink(&mut self, drink: Drink, now: DateTime<Utc>) -> Result<&Drink> {
        drink.validate()?;
        tracing::info!("Logged drink {} ({})", drink.name, drink.id);
        self.drinks.push(drink);
        self.recalculate(now);
        Ok(&self.drinks[self.drinks.len() - 1])
    }

    /// Log a parser result for the current user, stamped at `now`
    pub fn log_parsed(
        &mut self,
        parsed: ParsedDrink,
        plan_id: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<&Drink> {
        let drink = parsed.into_drink(&self.profile.user_id, plan_id, now)?;
        self.log_drink(drink, now)
    }

    /// Remove a drink by id, returning it if it was present
    pub fn remove_drink(&mut self, id: Uuid, now: DateTime<Utc>) -> Option<Drink> {
        let idx = self.drinks.iter().position(|d| d.id == id)?;
        let removed = self.drinks.remove(idx);
        tracing::info!("Removed drink {} ({})", removed.name, removed.id);
        self.recalculate(now);
        Some(removed)
    }

    pub fn clear_drinks(&mut self) {
        self.drinks.clear();
        self.current = None;
    }

    /// Drinks logged strictly less than the window before `now`
    pub fn recent_drinks(&self, now: DateTime<Utc>) -> Vec<Drink> {
        self.drinks
            .iter()
            .filter(|d| now - d.logged_at < self.window)
            .cloned()
            .collect()
    }

    /// Recompute the snapshot from drinks inside the window
    pub fn recalculate(&mut self, now: DateTime<Utc>) {
        let recent = self.recent_drinks(now);

        if recent.is_empty() {
            self.current = None;
            return;
        }

        let input = BacInput {
            drinks: &recent,
            weight_lbs: self.profile.weight_lbs,
            sex: self.profile.sex,
            now,
        };
        self.current = Some(full_estimate(&input));
    }

    pub fn drinks_for_plan(&self, plan_id: &str) -> Vec<&Drink> {
        self.drinks
            .iter()
            .filter(|d| d.plan_id.as_deref() == Some(plan_id))
            .collect()
    }

    /// Drinks whose calendar date in `tz` is `day`
    pub fn drinks_on<Tz: TimeZone>(&self, day: NaiveDate, tz: &Tz) -> Vec<&Drink> {
        self.drinks
            .iter()
            .filter(|d| d.logged_at.with_timezone(tz).date_naive() == day)
            .collect()
    }

    /// Drinks logged on the local calendar day of `now`
    pub fn todays_drinks(&self, now: DateTime<Utc>) -> Vec<&Drink> {
        let today = now.with_timezone(&Local).date_naive();
        self.drinks_on(today, &Local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{quick_log_drink, DrinkKind};
    use crate::{AlcoholType, SafetyLevel, Sex};
    use chrono::FixedOffset;

    fn profile() -> UserProfile {
        UserProfile {
            user_id: "user-1".into(),
            weight_lbs: 140.0,
            sex: Sex::Female,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 14, 23, 0, 0).unwrap()
    }

    #[test]
    fn test_new_store_has_no_estimate() {
        let store = DrinkStore::new(profile());
        assert!(store.current_estimate().is_none());
        assert!(store.drinks().is_empty());
    }

    #[test]
    fn test_log_drink_recomputes() {
        crate::logging::init_test();
        let mut store = DrinkStore::new(profile());
        let beer = quick_log_drink(DrinkKind::Beer, "user-1", None, now());

        store.log_drink(beer, now()).unwrap();

        let estimate = store.current_estimate().unwrap();
        assert_eq!(estimate.safety_level, SafetyLevel::Caution);
        assert!(estimate.bac > 0.04);
    }

    #[test]
    fn test_log_drink_rejects_invalid() {
        let mut store = DrinkStore::new(profile());
        let mut bad = quick_log_drink(DrinkKind::Beer, "user-1", None, now());
        bad.estimated_oz = -3.0;

        assert!(store.log_drink(bad, now()).is_err());
        assert!(store.drinks().is_empty());
    }

    #[test]
    fn test_log_parsed_uses_profile_user() {
        let mut store = DrinkStore::new(profile());
        let parsed = ParsedDrink {
            name: "Negroni".into(),
            alcohol_type: AlcoholType::Cocktail,
            estimated_oz: 3.0,
            estimated_abv: 0.24,
        };

        let drink = store.log_parsed(parsed, Some("plan-1".into()), now()).unwrap();
        assert_eq!(drink.user_id, "user-1");
        assert_eq!(drink.plan_id.as_deref(), Some("plan-1"));
        assert!(store.current_estimate().is_some());
    }

    #[test]
    fn test_remove_drink_recomputes() {
        let mut store = DrinkStore::new(profile());
        let shot = quick_log_drink(DrinkKind::Shot, "user-1", None, now());
        let wine = quick_log_drink(DrinkKind::Wine, "user-1", None, now());
        let shot_id = shot.id;
        store.log_drink(shot, now()).unwrap();
        store.log_drink(wine, now()).unwrap();
        let before = store.current_estimate().unwrap().bac;

        let removed = store.remove_drink(shot_id, now()).unwrap();
        assert_eq!(removed.id, shot_id);
        assert!(store.current_estimate().unwrap().bac < before);

        assert!(store.remove_drink(shot_id, now()).is_none());
    }

    #[test]
    fn test_removing_last_drink_clears_estimate() {
        let mut store = DrinkStore::new(profile());
        let beer = quick_log_drink(DrinkKind::Beer, "user-1", None, now());
        let id = beer.id;
        store.log_drink(beer, now()).unwrap();

        store.remove_drink(id, now());
        assert!(store.current_estimate().is_none());
    }

    #[test]
    fn test_window_excludes_old_drinks() {
        let drinks = vec![
            quick_log_drink(DrinkKind::LongIsland, "user-1", None, now() - Duration::hours(12)),
            quick_log_drink(DrinkKind::Beer, "user-1", None, now() - Duration::hours(11)),
        ];
        let store = DrinkStore::from_drinks(profile(), 12, drinks, now());

        let recent = store.recent_drinks(now());
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].name, "Beer");
    }

    #[test]
    fn test_oversized_window_is_clamped() {
        let drinks = vec![
            quick_log_drink(DrinkKind::Beer, "user-1", None, now() - Duration::hours(1)),
            quick_log_drink(DrinkKind::Wine, "user-1", None, now() - Duration::days(30)),
        ];
        let store = DrinkStore::from_drinks(profile(), i64::MAX, drinks, now());

        assert_eq!(store.recent_drinks(now()).len(), 1);
        assert!(store.current_estimate().is_some());
    }

    #[test]
    fn test_only_stale_drinks_yields_no_estimate() {
        let drinks = vec![quick_log_drink(
            DrinkKind::Wine,
            "user-1",
            None,
            now() - Duration::hours(13),
        )];
        let store = DrinkStore::from_drinks(profile(), 12, drinks, now());
        assert!(store.current_estimate().is_none());
        assert_eq!(store.drinks().len(), 1);
    }

    #[test]
    fn test_set_user_profile_recomputes() {
        let mut store = DrinkStore::new(profile());
        store
            .log_drink(quick_log_drink(DrinkKind::Martini, "user-1", None, now()), now())
            .unwrap();
        let before = store.current_estimate().unwrap().bac;

        let mut heavier = profile();
        heavier.weight_lbs = 200.0;
        store.set_user_profile(heavier, now());

        assert!(store.current_estimate().unwrap().bac < before);
    }

    #[test]
    fn test_clear_drinks() {
        let mut store = DrinkStore::new(profile());
        store
            .log_drink(quick_log_drink(DrinkKind::Ipa, "user-1", None, now()), now())
            .unwrap();

        store.clear_drinks();
        assert!(store.drinks().is_empty());
        assert!(store.current_estimate().is_none());
    }

    #[test]
    fn test_drinks_for_plan() {
        let mut store = DrinkStore::new(profile());
        for plan in [Some("a"), Some("b"), Some("a"), None] {
            let drink =
                quick_log_drink(DrinkKind::Beer, "user-1", plan.map(String::from), now());
            store.log_drink(drink, now()).unwrap();
        }

        assert_eq!(store.drinks_for_plan("a").len(), 2);
        assert_eq!(store.drinks_for_plan("b").len(), 1);
        assert!(store.drinks_for_plan("c").is_empty());
    }

    #[test]
    fn test_drinks_on_respects_timezone() {
        let mut store = DrinkStore::new(profile());
        // 23:00 UTC on the 14th is already the 15th at UTC+2
        store
            .log_drink(quick_log_drink(DrinkKind::Beer, "user-1", None, now()), now())
            .unwrap();

        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let the_14th = NaiveDate::from_ymd_opt(2025, 6, 14).unwrap();
        let the_15th = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();

        assert_eq!(store.drinks_on(the_14th, &Utc).len(), 1);
        assert!(store.drinks_on(the_14th, &plus_two).is_empty());
        assert_eq!(store.drinks_on(the_15th, &plus_two).len(), 1);
    }

    #[test]
    fn test_todays_drinks() {
        let real_now = Utc::now();
        let mut store = DrinkStore::new(profile());
        store
            .log_drink(quick_log_drink(DrinkKind::Wine, "user-1", None, real_now), real_now)
            .unwrap();
        store
            .log_drink(
                quick_log_drink(DrinkKind::Wine, "user-1", None, real_now - Duration::days(3)),
                real_now,
            )
            .unwrap();

        assert_eq!(store.todays_drinks(real_now).len(), 1);
    }
}
