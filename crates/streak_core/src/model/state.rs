//! Persisted aggregate of habits and completion logs.
//!
//! # Responsibility
//! - Define the single document the store loads and saves as one unit.
//! - Provide in-memory mutation helpers used by the store.
//!
//! # Invariants
//! - Logs stay sparse: only explicitly toggled `(date, habit)` pairs exist.
//! - Date buckets are keyed by calendar date and serialize as `YYYY-MM-DD`.

use crate::model::habit::{Habit, HabitId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// One habit's explicit entries: date -> completed.
pub type HabitLog = BTreeMap<NaiveDate, bool>;

/// All explicit entries: date -> (habit id -> completed).
pub type CompletionLogs = BTreeMap<NaiveDate, BTreeMap<HabitId, bool>>;

/// The whole persisted store document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppState {
    #[serde(default)]
    pub habits: Vec<Habit>,
    #[serde(default)]
    pub logs: CompletionLogs,
}

impl AppState {
    pub fn find_habit(&self, id: HabitId) -> Option<&Habit> {
        self.habits.iter().find(|habit| habit.id == id)
    }

    pub fn find_habit_mut(&mut self, id: HabitId) -> Option<&mut Habit> {
        self.habits.iter_mut().find(|habit| habit.id == id)
    }

    /// Habits sorted by display rank. Ties keep storage order.
    pub fn sorted_habits(&self) -> Vec<Habit> {
        let mut habits = self.habits.clone();
        habits.sort_by_key(|habit| habit.order);
        habits
    }

    /// Rank for a newly appended habit.
    ///
    /// Equals the habit count while ranks are dense; after deletions leave
    /// that rank occupied, falls back to one past the highest rank.
    pub fn next_order(&self) -> u32 {
        let count = u32::try_from(self.habits.len()).unwrap_or(u32::MAX);
        let taken = self.habits.iter().any(|habit| habit.order == count);
        if !taken {
            return count;
        }
        self.habits
            .iter()
            .map(|habit| habit.order)
            .max()
            .map_or(count, |max| max.saturating_add(1))
    }

    pub fn is_completed(&self, habit_id: HabitId, date: NaiveDate) -> bool {
        self.logs
            .get(&date)
            .and_then(|entries| entries.get(&habit_id))
            .copied()
            .unwrap_or(false)
    }

    /// Flips one entry (absent counts as `false`) and returns the new value.
    pub fn toggle(&mut self, habit_id: HabitId, date: NaiveDate) -> bool {
        let entry = self
            .logs
            .entry(date)
            .or_default()
            .entry(habit_id)
            .or_insert(false);
        *entry = !*entry;
        *entry
    }

    /// Explicit entries for one habit.
    pub fn habit_log(&self, habit_id: HabitId) -> HabitLog {
        self.logs
            .iter()
            .filter_map(|(date, entries)| entries.get(&habit_id).map(|done| (*date, *done)))
            .collect()
    }

    /// Explicit entries for every known habit, keyed by habit id.
    ///
    /// Habits without entries map to an empty log.
    pub fn logs_by_habit(&self) -> HashMap<HabitId, HabitLog> {
        let mut by_habit: HashMap<HabitId, HabitLog> = self
            .habits
            .iter()
            .map(|habit| (habit.id, HabitLog::new()))
            .collect();
        for (date, entries) in &self.logs {
            for (habit_id, done) in entries {
                if let Some(log) = by_habit.get_mut(habit_id) {
                    log.insert(*date, *done);
                }
            }
        }
        by_habit
    }

    /// Removes every log entry for `habit_id`, dropping emptied dates.
    ///
    /// Returns the number of entries removed.
    pub fn purge_logs(&mut self, habit_id: HabitId) -> usize {
        let mut removed = 0;
        self.logs.retain(|_, entries| {
            if entries.remove(&habit_id).is_some() {
                removed += 1;
            }
            !entries.is_empty()
        });
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn habit(name: &str, order: u32) -> Habit {
        Habit::new(name, "⭐", ymd(2024, 1, 1), order).unwrap()
    }

    #[test]
    fn next_order_appends_and_skips_taken_rank() {
        let mut state = AppState::default();
        assert_eq!(state.next_order(), 0);

        state.habits = vec![habit("a", 1), habit("b", 2)];
        assert_eq!(state.next_order(), 3);

        state.habits = vec![habit("a", 0), habit("b", 1)];
        assert_eq!(state.next_order(), 2);
    }

    #[test]
    fn purge_logs_drops_emptied_dates_only() {
        let mut state = AppState::default();
        let a = habit("a", 0);
        let b = habit("b", 1);
        state.toggle(a.id, ymd(2024, 1, 1));
        state.toggle(a.id, ymd(2024, 1, 2));
        state.toggle(b.id, ymd(2024, 1, 2));

        assert_eq!(state.purge_logs(a.id), 2);
        assert!(!state.logs.contains_key(&ymd(2024, 1, 1)));
        assert!(state.is_completed(b.id, ymd(2024, 1, 2)));
    }

    #[test]
    fn json_layout_uses_date_keys() {
        let mut state = AppState::default();
        let a = habit("a", 0);
        state.toggle(a.id, ymd(2024, 2, 10));
        state.habits.push(a.clone());

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["logs"]["2024-02-10"][a.id.to_string()], true);

        let back: AppState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn missing_sections_deserialize_as_empty() {
        let state: AppState = serde_json::from_str("{}").unwrap();
        assert!(state.habits.is_empty());
        assert!(state.logs.is_empty());
    }
}
