//! Habit store use-case service.
//!
//! # Responsibility
//! - Own every write to the persisted habit aggregate.
//! - Provide CRUD, reorder and completion-toggle entry points.
//!
//! # Invariants
//! - Each mutation is one load -> mutate -> save cycle of the whole aggregate.
//! - Validation failures return before the backend is touched.
//! - Unknown habit ids are absorbed: callers get `None`/`false`/empty.
//! - Store layer remains storage-agnostic.

use crate::date;
use crate::model::habit::{Habit, HabitId, HabitPatch, HabitValidationError};
use crate::model::state::{AppState, HabitLog};
use crate::repo::state_repo::{RepoError, StateBackend};
use chrono::NaiveDate;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Store-level error.
#[derive(Debug)]
pub enum StoreError {
    /// Rejected user input; nothing was persisted.
    Validation(HabitValidationError),
    /// Backend load/save failure.
    Persistence(RepoError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Persistence(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Persistence(err) => Some(err),
        }
    }
}

impl From<HabitValidationError> for StoreError {
    fn from(value: HabitValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        Self::Persistence(value)
    }
}

/// Single source of truth for habits and completion logs.
pub struct HabitStore<B: StateBackend> {
    backend: B,
}

impl<B: StateBackend> HabitStore<B> {
    /// Creates a store over the provided persistence backend.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Lists habits ascending by `order`.
    pub fn list_habits(&self) -> StoreResult<Vec<Habit>> {
        Ok(self.backend.load()?.sorted_habits())
    }

    /// Gets one habit by ID.
    pub fn get_habit(&self, id: HabitId) -> StoreResult<Option<Habit>> {
        Ok(self.backend.load()?.find_habit(id).cloned())
    }

    /// Adds a habit created today, appended at the end of the display order.
    pub fn add_habit(&self, name: &str, icon: &str) -> StoreResult<Habit> {
        self.add_habit_on(name, icon, date::today())
    }

    /// Adds a habit with an explicit creation date.
    ///
    /// # Errors
    /// - `StoreError::Validation` for a blank name or a non-emoji icon; the
    ///   backend is not read or written in that case.
    pub fn add_habit_on(
        &self,
        name: &str,
        icon: &str,
        created_at: NaiveDate,
    ) -> StoreResult<Habit> {
        // Rank is assigned after load; validation must not depend on the backend.
        let mut habit = Habit::new(name, icon, created_at, 0)?;

        let mut state = self.backend.load()?;
        habit.order = state.next_order();
        state.habits.push(habit.clone());
        self.backend.save(&state)?;

        info!(
            "event=habit_add module=store status=ok habit_id={} order={} habit_count={}",
            habit.id,
            habit.order,
            state.habits.len()
        );
        Ok(habit)
    }

    /// Merges `patch` (name/icon only) into an existing habit.
    ///
    /// Returns `Ok(None)` without persisting when `id` is unknown.
    pub fn update_habit(&self, id: HabitId, patch: &HabitPatch) -> StoreResult<Option<Habit>> {
        patch.normalized()?;

        let mut state = self.backend.load()?;
        let Some(habit) = state.find_habit_mut(id) else {
            debug!("event=habit_update module=store status=not_found habit_id={id}");
            return Ok(None);
        };
        habit.apply_patch(patch)?;
        let updated = habit.clone();
        self.backend.save(&state)?;

        info!("event=habit_update module=store status=ok habit_id={id}");
        Ok(Some(updated))
    }

    /// Deletes a habit and every log entry it owns.
    ///
    /// Remaining `order` values are not renumbered. Returns whether the
    /// habit itself existed; orphaned log entries are purged either way.
    pub fn delete_habit(&self, id: HabitId) -> StoreResult<bool> {
        let mut state = self.backend.load()?;
        let before = state.habits.len();
        state.habits.retain(|habit| habit.id != id);
        let removed_habit = state.habits.len() != before;
        let removed_logs = state.purge_logs(id);

        if !removed_habit && removed_logs == 0 {
            debug!("event=habit_delete module=store status=not_found habit_id={id}");
            return Ok(false);
        }
        self.backend.save(&state)?;

        info!(
            "event=habit_delete module=store status=ok habit_id={} removed_logs={}",
            id, removed_logs
        );
        Ok(removed_habit)
    }

    /// Assigns `order = index` for each listed habit.
    ///
    /// Unknown ids are skipped and unlisted habits keep their rank, so a
    /// partial list is tolerated.
    pub fn reorder_habits(&self, ordered_ids: &[HabitId]) -> StoreResult<()> {
        let mut state = self.backend.load()?;
        let mut skipped = 0usize;
        for (index, id) in ordered_ids.iter().enumerate() {
            match state.find_habit_mut(*id) {
                Some(habit) => habit.order = u32::try_from(index).unwrap_or(u32::MAX),
                None => skipped += 1,
            }
        }
        if ordered_ids.len() != state.habits.len() || skipped > 0 {
            warn!(
                "event=habit_reorder module=store status=partial listed={} skipped={} habit_count={}",
                ordered_ids.len(),
                skipped,
                state.habits.len()
            );
        }
        self.backend.save(&state)?;

        info!(
            "event=habit_reorder module=store status=ok listed={}",
            ordered_ids.len()
        );
        Ok(())
    }

    /// Flips completion of `habit_id` on `day` and returns the new value.
    ///
    /// Returns `Ok(None)` without persisting when the habit is unknown.
    pub fn toggle_completion(
        &self,
        habit_id: HabitId,
        day: NaiveDate,
    ) -> StoreResult<Option<bool>> {
        let mut state = self.backend.load()?;
        if state.find_habit(habit_id).is_none() {
            debug!("event=habit_toggle module=store status=not_found habit_id={habit_id}");
            return Ok(None);
        }
        let completed = state.toggle(habit_id, day);
        self.backend.save(&state)?;

        debug!(
            "event=habit_toggle module=store status=ok habit_id={} date={} completed={}",
            habit_id,
            date::format_date(day),
            completed
        );
        Ok(Some(completed))
    }

    /// Returns whether `habit_id` is completed on `date`.
    pub fn is_completed(&self, habit_id: HabitId, date: NaiveDate) -> StoreResult<bool> {
        Ok(self.backend.load()?.is_completed(habit_id, date))
    }

    /// Returns only the explicit entries for one habit.
    pub fn get_habit_logs(&self, habit_id: HabitId) -> StoreResult<HabitLog> {
        Ok(self.backend.load()?.habit_log(habit_id))
    }

    /// Returns explicit entries for every habit from a single load.
    pub fn logs_by_habit(&self) -> StoreResult<HashMap<HabitId, HabitLog>> {
        Ok(self.backend.load()?.logs_by_habit())
    }

    /// Returns a full copy of the persisted aggregate.
    pub fn snapshot(&self) -> StoreResult<AppState> {
        self.backend.load().map_err(StoreError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::state_repo::MemoryStateBackend;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn store() -> HabitStore<MemoryStateBackend> {
        HabitStore::new(MemoryStateBackend::new())
    }

    #[test]
    fn add_appends_with_dense_order() {
        let store = store();
        let a = store.add_habit_on("Read", "📚", ymd(2024, 1, 1)).unwrap();
        let b = store.add_habit_on("Run", "🏃", ymd(2024, 1, 2)).unwrap();

        assert_eq!((a.order, b.order), (0, 1));
        assert_eq!(b.created_at, ymd(2024, 1, 2));
        let listed: Vec<HabitId> = store.list_habits().unwrap().iter().map(|h| h.id).collect();
        assert_eq!(listed, vec![a.id, b.id]);
    }

    #[test]
    fn add_uses_today_for_created_at() {
        let store = store();
        let before = date::today();
        let habit = store.add_habit("Walk", "🚶").unwrap();
        assert!(habit.created_at >= before);
        assert!(habit.created_at <= date::today());
    }

    #[test]
    fn validation_failure_does_not_touch_backend() {
        let store = store();
        let err = store.add_habit_on("  ", "🔥", ymd(2024, 1, 1)).unwrap_err();
        assert!(matches!(err, StoreError::Validation(HabitValidationError::EmptyName)));

        let err = store.add_habit_on("Read", "book", ymd(2024, 1, 1)).unwrap_err();
        assert!(matches!(err, StoreError::Validation(HabitValidationError::InvalidIcon(_))));

        assert_eq!(store.backend().save_count(), 0);
        assert!(store.list_habits().unwrap().is_empty());
    }

    #[test]
    fn update_merges_fields_and_ignores_unknown_id() {
        let store = store();
        let habit = store.add_habit_on("Read", "📚", ymd(2024, 1, 1)).unwrap();

        let updated = store
            .update_habit(habit.id, &HabitPatch::icon("📖"))
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "Read");
        assert_eq!(updated.icon, "📖");
        assert_eq!(updated.order, habit.order);
        assert_eq!(updated.created_at, habit.created_at);

        let saves = store.backend().save_count();
        assert!(store
            .update_habit(HabitId::new_v4(), &HabitPatch::name("x"))
            .unwrap()
            .is_none());
        assert_eq!(store.backend().save_count(), saves);
    }

    #[test]
    fn update_rejects_invalid_patch_before_persisting() {
        let store = store();
        let habit = store.add_habit_on("Read", "📚", ymd(2024, 1, 1)).unwrap();
        let saves = store.backend().save_count();

        let err = store
            .update_habit(habit.id, &HabitPatch::name(""))
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(store.backend().save_count(), saves);
        assert_eq!(store.get_habit(habit.id).unwrap().unwrap().name, "Read");
    }

    #[test]
    fn toggle_unknown_habit_is_absorbed() {
        let store = store();
        assert_eq!(
            store.toggle_completion(HabitId::new_v4(), ymd(2024, 1, 1)).unwrap(),
            None
        );
        assert_eq!(store.backend().save_count(), 0);
    }

    #[test]
    fn add_after_delete_keeps_orders_unique() {
        let store = store();
        let a = store.add_habit_on("A", "🍎", ymd(2024, 1, 1)).unwrap();
        store.add_habit_on("B", "🐝", ymd(2024, 1, 1)).unwrap();
        store.add_habit_on("C", "🌊", ymd(2024, 1, 1)).unwrap();
        assert!(store.delete_habit(a.id).unwrap());

        let d = store.add_habit_on("D", "🐶", ymd(2024, 1, 1)).unwrap();
        let orders: Vec<u32> = store.list_habits().unwrap().iter().map(|h| h.order).collect();
        assert_eq!(orders, vec![1, 2, 3]);
        assert_eq!(d.order, 3);
    }
}
