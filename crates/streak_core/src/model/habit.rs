//! Habit domain model.
//!
//! # Responsibility
//! - Define the habit record shared by the store, engines and FFI.
//! - Validate user-editable fields (`name`, `icon`).
//!
//! # Invariants
//! - `id` and `created_at` never change after creation.
//! - `name` is stored trimmed and is never empty.
//! - `icon` is exactly one extended grapheme cluster containing an emoji.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use unicode_segmentation::UnicodeSegmentation;
use uuid::Uuid;

/// Stable identifier for a habit.
pub type HabitId = Uuid;

static EMOJI_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\p{Emoji_Presentation}\p{Extended_Pictographic}]").expect("valid emoji regex")
});

/// Validation failures for habit fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HabitValidationError {
    /// Name is empty or whitespace only.
    EmptyName,
    /// Icon is not a single emoji grapheme.
    InvalidIcon(String),
}

impl Display for HabitValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "habit name cannot be empty"),
            Self::InvalidIcon(value) => write!(f, "habit icon must be a single emoji, got `{value}`"),
        }
    }
}

impl Error for HabitValidationError {}

/// A user-defined recurring activity tracked per calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: HabitId,
    pub name: String,
    pub icon: String,
    /// Calendar date of creation, no time component.
    pub created_at: NaiveDate,
    /// Display rank. Unique across habits; dense after every reorder.
    pub order: u32,
}

impl Habit {
    /// Creates a validated habit with a generated stable ID.
    pub fn new(
        name: &str,
        icon: &str,
        created_at: NaiveDate,
        order: u32,
    ) -> Result<Self, HabitValidationError> {
        Self::with_id(Uuid::new_v4(), name, icon, created_at, order)
    }

    /// Creates a validated habit with a caller-provided ID.
    ///
    /// Used by import paths where identity already exists externally.
    pub fn with_id(
        id: HabitId,
        name: &str,
        icon: &str,
        created_at: NaiveDate,
        order: u32,
    ) -> Result<Self, HabitValidationError> {
        Ok(Self {
            id,
            name: normalize_name(name)?,
            icon: normalize_icon(icon)?,
            created_at,
            order,
        })
    }

    /// Re-checks field rules, e.g. on records read back from storage.
    pub fn validate(&self) -> Result<(), HabitValidationError> {
        normalize_name(&self.name)?;
        normalize_icon(&self.icon)?;
        Ok(())
    }

    /// Merges a patch into this habit.
    ///
    /// Both fields are validated before either is written, so a rejected
    /// patch leaves the habit untouched.
    pub fn apply_patch(&mut self, patch: &HabitPatch) -> Result<(), HabitValidationError> {
        let (name, icon) = patch.normalized()?;
        if let Some(name) = name {
            self.name = name;
        }
        if let Some(icon) = icon {
            self.icon = icon;
        }
        Ok(())
    }
}

/// Partial update for the editable habit fields.
///
/// `id`, `created_at` and `order` are intentionally absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HabitPatch {
    pub name: Option<String>,
    pub icon: Option<String>,
}

impl HabitPatch {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            icon: None,
        }
    }

    pub fn icon(icon: impl Into<String>) -> Self {
        Self {
            name: None,
            icon: Some(icon.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.icon.is_none()
    }

    /// Returns the validated, normalized field values.
    pub fn normalized(
        &self,
    ) -> Result<(Option<String>, Option<String>), HabitValidationError> {
        let name = self.name.as_deref().map(normalize_name).transpose()?;
        let icon = self.icon.as_deref().map(normalize_icon).transpose()?;
        Ok((name, icon))
    }
}

/// Trims and validates a habit name.
pub fn normalize_name(name: &str) -> Result<String, HabitValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(HabitValidationError::EmptyName);
    }
    Ok(trimmed.to_string())
}

/// Trims and validates a habit icon.
pub fn normalize_icon(icon: &str) -> Result<String, HabitValidationError> {
    let trimmed = icon.trim();
    if is_single_emoji(trimmed) {
        Ok(trimmed.to_string())
    } else {
        Err(HabitValidationError::InvalidIcon(icon.to_string()))
    }
}

/// Returns whether `value` is one grapheme cluster carrying an emoji.
///
/// ZWJ sequences, skin-tone modifiers and flags are single clusters and
/// pass; plain text, digits and multi-emoji strings do not.
pub fn is_single_emoji(value: &str) -> bool {
    let mut graphemes = value.graphemes(true);
    match (graphemes.next(), graphemes.next()) {
        (Some(cluster), None) => EMOJI_RE.is_match(cluster),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn created() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    #[test]
    fn accepts_single_emoji_graphemes() {
        for icon in ["🔥", "⭐", "❤️", "👍🏽", "👨‍👩‍👧", "🇯🇵"] {
            assert!(is_single_emoji(icon), "{icon} should be accepted");
        }
    }

    #[test]
    fn rejects_text_and_multiple_emoji() {
        for icon in ["", "a", "1", "ok", "🔥🔥", "🔥 x"] {
            assert!(!is_single_emoji(icon), "{icon} should be rejected");
        }
    }

    #[test]
    fn new_trims_name_and_rejects_blank() {
        let habit = Habit::new("  Read  ", "📚", created(), 0).unwrap();
        assert_eq!(habit.name, "Read");

        let err = Habit::new("   ", "📚", created(), 0).unwrap_err();
        assert_eq!(err, HabitValidationError::EmptyName);
    }

    #[test]
    fn rejected_patch_leaves_habit_untouched() {
        let mut habit = Habit::new("Run", "🏃", created(), 0).unwrap();
        let patch = HabitPatch {
            name: Some("Jog".to_string()),
            icon: Some("x".to_string()),
        };

        let err = habit.apply_patch(&patch).unwrap_err();
        assert!(matches!(err, HabitValidationError::InvalidIcon(_)));
        assert_eq!(habit.name, "Run");

        habit.apply_patch(&HabitPatch::name("Jog")).unwrap();
        assert_eq!(habit.name, "Jog");
        assert_eq!(habit.icon, "🏃");
    }

    #[test]
    fn serializes_with_camel_case_and_iso_date() {
        let habit = Habit::new("Run", "🏃", created(), 3).unwrap();
        let json = serde_json::to_value(&habit).unwrap();
        assert_eq!(json["createdAt"], "2024-01-01");
        assert_eq!(json["order"], 3);
    }
}
