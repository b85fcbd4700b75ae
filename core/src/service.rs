use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::debug;

use crate::db::{Database, StoreOptions};
use crate::models::{
    EquipmentItem, FoodPreference, HistoryEntry, NewEquipment, NewFoodPreference,
    PLACEHOLDER_USERS, Profile, ProfileInput, non_blank, validate_profile_input,
    validate_user_name, validate_weight,
};
use crate::prompts;
use crate::session::SessionContext;

/// History entries loaded when building a prompt. The prompt itself only
/// shows the most recent [`prompts::HISTORY_LINES`].
pub const HISTORY_FETCH_LIMIT: i64 = 10;

pub struct FitFlowService {
    db: Database,
}

impl FitFlowService {
    pub fn new(db_path: &Path, options: StoreOptions) -> Result<Self> {
        let db = Database::open_with_options(db_path, options)?;
        Ok(Self { db })
    }

    pub fn new_in_memory() -> Result<Self> {
        Self::new_in_memory_with_options(StoreOptions::default())
    }

    pub fn new_in_memory_with_options(options: StoreOptions) -> Result<Self> {
        let db = Database::open_in_memory_with_options(options)?;
        Ok(Self { db })
    }

    #[must_use]
    pub fn history_available(&self) -> bool {
        self.db.history_available()
    }

    // --- Profiles ---

    /// Create empty placeholder profiles for any missing default slot.
    pub fn ensure_default_users(&self) -> Result<()> {
        for name in PLACEHOLDER_USERS {
            if self.db.get_profile(name)?.is_none() {
                debug!(user_name = name, "creating placeholder profile");
                self.db.upsert_profile(name, 0, 0, 0, "")?;
            }
        }
        Ok(())
    }

    /// Names offered for selection: placeholder slots first, then every
    /// stored profile, without duplicates.
    pub fn display_user_names(&self) -> Result<Vec<String>> {
        let mut seen = HashSet::new();
        let names = PLACEHOLDER_USERS
            .iter()
            .map(ToString::to_string)
            .chain(self.db.list_user_names()?)
            .filter(|n| seen.insert(n.clone()))
            .collect();
        Ok(names)
    }

    pub fn list_user_names(&self) -> Result<Vec<String>> {
        self.db.list_user_names()
    }

    pub fn get_profile(&self, user_name: &str) -> Result<Option<Profile>> {
        self.db.get_profile(user_name)
    }

    pub fn require_profile(&self, user_name: &str) -> Result<Profile> {
        self.db
            .get_profile(user_name)?
            .with_context(|| format!("Profile '{user_name}' not found"))
    }

    /// Validate and store the profile form for `current_name`.
    ///
    /// When the input carries a different name the profile and everything it
    /// owns is renamed first. The new name must not belong to another profile.
    pub fn save_profile(&self, current_name: &str, input: &ProfileInput) -> Result<Profile> {
        let current = validate_user_name(current_name)?;
        let target = match input.user_name.as_deref() {
            Some(name) => validate_user_name(name)?,
            None => current.clone(),
        };
        validate_profile_input(input)?;

        if target != current {
            if self.db.get_profile(&target)?.is_some() {
                bail!("A profile named '{target}' already exists");
            }
            if self.db.get_profile(&current)?.is_some() {
                self.db.rename_user(&current, &target)?;
            }
        }
        self.db.upsert_profile(
            &target,
            input.age,
            input.height_in,
            input.weight_lbs,
            input.medical_notes.trim(),
        )
    }

    pub fn update_weight(&self, user_name: &str, weight_lbs: i64) -> Result<Profile> {
        validate_weight(weight_lbs)?;
        self.db.update_weight(user_name, weight_lbs)
    }

    pub fn rename_user(&self, old_name: &str, new_name: &str) -> Result<Profile> {
        let new_name = validate_user_name(new_name)?;
        self.db.rename_user(old_name, &new_name)?;
        self.require_profile(&new_name)
    }

    // --- Equipment ---

    pub fn list_equipment(&self, user_name: &str) -> Result<Vec<EquipmentItem>> {
        self.db.list_equipment(user_name)
    }

    pub fn add_equipment(&self, item: &NewEquipment) -> Result<EquipmentItem> {
        let name = item.name.trim();
        if name.is_empty() {
            bail!("Equipment name is required");
        }
        self.db.add_equipment(&NewEquipment {
            user_name: validate_user_name(&item.user_name)?,
            name: name.to_string(),
            category: item.category,
            notes: non_blank(item.notes.clone()),
        })
    }

    pub fn delete_equipment(&self, id: i64) -> Result<bool> {
        self.db.delete_equipment(id)
    }

    // --- Food preferences ---

    pub fn list_food_preferences(&self, user_name: &str) -> Result<Vec<FoodPreference>> {
        self.db.list_food_preferences(user_name)
    }

    pub fn add_food_preference(&self, pref: &NewFoodPreference) -> Result<FoodPreference> {
        let item_name = pref.item_name.trim();
        if item_name.is_empty() {
            bail!("Food item name is required");
        }
        self.db.add_food_preference(&NewFoodPreference {
            user_name: validate_user_name(&pref.user_name)?,
            item_name: item_name.to_string(),
            preference_type: pref.preference_type,
            nutritional_goal: non_blank(pref.nutritional_goal.clone()),
        })
    }

    pub fn delete_food_preference(&self, id: i64) -> Result<bool> {
        self.db.delete_food_preference(id)
    }

    // --- History ---

    pub fn get_history(&self, user_name: &str, limit: i64) -> Result<Vec<HistoryEntry>> {
        self.db.get_history(user_name, limit)
    }

    pub fn save_history(
        &self,
        user_name: &str,
        workout: &str,
        dinner: &str,
    ) -> Result<Option<HistoryEntry>> {
        self.db.save_history(user_name, workout, dinner)
    }

    /// Persist the session's workout and dinner for its selected user.
    pub fn save_session_history(&self, session: &SessionContext) -> Result<Option<HistoryEntry>> {
        let user_name = session
            .selected_user
            .as_deref()
            .context("No user selected")?;
        let (workout, dinner) = session
            .pending_history()
            .context("Generate both a workout and a dinner before saving")?;
        self.db.save_history(user_name, workout, dinner)
    }

    // --- Prompts ---

    pub fn workout_prompt(&self, user_name: &str) -> Result<String> {
        let profile = self.require_profile(user_name)?;
        let equipment = self.db.list_equipment(user_name)?;
        let history = self.db.get_history(user_name, HISTORY_FETCH_LIMIT)?;
        Ok(prompts::workout_prompt(&profile, &equipment, &history))
    }

    pub fn dinner_prompt(&self, user_name: &str) -> Result<String> {
        let profile = self.require_profile(user_name)?;
        let food_prefs = self.db.list_food_preferences(user_name)?;
        let history = self.db.get_history(user_name, HISTORY_FETCH_LIMIT)?;
        Ok(prompts::dinner_prompt(&profile, &food_prefs, &history))
    }

    pub fn recipe_prompt(&self, user_name: &str, dinner_description: &str) -> Result<String> {
        if dinner_description.trim().is_empty() {
            bail!("Generate a dinner suggestion before asking for its recipe");
        }
        self.require_profile(user_name)?;
        let food_prefs = self.db.list_food_preferences(user_name)?;
        Ok(prompts::recipe_prompt(dinner_description, &food_prefs))
    }
}
