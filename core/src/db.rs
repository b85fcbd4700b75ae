use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use chrono::Local;
use rusqlite::{Connection, params};
use tracing::debug;

use crate::models::{
    EquipmentItem, FoodPreference, HISTORY_TEXT_LIMIT, HistoryEntry, NewEquipment,
    NewFoodPreference, Profile, truncate_chars,
};

const HISTORY_TABLE: &str = "recommendation_history";

/// Schema options applied when the database is opened.
#[derive(Debug, Clone, Copy)]
pub struct StoreOptions {
    /// Create the recommendation history table if it does not exist yet.
    pub provision_history: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            provision_history: true,
        }
    }
}

pub struct Database {
    conn: Connection,
    history_available: bool,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_options(path, StoreOptions::default())
    }

    pub fn open_with_options(path: &Path, options: StoreOptions) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        Self::init(conn, options)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::open_in_memory_with_options(StoreOptions::default())
    }

    pub fn open_in_memory_with_options(options: StoreOptions) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, options)
    }

    fn init(conn: Connection, options: StoreOptions) -> Result<Self> {
        let mut db = Database {
            conn,
            history_available: false,
        };
        db.migrate(options)?;
        db.history_available = db.table_exists(HISTORY_TABLE)?;
        debug!(
            history_available = db.history_available,
            "recommendation history capability resolved"
        );
        Ok(db)
    }

    fn migrate(&self, options: StoreOptions) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS physical_profile (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_name TEXT NOT NULL UNIQUE,
                    age INTEGER NOT NULL DEFAULT 0,
                    height_in INTEGER NOT NULL DEFAULT 0,
                    weight_lbs INTEGER NOT NULL DEFAULT 0,
                    medical_notes TEXT NOT NULL DEFAULT '',
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS equipment_inventory (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_name TEXT NOT NULL,
                    name TEXT NOT NULL,
                    category TEXT NOT NULL,
                    notes TEXT,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS food_preferences (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_name TEXT NOT NULL,
                    item_name TEXT NOT NULL,
                    preference_type TEXT NOT NULL,
                    nutritional_goal TEXT,
                    created_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_equipment_user ON equipment_inventory(user_name);
                CREATE INDEX IF NOT EXISTS idx_food_preferences_user ON food_preferences(user_name);

                PRAGMA user_version = 1;",
            )?;
        }

        // The history log is optional: a store opened without it keeps working,
        // and a later open with provisioning enabled adds it.
        if version < 2 && options.provision_history {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS recommendation_history (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_name TEXT NOT NULL,
                    workout TEXT NOT NULL,
                    dinner TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_history_user_created
                    ON recommendation_history(user_name, created_at);

                PRAGMA user_version = 2;",
            )?;
        }

        Ok(())
    }

    fn table_exists(&self, table: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Whether the recommendation history table exists in this store.
    #[must_use]
    pub fn history_available(&self) -> bool {
        self.history_available
    }

    // --- Row mapping helpers ---

    fn profile_from_row(row: &rusqlite::Row) -> rusqlite::Result<Profile> {
        Ok(Profile {
            id: row.get(0)?,
            user_name: row.get(1)?,
            age: row.get(2)?,
            height_in: row.get(3)?,
            weight_lbs: row.get(4)?,
            medical_notes: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }

    fn parse_column<T>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T>
    where
        T: FromStr<Err = anyhow::Error>,
    {
        let raw: String = row.get(idx)?;
        raw.parse::<T>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, e.into())
        })
    }

    fn equipment_from_row(row: &rusqlite::Row) -> rusqlite::Result<EquipmentItem> {
        Ok(EquipmentItem {
            id: row.get(0)?,
            user_name: row.get(1)?,
            name: row.get(2)?,
            category: Self::parse_column(row, 3)?,
            notes: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    fn food_preference_from_row(row: &rusqlite::Row) -> rusqlite::Result<FoodPreference> {
        Ok(FoodPreference {
            id: row.get(0)?,
            user_name: row.get(1)?,
            item_name: row.get(2)?,
            preference_type: Self::parse_column(row, 3)?,
            nutritional_goal: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    fn history_from_row(row: &rusqlite::Row) -> rusqlite::Result<HistoryEntry> {
        Ok(HistoryEntry {
            id: row.get(0)?,
            user_name: row.get(1)?,
            workout: row.get(2)?,
            dinner: row.get(3)?,
            created_at: row.get(4)?,
        })
    }

    // --- Profiles ---

    pub fn list_user_names(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT user_name FROM physical_profile ORDER BY user_name")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    pub fn get_profile(&self, user_name: &str) -> Result<Option<Profile>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_name, age, height_in, weight_lbs, medical_notes, created_at, updated_at
             FROM physical_profile WHERE user_name = ?1",
        )?;
        let mut rows = stmt.query(params![user_name])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Self::profile_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    /// Update the profile named `user_name` if it exists, otherwise insert it.
    pub fn upsert_profile(
        &self,
        user_name: &str,
        age: i64,
        height_in: i64,
        weight_lbs: i64,
        medical_notes: &str,
    ) -> Result<Profile> {
        let now = Local::now().to_rfc3339();
        if self.get_profile(user_name)?.is_some() {
            self.conn.execute(
                "UPDATE physical_profile
                 SET age = ?1, height_in = ?2, weight_lbs = ?3, medical_notes = ?4, updated_at = ?5
                 WHERE user_name = ?6",
                params![age, height_in, weight_lbs, medical_notes, now, user_name],
            )?;
        } else {
            self.conn.execute(
                "INSERT INTO physical_profile (user_name, age, height_in, weight_lbs, medical_notes, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![user_name, age, height_in, weight_lbs, medical_notes, now, now],
            )?;
        }
        self.get_profile(user_name)?
            .context("Profile not found after upsert")
    }

    pub fn update_weight(&self, user_name: &str, weight_lbs: i64) -> Result<Profile> {
        let now = Local::now().to_rfc3339();
        let rows = self.conn.execute(
            "UPDATE physical_profile SET weight_lbs = ?1, updated_at = ?2 WHERE user_name = ?3",
            params![weight_lbs, now, user_name],
        )?;
        if rows == 0 {
            bail!("Profile '{user_name}' not found");
        }
        self.get_profile(user_name)?
            .context("Profile not found after weight update")
    }

    /// Move every record owned by `old_name` to `new_name`.
    ///
    /// All tables are updated in one transaction, so a failure part-way leaves
    /// the store untouched.
    pub fn rename_user(&self, old_name: &str, new_name: &str) -> Result<()> {
        if old_name == new_name {
            return Ok(());
        }
        if self.get_profile(old_name)?.is_none() {
            bail!("Profile '{old_name}' not found");
        }
        if self.get_profile(new_name)?.is_some() {
            bail!("A profile named '{new_name}' already exists");
        }

        let now = Local::now().to_rfc3339();
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "UPDATE physical_profile SET user_name = ?1, updated_at = ?2 WHERE user_name = ?3",
            params![new_name, now, old_name],
        )?;
        tx.execute(
            "UPDATE equipment_inventory SET user_name = ?1 WHERE user_name = ?2",
            params![new_name, old_name],
        )?;
        tx.execute(
            "UPDATE food_preferences SET user_name = ?1 WHERE user_name = ?2",
            params![new_name, old_name],
        )?;
        if self.history_available {
            tx.execute(
                "UPDATE recommendation_history SET user_name = ?1 WHERE user_name = ?2",
                params![new_name, old_name],
            )?;
        }
        tx.commit()
            .with_context(|| format!("Failed to rename '{old_name}' to '{new_name}'"))?;
        Ok(())
    }

    // --- Equipment ---

    pub fn list_equipment(&self, user_name: &str) -> Result<Vec<EquipmentItem>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_name, name, category, notes, created_at
             FROM equipment_inventory WHERE user_name = ?1 ORDER BY id",
        )?;
        let items = stmt
            .query_map(params![user_name], Self::equipment_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    pub fn get_equipment(&self, id: i64) -> Result<EquipmentItem> {
        self.conn
            .query_row(
                "SELECT id, user_name, name, category, notes, created_at
                 FROM equipment_inventory WHERE id = ?1",
                params![id],
                Self::equipment_from_row,
            )
            .context("Equipment item not found")
    }

    pub fn add_equipment(&self, item: &NewEquipment) -> Result<EquipmentItem> {
        let now = Local::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO equipment_inventory (user_name, name, category, notes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                item.user_name,
                item.name,
                item.category.as_str(),
                item.notes,
                now
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_equipment(id)
    }

    pub fn delete_equipment(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM equipment_inventory WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // --- Food preferences ---

    pub fn list_food_preferences(&self, user_name: &str) -> Result<Vec<FoodPreference>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_name, item_name, preference_type, nutritional_goal, created_at
             FROM food_preferences WHERE user_name = ?1 ORDER BY id",
        )?;
        let prefs = stmt
            .query_map(params![user_name], Self::food_preference_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(prefs)
    }

    pub fn get_food_preference(&self, id: i64) -> Result<FoodPreference> {
        self.conn
            .query_row(
                "SELECT id, user_name, item_name, preference_type, nutritional_goal, created_at
                 FROM food_preferences WHERE id = ?1",
                params![id],
                Self::food_preference_from_row,
            )
            .context("Food preference not found")
    }

    pub fn add_food_preference(&self, pref: &NewFoodPreference) -> Result<FoodPreference> {
        let now = Local::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO food_preferences (user_name, item_name, preference_type, nutritional_goal, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                pref.user_name,
                pref.item_name,
                pref.preference_type.as_str(),
                pref.nutritional_goal,
                now
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_food_preference(id)
    }

    pub fn delete_food_preference(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM food_preferences WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // --- Recommendation history ---

    /// Most recent history entries for a user, newest first.
    ///
    /// Insertion order decides recency; `created_at` carries a local offset
    /// and does not sort across offset changes.
    ///
    /// Returns an empty list when the store has no history table.
    pub fn get_history(&self, user_name: &str, limit: i64) -> Result<Vec<HistoryEntry>> {
        if !self.history_available {
            return Ok(Vec::new());
        }
        let mut stmt = self.conn.prepare(
            "SELECT id, user_name, workout, dinner, created_at
             FROM recommendation_history
             WHERE user_name = ?1
             ORDER BY id DESC
             LIMIT ?2",
        )?;
        let entries = stmt
            .query_map(params![user_name, limit.max(0)], Self::history_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Append a workout/dinner pair to the history log.
    ///
    /// Returns `None` without writing when the store has no history table.
    pub fn save_history(
        &self,
        user_name: &str,
        workout: &str,
        dinner: &str,
    ) -> Result<Option<HistoryEntry>> {
        if !self.history_available {
            debug!(user_name, "history table not provisioned, skipping save");
            return Ok(None);
        }
        let now = Local::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO recommendation_history (user_name, workout, dinner, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                user_name,
                truncate_chars(workout, HISTORY_TEXT_LIMIT),
                truncate_chars(dinner, HISTORY_TEXT_LIMIT),
                now
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        let entry = self
            .conn
            .query_row(
                "SELECT id, user_name, workout, dinner, created_at
                 FROM recommendation_history WHERE id = ?1",
                params![id],
                Self::history_from_row,
            )
            .context("History entry not found after insert")?;
        Ok(Some(entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EquipmentCategory, PreferenceType};

    fn add_kettlebell(db: &Database, user: &str) -> EquipmentItem {
        db.add_equipment(&NewEquipment {
            user_name: user.to_string(),
            name: "Kettlebell".to_string(),
            category: EquipmentCategory::Strength,
            notes: Some("16kg single".to_string()),
        })
        .unwrap()
    }

    fn add_salmon(db: &Database, user: &str) -> FoodPreference {
        db.add_food_preference(&NewFoodPreference {
            user_name: user.to_string(),
            item_name: "Salmon".to_string(),
            preference_type: PreferenceType::Like,
            nutritional_goal: Some("high protein".to_string()),
        })
        .unwrap()
    }

    #[test]
    fn test_upsert_inserts_then_updates() {
        let db = Database::open_in_memory().unwrap();
        let created = db.upsert_profile("Alex", 30, 66, 150, "").unwrap();
        assert_eq!(created.user_name, "Alex");
        assert_eq!(created.height_in, 66);

        let updated = db
            .upsert_profile("Alex", 31, 67, 155, "bad knees")
            .unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.age, 31);
        assert_eq!(updated.medical_notes, "bad knees");
        assert_eq!(db.list_user_names().unwrap(), vec!["Alex".to_string()]);
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        let first = db.upsert_profile("Sam", 40, 70, 180, "none").unwrap();
        let second = db.upsert_profile("Sam", 40, 70, 180, "none").unwrap();
        let third = db.upsert_profile("Sam", 40, 70, 180, "none").unwrap();

        for p in [&second, &third] {
            assert_eq!(p.id, first.id);
            assert_eq!(p.user_name, first.user_name);
            assert_eq!(p.age, first.age);
            assert_eq!(p.height_in, first.height_in);
            assert_eq!(p.weight_lbs, first.weight_lbs);
            assert_eq!(p.medical_notes, first.medical_notes);
            assert_eq!(p.created_at, first.created_at);
        }
    }

    #[test]
    fn test_get_profile_missing() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.get_profile("Nobody").unwrap().is_none());
    }

    #[test]
    fn test_list_user_names_sorted() {
        let db = Database::open_in_memory().unwrap();
        for name in ["Zoe", "Alex", "Mia"] {
            db.upsert_profile(name, 30, 66, 150, "").unwrap();
        }
        assert_eq!(db.list_user_names().unwrap(), vec!["Alex", "Mia", "Zoe"]);
    }

    #[test]
    fn test_update_weight() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_profile("Alex", 30, 66, 150, "").unwrap();
        let p = db.update_weight("Alex", 145).unwrap();
        assert_eq!(p.weight_lbs, 145);
        assert_eq!(p.age, 30);
        assert!(db.update_weight("Nobody", 145).is_err());
    }

    #[test]
    fn test_equipment_add_list_delete() {
        let db = Database::open_in_memory().unwrap();
        let kb = add_kettlebell(&db, "Alex");
        let bike = db
            .add_equipment(&NewEquipment {
                user_name: "Alex".to_string(),
                name: "Bike".to_string(),
                category: EquipmentCategory::Cardio,
                notes: None,
            })
            .unwrap();
        add_kettlebell(&db, "Sam");

        let items = db.list_equipment("Alex").unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, kb.id);
        assert_eq!(items[0].category, EquipmentCategory::Strength);
        assert_eq!(items[0].notes.as_deref(), Some("16kg single"));
        assert_eq!(items[1].id, bike.id);
        assert!(items[1].notes.is_none());

        assert!(db.delete_equipment(kb.id).unwrap());
        assert!(!db.delete_equipment(kb.id).unwrap());
        assert_eq!(db.list_equipment("Alex").unwrap().len(), 1);
        assert_eq!(db.list_equipment("Sam").unwrap().len(), 1);
    }

    #[test]
    fn test_food_preferences_add_list_delete() {
        let db = Database::open_in_memory().unwrap();
        let salmon = add_salmon(&db, "Alex");
        let peanuts = db
            .add_food_preference(&NewFoodPreference {
                user_name: "Alex".to_string(),
                item_name: "Peanuts".to_string(),
                preference_type: PreferenceType::Allergy,
                nutritional_goal: None,
            })
            .unwrap();

        let prefs = db.list_food_preferences("Alex").unwrap();
        assert_eq!(prefs.len(), 2);
        assert_eq!(prefs[0].item_name, "Salmon");
        assert_eq!(prefs[0].nutritional_goal.as_deref(), Some("high protein"));
        assert_eq!(prefs[1].preference_type, PreferenceType::Allergy);

        assert!(db.delete_food_preference(salmon.id).unwrap());
        let prefs = db.list_food_preferences("Alex").unwrap();
        assert_eq!(prefs.len(), 1);
        assert_eq!(prefs[0].id, peanuts.id);
    }

    #[test]
    fn test_history_newest_first_with_limit() {
        let db = Database::open_in_memory().unwrap();
        for i in 0..5 {
            db.save_history("Alex", &format!("workout {i}"), &format!("dinner {i}"))
                .unwrap()
                .unwrap();
        }
        db.save_history("Sam", "other", "other").unwrap();

        let history = db.get_history("Alex", 3).unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].workout, "workout 4");
        assert_eq!(history[1].workout, "workout 3");
        assert_eq!(history[2].dinner, "dinner 2");
    }

    #[test]
    fn test_history_newest_first_across_offset_change() {
        let db = Database::open_in_memory().unwrap();
        // 05:30Z then 06:10Z, written across a DST fall-back
        for (workout, stamp) in [
            ("older", "2025-11-02T01:30:00-04:00"),
            ("newer", "2025-11-02T01:10:00-05:00"),
        ] {
            db.conn
                .execute(
                    "INSERT INTO recommendation_history (user_name, workout, dinner, created_at)
                     VALUES (?1, ?2, ?3, ?4)",
                    params!["Alex", workout, "soup", stamp],
                )
                .unwrap();
        }

        let history = db.get_history("Alex", 10).unwrap();
        let workouts: Vec<&str> = history.iter().map(|h| h.workout.as_str()).collect();
        assert_eq!(workouts, vec!["newer", "older"]);
        assert_eq!(db.get_history("Alex", 1).unwrap()[0].workout, "newer");
    }

    #[test]
    fn test_history_truncates_saved_text() {
        let db = Database::open_in_memory().unwrap();
        let long = "x".repeat(HISTORY_TEXT_LIMIT + 50);
        let entry = db.save_history("Alex", &long, "short").unwrap().unwrap();
        assert_eq!(entry.workout.chars().count(), HISTORY_TEXT_LIMIT);
        assert_eq!(entry.dinner, "short");
    }

    #[test]
    fn test_history_absent_is_empty_and_noop() {
        let db = Database::open_in_memory_with_options(StoreOptions {
            provision_history: false,
        })
        .unwrap();
        assert!(!db.history_available());
        assert!(db.get_history("Alex", 10).unwrap().is_empty());
        assert!(db.save_history("Alex", "w", "d").unwrap().is_none());
        assert!(db.get_history("Alex", 10).unwrap().is_empty());
    }

    #[test]
    fn test_history_provisioned_on_later_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fitflow.db");

        {
            let db = Database::open_with_options(
                &path,
                StoreOptions {
                    provision_history: false,
                },
            )
            .unwrap();
            db.upsert_profile("Alex", 30, 66, 150, "").unwrap();
            assert!(!db.history_available());
        }

        let db = Database::open(&path).unwrap();
        assert!(db.history_available());
        assert!(db.get_profile("Alex").unwrap().is_some());
        db.save_history("Alex", "w", "d").unwrap().unwrap();
        assert_eq!(db.get_history("Alex", 10).unwrap().len(), 1);
    }

    #[test]
    fn test_rename_user_moves_all_records() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_profile("User A", 28, 70, 160, "knee pain")
            .unwrap();
        add_kettlebell(&db, "User A");
        add_salmon(&db, "User A");
        db.save_history("User A", "squats", "tacos").unwrap();

        db.rename_user("User A", "Alex").unwrap();

        let profile = db.get_profile("Alex").unwrap().unwrap();
        assert_eq!(profile.age, 28);
        assert_eq!(profile.medical_notes, "knee pain");
        assert_eq!(db.list_equipment("Alex").unwrap().len(), 1);
        assert_eq!(db.list_food_preferences("Alex").unwrap().len(), 1);
        assert_eq!(db.get_history("Alex", 10).unwrap()[0].workout, "squats");

        assert!(db.get_profile("User A").unwrap().is_none());
        assert!(db.list_equipment("User A").unwrap().is_empty());
        assert!(db.list_food_preferences("User A").unwrap().is_empty());
        assert!(db.get_history("User A", 10).unwrap().is_empty());
    }

    #[test]
    fn test_rename_user_without_history_table() {
        let db = Database::open_in_memory_with_options(StoreOptions {
            provision_history: false,
        })
        .unwrap();
        db.upsert_profile("User B", 28, 70, 160, "").unwrap();
        add_kettlebell(&db, "User B");
        db.rename_user("User B", "Jo").unwrap();
        assert_eq!(db.list_equipment("Jo").unwrap().len(), 1);
    }

    #[test]
    fn test_rename_user_rejects_existing_name() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_profile("Alex", 30, 66, 150, "").unwrap();
        db.upsert_profile("Sam", 40, 70, 180, "").unwrap();
        add_kettlebell(&db, "Alex");

        let err = db.rename_user("Alex", "Sam").unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert_eq!(db.list_equipment("Alex").unwrap().len(), 1);
        assert!(db.list_equipment("Sam").unwrap().is_empty());
    }

    #[test]
    fn test_rename_user_missing_and_same_name() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.rename_user("Nobody", "Someone").is_err());

        db.upsert_profile("Alex", 30, 66, 150, "").unwrap();
        db.rename_user("Alex", "Alex").unwrap();
        assert!(db.get_profile("Alex").unwrap().is_some());
    }
}
