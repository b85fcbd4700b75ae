use std::fmt;
use std::str::FromStr;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

/// Placeholder profile slots bootstrapped on first run.
pub const PLACEHOLDER_USERS: &[&str] = &["User A", "User B", "User C", "User D"];

/// Maximum characters kept for each text of a saved history entry.
pub const HISTORY_TEXT_LIMIT: usize = 500;

pub const AGE_RANGE: (i64, i64) = (10, 120);
pub const FEET_RANGE: (i64, i64) = (3, 8);
pub const INCHES_RANGE: (i64, i64) = (0, 11);
pub const WEIGHT_RANGE: (i64, i64) = (50, 600);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: i64,
    pub user_name: String,
    pub age: i64,
    pub height_in: i64,
    pub weight_lbs: i64,
    pub medical_notes: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Profile {
    #[must_use]
    pub fn height(&self) -> Height {
        Height::from_inches(self.height_in)
    }

    /// A profile is configured once age, height and weight are all filled in.
    /// Placeholder slots are stored with zeros.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.age > 0 && self.height_in > 0 && self.weight_lbs > 0
    }

    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        PLACEHOLDER_USERS.contains(&self.user_name.as_str())
    }
}

/// Editable profile fields, as submitted by a form or CLI flags.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileInput {
    /// New name for the profile. `None` keeps the current name.
    #[serde(default)]
    pub user_name: Option<String>,
    pub age: i64,
    pub height_in: i64,
    pub weight_lbs: i64,
    #[serde(default)]
    pub medical_notes: String,
}

/// Height split into feet and inches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Height {
    pub feet: i64,
    pub inches: i64,
}

impl Height {
    #[must_use]
    pub fn from_inches(total: i64) -> Self {
        let total = total.max(0);
        Self {
            feet: total / 12,
            inches: total % 12,
        }
    }

    #[must_use]
    pub fn from_feet_inches(feet: i64, inches: i64) -> Self {
        Self::from_inches(feet * 12 + inches)
    }

    #[must_use]
    pub fn total_inches(self) -> i64 {
        self.feet * 12 + self.inches
    }
}

impl fmt::Display for Height {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}'{}\"", self.feet, self.inches)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EquipmentCategory {
    Strength,
    Cardio,
    Mobility,
    Other,
}

impl EquipmentCategory {
    pub const ALL: &[Self] = &[Self::Strength, Self::Cardio, Self::Mobility, Self::Other];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strength => "strength",
            Self::Cardio => "cardio",
            Self::Mobility => "mobility",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for EquipmentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EquipmentCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_lowercase();
        match Self::ALL.iter().find(|c| c.as_str() == lower) {
            Some(c) => Ok(*c),
            None => bail!("Invalid equipment category '{s}'. Must be one of: strength, cardio, mobility, other"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreferenceType {
    Staple,
    Like,
    Dislike,
    Avoid,
    Allergy,
}

impl PreferenceType {
    pub const ALL: &[Self] = &[
        Self::Staple,
        Self::Like,
        Self::Dislike,
        Self::Avoid,
        Self::Allergy,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Staple => "staple",
            Self::Like => "like",
            Self::Dislike => "dislike",
            Self::Avoid => "avoid",
            Self::Allergy => "allergy",
        }
    }
}

impl fmt::Display for PreferenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PreferenceType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_lowercase();
        match Self::ALL.iter().find(|p| p.as_str() == lower) {
            Some(p) => Ok(*p),
            None => bail!(
                "Invalid preference type '{s}'. Must be one of: staple, like, dislike, avoid, allergy"
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EquipmentItem {
    pub id: i64,
    pub user_name: String,
    pub name: String,
    pub category: EquipmentCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewEquipment {
    pub user_name: String,
    pub name: String,
    pub category: EquipmentCategory,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FoodPreference {
    pub id: i64,
    pub user_name: String,
    pub item_name: String,
    pub preference_type: PreferenceType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nutritional_goal: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewFoodPreference {
    pub user_name: String,
    pub item_name: String,
    pub preference_type: PreferenceType,
    #[serde(default)]
    pub nutritional_goal: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub user_name: String,
    pub workout: String,
    pub dinner: String,
    pub created_at: String,
}

/// Cut `text` to at most `max_chars` characters without splitting a code point.
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Trim a user name and reject blanks.
pub fn validate_user_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        bail!("Please enter your name");
    }
    Ok(trimmed.to_string())
}

/// Treat blank optional text as absent.
#[must_use]
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn check_range(label: &str, value: i64, (min, max): (i64, i64)) -> Result<()> {
    if !(min..=max).contains(&value) {
        bail!("{label} must be between {min} and {max} (got {value})");
    }
    Ok(())
}

/// Range checks the profile form enforces on its inputs.
pub fn validate_profile_input(input: &ProfileInput) -> Result<()> {
    check_range("Age", input.age, AGE_RANGE)?;
    let height = Height::from_inches(input.height_in);
    if height.total_inches() != input.height_in {
        bail!("Height must not be negative");
    }
    check_range("Height (feet)", height.feet, FEET_RANGE)?;
    check_range("Height (inches)", height.inches, INCHES_RANGE)?;
    check_range("Weight (lbs)", input.weight_lbs, WEIGHT_RANGE)?;
    Ok(())
}

pub fn validate_weight(weight_lbs: i64) -> Result<()> {
    check_range("Weight (lbs)", weight_lbs, WEIGHT_RANGE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(age: i64, height_in: i64, weight_lbs: i64) -> ProfileInput {
        ProfileInput {
            user_name: None,
            age,
            height_in,
            weight_lbs,
            medical_notes: String::new(),
        }
    }

    #[test]
    fn test_height_decomposition_roundtrips() {
        for h in 0..=120 {
            let height = Height::from_inches(h);
            assert_eq!(height.feet * 12 + height.inches, h);
            assert!((0..12).contains(&height.inches));
        }
    }

    #[test]
    fn test_height_display() {
        assert_eq!(Height::from_inches(70).to_string(), "5'10\"");
        assert_eq!(Height::from_inches(72).to_string(), "6'0\"");
        assert_eq!(Height::from_inches(0).to_string(), "0'0\"");
    }

    #[test]
    fn test_height_negative_clamps_to_zero() {
        assert_eq!(Height::from_inches(-5), Height { feet: 0, inches: 0 });
    }

    #[test]
    fn test_height_from_feet_inches() {
        assert_eq!(Height::from_feet_inches(5, 10).total_inches(), 70);
    }

    #[test]
    fn test_equipment_category_parse() {
        assert_eq!(
            "Strength".parse::<EquipmentCategory>().unwrap(),
            EquipmentCategory::Strength
        );
        assert_eq!(
            " cardio ".parse::<EquipmentCategory>().unwrap(),
            EquipmentCategory::Cardio
        );
        assert!("yoga".parse::<EquipmentCategory>().is_err());
    }

    #[test]
    fn test_preference_type_parse() {
        for p in PreferenceType::ALL {
            assert_eq!(p.as_str().parse::<PreferenceType>().unwrap(), *p);
        }
        assert!("love".parse::<PreferenceType>().is_err());
    }

    #[test]
    fn test_category_serde_lowercase() {
        let json = serde_json::to_string(&EquipmentCategory::Mobility).unwrap();
        assert_eq!(json, "\"mobility\"");
        let parsed: PreferenceType = serde_json::from_str("\"allergy\"").unwrap();
        assert_eq!(parsed, PreferenceType::Allergy);
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 3), "hel");
        assert_eq!(truncate_chars("hi", 10), "hi");
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("", 5), "");
    }

    #[test]
    fn test_validate_user_name() {
        assert_eq!(validate_user_name("  Alex ").unwrap(), "Alex");
        assert!(validate_user_name("   ").is_err());
        assert!(validate_user_name("").is_err());
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some(" 16kg ".to_string())).as_deref(), Some("16kg"));
        assert!(non_blank(Some("  ".to_string())).is_none());
        assert!(non_blank(None).is_none());
    }

    #[test]
    fn test_validate_profile_input() {
        assert!(validate_profile_input(&input(28, 70, 160)).is_ok());
        assert!(validate_profile_input(&input(9, 70, 160)).is_err());
        assert!(validate_profile_input(&input(28, 30, 160)).is_err());
        assert!(validate_profile_input(&input(28, 108, 160)).is_err());
        assert!(validate_profile_input(&input(28, 70, 700)).is_err());
        assert!(validate_profile_input(&input(28, -70, 160)).is_err());
    }

    #[test]
    fn test_profile_configured() {
        let mut profile = Profile {
            id: 1,
            user_name: "User A".to_string(),
            age: 0,
            height_in: 0,
            weight_lbs: 0,
            medical_notes: String::new(),
            created_at: String::new(),
            updated_at: String::new(),
        };
        assert!(profile.is_placeholder());
        assert!(!profile.is_configured());
        profile.age = 30;
        profile.height_in = 66;
        profile.weight_lbs = 150;
        assert!(profile.is_configured());
    }
}
