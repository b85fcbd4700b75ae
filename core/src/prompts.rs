//! Prompt templates for workout, dinner and recipe generation.
//!
//! Every builder is pure: missing profile data degrades to placeholder text
//! rather than failing.

use std::fmt::Write;

use crate::models::{EquipmentItem, FoodPreference, HistoryEntry, Profile, truncate_chars};

/// Number of past recommendations shown to the model.
pub const HISTORY_LINES: usize = 7;
/// Characters kept from each past recommendation.
pub const HISTORY_LINE_CHARS: usize = 120;

pub const NO_EQUIPMENT: &str = "No equipment listed, suggest bodyweight exercises only.";
pub const NO_WORKOUT_HISTORY: &str = "No previous workouts on record.";
pub const NO_FOOD_PREFERENCES: &str = "No food preferences recorded.";
pub const NO_DINNER_HISTORY: &str = "No previous dinner suggestions on record.";
pub const NO_RECIPE_PREFERENCES: &str = "No specific preferences.";

const UNKNOWN: &str = "Unknown";

fn display_name(profile: &Profile) -> &str {
    let name = profile.user_name.trim();
    if name.is_empty() { UNKNOWN } else { name }
}

fn display_positive(value: i64) -> String {
    if value > 0 {
        value.to_string()
    } else {
        UNKNOWN.to_string()
    }
}

fn display_notes(profile: &Profile) -> &str {
    let notes = profile.medical_notes.trim();
    if notes.is_empty() { "None" } else { notes }
}

/// Render one bullet per line, or the fallback sentence when there are none.
fn bullets<I>(lines: I, fallback: &str) -> String
where
    I: IntoIterator<Item = String>,
{
    let mut out = String::new();
    for line in lines {
        if !out.is_empty() {
            out.push('\n');
        }
        let _ = write!(out, "  - {line}");
    }
    if out.is_empty() {
        format!("  {fallback}")
    } else {
        out
    }
}

fn history_bullets<'a, F>(history: &'a [HistoryEntry], field: F, fallback: &str) -> String
where
    F: Fn(&'a HistoryEntry) -> &'a str,
{
    bullets(
        history
            .iter()
            .take(HISTORY_LINES)
            .map(|h| truncate_chars(field(h), HISTORY_LINE_CHARS).to_string()),
        fallback,
    )
}

fn equipment_line(item: &EquipmentItem) -> String {
    match item.notes.as_deref().map(str::trim) {
        Some(notes) if !notes.is_empty() => {
            format!("{} ({}): {notes}", item.name, item.category)
        }
        _ => format!("{} ({})", item.name, item.category),
    }
}

fn preference_line(pref: &FoodPreference) -> String {
    match pref.nutritional_goal.as_deref().map(str::trim) {
        Some(goal) if !goal.is_empty() => format!(
            "{} (type: {}), goal: {goal}",
            pref.item_name, pref.preference_type
        ),
        _ => format!("{} (type: {})", pref.item_name, pref.preference_type),
    }
}

#[must_use]
pub fn workout_prompt(
    profile: &Profile,
    equipment: &[EquipmentItem],
    history: &[HistoryEntry],
) -> String {
    let equipment_list = bullets(equipment.iter().map(equipment_line), NO_EQUIPMENT);
    let past_workouts = history_bullets(history, |h| h.workout.as_str(), NO_WORKOUT_HISTORY);

    format!(
        "You are a certified personal trainer creating a personalized 45-minute workout.

USER PROFILE:
  Name: {name}
  Age: {age}
  Height: {height}
  Weight: {weight} lbs
  Medical notes / limitations: {notes}

AVAILABLE EQUIPMENT:
{equipment_list}

RECENT PAST WORKOUTS (avoid repeating these):
{past_workouts}

INSTRUCTIONS:
- Design a 45-minute workout that is DIFFERENT from the recent past workouts listed above.
- The workout should be interesting and varied. Acceptable formats include:
    * 15 minutes each of three different workout types (e.g., strength, cardio, mobility)
    * 5-minute warm-up + 35-minute main workout + 5-minute cooldown
    * Any other creative 45-minute structure
- Respect ALL medical notes and limitations. If a limitation is listed, do NOT suggest exercises that could aggravate it.
- Only suggest exercises that use the available equipment or bodyweight.
- Include sets, reps (or duration), and brief form cues for each exercise.
- Keep the tone encouraging and fun.

Format the response in clean markdown with clear sections.",
        name = display_name(profile),
        age = display_positive(profile.age),
        height = profile.height(),
        weight = display_positive(profile.weight_lbs),
        notes = display_notes(profile),
    )
}

#[must_use]
pub fn dinner_prompt(
    profile: &Profile,
    food_prefs: &[FoodPreference],
    history: &[HistoryEntry],
) -> String {
    let preference_list = bullets(food_prefs.iter().map(preference_line), NO_FOOD_PREFERENCES);
    let past_dinners = history_bullets(history, |h| h.dinner.as_str(), NO_DINNER_HISTORY);

    format!(
        "You are a nutrition-savvy personal chef creating a personalized dinner suggestion.

USER PROFILE:
  Name: {name}
  Age: {age}
  Weight: {weight} lbs
  Medical notes: {notes}

FOOD PREFERENCES & DIETARY NEEDS:
{preference_list}

RECENT PAST DINNER SUGGESTIONS (suggest something different):
{past_dinners}

INSTRUCTIONS:
- Suggest ONE dinner that aligns with the user's food preferences and nutritional goals.
- Make it DIFFERENT from past suggestions.
- Respect any allergies or items marked \"avoid.\"
- Be descriptive and flavorful in your suggestion but do NOT include the full recipe.
  Example good answer: \"Lemon pepper grilled chicken with cilantro lime rice and roasted garlic asparagus.\"
- After the suggestion, ask: \"Would you like the full recipe?\"
- Keep the tone fun and appetizing.

Format the response in clean markdown.",
        name = display_name(profile),
        age = display_positive(profile.age),
        weight = display_positive(profile.weight_lbs),
        notes = display_notes(profile),
    )
}

#[must_use]
pub fn recipe_prompt(dinner_description: &str, food_prefs: &[FoodPreference]) -> String {
    let preferences = if food_prefs.is_empty() {
        NO_RECIPE_PREFERENCES.to_string()
    } else {
        food_prefs
            .iter()
            .map(|p| format!("{} ({})", p.item_name, p.preference_type))
            .collect::<Vec<_>>()
            .join(", ")
    };

    format!(
        "The user wants the full recipe for this dinner:

\"{dinner}\"

User's food preferences: {preferences}

Please provide:
1. Ingredients list with quantities
2. Step-by-step cooking instructions
3. Approximate cook time
4. Any helpful tips

Keep the tone fun and format in clean markdown.",
        dinner = dinner_description.trim(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EquipmentCategory, PreferenceType};

    fn profile() -> Profile {
        Profile {
            id: 1,
            user_name: "User B".to_string(),
            age: 28,
            height_in: 70,
            weight_lbs: 160,
            medical_notes: "knee pain".to_string(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn history(n: usize, text: impl Fn(usize) -> String) -> Vec<HistoryEntry> {
        (0..n)
            .map(|i| HistoryEntry {
                id: i as i64,
                user_name: "User B".to_string(),
                workout: text(i),
                dinner: format!("dinner {i}"),
                created_at: String::new(),
            })
            .collect()
    }

    fn kettlebell(notes: Option<&str>) -> EquipmentItem {
        EquipmentItem {
            id: 1,
            user_name: "User B".to_string(),
            name: "Kettlebell".to_string(),
            category: EquipmentCategory::Strength,
            notes: notes.map(str::to_string),
            created_at: String::new(),
        }
    }

    fn peanuts() -> FoodPreference {
        FoodPreference {
            id: 1,
            user_name: "User B".to_string(),
            item_name: "Peanuts".to_string(),
            preference_type: PreferenceType::Allergy,
            nutritional_goal: None,
            created_at: String::new(),
        }
    }

    fn bullet_count(prompt: &str, section: &str) -> usize {
        prompt
            .split(section)
            .nth(1)
            .unwrap()
            .split("\n\n")
            .next()
            .unwrap()
            .lines()
            .filter(|l| l.starts_with("  - "))
            .count()
    }

    #[test]
    fn test_workout_prompt_profile_fields() {
        let prompt = workout_prompt(&profile(), &[], &[]);
        assert!(prompt.contains("Name: User B"));
        assert!(prompt.contains("Age: 28"));
        assert!(prompt.contains("Height: 5'10\""));
        assert!(prompt.contains("Weight: 160 lbs"));
        assert!(prompt.contains("Medical notes / limitations: knee pain"));
    }

    #[test]
    fn test_workout_prompt_fallbacks_when_empty() {
        let prompt = workout_prompt(&profile(), &[], &[]);
        assert!(prompt.contains(NO_EQUIPMENT));
        assert!(prompt.contains(NO_WORKOUT_HISTORY));
    }

    #[test]
    fn test_workout_prompt_lists_equipment() {
        let prompt = workout_prompt(
            &profile(),
            &[kettlebell(Some("16kg single")), kettlebell(None)],
            &[],
        );
        assert!(prompt.contains("  - Kettlebell (strength): 16kg single"));
        assert!(prompt.contains("  - Kettlebell (strength)\n"));
        assert!(!prompt.contains(NO_EQUIPMENT));
    }

    #[test]
    fn test_history_capped_at_seven_lines() {
        let past = history(12, |i| format!("workout {i}"));
        let prompt = workout_prompt(&profile(), &[], &past);
        assert_eq!(bullet_count(&prompt, "RECENT PAST WORKOUTS"), HISTORY_LINES);
        assert!(prompt.contains("  - workout 6"));
        assert!(!prompt.contains("workout 7"));
    }

    #[test]
    fn test_history_lines_truncated_to_120_chars() {
        let long = "a".repeat(300);
        let past = history(1, |_| long.clone());
        let prompt = workout_prompt(&profile(), &[], &past);
        let line = prompt
            .lines()
            .find(|l| l.starts_with("  - aaa"))
            .unwrap();
        assert_eq!(line.trim_start_matches("  - ").chars().count(), HISTORY_LINE_CHARS);
    }

    #[test]
    fn test_placeholders_for_missing_fields() {
        let mut p = profile();
        p.user_name = String::new();
        p.age = 0;
        p.height_in = 0;
        p.weight_lbs = 0;
        p.medical_notes = "  ".to_string();
        let prompt = workout_prompt(&p, &[], &[]);
        assert!(prompt.contains("Name: Unknown"));
        assert!(prompt.contains("Age: Unknown"));
        assert!(prompt.contains("Height: 0'0\""));
        assert!(prompt.contains("Weight: Unknown lbs"));
        assert!(prompt.contains("limitations: None"));
    }

    #[test]
    fn test_dinner_prompt_preferences_and_history() {
        let mut salmon = peanuts();
        salmon.item_name = "Salmon".to_string();
        salmon.preference_type = PreferenceType::Like;
        salmon.nutritional_goal = Some("omega-3".to_string());

        let past = history(2, |i| format!("w{i}"));
        let prompt = dinner_prompt(&profile(), &[peanuts(), salmon], &past);
        assert!(prompt.contains("  - Peanuts (type: allergy)"));
        assert!(prompt.contains("  - Salmon (type: like), goal: omega-3"));
        assert!(prompt.contains("  - dinner 0"));
        assert!(prompt.contains("  - dinner 1"));
        assert!(prompt.contains("Medical notes: knee pain"));
        assert!(!prompt.contains("Height"));
    }

    #[test]
    fn test_dinner_prompt_fallbacks_when_empty() {
        let prompt = dinner_prompt(&profile(), &[], &[]);
        assert!(prompt.contains(NO_FOOD_PREFERENCES));
        assert!(prompt.contains(NO_DINNER_HISTORY));
    }

    #[test]
    fn test_recipe_prompt() {
        let prompt = recipe_prompt("  Lemon pepper chicken ", &[peanuts()]);
        assert!(prompt.contains("\"Lemon pepper chicken\""));
        assert!(prompt.contains("User's food preferences: Peanuts (allergy)"));

        let prompt = recipe_prompt("Tacos", &[]);
        assert!(prompt.contains(NO_RECIPE_PREFERENCES));
    }
}
