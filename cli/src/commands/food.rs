use anyhow::{Result, bail};
use tabled::{Table, Tabled, settings::Style};

use fitflow_core::models::{NewFoodPreference, PreferenceType};
use fitflow_core::service::FitFlowService;

use super::helpers::truncate;

pub(crate) fn cmd_food_list(svc: &FitFlowService, user: &str, json: bool) -> Result<()> {
    let prefs = svc.list_food_preferences(user)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&prefs)?);
    } else if prefs.is_empty() {
        eprintln!("No food preferences for {user}. Use `fitflow food add` to record some.");
    } else {
        #[derive(Tabled)]
        struct PreferenceRow {
            #[tabled(rename = "ID")]
            id: i64,
            #[tabled(rename = "Item")]
            item: String,
            #[tabled(rename = "Type")]
            kind: String,
            #[tabled(rename = "Goal")]
            goal: String,
        }

        let rows: Vec<PreferenceRow> = prefs
            .iter()
            .map(|p| PreferenceRow {
                id: p.id,
                item: truncate(&p.item_name, 30),
                kind: p.preference_type.to_string(),
                goal: p
                    .nutritional_goal
                    .as_deref()
                    .map(|g| truncate(g, 40))
                    .unwrap_or_default(),
            })
            .collect();

        let table = Table::new(&rows).with(Style::rounded()).to_string();
        println!("{table}");
    }

    Ok(())
}

pub(crate) fn cmd_food_add(
    svc: &FitFlowService,
    user: &str,
    item: &str,
    preference_type: PreferenceType,
    goal: Option<String>,
    json: bool,
) -> Result<()> {
    if svc.get_profile(user)?.is_none() {
        bail!("No profile named '{user}'. Create it with `fitflow profile set` first");
    }
    let pref = svc.add_food_preference(&NewFoodPreference {
        user_name: user.to_string(),
        item_name: item.to_string(),
        preference_type,
        nutritional_goal: goal,
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&pref)?);
    } else {
        println!(
            "Added {} ({}) for {} [ID: {}]",
            pref.item_name, pref.preference_type, pref.user_name, pref.id
        );
    }
    Ok(())
}

pub(crate) fn cmd_food_delete(svc: &FitFlowService, id: i64, json: bool) -> Result<()> {
    if !svc.delete_food_preference(id)? {
        bail!("Food preference {id} not found");
    }

    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!("Deleted food preference {id}");
    }
    Ok(())
}
