use anyhow::{Result, bail};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use fitflow_core::models::{Profile, ProfileInput};
use fitflow_core::service::FitFlowService;

use super::helpers::{format_timestamp, json_error};

pub(crate) fn cmd_users(svc: &FitFlowService, json: bool) -> Result<()> {
    let names = svc.display_user_names()?;
    let profiles = names
        .iter()
        .map(|n| svc.get_profile(n))
        .collect::<Result<Vec<_>>>()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&profiles)?);
        return Ok(());
    }

    #[derive(Tabled)]
    struct UserRow {
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Age")]
        age: String,
        #[tabled(rename = "Height")]
        height: String,
        #[tabled(rename = "Weight (lbs)")]
        weight: String,
        #[tabled(rename = "Status")]
        status: String,
    }

    let rows: Vec<UserRow> = names
        .iter()
        .zip(&profiles)
        .map(|(name, profile)| match profile {
            Some(p) if p.is_configured() => UserRow {
                name: name.clone(),
                age: p.age.to_string(),
                height: p.height().to_string(),
                weight: p.weight_lbs.to_string(),
                status: "ready".to_string(),
            },
            _ => UserRow {
                name: name.clone(),
                age: "-".to_string(),
                height: "-".to_string(),
                weight: "-".to_string(),
                status: "not set up".to_string(),
            },
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..4)).with(Alignment::right()))
        .to_string();
    println!("{table}");
    Ok(())
}

fn print_profile(profile: &Profile) {
    println!("{}", profile.user_name);
    if profile.is_configured() {
        println!("  Age:    {}", profile.age);
        println!("  Height: {}", profile.height());
        println!("  Weight: {} lbs", profile.weight_lbs);
    } else {
        println!("  Profile not filled in yet. Use `fitflow profile set` to add your details.");
    }
    let notes = profile.medical_notes.trim();
    println!("  Notes:  {}", if notes.is_empty() { "None" } else { notes });
    println!("  Updated {}", format_timestamp(&profile.updated_at));
}

pub(crate) fn cmd_profile_show(svc: &FitFlowService, user: &str, json: bool) -> Result<()> {
    match svc.get_profile(user)? {
        Some(profile) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&profile)?);
            } else {
                print_profile(&profile);
            }
        }
        None => {
            let message = format!("No profile named '{user}'");
            if json {
                println!("{}", json_error(&message));
            } else {
                eprintln!("{message}");
            }
        }
    }
    Ok(())
}

/// Fields for `profile set`; anything left out keeps its stored value.
pub(crate) struct ProfileUpdate {
    pub name: Option<String>,
    pub age: Option<i64>,
    pub height_in: Option<i64>,
    pub weight_lbs: Option<i64>,
    pub notes: Option<String>,
}

pub(crate) fn cmd_profile_set(
    svc: &FitFlowService,
    user: &str,
    update: ProfileUpdate,
    json: bool,
) -> Result<()> {
    let stored = svc.get_profile(user)?;
    let configured = stored.as_ref().filter(|p| p.is_configured());

    let (Some(age), Some(height_in), Some(weight_lbs)) = (
        update.age.or(configured.map(|p| p.age)),
        update.height_in.or(configured.map(|p| p.height_in)),
        update.weight_lbs.or(configured.map(|p| p.weight_lbs)),
    ) else {
        bail!("New profiles need --age, --height and --weight");
    };

    let medical_notes = update
        .notes
        .or_else(|| stored.map(|p| p.medical_notes))
        .unwrap_or_default();

    let input = ProfileInput {
        user_name: update.name,
        age,
        height_in,
        weight_lbs,
        medical_notes,
    };
    let profile = svc.save_profile(user, &input)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
    } else {
        println!("Profile saved.");
        print_profile(&profile);
    }
    Ok(())
}

pub(crate) fn cmd_profile_rename(
    svc: &FitFlowService,
    user: &str,
    new_name: &str,
    json: bool,
) -> Result<()> {
    let profile = svc.rename_user(user, new_name)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
    } else {
        println!("Renamed '{user}' to '{}'", profile.user_name);
    }
    Ok(())
}

pub(crate) fn cmd_profile_weight(
    svc: &FitFlowService,
    user: &str,
    weight_lbs: i64,
    json: bool,
) -> Result<()> {
    let profile = svc.update_weight(user, weight_lbs)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
    } else {
        println!("Updated {} to {} lbs", profile.user_name, profile.weight_lbs);
    }
    Ok(())
}
