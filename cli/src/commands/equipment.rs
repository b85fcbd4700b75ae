use anyhow::{Result, bail};
use tabled::{Table, Tabled, settings::Style};

use fitflow_core::models::{EquipmentCategory, NewEquipment};
use fitflow_core::service::FitFlowService;

use super::helpers::truncate;

pub(crate) fn cmd_equipment_list(svc: &FitFlowService, user: &str, json: bool) -> Result<()> {
    let items = svc.list_equipment(user)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else if items.is_empty() {
        eprintln!(
            "No equipment for {user}. Workouts will use bodyweight exercises only. \
             Use `fitflow equipment add` to record some."
        );
    } else {
        #[derive(Tabled)]
        struct EquipmentRow {
            #[tabled(rename = "ID")]
            id: i64,
            #[tabled(rename = "Name")]
            name: String,
            #[tabled(rename = "Category")]
            category: String,
            #[tabled(rename = "Notes")]
            notes: String,
        }

        let rows: Vec<EquipmentRow> = items
            .iter()
            .map(|e| EquipmentRow {
                id: e.id,
                name: truncate(&e.name, 30),
                category: e.category.to_string(),
                notes: e.notes.as_deref().map(|n| truncate(n, 40)).unwrap_or_default(),
            })
            .collect();

        let table = Table::new(&rows).with(Style::rounded()).to_string();
        println!("{table}");
    }

    Ok(())
}

pub(crate) fn cmd_equipment_add(
    svc: &FitFlowService,
    user: &str,
    name: &str,
    category: EquipmentCategory,
    notes: Option<String>,
    json: bool,
) -> Result<()> {
    if svc.get_profile(user)?.is_none() {
        bail!("No profile named '{user}'. Create it with `fitflow profile set` first");
    }
    let item = svc.add_equipment(&NewEquipment {
        user_name: user.to_string(),
        name: name.to_string(),
        category,
        notes,
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&item)?);
    } else {
        println!(
            "Added {} ({}) for {} [ID: {}]",
            item.name, item.category, item.user_name, item.id
        );
    }
    Ok(())
}

pub(crate) fn cmd_equipment_delete(svc: &FitFlowService, id: i64, json: bool) -> Result<()> {
    if !svc.delete_equipment(id)? {
        bail!("Equipment item {id} not found");
    }

    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!("Deleted equipment item {id}");
    }
    Ok(())
}
