use anyhow::Result;
use tabled::{Table, Tabled, settings::Style};

use fitflow_core::service::FitFlowService;

use super::helpers::{format_timestamp, truncate};

pub(crate) fn cmd_history(svc: &FitFlowService, user: &str, limit: u32, json: bool) -> Result<()> {
    if !svc.history_available() {
        eprintln!("Recommendation history is disabled for this database.");
    }
    let entries = svc.get_history(user, i64::from(limit))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else if entries.is_empty() {
        eprintln!("No saved recommendations for {user}.");
    } else {
        #[derive(Tabled)]
        struct HistoryRow {
            #[tabled(rename = "Saved")]
            saved: String,
            #[tabled(rename = "Workout")]
            workout: String,
            #[tabled(rename = "Dinner")]
            dinner: String,
        }

        let rows: Vec<HistoryRow> = entries
            .iter()
            .map(|h| HistoryRow {
                saved: format_timestamp(&h.created_at),
                workout: truncate(&h.workout, 50),
                dinner: truncate(&h.dinner, 50),
            })
            .collect();

        let table = Table::new(&rows).with(Style::rounded()).to_string();
        println!("{table}");
    }

    Ok(())
}
