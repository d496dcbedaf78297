use anyhow::Result;
use cirrus_core::{AppConfig, HistoryItem, open_session};
use comfy_table::{Cell, Table};

use crate::commands::utils::format_timestamp;
use crate::output::{OutputFormat, json::print_json, table::print_table};

pub async fn run(config: &AppConfig, format: OutputFormat) -> Result<()> {
    let (session, _restored) = open_session(config).await?;
    let history = session.history().await;

    if format.is_json() {
        return print_json(&history);
    }

    if history.is_empty() {
        println!("No saved chats yet.");
        return Ok(());
    }

    print_table(history_table(&history))
}

fn history_table(history: &[HistoryItem]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["", "ID", "Updated", "Title"]);
    for item in history {
        table.add_row(vec![
            Cell::new(if item.is_current { "*" } else { "" }),
            Cell::new(&item.id),
            Cell::new(format_timestamp(item.timestamp)),
            Cell::new(&item.title),
        ]);
    }
    table
}
