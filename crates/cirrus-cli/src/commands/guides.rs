use anyhow::Result;
use cirrus_core::search_guides;
use comfy_table::{Cell, Table};

use crate::output::{OutputFormat, json::print_json, table::print_table};

pub fn run(query: Option<&str>, format: OutputFormat) -> Result<()> {
    let guides = search_guides(query.unwrap_or(""));

    if format.is_json() {
        return print_json(&guides);
    }

    if guides.is_empty() {
        println!("No guides match.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Title", "Keywords"]);
    for guide in guides {
        table.add_row(vec![
            Cell::new(guide.id),
            Cell::new(guide.title),
            Cell::new(guide.keywords),
        ]);
    }
    print_table(table)
}
