use anyhow::Result;
use cirrus_ai::BackendKind;
use cirrus_core::{AppConfig, tool_registry};
use colored::Colorize;
use serde::Serialize;

use crate::output::{OutputFormat, json::print_json};

#[derive(Serialize)]
struct StatusReport {
    model: String,
    base_url: String,
    has_api_key: bool,
    google_drive: bool,
    onedrive: bool,
    drive_root_folder: Option<String>,
    tools: Vec<String>,
    data_dir: String,
}

pub fn run(config: &AppConfig, format: OutputFormat) -> Result<()> {
    let registry = tool_registry(config);
    let report = StatusReport {
        model: config.model().to_string(),
        base_url: config.base_url().to_string(),
        has_api_key: config.has_api_key(),
        google_drive: registry.is_configured(BackendKind::GoogleDrive),
        onedrive: registry.is_configured(BackendKind::OneDrive),
        drive_root_folder: registry.drive_root_folder().map(str::to_string),
        tools: registry.schemas().into_iter().map(|s| s.name).collect(),
        data_dir: config.ensure_data_dir()?.display().to_string(),
    };

    if format.is_json() {
        return print_json(&report);
    }

    println!("Model:        {}", report.model);
    println!("Endpoint:     {}", report.base_url);
    println!("API key:      {}", yes_no(report.has_api_key));
    println!("Google Drive: {}", yes_no(report.google_drive));
    if let Some(folder) = &report.drive_root_folder {
        println!("  root folder {folder}");
    }
    println!("OneDrive:     {}", yes_no(report.onedrive));
    println!("Data dir:     {}", report.data_dir);
    Ok(())
}

fn yes_no(value: bool) -> String {
    if value {
        "configured".green().to_string()
    } else {
        "not configured".yellow().to_string()
    }
}
