use anyhow::Result;
use cirrus_core::{AppConfig, open_session};
use serde_json::json;

use crate::commands::utils::run_turn;
use crate::output::{OutputFormat, json::print_json};

pub async fn run(config: &AppConfig, prompt: &str, format: OutputFormat) -> Result<()> {
    let (session, _restored) = open_session(config).await?;
    let answer = run_turn(&session, prompt).await?;

    if format.is_json() {
        return print_json(&json!({
            "chat_id": session.current_chat_id().await,
            "answer": answer,
        }));
    }

    println!("{answer}");
    Ok(())
}
