use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone};
use cirrus_ai::Notifier;
use cirrus_core::{ChatSession, SessionError};
use colored::Colorize;
use tokio_util::sync::CancellationToken;

pub fn format_timestamp(timestamp_ms: i64) -> String {
    let datetime: DateTime<Local> = match Local.timestamp_millis_opt(timestamp_ms).single() {
        Some(dt) => dt,
        None => return "-".to_string(),
    };

    datetime.format("%Y-%m-%d %H:%M").to_string()
}

/// Progress lines go to stderr so piped answers stay clean.
pub fn status_notifier() -> Notifier {
    Arc::new(|text: &str| eprintln!("{}", text.dimmed()))
}

/// Run one turn; Ctrl-C cancels the in-flight request instead of killing the process.
pub async fn run_turn(session: &ChatSession, text: &str) -> Result<String, SessionError> {
    let cancel = CancellationToken::new();
    let notify = status_notifier();
    let turn = session.send(text, &notify, &cancel);
    tokio::pin!(turn);

    tokio::select! {
        result = &mut turn => result,
        _ = tokio::signal::ctrl_c() => {
            cancel.cancel();
            turn.await
        }
    }
}
