//! History command handler.

use anyhow::Result;
use medtalk_core::HistoryResponse;

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Execute the history command.
pub async fn execute(ctx: &CliContext, session_id: &str, json: bool) -> Result<()> {
    let history = ctx
        .client()
        .history(session_id)
        .await
        .map_err(CliError::from)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&history)?);
    } else {
        print!("{}", format_history(&history));
    }
    Ok(())
}

/// One `role: content` line per message.
pub fn format_history(history: &HistoryResponse) -> String {
    if history.messages.is_empty() {
        return format!("No messages in session {}\n", history.session_id);
    }

    history
        .messages
        .iter()
        .map(|m| format!("{}: {}\n", m.role, m.content))
        .collect()
}
