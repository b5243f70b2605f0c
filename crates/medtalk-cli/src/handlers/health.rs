//! Health command handler.

use anyhow::Result;
use medtalk_core::HealthStatus;

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Execute the health command.
///
/// An unhealthy status is printed and then reported as
/// [`CliError::Unavailable`].
pub async fn execute(ctx: &CliContext, json: bool) -> Result<()> {
    let status = ctx.client().health().await.map_err(CliError::from)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("API:     {}", ctx.settings.effective_api_base());
        for line in format_health(&status) {
            println!("{line}");
        }
    }

    if !status.is_ok() {
        return Err(CliError::Unavailable(format!("API reports status '{}'", status.status)).into());
    }
    Ok(())
}

pub fn format_health(status: &HealthStatus) -> Vec<String> {
    let yes_no = |flag: bool| if flag { "yes" } else { "no" };

    let mut lines = vec![format!("Status:  {}", status.status)];
    if let Some(model) = &status.gemini_model {
        lines.push(format!("Model:   {model}"));
    }
    if let Some(loaded) = status.gemini_api_key_loaded {
        lines.push(format!("API key: {}", yes_no(loaded)));
    }
    if let Some(writable) = status.audio_dir_writable {
        lines.push(format!("Audio:   {}", if writable { "writable" } else { "read-only" }));
    }
    lines
}
