//! Clinician command handler.

use anyhow::Result;

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Execute the clinician command.
pub async fn execute(ctx: &CliContext) -> Result<()> {
    let clinician = ctx.client().clinician().await.map_err(CliError::from)?;
    println!("{}, {}", clinician.clinician_name, clinician.clinician_title);
    if !clinician.avatar_image_url.is_empty() {
        println!("Avatar: {}", clinician.avatar_image_url);
    }
    Ok(())
}
