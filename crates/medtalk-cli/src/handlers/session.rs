//! Session command handler.

use anyhow::Result;

use crate::bootstrap::CliContext;
use crate::commands::SessionCommand;
use crate::error::CliError;

/// Execute a `session` subcommand.
pub async fn execute(ctx: &CliContext, command: &SessionCommand) -> Result<()> {
    match command {
        SessionCommand::New => {
            let session = ctx
                .client()
                .create_session()
                .await
                .map_err(CliError::from)?;
            println!("{}", session.session_id);
        }
    }
    Ok(())
}
