//! Chat command handler.

use std::path::PathBuf;

use anyhow::Result;
use medtalk_core::{ChatRequest, SpeechRequest};

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::handlers::speak;

/// Arguments of `medtalk chat`.
#[derive(Debug, Clone, Default)]
pub struct ChatArgs {
    pub message: String,
    pub session: Option<String>,
    pub speak: bool,
    pub out: Option<PathBuf>,
}

/// Execute the chat command.
pub async fn execute(ctx: &CliContext, args: ChatArgs) -> Result<()> {
    if args.message.trim().is_empty() {
        return Err(CliError::Arguments("message must not be empty".to_string()).into());
    }

    let reply = ctx
        .client()
        .chat(&ChatRequest {
            message: args.message,
            session_id: args.session,
        })
        .await
        .map_err(CliError::from)?;

    println!("{}", reply.response);
    println!();
    println!("Session: {}", reply.session_id);

    if args.speak && !reply.response.trim().is_empty() {
        let request =
            SpeechRequest::new(reply.response.clone()).with_session(Some(reply.session_id));
        let outcome = speak::speak(
            ctx,
            request,
            ctx.settings.effective_delivery(),
            ctx.settings.effective_fallback(),
            args.out.as_deref(),
        )
        .await?;
        speak::report(&outcome, args.out.as_deref())?;
    }

    Ok(())
}
