//! Speak command handler.

use std::path::{Path, PathBuf};

use anyhow::Result;
use medtalk_core::{DeliveryMode, SpeechErrorKind, SpeechEvent, SpeechRequest};
use medtalk_speech::{SpeakOutcome, SpeakerController, SpeakingTracker};
use tokio::sync::mpsc;

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Arguments of `medtalk speak`.
#[derive(Debug, Clone, Default)]
pub struct SpeakArgs {
    pub text: String,
    pub session: Option<String>,
    pub speaker: Option<String>,
    pub language: Option<String>,
    pub buffered: bool,
    pub no_fallback: bool,
    pub out: Option<PathBuf>,
}

/// Execute the speak command.
pub async fn execute(ctx: &CliContext, args: SpeakArgs) -> Result<()> {
    if args.text.trim().is_empty() {
        return Err(CliError::Arguments("text to speak must not be empty".to_string()).into());
    }

    let request = SpeechRequest::new(args.text)
        .with_session(args.session)
        .with_speaker(args.speaker)
        .with_language(args.language);
    let delivery = if args.buffered {
        DeliveryMode::Buffered
    } else {
        ctx.settings.effective_delivery()
    };
    let fallback = !args.no_fallback && ctx.settings.effective_fallback();

    let outcome = speak(ctx, request, delivery, fallback, args.out.as_deref()).await?;
    report(&outcome, args.out.as_deref())?;
    Ok(())
}

/// Speak `request` and wait until it has played (or failed).
///
/// With `fallback`, a stream that fails on the network or protocol side is
/// retried once through buffered synthesis.
pub async fn speak(
    ctx: &CliContext,
    request: SpeechRequest,
    delivery: DeliveryMode,
    fallback: bool,
    out: Option<&Path>,
) -> Result<SpeakOutcome, CliError> {
    let (mut controller, mut events) = ctx.speaker(out, delivery)?;
    let outcome = run_once(&mut controller, &mut events, request.clone()).await?;

    match outcome {
        SpeakOutcome::Failed { kind, message }
            if fallback && delivery == DeliveryMode::Stream && worth_retrying(kind) =>
        {
            tracing::warn!(error = %message, "Streaming failed, retrying with buffered synthesis");
            controller.set_delivery(DeliveryMode::Buffered);
            run_once(&mut controller, &mut events, request).await
        }
        other => Ok(other),
    }
}

const fn worth_retrying(kind: SpeechErrorKind) -> bool {
    matches!(kind, SpeechErrorKind::Transport | SpeechErrorKind::Protocol)
}

async fn run_once(
    controller: &mut SpeakerController,
    events: &mut mpsc::UnboundedReceiver<SpeechEvent>,
    request: SpeechRequest,
) -> Result<SpeakOutcome, CliError> {
    let ticket = controller.start(request).await?;
    let mut tracker = SpeakingTracker::new();

    tokio::select! {
        outcome = tracker.follow(events, ticket.id()) => outcome.ok_or_else(|| {
            CliError::Core("speech events ended before the session finished".to_string())
        }),
        _ = tokio::signal::ctrl_c() => {
            controller.cancel().await;
            Ok(SpeakOutcome::Cancelled)
        }
    }
}

/// Print what happened; failures become errors.
pub fn report(outcome: &SpeakOutcome, out: Option<&Path>) -> Result<(), CliError> {
    match outcome {
        SpeakOutcome::Played => {
            if let Some(path) = out {
                println!("Audio saved to {}", path.display());
            }
        }
        SpeakOutcome::Silent => println!("The server returned no audio."),
        SpeakOutcome::Unavailable { reason } => println!("Voice unavailable: {reason}"),
        SpeakOutcome::Cancelled | SpeakOutcome::Stopped => println!("Stopped."),
        SpeakOutcome::Failed { kind, message } => {
            return Err(CliError::from_failure(*kind, message.clone()));
        }
    }
    Ok(())
}
