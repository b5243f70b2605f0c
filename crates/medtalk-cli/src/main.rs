//! CLI entry point.
//!
//! Parses arguments, builds the [`CliContext`](medtalk_cli::CliContext) via
//! bootstrap and routes each command to its handler. Failures carrying a
//! [`CliError`] exit with its code; anything else exits with 1.

use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use medtalk_cli::handlers::chat::ChatArgs;
use medtalk_cli::handlers::speak::SpeakArgs;
use medtalk_cli::handlers::{chat, clinician, health, history, session, speak};
use medtalk_cli::{Cli, CliConfig, CliError, Commands, bootstrap};

/// Filters used when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str =
    "warn,medtalk_cli=info,medtalk_client=info,medtalk_speech=info,medtalk_core=info";
const VERBOSE_FILTER: &str =
    "warn,medtalk_cli=debug,medtalk_client=debug,medtalk_speech=debug,medtalk_core=debug";

#[tokio::main]
async fn main() -> ExitCode {
    // .env may carry RUST_LOG, so load it before the subscriber.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            let code = err
                .downcast_ref::<CliError>()
                .map_or(1, CliError::exit_code);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let ctx = bootstrap(CliConfig::from_env().with_api_base(cli.api_base.as_deref()))?;

    match command {
        Commands::Speak {
            text,
            session,
            speaker,
            language,
            buffered,
            no_fallback,
            out,
        } => {
            speak::execute(
                &ctx,
                SpeakArgs {
                    text,
                    session,
                    speaker,
                    language,
                    buffered,
                    no_fallback,
                    out,
                },
            )
            .await
        }
        Commands::Chat {
            message,
            session,
            speak,
            out,
        } => {
            chat::execute(
                &ctx,
                ChatArgs {
                    message,
                    session,
                    speak,
                    out,
                },
            )
            .await
        }
        Commands::Session { command } => session::execute(&ctx, &command).await,
        Commands::History { session_id, json } => history::execute(&ctx, &session_id, json).await,
        Commands::Health { json } => health::execute(&ctx, json).await,
        Commands::Clinician => clinician::execute(&ctx).await,
    }
}
