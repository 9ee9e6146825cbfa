//! chatsync CLI entry point.
//!
//! Binary name: `chatsync`
//!
//! Parses CLI arguments, opens the conversation store, bootstraps the sync
//! coordinator for the caller's owner id, then dispatches to a command.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;

use chatsync_observe::tracing_setup::{init_tracing, shutdown_tracing};
use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,chatsync=debug",
        _ => "trace",
    };
    init_tracing(filter, cli.otel).map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "chatsync", &mut std::io::stdout());
        return Ok(());
    }

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let state = AppState::init(cli.owner.as_deref()).await?;
    let json = cli.json;

    match cli.command {
        Commands::List => cli::conversation::list(&state, json)?,
        Commands::New => cli::conversation::new_chat(&state, json).await?,
        Commands::Show { id } => cli::conversation::show(&state, &id, json).await?,
        Commands::Send { conversation, text } => {
            cli::conversation::send(&state, conversation.as_deref(), &text, json).await?;
        }
        Commands::Reply { conversation } => {
            cli::conversation::reply(&state, conversation.as_deref(), json).await?;
        }
        Commands::Rename { id, title } => {
            cli::conversation::rename(&state, &id, &title, json).await?;
        }
        Commands::Delete { id, force } => {
            cli::conversation::delete(&state, &id, force, json).await?;
        }
        // Handled before state init.
        Commands::Completions { .. } => {}
    }

    Ok(())
}
