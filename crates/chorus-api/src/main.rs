//! Chorus CLI entry point.
//!
//! Binary name: `chorus`
//!
//! Parses CLI arguments, initializes tracing, then dispatches to the
//! appropriate command handler.

mod cli;

use clap::Parser;
use clap_complete::generate;

use chorus_observe::attrs::filter_directive;
use chorus_observe::tracing_setup::{init_tracing, shutdown_tracing};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(&filter_directive(cli.verbose, cli.quiet), cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let outcome = dispatch(&cli).await;
    shutdown_tracing();
    outcome
}

async fn dispatch(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Run {
            content,
            cycles,
            reply_rounds,
        } => {
            let options = cli::run::RunOptions {
                content: content.clone(),
                cycles: *cycles,
                reply_rounds: *reply_rounds,
            };
            cli::run::run(options, cli.json, cli.quiet).await
        }

        Commands::Characters => cli::characters::list_characters(cli.json).await,

        Commands::Config => cli::config::show_config(cli.json).await,

        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            generate(*shell, &mut cmd, "chorus", &mut std::io::stdout());
            Ok(())
        }
    }
}
