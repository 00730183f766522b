//! depfinder CLI - find type references across solutions

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use depfinder::util::diagnostic::emit;
use depfinder::util::shell::Shell;
use depfinder::util::GlobalContext;
use depfinder::FinderError;

fn main() {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("depfinder=debug")
    } else {
        EnvFilter::new("depfinder=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let shell = Arc::new(Shell::from_flags(cli.quiet, cli.verbose, cli.no_color, cli.json));

    if let Err(e) = run(cli, &shell) {
        report(&shell, &e);
        std::process::exit(1);
    }
}

fn run(cli: Cli, shell: &Arc<Shell>) -> Result<()> {
    let ctx = GlobalContext::new()?;

    // Execute command
    match cli.command {
        Commands::Solutions(args) => commands::solutions::execute(args, &ctx, shell),
        Commands::Projects(args) => commands::projects::execute(args, &ctx, shell),
        Commands::Types(args) => commands::types::execute(args, &ctx, shell),
        Commands::References(args) => commands::references::execute(args, &ctx, shell),
        Commands::Version(args) => commands::version::execute(args, shell),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}

/// Print a fatal error, as a diagnostic when it carries one.
fn report(shell: &Shell, err: &anyhow::Error) {
    match err.downcast_ref::<FinderError>() {
        Some(finder) if !shell.is_json() => {
            emit(&finder.to_diagnostic(), shell.use_color());
        }
        _ => shell.error(format!("{:#}", err)),
    }
}
