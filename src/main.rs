use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::{Generator, generate};
use colored::Colorize;
use linkshelf::cli::{Cli, Commands};
use linkshelf::output::{self, Verbosity};
use linkshelf::{ShelfContext, commands};
use std::io;
use std::process;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a `tracing` filter directive
const LOG_ENV: &str = "LINKSHELF_LOG";

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let verbosity = if cli.quiet {
        Verbosity::Quiet
    } else if cli.verbose {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    };
    output::set_verbosity(verbosity);
    init_logging(verbosity, matches!(cli.command, Commands::Watch { .. }));

    if let Commands::Completion { shell } = cli.command {
        print_completions(shell, &mut Cli::command());
        return Ok(());
    }

    let mut ctx = ShelfContext::new()?;

    match cli.command {
        Commands::Add {
            path,
            description,
            auto,
        } => commands::add::execute(&ctx, &path, description, auto)?,
        Commands::Remove { id } => commands::remove::execute(&ctx, &id)?,
        Commands::List { long } => commands::list::execute(&ctx, long)?,
        Commands::Pause { id } => commands::toggle::execute(&ctx, &id, false)?,
        Commands::Resume { id } => commands::toggle::execute(&ctx, &id, true)?,
        Commands::ClearPending { id } => commands::pending::clear(&ctx, &id)?,
        Commands::Process { id } => commands::pending::process(&ctx, &id)?,
        Commands::Scan => commands::scan::execute(&ctx)?,
        Commands::Watch { interval, for_secs } => {
            commands::watch::execute(&ctx, interval.as_deref(), for_secs)?;
        }
        Commands::Repair { search, dry_run } => commands::repair::execute(&ctx, &search, dry_run)?,
        Commands::Config { key, value, list } => {
            commands::config::execute(&mut ctx, key.as_deref(), value, list)?;
        }
        Commands::Completion { .. } => {}
    }

    Ok(())
}

/// Installs the stderr log subscriber
///
/// `LINKSHELF_LOG` wins when set. Otherwise `watch` logs at info, one-shot
/// commands only surface warnings, `-v` raises to debug and `-q` to errors.
fn init_logging(verbosity: Verbosity, long_running: bool) {
    let default_level = match verbosity {
        Verbosity::Verbose => "debug",
        Verbosity::Quiet => "error",
        Verbosity::Normal if long_running => "info",
        Verbosity::Normal => "warn",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(format!("linkshelf={default_level}")));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn print_completions<G: Generator>(g: G, cmd: &mut clap::Command) {
    generate(g, cmd, cmd.get_name().to_string(), &mut io::stdout());
}
