mod cli;
mod commands;
mod output;
mod prompt;

use std::process;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use colored::*;
use tracing::Level;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use crate::cli::{Args, AuthCommand, Commands, MappingCommand};
use crate::commands::CommandContext;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = run(args).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        let reauth = e
            .downcast_ref::<qtsync_core::Error>()
            .is_some_and(qtsync_core::Error::requires_reauth)
            || e
                .downcast_ref::<qtsync_core::credentials::CredentialError>()
                .is_some_and(|c| c.requires_relogin());
        if reauth {
            eprintln!(
                "{}",
                "Run `qtsync auth login` with a new Questrade token and try again.".yellow()
            );
        }
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    if args.no_color {
        colored::control::set_override(false);
    }
    init_logging(args.verbose, args.quiet);

    if let Commands::Completions { shell } = args.command {
        let mut cmd = Args::command();
        let name = cmd.get_name().to_string();
        clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
        return Ok(());
    }

    let ctx = CommandContext::new(args.config_dir.as_deref())?;

    match args.command {
        Commands::Auth { command } => match command {
            AuthCommand::Set {
                questrade_token,
                ynab_token,
                budget_id,
            } => commands::auth::set(&ctx, questrade_token, ynab_token, budget_id).await,
            AuthCommand::Show { reveal } => commands::auth::show(&ctx, reveal).await,
            AuthCommand::Login => commands::auth::login(&ctx).await,
        },
        Commands::Mapping { command } => match command {
            MappingCommand::List => commands::mapping::list(&ctx).await,
            MappingCommand::Set => commands::mapping::set(&ctx).await,
        },
        Commands::Budgets => commands::budgets::list(&ctx).await,
        Commands::Sync {
            mode,
            dry_run,
            yes,
        } => commands::sync::run(&ctx, mode.into(), dry_run, yes).await,
        Commands::Completions { .. } => Ok(()),
    }
}

/// Logs go to stderr so tables on stdout stay clean.
fn init_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(verbose)
                .with_writer(std::io::stderr),
        )
        .init();
}
