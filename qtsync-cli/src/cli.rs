use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use qtsync_core::reconcile::SyncMode;

#[derive(Parser, Debug)]
#[command(name = "qtsync")]
#[command(about = "Sync Questrade investment balances into YNAB")]
#[command(version, author, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Data directory holding config.json, mappings.json and settings.toml
    #[arg(long, global = true, env = "QTSYNC_CONFIG_DIR", value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage stored credentials
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },

    /// Manage account mappings between Questrade and YNAB
    Mapping {
        #[command(subcommand)]
        command: MappingCommand,
    },

    /// List YNAB budgets available to the stored token
    Budgets,

    /// Sync Questrade account balances to YNAB
    Sync {
        /// How balances are written to YNAB
        #[arg(long, value_enum, default_value_t = ModeArg::Transaction)]
        mode: ModeArg,

        /// Show the plan without changing anything
        #[arg(long)]
        dry_run: bool,

        /// Apply without asking for confirmation
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum AuthCommand {
    /// Store Questrade and YNAB credentials (replaces config.json)
    Set {
        /// Questrade manual authorization (refresh) token
        #[arg(long, env = "QTSYNC_QUESTRADE_TOKEN", hide_env_values = true)]
        questrade_token: Option<String>,

        /// YNAB personal access token
        #[arg(long, env = "QTSYNC_YNAB_TOKEN", hide_env_values = true)]
        ynab_token: Option<String>,

        /// YNAB budget id; chosen interactively when omitted
        #[arg(long)]
        budget_id: Option<String>,
    },

    /// Print the stored credentials
    Show {
        /// Print tokens in full instead of redacted
        #[arg(long)]
        reveal: bool,
    },

    /// Make sure the Questrade access token is valid, refreshing if needed
    Login,
}

#[derive(Subcommand, Debug)]
pub enum MappingCommand {
    /// List accounts on both sides and the current mapping
    List,

    /// Interactively map Questrade accounts to YNAB accounts
    Set,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Overwrite the YNAB cleared balance
    Balance,
    /// Create an adjustment transaction for the difference
    Transaction,
}

impl From<ModeArg> for SyncMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Balance => SyncMode::Balance,
            ModeArg::Transaction => SyncMode::Transaction,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn sync_defaults_to_transaction_mode() {
        let args = Args::try_parse_from(["qtsync", "sync", "--dry-run"]).unwrap();
        match args.command {
            Commands::Sync { mode, dry_run, yes } => {
                assert_eq!(SyncMode::from(mode), SyncMode::Transaction);
                assert!(dry_run);
                assert!(!yes);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let args =
            Args::try_parse_from(["qtsync", "sync", "--mode", "balance", "-v", "--config-dir", "/tmp/q"])
                .unwrap();
        assert!(args.verbose);
        assert_eq!(args.config_dir, Some(PathBuf::from("/tmp/q")));
    }
}
