pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "catalog-etl")]
#[command(about = "Reconcile registrar course listings into a canonical catalog")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "catalog-etl.toml")]
    pub config: String,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Build full_cross.json and linking_table.json from a corpus dump
    Normalize {
        /// Override normalize.corpus_dir
        #[arg(long)]
        corpus_dir: Option<String>,
    },
    /// Reconcile a single term into the listing store
    Reconcile {
        #[arg(long)]
        term: u32,

        /// Plan without writing to the store
        #[arg(long)]
        dry_run: bool,
    },
    /// Reconcile every configured term, most recent first
    ReconcileAll,
}
