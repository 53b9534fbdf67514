//! Hook configuration from CLI arguments and environment.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::{APP_NAME, DATA_DIR_DEFAULT, SCAN_NAME_DEFAULT};

/// Persist security scan findings for a defect tracker
#[derive(Parser, Debug)]
#[command(name = APP_NAME)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Import a parser's findings file into the store
    Import {
        /// JSON array of findings produced by a parser
        findings: PathBuf,

        #[command(flatten)]
        target: HookConfig,
    },
    /// Print the findings stored for a scan
    Show {
        #[command(flatten)]
        target: HookConfig,
    },
}

/// Where findings are persisted.
#[derive(Args, Debug, Clone)]
pub struct HookConfig {
    /// Name of the scan the findings belong to
    #[arg(long, env = "SCAN_NAME", default_value = SCAN_NAME_DEFAULT)]
    pub scan: String,

    /// Directory holding stored findings
    #[arg(long, env = "PERSISTENCE_DATA_DIR", default_value = DATA_DIR_DEFAULT)]
    pub data_dir: String,

    /// Upload findings to this URL instead of the data directory
    #[arg(long, env = "UPLOAD_URL")]
    pub upload_url: Option<String>,
}

impl HookConfig {
    /// Data directory with `~` and environment variables expanded.
    pub fn expanded_data_dir(&self) -> PathBuf {
        match shellexpand::full(&self.data_dir) {
            Ok(expanded) => PathBuf::from(expanded.as_ref()),
            Err(e) => {
                tracing::warn!(data_dir = %self.data_dir, error = %e, "could not expand data directory");
                PathBuf::from(shellexpand::tilde(&self.data_dir).as_ref())
            }
        }
    }
}

/// Default log filter for a `-v` count.
pub fn log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}
