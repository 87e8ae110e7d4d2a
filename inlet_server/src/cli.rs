use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "inlet", version, about = "Inlet record cache service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the HTTP server (default if no subcommand given).
    Serve {
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        #[arg(long, default_value = "8000")]
        port: u16,

        /// Local data directory (SQLite store lives here).
        #[arg(long, env = "INLET_DATA_DIR", default_value = ".inlet_dev")]
        data_dir: PathBuf,
    },

    /// Apply store migrations without starting the server.
    Migrate {
        /// Store path override (else INLET_DB_PATH / {data_dir}/records.db).
        #[arg(long)]
        db_path: Option<PathBuf>,

        #[arg(long, env = "INLET_DATA_DIR", default_value = ".inlet_dev")]
        data_dir: PathBuf,
    },

    /// Print current configuration (redacted secrets).
    Config,

    /// Health check configured backends.
    Check,
}
