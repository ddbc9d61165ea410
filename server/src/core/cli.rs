use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::config::WriteMode;
use super::constants::{
    ENV_CONFIG, ENV_DEBUG, ENV_HOST, ENV_PORT, ENV_POSTGRES_URL, ENV_WRITE_MODE,
};

#[derive(Parser)]
#[command(name = "statsink")]
#[command(version, about = "statsd flush persistence service", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Server host address
    #[arg(long, short = 'H', global = true, env = ENV_HOST)]
    pub host: Option<String>,

    /// Server port
    #[arg(long, short = 'p', global = true, env = ENV_PORT)]
    pub port: Option<u16>,

    /// Enable debug mode (verbose pipeline logging)
    #[arg(long, global = true, env = ENV_DEBUG)]
    pub debug: bool,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// PostgreSQL connection URL
    #[arg(long, global = true, env = ENV_POSTGRES_URL)]
    pub postgres_url: Option<String>,

    /// Persistence write mode (batch or per-record)
    #[arg(long, global = true, env = ENV_WRITE_MODE, value_parser = parse_write_mode)]
    pub write_mode: Option<WriteMode>,
}

/// Parse write mode from CLI/env string
fn parse_write_mode(s: &str) -> Result<WriteMode, String> {
    match s.to_lowercase().as_str() {
        "batch" => Ok(WriteMode::Batch),
        "per-record" | "per_record" => Ok(WriteMode::PerRecord),
        _ => Err(format!(
            "Invalid write mode '{}'. Valid options: batch, per-record",
            s
        )),
    }
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Start the server (default command)
    Start,
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub debug: bool,
    pub config: Option<PathBuf>,
    pub postgres_url: Option<String>,
    pub write_mode: Option<WriteMode>,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Option<Commands>) {
    let cli = Cli::parse();
    let config = CliConfig {
        host: cli.host,
        port: cli.port,
        debug: cli.debug,
        config: cli.config,
        postgres_url: cli.postgres_url,
        write_mode: cli.write_mode,
    };
    (config, cli.command)
}
