//! Command-line interface definitions.

pub mod check;
pub mod run;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;

/// Guardian - keeps protective stop and trailing orders on an open position.
#[derive(Parser, Debug)]
#[command(name = "guardian")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Guard a paper position until interrupted
    Run(RunArgs),

    /// Validate configuration file
    Check(ConfigPathArg),
}

/// Shared argument for commands that only need a config path.
#[derive(Parser, Debug)]
pub struct ConfigPathArg {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Override the guarded symbol
    #[arg(long)]
    pub symbol: Option<String>,

    /// Override log level (debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Use JSON log format instead of pretty
    #[arg(long)]
    pub json_logs: bool,

    /// Override the paper position (signed; negative is short)
    #[arg(long, allow_hyphen_values = true)]
    pub position: Option<Decimal>,

    /// Override the paper entry price
    #[arg(long)]
    pub entry_price: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parses_run_overrides() {
        let cli = Cli::try_parse_from([
            "guardian",
            "run",
            "--config",
            "paper.toml",
            "--symbol",
            "ETHUSDT",
            "--position",
            "-0.5",
            "--json-logs",
        ])
        .unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.config, PathBuf::from("paper.toml"));
        assert_eq!(args.symbol.as_deref(), Some("ETHUSDT"));
        assert_eq!(args.position, Some(dec!(-0.5)));
        assert!(args.json_logs);
    }

    #[test]
    fn check_defaults_config_path() {
        let cli = Cli::try_parse_from(["guardian", "check"]).unwrap();
        let Commands::Check(args) = cli.command else {
            panic!("expected check");
        };
        assert_eq!(args.config, PathBuf::from("config.toml"));
    }
}
