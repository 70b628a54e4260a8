//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Shroud using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Shroud - PII anonymization and deduplicating ingestion
#[derive(Parser, Debug)]
#[command(name = "shroud")]
#[command(version, about, long_about = None)]
#[command(author = "Shroud Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "shroud.toml", env = "SHROUD_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "SHROUD_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch, anonymize and store a batch of person records
    Ingest(commands::ingest::IngestArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),

    /// Generate identity key material (never overwrites)
    InitKeys(commands::keys::InitKeysArgs),

    /// Store hashes of the admin and database secrets
    SetCredentials(commands::credentials::SetCredentialsArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Show store row count, last id and key fingerprint
    Status(commands::status::StatusArgs),

    /// Decrypt the stored identity of one row (admin only)
    Recover(commands::recover::RecoverArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_ingest() {
        let cli = Cli::parse_from(["shroud", "ingest"]);
        assert_eq!(cli.config, "shroud.toml");
        assert!(matches!(cli.command, Commands::Ingest(ref a) if !a.dry_run));
    }

    #[test]
    fn test_cli_parse_ingest_dry_run() {
        let cli = Cli::parse_from(["shroud", "ingest", "--dry-run", "--max-records", "50"]);
        match cli.command {
            Commands::Ingest(args) => {
                assert!(args.dry_run);
                assert_eq!(args.max_records, Some(50));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["shroud", "--config", "custom.toml", "status"]);
        assert_eq!(cli.config, "custom.toml");
        assert!(matches!(cli.command, Commands::Status(_)));
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["shroud", "--log-level", "debug", "validate-config"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_key_commands() {
        let cli = Cli::parse_from(["shroud", "init-keys", "--path", "k.json"]);
        assert!(matches!(cli.command, Commands::InitKeys(ref a) if a.path.is_some()));

        let cli = Cli::parse_from(["shroud", "set-credentials"]);
        assert!(matches!(cli.command, Commands::SetCredentials(_)));
    }

    #[test]
    fn test_cli_parse_recover() {
        let cli = Cli::parse_from(["shroud", "recover", "--id", "7"]);
        assert!(matches!(cli.command, Commands::Recover(ref a) if a.id == 7));
        assert!(Cli::try_parse_from(["shroud", "recover"]).is_err());
    }

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["shroud", "init", "--force"]);
        assert!(matches!(cli.command, Commands::Init(ref a) if a.force));
    }
}
