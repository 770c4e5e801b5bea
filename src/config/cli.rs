//! Command-line interface definitions using clap

use clap::{Parser, Subcommand};

/// tinylink - URL shortener service
#[derive(Parser, Debug)]
#[command(name = "tinylink")]
#[command(version)]
#[command(about = "A URL shortener service with click analytics", long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, short = 'c', global = true, default_value = "config.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Print a sample configuration file to stdout
    ConfigGen,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_none() {
        let cli = Cli::parse_from(["tinylink"]);
        assert_eq!(cli.config, "config.toml");
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_config_flag_and_subcommand() {
        let cli = Cli::parse_from(["tinylink", "--config", "/etc/tinylink.toml", "config-gen"]);
        assert_eq!(cli.config, "/etc/tinylink.toml");
        assert_eq!(cli.command, Some(Commands::ConfigGen));
    }
}
