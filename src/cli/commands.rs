//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - chat: talk to the assistant in the terminal (default)
//! - tools: print the tool definitions sent to the model
//! - config: print the effective configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Cinebot - a conversational assistant for your movie library
#[derive(Parser, Debug)]
#[command(name = "cinebot")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Chat with the assistant in the terminal
    Chat {
        /// User id to chat as (defaults to access.local_user)
        #[arg(short, long)]
        user: Option<i64>,
    },

    /// Print the tool definitions advertised to the model
    Tools,

    /// Print the effective configuration
    Config,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse_no_args() {
        // No args means terminal chat
        let cli = Cli::try_parse_from(["cinebot"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::try_parse_from(["cinebot", "-v"]).unwrap();
        assert!(cli.is_verbose());
    }

    #[test]
    fn test_cli_config_option() {
        let cli = Cli::try_parse_from(["cinebot", "-c", "/path/to/cinebot.yml"]).unwrap();
        assert_eq!(cli.config.as_ref(), Some(&PathBuf::from("/path/to/cinebot.yml")));
    }

    #[test]
    fn test_chat_with_user() {
        let cli = Cli::try_parse_from(["cinebot", "chat", "--user", "42"]).unwrap();
        match cli.command {
            Some(Commands::Chat { user }) => assert_eq!(user, Some(42)),
            _ => panic!("Expected chat command"),
        }
    }

    #[test]
    fn test_tools_command() {
        let cli = Cli::try_parse_from(["cinebot", "tools"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Tools)));
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let cli = Cli::try_parse_from(["cinebot", "config", "-c", "x.yml"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Config)));
        assert_eq!(cli.config, Some(PathBuf::from("x.yml")));
    }

    #[test]
    fn test_cli_debug_assert() {
        Cli::command().debug_assert();
    }
}
