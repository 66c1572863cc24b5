//! CLI module for cinebot - command-line interface and subcommands.

pub mod commands;

pub use commands::Cli;
