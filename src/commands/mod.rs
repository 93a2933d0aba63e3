//! CLI command implementations for herakles-meminfo-exporter.
//!
//! This module provides implementations for all CLI subcommands:
//! - `check`: Source and configuration validation
//! - `config`: Configuration file generation
//! - `test`: One-off collection passes with record output

pub mod check;
pub mod config;

// Re-export command functions
pub use check::command_check;
pub use config::command_config;
pub use test::command_test;
