//! chatwatch CLI library.
//!
//! This crate provides the CLI interface for chatwatch.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, IgnoreAction};
pub use config::Config;
