//! Command-line surface over the repository.

pub mod cli;

pub use cli::{resolve_target, Cli, CliContext, Commands};
