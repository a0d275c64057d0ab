//! Integration tests for the repository bridge

mod cli_contracts;
mod config_loading;
mod content_streams;
mod pagination_windows;
mod query_equivalence;
mod scenarios;
mod support;
mod visibility;
mod write_operations;
