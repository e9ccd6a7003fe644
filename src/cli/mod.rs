//! CLI module
//!
//! Command-line interface for running queries.
//!
//! # Commands
//!
//! - `query` - Run a batch of queries and print the frames
//! - `check` - Check that the datasource settings are usable
//! - `serve` - Start HTTP server mode

mod batch;
mod commands;
mod runner;
mod server;

pub use batch::{parse_time, QueryBatch};
pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
pub use server::{router, serve};
