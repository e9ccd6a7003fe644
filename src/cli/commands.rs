//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Run data source queries against URLs and inline data
#[derive(Parser, Debug)]
#[command(name = "urlframe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Datasource settings file (YAML or JSON)
    #[arg(short, long, global = true)]
    pub settings: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a batch of queries and print the frames
    Query {
        /// Queries file (YAML or JSON): a list of queries or `{queries, range, headers}`
        #[arg(short, long)]
        queries: PathBuf,

        /// Range start (RFC 3339 or epoch milliseconds)
        #[arg(long)]
        from: Option<String>,

        /// Range end (RFC 3339 or epoch milliseconds)
        #[arg(long)]
        to: Option<String>,
    },

    /// Check that the settings are usable
    Check,

    /// Start HTTP server mode
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one response per line)
    Json,
    /// Human-readable tables
    Pretty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_command() {
        let cli = Cli::parse_from([
            "urlframe",
            "query",
            "--settings",
            "settings.yaml",
            "--queries",
            "queries.json",
            "--from",
            "2024-01-01T00:00:00Z",
            "--format",
            "pretty",
        ]);
        assert_eq!(cli.settings, Some(PathBuf::from("settings.yaml")));
        assert_eq!(cli.format, OutputFormat::Pretty);
        match cli.command {
            Commands::Query { queries, from, to } => {
                assert_eq!(queries, PathBuf::from("queries.json"));
                assert_eq!(from.as_deref(), Some("2024-01-01T00:00:00Z"));
                assert!(to.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_serve_defaults() {
        let cli = Cli::parse_from(["urlframe", "serve", "-v"]);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Serve { port: 8080 }));
    }
}
