//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use spawnpipe::process::{DEFAULT_MIN_SLACK, DEFAULT_SHELL};

/// Spawnpipe - run a shell command and capture everything it wrote
#[derive(Parser, Debug)]
#[command(name = "spawnpipe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Shell that interprets the command (run as `<shell> -c <command>`)
    #[arg(long, default_value = DEFAULT_SHELL)]
    pub shell: PathBuf,

    /// Working directory for the command
    #[arg(long)]
    pub cwd: Option<PathBuf>,

    /// Set an environment variable (KEY=VALUE, repeatable)
    #[arg(short, long = "env", value_name = "KEY=VALUE", value_parser = parse_env_pair)]
    pub env: Vec<(String, String)>,

    /// Start the command with an empty environment
    #[arg(long)]
    pub env_clear: bool,

    /// Minimum free space kept in each capture buffer, in bytes
    #[arg(long, default_value_t = DEFAULT_MIN_SLACK)]
    pub min_slack: usize,

    /// How to report the result
    #[arg(long, value_enum, default_value_t = OutputFormat::Raw)]
    pub format: OutputFormat,

    /// Fail if the command exits with a non-zero code
    #[arg(long)]
    pub check: bool,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    pub verbose: bool,

    /// Command line to run (words are joined with spaces)
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
    pub command: Vec<String>,
}

/// Result output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Replay captured stdout and stderr, exit with the child's code
    Raw,
    /// Print one JSON object describing the result
    Json,
}

/// Parse a `KEY=VALUE` pair.
fn parse_env_pair(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    if key.is_empty() {
        return Err(format!("empty variable name in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}
