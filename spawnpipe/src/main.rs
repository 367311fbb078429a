//! Spawnpipe - run a shell command and capture everything it wrote.
//!
//! The binary is a thin driver over the library: it parses arguments,
//! runs the command on a background worker and replays or reports the
//! captured result.

mod cli;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use cli::{execute, init_logging, Cli};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    execute(cli).await.map(ExitCode::from)
}
