//! CLI command execution.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use spawnpipe::process::{exec, ExecutionResult, SpawnOptions, Termination};
use uuid::Uuid;

use super::args::{Cli, OutputFormat};

impl From<&Cli> for SpawnOptions {
    fn from(cli: &Cli) -> Self {
        let mut options = Self::new()
            .shell(&cli.shell)
            .min_slack(cli.min_slack)
            .envs(cli.env.iter().cloned());

        if let Some(ref dir) = cli.cwd {
            options = options.working_dir(dir);
        }
        if cli.env_clear {
            options = options.env_clear();
        }
        options
    }
}

/// JSON view of a finished spawn.
#[derive(Debug, Serialize)]
struct Report<'a> {
    id: Uuid,
    command: &'a str,
    pid: u32,
    exit_code: i32,
    termination: Termination,
    stdout: String,
    stderr: String,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    duration_ms: i64,
}

impl<'a> Report<'a> {
    fn new(command: &'a str, result: &ExecutionResult) -> Self {
        Self {
            id: result.id(),
            command,
            pid: result.pid(),
            exit_code: result.exit_code(),
            termination: result.termination(),
            stdout: result.stdout_lossy(),
            stderr: result.stderr_lossy(),
            started_at: result.started_at(),
            finished_at: result.finished_at(),
            duration_ms: (result.finished_at() - result.started_at()).num_milliseconds(),
        }
    }
}

/// Run the command described by `cli` and report the result.
///
/// Returns the byte the process should exit with.
///
/// # Errors
///
/// Fails if the command could not be started or reaped, if `--check` is set
/// and the command exited non-zero, or if writing the report fails.
pub async fn execute(cli: Cli) -> Result<u8> {
    let options = SpawnOptions::from(&cli);
    let command = cli.command.join(" ");

    let result = exec(command.as_str(), options)
        .await
        .with_context(|| format!("Failed to run command: {command}"))?;

    match cli.format {
        OutputFormat::Raw => replay(&result)?,
        OutputFormat::Json => {
            let report = Report::new(&command, &result);
            let json = serde_json::to_string_pretty(&report).context("Failed to encode result")?;
            println!("{json}");
        }
    }

    let code = result.exit_code();
    if cli.check {
        result
            .into_output()
            .with_context(|| format!("Command failed: {command}"))?;
    }

    Ok(u8::try_from(code).unwrap_or(u8::MAX))
}

/// Write the captured streams to our own stdout and stderr, unchanged.
fn replay(result: &ExecutionResult) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(result.stdout())
        .and_then(|()| stdout.flush())
        .context("Failed to write captured stdout")?;

    let mut stderr = std::io::stderr().lock();
    stderr
        .write_all(result.stderr())
        .and_then(|()| stderr.flush())
        .context("Failed to write captured stderr")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::PathBuf;

    #[test]
    fn test_options_from_cli() {
        let cli = Cli::try_parse_from([
            "spawnpipe",
            "--shell",
            "/bin/bash",
            "--cwd",
            "/tmp",
            "-e",
            "K=V",
            "--env-clear",
            "--min-slack",
            "128",
            "true",
        ])
        .unwrap();
        let options = SpawnOptions::from(&cli);

        assert_eq!(options.shell, PathBuf::from("/bin/bash"));
        assert_eq!(options.working_dir, Some(PathBuf::from("/tmp")));
        assert_eq!(options.env.get("K").map(String::as_str), Some("V"));
        assert!(options.env_clear);
        assert_eq!(options.min_slack, 128);
    }

    #[tokio::test]
    async fn test_report_fields() {
        let result = exec("printf out; printf err >&2; exit 5", SpawnOptions::new())
            .await
            .unwrap();
        let report = Report::new("cmd", &result);
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["command"], "cmd");
        assert_eq!(value["exit_code"], 5);
        assert_eq!(value["stdout"], "out");
        assert_eq!(value["stderr"], "err");
        assert_eq!(value["termination"]["kind"], "exited");
        assert_eq!(value["termination"]["value"], 5);
        assert!(value["duration_ms"].as_i64().unwrap() >= 0);
    }

    #[tokio::test]
    async fn test_execute_returns_child_code() {
        let cli = Cli::try_parse_from(["spawnpipe", "--format", "json", "exit", "3"]).unwrap();
        let code = execute(cli).await.unwrap();
        assert_eq!(code, 3);
    }

    #[tokio::test]
    async fn test_execute_check_fails_on_non_zero() {
        let cli = Cli::try_parse_from(["spawnpipe", "--check", "--format", "json", "exit 4"])
            .unwrap();
        let err = execute(cli).await.unwrap_err();
        assert!(err.to_string().contains("Command failed"));
    }
}
