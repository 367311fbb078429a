//! Running a spawn end to end, in the foreground or on a background worker.

use chrono::Utc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::debug_span;
use uuid::Uuid;

use super::launch::{Launched, Launcher};
use super::multiplex::StreamMultiplexer;
use super::options::{CommandSpec, SpawnOptions};
use super::pipe::PipePair;
use super::result::{ExecutionResult, ResultAssembler};
use crate::error::{Result, SpawnError};

type PipeFactory = fn() -> nix::Result<PipePair>;

/// Run a command to completion on the current thread.
///
/// Blocks until both output streams have closed and the child has been
/// reaped. A non-zero exit is still `Ok`.
///
/// # Errors
///
/// Returns [`SpawnError::PipeCreation`] or [`SpawnError::Spawn`] if the
/// child could not be started, and [`SpawnError::Reap`] if waiting for it
/// failed.
///
/// # Example
///
/// ```rust,no_run
/// use spawnpipe::process::{run, CommandSpec, SpawnOptions};
///
/// let command = CommandSpec::new("echo hello")?;
/// let result = run(&command, &SpawnOptions::new())?;
/// assert_eq!(result.stdout(), b"hello\n");
/// # Ok::<(), spawnpipe::SpawnError>(())
/// ```
pub fn run(command: &CommandSpec, options: &SpawnOptions) -> Result<ExecutionResult> {
    run_with(command, options, PipePair::open)
}

fn run_with(
    command: &CommandSpec,
    options: &SpawnOptions,
    open_pipe: PipeFactory,
) -> Result<ExecutionResult> {
    let id = Uuid::now_v7();
    let span = debug_span!("spawn", %id, command = %command);
    let _enter = span.enter();

    let started_at = Utc::now();
    let Launched {
        mut child,
        stdout,
        stderr,
    } = Launcher::new(options)
        .with_pipe_factory(open_pipe)
        .launch(command)?;

    let assembler = ResultAssembler::new(id, child.pid(), started_at);
    let captured = StreamMultiplexer::new(stdout, stderr, options.effective_slack()).drain();
    // Reap only after both pipes are drained.
    let termination = child.wait()?;

    Ok(assembler.assemble(captured, termination))
}

/// Run a command on a blocking worker and hand the outcome to `on_complete`.
///
/// Returns immediately. `on_complete` is called exactly once, on the worker,
/// with either the full result or the error that stopped the spawn (an
/// invalid command included). Must be called from within a tokio runtime.
///
/// # Example
///
/// ```rust,no_run
/// use spawnpipe::process::{spawn, SpawnOptions};
///
/// #[tokio::main]
/// async fn main() {
///     let worker = spawn("ls -la", SpawnOptions::new(), |result| match result {
///         Ok(r) => println!("exit {}: {}", r.exit_code(), r.stdout_lossy()),
///         Err(e) => eprintln!("spawn failed: {e}"),
///     });
///     worker.await.unwrap();
/// }
/// ```
pub fn spawn<F>(command: impl Into<String>, options: SpawnOptions, on_complete: F) -> JoinHandle<()>
where
    F: FnOnce(Result<ExecutionResult>) + Send + 'static,
{
    spawn_with(command.into(), options, PipePair::open, on_complete)
}

fn spawn_with<F>(
    command: String,
    options: SpawnOptions,
    open_pipe: PipeFactory,
    on_complete: F,
) -> JoinHandle<()>
where
    F: FnOnce(Result<ExecutionResult>) + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let outcome = CommandSpec::new(command).and_then(|c| run_with(&c, &options, open_pipe));
        on_complete(outcome);
    })
}

/// Run a command on a blocking worker and await its result.
///
/// # Errors
///
/// The same errors as [`run`], plus [`SpawnError::InvalidCommand`] for a
/// blank or NUL-containing command and [`SpawnError::WorkerLost`] if the
/// worker went away without reporting.
///
/// # Example
///
/// ```rust,no_run
/// use spawnpipe::process::{exec, SpawnOptions};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let (stdout, _stderr) = exec("git rev-parse HEAD", SpawnOptions::new())
///         .await?
///         .into_output()?;
///     println!("{}", String::from_utf8_lossy(&stdout));
///     Ok(())
/// }
/// ```
pub async fn exec(command: impl Into<String>, options: SpawnOptions) -> Result<ExecutionResult> {
    let (result_tx, result_rx) = oneshot::channel();
    spawn(command, options, move |result| {
        let _ = result_tx.send(result);
    });

    result_rx.await.map_err(|_| SpawnError::WorkerLost)?
}
