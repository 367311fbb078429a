//! Spawnpipe - run a shell command and capture everything it wrote.
//!
//! The engine starts `sh -c <command>` with stdout and stderr on pipes,
//! drains both with a single `poll(2)` loop into growable buffers, reaps the
//! child and reports its exit status together with both byte streams.
//! Spawns run on a background worker and report through a completion
//! handler or a future.

pub mod error;
pub mod process;

pub use error::SpawnError;
pub use process::{exec, run, spawn, CommandSpec, ExecutionResult, SpawnOptions, Termination};
