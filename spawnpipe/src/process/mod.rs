//! Shell command spawning with full stdout/stderr capture.
//!
//! A spawn runs in four steps on one worker: the launcher starts
//! `sh -c <command>` with its standard streams on pipes, the multiplexer
//! drains stdout and stderr until both close, the child is reaped, and the
//! pieces are sealed into an [`ExecutionResult`].

mod buffer;
mod launch;
mod multiplex;
mod options;
mod pipe;
mod reap;
mod result;
mod worker;

pub use buffer::GrowableBuffer;
pub use launch::{Launched, Launcher};
pub use multiplex::{Captured, StreamKind, StreamMultiplexer};
pub use options::{CommandSpec, SpawnOptions, DEFAULT_MIN_SLACK, DEFAULT_SHELL};
pub use pipe::{PipePair, StdioPipes};
pub use reap::{ChildHandle, ChildState, Termination};
pub use result::{ExecutionResult, ResultAssembler};
pub use worker::{exec, run, spawn};
