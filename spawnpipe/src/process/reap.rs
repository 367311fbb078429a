//! Waiting for the child and decoding how it ended.

use std::fmt;
use std::os::unix::process::ExitStatusExt;
use std::process::{Child, ExitStatus};

use nix::sys::signal::Signal;
use serde::Serialize;
use tracing::debug;

use crate::error::{Result, SpawnError};

/// How the child terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Termination {
    /// Normal exit, code already masked to the low 8 bits.
    Exited(i32),
    /// Killed by a signal.
    Signaled(i32),
}

impl Termination {
    pub fn from_status(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            Self::Exited(code & 0xff)
        } else if let Some(signal) = status.signal() {
            Self::Signaled(signal)
        } else {
            Self::Exited((status.into_raw() >> 8) & 0xff)
        }
    }

    /// Exit code in shell convention: the exit byte, or `128 + signal`.
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Exited(code) => code & 0xff,
            Self::Signaled(signal) => 128 + signal,
        }
    }

    pub const fn success(self) -> bool {
        matches!(self, Self::Exited(0))
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Exited(code) => write!(f, "exited with code {code}"),
            Self::Signaled(signal) => match Signal::try_from(signal) {
                Ok(sig) => write!(f, "killed by {sig}"),
                Err(_) => write!(f, "killed by signal {signal}"),
            },
        }
    }
}

/// Lifecycle state of a spawned child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildState {
    Running,
    Exited(Termination),
}

/// A spawned child that has not necessarily been reaped yet.
#[derive(Debug)]
pub struct ChildHandle {
    child: Child,
    state: ChildState,
}

impl ChildHandle {
    pub(crate) const fn new(child: Child) -> Self {
        Self {
            child,
            state: ChildState::Running,
        }
    }

    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    pub const fn state(&self) -> ChildState {
        self.state
    }

    /// Block until the child has terminated. No timeout.
    ///
    /// Only call this once both output pipes are drained: a child blocked on
    /// a full pipe never exits. Repeated calls return the recorded state.
    ///
    /// # Errors
    ///
    /// [`SpawnError::Reap`] if `waitpid` fails.
    pub fn wait(&mut self) -> Result<Termination> {
        if let ChildState::Exited(termination) = self.state {
            return Ok(termination);
        }

        let status = self.child.wait().map_err(SpawnError::Reap)?;
        let termination = Termination::from_status(status);
        self.state = ChildState::Exited(termination);
        debug!(pid = self.pid(), %termination, "reaped child");
        Ok(termination)
    }
}
