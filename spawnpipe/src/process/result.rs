//! The finished result of one spawn.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::multiplex::Captured;
use super::reap::Termination;
use crate::error::{Result, SpawnError};

/// Exit status and everything the child wrote. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    id: Uuid,
    pid: u32,
    termination: Termination,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
}

impl ExecutionResult {
    /// Identifier of the spawn that produced this result.
    pub const fn id(&self) -> Uuid {
        self.id
    }

    pub const fn pid(&self) -> u32 {
        self.pid
    }

    /// Exit code masked to the low 8 bits; `128 + signal` if signalled.
    pub const fn exit_code(&self) -> i32 {
        self.termination.exit_code()
    }

    pub const fn termination(&self) -> Termination {
        self.termination
    }

    /// Whether the child exited normally with code zero.
    pub const fn success(&self) -> bool {
        self.termination.success()
    }

    pub fn stdout(&self) -> &[u8] {
        &self.stdout
    }

    pub fn stderr(&self) -> &[u8] {
        &self.stderr
    }

    /// Get stdout as text, replacing invalid UTF-8.
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Get stderr as text, replacing invalid UTF-8.
    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub const fn finished_at(&self) -> DateTime<Utc> {
        self.finished_at
    }

    /// `(stdout, stderr)` if the child succeeded, otherwise
    /// [`SpawnError::NonZeroExit`] carrying the captured stderr.
    ///
    /// # Errors
    ///
    /// [`SpawnError::NonZeroExit`] unless the child exited with code zero.
    pub fn into_output(self) -> Result<(Vec<u8>, Vec<u8>)> {
        if self.success() {
            Ok((self.stdout, self.stderr))
        } else {
            Err(SpawnError::NonZeroExit {
                code: self.exit_code(),
                stderr: self.stderr,
            })
        }
    }
}

/// Collects the pieces of a spawn and seals them into an [`ExecutionResult`].
#[derive(Debug)]
pub struct ResultAssembler {
    id: Uuid,
    pid: u32,
    started_at: DateTime<Utc>,
}

impl ResultAssembler {
    pub const fn new(id: Uuid, pid: u32, started_at: DateTime<Utc>) -> Self {
        Self {
            id,
            pid,
            started_at,
        }
    }

    /// Consumes the assembler, so each spawn yields at most one result.
    pub fn assemble(self, captured: Captured, termination: Termination) -> ExecutionResult {
        ExecutionResult {
            id: self.id,
            pid: self.pid,
            termination,
            stdout: captured.stdout,
            stderr: captured.stderr,
            started_at: self.started_at,
            finished_at: Utc::now(),
        }
    }
}
