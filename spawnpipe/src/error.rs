//! Error types for the spawn engine.

use thiserror::Error;

/// Everything that can stop a spawn from producing an [`ExecutionResult`].
///
/// A child exiting with a non-zero code is *not* an error here; it is an
/// ordinary result. Only [`ExecutionResult::into_output`] turns it into
/// [`SpawnError::NonZeroExit`].
///
/// [`ExecutionResult`]: crate::process::ExecutionResult
/// [`ExecutionResult::into_output`]: crate::process::ExecutionResult::into_output
#[derive(Debug, Error)]
pub enum SpawnError {
    /// The command line was empty or contained a NUL byte.
    #[error("invalid command: {reason}")]
    InvalidCommand { reason: &'static str },

    /// One of the three pipes could not be created. No process was started.
    #[error("cannot create pipes: {0}")]
    PipeCreation(#[source] nix::Error),

    /// The child process could not be started.
    #[error("spawn failed: {0}")]
    Spawn(#[source] std::io::Error),

    /// Waiting for the child to terminate failed.
    #[error("failed to reap child process: {0}")]
    Reap(#[source] std::io::Error),

    /// The background worker went away before delivering a result.
    #[error("spawn worker terminated before completion")]
    WorkerLost,

    /// The child exited with a non-zero code.
    #[error("non-zero exit code: {code}")]
    NonZeroExit { code: i32, stderr: Vec<u8> },
}

/// Crate-local result alias.
pub type Result<T, E = SpawnError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use nix::errno::Errno;

    #[test]
    fn test_display_matches_failure_kind() {
        let err = SpawnError::PipeCreation(Errno::EMFILE);
        assert!(err.to_string().starts_with("cannot create pipes"));

        let err = SpawnError::NonZeroExit {
            code: 3,
            stderr: b"boom".to_vec(),
        };
        assert_eq!(err.to_string(), "non-zero exit code: 3");
    }

    #[test]
    fn test_source_is_preserved() {
        use std::error::Error as _;

        let io = std::io::Error::from(std::io::ErrorKind::NotFound);
        let err = SpawnError::Spawn(io);
        assert!(err.source().is_some());
        assert!(SpawnError::WorkerLost.source().is_none());
    }
}
