//! Child process launch with all three standard streams piped.

use std::os::fd::OwnedFd;
use std::process::{Command, Stdio};

use tracing::debug;

use super::options::{CommandSpec, SpawnOptions};
use super::pipe::{PipePair, StdioPipes};
use super::reap::ChildHandle;
use crate::error::{Result, SpawnError};

/// A started child and the parent's read ends of its output pipes.
#[derive(Debug)]
pub struct Launched {
    pub child: ChildHandle,
    pub stdout: OwnedFd,
    pub stderr: OwnedFd,
}

/// Starts `<shell> -c <command>` with stdin, stdout and stderr on pipes.
///
/// `std::process::Command` goes through `posix_spawn` on the platforms that
/// support it as long as no `pre_exec` hook is installed, so no copy of the
/// parent's address space is made before the shell is exec'd.
#[derive(Debug)]
pub struct Launcher<'a> {
    options: &'a SpawnOptions,
    open_pipe: fn() -> nix::Result<PipePair>,
}

impl<'a> Launcher<'a> {
    pub const fn new(options: &'a SpawnOptions) -> Self {
        Self {
            options,
            open_pipe: PipePair::open,
        }
    }

    /// Swap the pipe constructor, used to simulate descriptor exhaustion.
    #[must_use]
    pub(crate) const fn with_pipe_factory(
        mut self,
        open_pipe: fn() -> nix::Result<PipePair>,
    ) -> Self {
        self.open_pipe = open_pipe;
        self
    }

    /// Create the pipes and start the child.
    ///
    /// Every pipe end not returned in [`Launched`] is closed before this
    /// returns, on success and on failure alike.
    ///
    /// # Errors
    ///
    /// [`SpawnError::PipeCreation`] if a pipe could not be created, in which
    /// case no process was started; [`SpawnError::Spawn`] if the shell could
    /// not be started.
    pub fn launch(&self, command: &CommandSpec) -> Result<Launched> {
        let StdioPipes {
            stdin,
            stdout,
            stderr,
        } = StdioPipes::open_with(self.open_pipe).map_err(SpawnError::PipeCreation)?;
        debug!("created stdio pipes");

        let mut cmd = Command::new(&self.options.shell);
        cmd.arg("-c").arg(command.as_str());

        if let Some(ref dir) = self.options.working_dir {
            cmd.current_dir(dir);
        }

        if self.options.env_clear {
            cmd.env_clear();
        }

        for (key, value) in &self.options.env {
            cmd.env(key, value);
        }

        cmd.stdin(Stdio::from(stdin.read_end));
        cmd.stdout(Stdio::from(stdout.write_end));
        cmd.stderr(Stdio::from(stderr.write_end));

        let spawned = cmd.spawn();

        // `cmd` owns the child's pipe ends; dropping it closes the parent's
        // copies so end-of-stream arrives once the child exits.
        drop(cmd);
        // Nothing is ever written to the child.
        drop(stdin.write_end);

        let child = spawned.map_err(SpawnError::Spawn)?;
        let child = ChildHandle::new(child);
        debug!(pid = child.pid(), "spawned child");

        Ok(Launched {
            child,
            stdout: stdout.read_end,
            stderr: stderr.read_end,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::errno::Errno;
    use std::fs::File;
    use std::io::Read;

    fn read_all(fd: OwnedFd) -> String {
        let mut out = String::new();
        File::from(fd).read_to_string(&mut out).unwrap();
        out
    }

    #[test]
    fn test_launch_wires_stdout_and_stderr() {
        let options = SpawnOptions::new();
        let command = CommandSpec::new("printf out; printf err >&2").unwrap();
        let mut launched = Launcher::new(&options).launch(&command).unwrap();

        assert_eq!(read_all(launched.stdout), "out");
        assert_eq!(read_all(launched.stderr), "err");
        assert_eq!(launched.child.wait().unwrap().exit_code(), 0);
    }

    #[test]
    fn test_child_sees_eof_on_stdin() {
        let options = SpawnOptions::new();
        let command = CommandSpec::new("cat; echo done").unwrap();
        let mut launched = Launcher::new(&options).launch(&command).unwrap();

        assert_eq!(read_all(launched.stdout), "done\n");
        launched.child.wait().unwrap();
    }

    #[test]
    fn test_missing_shell_is_spawn_error() {
        let options = SpawnOptions::new().shell("/nonexistent/shell-12345");
        let command = CommandSpec::new("true").unwrap();
        let err = Launcher::new(&options).launch(&command).unwrap_err();
        assert!(matches!(err, SpawnError::Spawn(_)));
    }

    #[test]
    fn test_pipe_failure_starts_nothing() {
        let options = SpawnOptions::new();
        let command = CommandSpec::new("true").unwrap();
        let err = Launcher::new(&options)
            .with_pipe_factory(|| Err(Errno::ENFILE))
            .launch(&command)
            .unwrap_err();
        assert!(matches!(err, SpawnError::PipeCreation(Errno::ENFILE)));
    }

    #[test]
    fn test_working_dir_and_env() {
        let dir = tempfile::tempdir().unwrap();
        let options = SpawnOptions::new()
            .working_dir(dir.path())
            .env("SPAWNPIPE_TEST_VAR", "value");
        let command = CommandSpec::new("ls; printf %s \"$SPAWNPIPE_TEST_VAR\"").unwrap();

        std::fs::write(dir.path().join("marker.txt"), "").unwrap();
        let mut launched = Launcher::new(&options).launch(&command).unwrap();

        assert_eq!(read_all(launched.stdout), "marker.txt\nvalue");
        launched.child.wait().unwrap();
    }
}
