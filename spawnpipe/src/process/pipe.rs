//! Close-on-exec pipe pairs.

use std::os::fd::OwnedFd;

/// A unidirectional pipe. Each end closes when dropped, exactly once.
#[derive(Debug)]
pub struct PipePair {
    /// End the data comes out of.
    pub read_end: OwnedFd,
    /// End the data goes into.
    pub write_end: OwnedFd,
}

impl PipePair {
    /// Create a pipe whose ends are both close-on-exec.
    ///
    /// Only descriptors explicitly wired into a child's stdio survive its
    /// `exec`, so a pipe never leaks into an unrelated concurrent spawn.
    ///
    /// # Errors
    ///
    /// The `pipe2`/`fcntl` errno, typically `EMFILE` or `ENFILE`.
    pub fn open() -> nix::Result<Self> {
        let (read_end, write_end) = cloexec_pipe()?;
        Ok(Self {
            read_end,
            write_end,
        })
    }
}

/// The three pipes wired into a child's standard streams.
#[derive(Debug)]
pub struct StdioPipes {
    pub stdin: PipePair,
    pub stdout: PipePair,
    pub stderr: PipePair,
}

impl StdioPipes {
    /// Create all three pipes or none.
    ///
    /// On failure, pipes created before the failing one are dropped (and so
    /// closed) before the error is returned.
    ///
    /// # Errors
    ///
    /// The first error returned by `open`.
    pub fn open_with(mut open: impl FnMut() -> nix::Result<PipePair>) -> nix::Result<Self> {
        let stdin = open()?;
        let stdout = open()?;
        let stderr = open()?;
        Ok(Self {
            stdin,
            stdout,
            stderr,
        })
    }
}

#[cfg(any(
    target_os = "linux",
    target_os = "android",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd",
    target_os = "dragonfly"
))]
fn cloexec_pipe() -> nix::Result<(OwnedFd, OwnedFd)> {
    nix::unistd::pipe2(nix::fcntl::OFlag::O_CLOEXEC)
}

// No pipe2 here; another thread spawning between pipe() and fcntl() can
// inherit these ends.
#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd",
    target_os = "dragonfly"
)))]
fn cloexec_pipe() -> nix::Result<(OwnedFd, OwnedFd)> {
    use nix::fcntl::{fcntl, FcntlArg, FdFlag};
    use std::os::fd::AsRawFd;

    let (read_end, write_end) = nix::unistd::pipe()?;
    for fd in [&read_end, &write_end] {
        fcntl(fd.as_raw_fd(), FcntlArg::F_SETFD(FdFlag::FD_CLOEXEC))?;
    }
    Ok((read_end, write_end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::errno::Errno;
    use nix::fcntl::{fcntl, FcntlArg, FdFlag};
    use std::fs::File;
    use std::io::{Read, Write};
    use std::os::fd::AsRawFd;

    #[test]
    fn test_pipe_carries_bytes() {
        let pipe = PipePair::open().unwrap();
        let mut writer = File::from(pipe.write_end);
        let mut reader = File::from(pipe.read_end);

        writer.write_all(b"through the pipe").unwrap();
        drop(writer);

        let mut out = String::new();
        reader.read_to_string(&mut out).unwrap();
        assert_eq!(out, "through the pipe");
    }

    #[test]
    fn test_pipe_ends_are_cloexec() {
        let pipe = PipePair::open().unwrap();
        for fd in [&pipe.read_end, &pipe.write_end] {
            let flags = fcntl(fd.as_raw_fd(), FcntlArg::F_GETFD).unwrap();
            assert!(FdFlag::from_bits_truncate(flags).contains(FdFlag::FD_CLOEXEC));
        }
    }

    #[test]
    fn test_stdio_pipes_stop_at_first_failure() {
        let mut calls = 0;
        let result = StdioPipes::open_with(|| {
            calls += 1;
            if calls == 2 {
                Err(Errno::EMFILE)
            } else {
                PipePair::open()
            }
        });

        assert_eq!(result.unwrap_err(), Errno::EMFILE);
        assert_eq!(calls, 2);
    }
}
