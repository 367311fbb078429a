//! Draining stdout and stderr together with `poll(2)`.
//!
//! Both pipes are watched in one blocking readiness wait. A pipe leaves the
//! watched set the moment it reports end-of-stream or a read error, and the
//! loop ends when the set is empty. Neither pipe can fill up and stall the
//! child while the other one is being read.

use std::ffi::c_int;
use std::fmt;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::os::fd::{AsFd, OwnedFd};

use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use tracing::{debug, trace, warn};

use super::buffer::GrowableBuffer;

/// Readiness wait over a set of descriptors, `poll(2)` by default.
type WaitFn = fn(&mut [PollFd<'_>], PollTimeout) -> nix::Result<c_int>;

/// Which output stream a pipe carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => f.write_str("stdout"),
            Self::Stderr => f.write_str("stderr"),
        }
    }
}

/// Everything read from both streams.
#[derive(Debug, Default)]
pub struct Captured {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// One pipe and the buffer it fills. `source` is `None` once closed.
#[derive(Debug)]
struct Stream {
    kind: StreamKind,
    source: Option<File>,
    buffer: GrowableBuffer,
}

impl Stream {
    fn new(kind: StreamKind, fd: OwnedFd, min_slack: usize) -> Self {
        Self {
            kind,
            source: Some(File::from(fd)),
            buffer: GrowableBuffer::with_slack(min_slack),
        }
    }

    const fn is_open(&self) -> bool {
        self.source.is_some()
    }

    /// Perform one read on a ready pipe.
    fn pump(&mut self) {
        let Some(source) = self.source.as_mut() else {
            return;
        };

        let outcome = loop {
            match source.read(self.buffer.spare_mut()) {
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                other => break other,
            }
        };

        match outcome {
            Ok(0) => self.close(),
            Ok(n) => {
                trace!(stream = %self.kind, bytes = n, "read");
                self.buffer.advance(n);
            }
            Err(e) => {
                warn!(stream = %self.kind, error = %e, "read failed, closing stream");
                self.close();
            }
        }
    }

    fn close(&mut self) {
        if self.source.take().is_some() {
            debug!(stream = %self.kind, bytes = self.buffer.len(), "stream closed");
        }
    }
}

/// Reads two pipes to completion into independent buffers.
#[derive(Debug)]
pub struct StreamMultiplexer {
    streams: [Stream; 2],
    wait: WaitFn,
}

impl StreamMultiplexer {
    pub fn new(stdout: OwnedFd, stderr: OwnedFd, min_slack: usize) -> Self {
        Self {
            streams: [
                Stream::new(StreamKind::Stdout, stdout, min_slack),
                Stream::new(StreamKind::Stderr, stderr, min_slack),
            ],
            wait: poll::<PollTimeout>,
        }
    }

    /// Swap the readiness wait, used to simulate a failing `poll`.
    #[cfg(test)]
    #[must_use]
    const fn with_wait(mut self, wait: WaitFn) -> Self {
        self.wait = wait;
        self
    }

    /// Read until both pipes have closed, or until the readiness wait fails.
    ///
    /// A failed wait is not fatal: whatever was captured up to that point
    /// is returned and the remaining pipes are closed.
    pub fn drain(mut self) -> Captured {
        loop {
            let ready = match self.wait_ready() {
                Ok(Some(ready)) => ready,
                Ok(None) => break,
                Err(errno) => {
                    warn!(error = %errno, "readiness wait failed, keeping partial output");
                    break;
                }
            };

            for (stream, is_ready) in self.streams.iter_mut().zip(ready) {
                if is_ready {
                    stream.pump();
                }
            }
        }

        let [stdout, stderr] = self.streams;
        Captured {
            stdout: stdout.buffer.into_bytes(),
            stderr: stderr.buffer.into_bytes(),
        }
    }

    /// Block until at least one open pipe is readable or hung up.
    ///
    /// Returns `None` when no pipe is open any more.
    fn wait_ready(&self) -> nix::Result<Option<[bool; 2]>> {
        let open: Vec<(usize, &File)> = self
            .streams
            .iter()
            .enumerate()
            .filter_map(|(idx, stream)| stream.source.as_ref().map(|file| (idx, file)))
            .collect();

        if open.is_empty() {
            return Ok(None);
        }

        let mut fds: Vec<PollFd<'_>> = open
            .iter()
            .map(|(_, file)| PollFd::new(file.as_fd(), PollFlags::POLLIN))
            .collect();

        let waited = loop {
            match (self.wait)(&mut fds, PollTimeout::NONE) {
                Err(Errno::EINTR) => {}
                other => break other,
            }
        };
        waited?;

        // POLLHUP and POLLERR count as ready: the following read reports
        // end-of-stream or the error, and the stream is closed then.
        let mut ready = [false; 2];
        for ((idx, _), fd) in open.iter().zip(&fds) {
            ready[*idx] = fd.revents().is_some_and(|events| !events.is_empty());
        }
        Ok(Some(ready))
    }

    /// Number of pipes still being watched.
    pub fn open_streams(&self) -> usize {
        self.streams.iter().filter(|s| s.is_open()).count()
    }
}
