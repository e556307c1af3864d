//! Process execution boundary
//!
//! The harness talks to the outside world through one trait, [`ProgramRunner`]: run a program with some bytes on
//! stdin and hand back what it printed. [`SubprocessRunner`] is the real implementation; tests plug in fakes.
//!
//! ## Child lifecycle
//!
//! Every spawned child is owned by a [`ChildGuard`]. On every exit path (normal exit, timeout, interruption,
//! I/O error, panic) the guard kills the child if it is still running and waits on it, so the child never outlives
//! the call that started it. Collecting its output is bounded by the same deadline: a background process that
//! inherited the output pipe turns the run into a timeout instead of stalling the harness.

use std::io::{self, Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ProgramSpec;

const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Errors that occur while running an external program
#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to launch `{program}`: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("`{program}` timed out after {}ms", .timeout.as_millis())]
    Timeout { program: String, timeout: Duration },

    #[error("`{program}` wrote output that is not valid UTF-8 ({} bytes)", .bytes.len())]
    Decode { program: String, bytes: Vec<u8> },

    #[error("interrupted while `{program}` was running")]
    Interrupted { program: String },

    #[error("I/O error while running `{program}`: {source}")]
    Io {
        program: String,
        #[source]
        source: io::Error,
    },
}

impl RunError {
    /// Whether the error ends the whole run rather than a single test.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RunError::Launch { .. } | RunError::Interrupted { .. })
    }
}

/// Shared cancellation switch, flipped by the interrupt handler.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What a program printed and how it exited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramOutput {
    /// stdout and stderr as one interleaved stream, decoded as UTF-8
    pub text: String,
    /// Exit code; `None` when the process was ended by a signal
    pub exit_code: Option<i32>,
    pub duration: Duration,
}

impl ProgramOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Run an external program with the given stdin bytes.
pub trait ProgramRunner {
    fn run(&self, program: &ProgramSpec, input: &[u8]) -> Result<ProgramOutput, RunError>;
}

/// Blocking subprocess runner with a per-invocation time budget.
///
/// The budget covers the whole invocation: waiting for the child and collecting everything it wrote.
#[derive(Debug, Clone)]
pub struct SubprocessRunner {
    timeout: Duration,
    cancel: CancelFlag,
}

impl SubprocessRunner {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            cancel: CancelFlag::new(),
        }
    }

    /// Abort the in-flight program (and report [`RunError::Interrupted`]) once `cancel` is set.
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn wait(&self, guard: &mut ChildGuard, name: &str, deadline: Instant) -> Result<ExitStatus, RunError> {
        loop {
            match guard.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) => {}
                Err(source) => {
                    guard.terminate();
                    return Err(RunError::Io {
                        program: name.to_string(),
                        source,
                    });
                }
            }

            if self.cancel.is_cancelled() {
                guard.terminate();
                return Err(RunError::Interrupted {
                    program: name.to_string(),
                });
            }

            if Instant::now() >= deadline {
                warn!(program = name, timeout_ms = self.timeout.as_millis() as u64, "killing timed out program");
                guard.terminate();
                return Err(self.timed_out(name));
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    /// Wait for a helper thread's result, bounded by the same deadline as the child itself.
    fn collect<T>(&self, rx: &Receiver<io::Result<T>>, name: &str, deadline: Instant) -> Result<T, RunError> {
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                // The child has exited, but something it left behind still holds the pipe open.
                warn!(program = name, "output pipe still open after the program exited");
                return Err(self.timed_out(name));
            }
            match rx.recv_timeout(remaining.min(POLL_INTERVAL)) {
                Ok(result) => {
                    return result.map_err(|source| RunError::Io {
                        program: name.to_string(),
                        source,
                    });
                }
                Err(RecvTimeoutError::Timeout) => {
                    if self.cancel.is_cancelled() {
                        return Err(RunError::Interrupted {
                            program: name.to_string(),
                        });
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(RunError::Io {
                        program: name.to_string(),
                        source: io::Error::other("stream thread panicked"),
                    });
                }
            }
        }
    }

    fn timed_out(&self, name: &str) -> RunError {
        RunError::Timeout {
            program: name.to_string(),
            timeout: self.timeout,
        }
    }
}

impl ProgramRunner for SubprocessRunner {
    fn run(&self, program: &ProgramSpec, input: &[u8]) -> Result<ProgramOutput, RunError> {
        let name = program.to_string();
        let start = Instant::now();
        let deadline = start + self.timeout;
        debug!(program = %name, input_bytes = input.len(), "spawning");

        let io_err = |source: io::Error| RunError::Io {
            program: name.clone(),
            source,
        };

        // stdout and stderr share one pipe so the output keeps the order the program wrote it in.
        let (output, out_writer) = io::pipe().map_err(io_err)?;
        let err_writer = out_writer.try_clone().map_err(io_err)?;

        let mut command = Command::new(&program.path);
        command
            .args(&program.args)
            .stdin(Stdio::piped())
            .stdout(out_writer)
            .stderr(err_writer);
        let spawned = command.spawn();
        // The command holds our copies of the write end; the reader only sees EOF once they are closed.
        drop(command);
        let child = spawned.map_err(|source| RunError::Launch {
            program: name.clone(),
            source,
        })?;
        let mut guard = ChildGuard::new(child);

        let stdin = guard
            .child
            .stdin
            .take()
            .ok_or_else(|| io_err(io::Error::other("stdin stream unavailable")))?;

        // Write and drain on helper threads so a child that fills the pipe before reading stdin cannot deadlock us.
        // Threads still blocked when the deadline passes are left behind; they end once the last writer goes away.
        let writer = feed_stdin(stdin, input.to_vec());
        let reader = drain(output);

        let status = self.wait(&mut guard, &name, deadline)?;
        let bytes = self.collect(&reader, &name, deadline)?;
        self.collect(&writer, &name, deadline)?;

        let duration = start.elapsed();
        debug!(
            program = %name,
            exit_code = ?status.code(),
            output_bytes = bytes.len(),
            elapsed_ms = duration.as_millis() as u64,
            "program finished"
        );

        let text = String::from_utf8(bytes).map_err(|e| RunError::Decode {
            program: name.clone(),
            bytes: e.into_bytes(),
        })?;

        Ok(ProgramOutput {
            text,
            exit_code: status.code(),
            duration,
        })
    }
}

/// Owns a child process and guarantees it is killed and reaped when dropped.
struct ChildGuard {
    child: Child,
    reaped: bool,
}

impl ChildGuard {
    fn new(child: Child) -> Self {
        Self { child, reaped: false }
    }

    fn try_wait(&mut self) -> io::Result<Option<ExitStatus>> {
        let status = self.child.try_wait()?;
        if status.is_some() {
            self.reaped = true;
        }
        Ok(status)
    }

    fn terminate(&mut self) {
        if self.reaped {
            return;
        }
        let _ = self.child.kill();
        let _ = self.child.wait();
        self.reaped = true;
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        self.terminate();
    }
}

fn feed_stdin<W: Write + Send + 'static>(mut stdin: W, input: Vec<u8>) -> Receiver<io::Result<()>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let written = stdin.write_all(&input).and_then(|()| stdin.flush());
        drop(stdin);
        let result = match written {
            // The program is allowed to exit without reading all of its input.
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
            other => other,
        };
        let _ = tx.send(result);
    });
    rx
}

fn drain<R: Read + Send + 'static>(mut stream: R) -> Receiver<io::Result<Vec<u8>>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        let result = stream.read_to_end(&mut buf).map(|_| buf);
        let _ = tx.send(result);
    });
    rx
}

// ============================================================================
// Tests
// ============================================================================
