//! Session driver
//!
//! Runs one script in one shell process and captures everything it prints.
//!
//! stdout and stderr are attached to the same pipe so lines keep the order the
//! shell wrote them in; two separate pipes would interleave nondeterministically
//! and break the echo/response pairing. A reader thread drains the pipe into a
//! channel while the driver blocks on the child with a timeout.
//!
//! A timed-out shell is killed and reported as
//! [`HarnessError::SessionTimedOut`] together with the lines it printed; the
//! run continues with the next scenario.

use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Child, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use crossbeam_channel as chan;
use wait_timeout::ChildExt;

use crate::error::HarnessError;
use crate::script::Script;
use crate::shell_exec::{self, ShellProfile};

/// Prompt format forced into the shell. Cannot occur in a rendered
/// repository prefix.
pub const DEFAULT_SENTINEL: &str = "###";

/// How long a session may run before it is killed.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// How long to keep reading a killed shell's output. A process the shell
/// started may still hold the pipe open.
const DRAIN_AFTER_KILL: Duration = Duration::from_millis(500);

/// An action against the running shell, performed before the driver waits.
pub trait SessionHook {
    fn before_wait(&self, child: &Child) -> anyhow::Result<()>;
}

/// Sends an interrupt to the shell after a delay.
#[derive(Debug, Clone, Copy)]
pub struct InterruptHook {
    pub delay: Duration,
}

impl SessionHook for InterruptHook {
    #[cfg(unix)]
    fn before_wait(&self, child: &Child) -> anyhow::Result<()> {
        use nix::sys::signal::{Signal, kill};
        use nix::unistd::Pid;

        thread::sleep(self.delay);
        let pid = i32::try_from(child.id()).context("Child pid out of range")?;
        log::debug!("Sending SIGINT to {pid}");
        kill(Pid::from_raw(pid), Signal::SIGINT).context("Failed to interrupt shell")?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn before_wait(&self, _child: &Child) -> anyhow::Result<()> {
        anyhow::bail!("Interrupting a session is only supported on Unix")
    }
}

/// Everything a finished session produced.
#[derive(Debug, Clone)]
pub struct RawSession {
    pub sentinel: String,
    /// Captured lines, line terminators removed, in output order.
    pub lines: Vec<String>,
    pub status: ExitStatus,
}

/// Spawns a shell for a script and captures its combined output.
#[derive(Debug, Clone)]
pub struct SessionDriver {
    profile: ShellProfile,
    sentinel: String,
    timeout: Duration,
}

impl SessionDriver {
    pub fn new(profile: ShellProfile) -> Self {
        Self {
            profile,
            sentinel: DEFAULT_SENTINEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.sentinel = sentinel.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn profile(&self) -> &ShellProfile {
        &self.profile
    }

    pub fn sentinel(&self) -> &str {
        &self.sentinel
    }

    /// Run `script` with `cwd` as working directory and block until the shell
    /// exits or the timeout expires.
    ///
    /// `context` names the scenario in log lines.
    pub fn drive(
        &self,
        cwd: &Path,
        script: &Script,
        hook: Option<&dyn SessionHook>,
        context: &str,
    ) -> anyhow::Result<RawSession> {
        let (reader, writer) = std::io::pipe().context("Failed to create output pipe")?;

        let mut cmd = self.profile.command(script.path(), &self.sentinel);
        cmd.current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(writer.try_clone().context("Failed to clone output pipe")?)
            .stderr(writer);

        let spawned = shell_exec::spawn(&mut cmd, Some(context));
        // The Command holds the parent's copy of the write end; the reader
        // only sees EOF once it is gone.
        drop(cmd);
        let mut child = spawned.map_err(|e| HarnessError::SpawnFailed {
            shell: self.profile.name.clone(),
            detail: e.to_string(),
        })?;

        let started = Instant::now();
        let (tx, rx) = chan::unbounded::<String>();
        thread::spawn(move || forward_lines(reader, &tx));

        if let Some(hook) = hook
            && let Err(e) = hook.before_wait(&child)
        {
            let _ = child.kill();
            let _ = child.wait();
            return Err(e.context("Session hook failed"));
        }

        let status = match child
            .wait_timeout(self.timeout)
            .context("Failed to wait for shell")?
        {
            Some(status) => status,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                log::warn!(
                    "[{context}] shell {} killed after {:?}",
                    child.id(),
                    self.timeout
                );
                let captured = drain_until_closed(&rx, Instant::now() + DRAIN_AFTER_KILL, context);
                return Err(HarnessError::SessionTimedOut {
                    timeout: self.timeout,
                    captured,
                }
                .into());
            }
        };

        let lines = drain_until_closed(&rx, started + self.timeout, context);
        log::debug!(
            "[{context}] shell exited with {status} after {:.1}ms, {} lines captured",
            started.elapsed().as_secs_f64() * 1000.0,
            lines.len()
        );

        Ok(RawSession {
            sentinel: self.sentinel.clone(),
            lines,
            status,
        })
    }
}

/// Read `reader` line by line into `tx` until EOF.
///
/// Bytes are decoded lossily: cmd writes in the console code page, and a
/// replacement character in a response is a mismatch, not a harness crash.
fn forward_lines(reader: impl Read, tx: &chan::Sender<String>) {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                if tx.send(decode_line(&buf)).is_err() {
                    break;
                }
            }
            Err(e) => {
                log::debug!("Output pipe read failed: {e}");
                break;
            }
        }
    }
}

fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

/// Collect lines until every writer has closed the pipe or `deadline` passes.
///
/// A process started by the script can outlive the shell and keep the pipe
/// open; the deadline stops the driver from waiting on it forever.
fn drain_until_closed(rx: &chan::Receiver<String>, deadline: Instant, context: &str) -> Vec<String> {
    let mut lines = Vec::new();
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok(line) => lines.push(line),
            Err(chan::RecvTimeoutError::Disconnected) => break,
            Err(chan::RecvTimeoutError::Timeout) => {
                log::warn!("[{context}] output pipe still open after the shell exited");
                break;
            }
        }
    }
    lines
}
