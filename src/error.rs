//! Harness error types and formatting
//!
//! **`HarnessError`** is a typed enum for failures that need to be
//! pattern-matched: the runner distinguishes harness-setup failures (the shell
//! never produced the sentinel) from content mismatches, and `main` maps
//! `InvariantViolation` to its own exit code. Use `.into()` to convert to
//! `anyhow::Error` while preserving the type for `downcast_ref`.
//!
//! Content and length mismatches are not errors; they are
//! [`Failure`](crate::scenario::Failure) values carried by a verdict.

use std::path::PathBuf;
use std::time::Duration;

use color_print::cformat;

use crate::styling::{error_message, format_with_gutter, hint_message};

/// Exit code when at least one scenario failed.
pub const EXIT_SCENARIO_FAILED: i32 = 1;

/// Exit code when the harness itself is inconsistent.
pub const EXIT_INTERNAL: i32 = 2;

/// Domain errors raised while provisioning, driving or demultiplexing a session.
///
/// ```ignore
/// if let Some(HarnessError::SentinelMissing { .. }) = err.downcast_ref() {
///     // the shell did not start as expected
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HarnessError {
    /// The catalog has no entry with this name.
    FixtureTemplateMissing { name: String, catalog: PathBuf },
    /// Copying the template, renaming `_git` or `git init` failed.
    FixtureProvision { fixture: String, detail: String },
    /// The shell process could not be started.
    SpawnFailed { shell: String, detail: String },
    /// The shell did not exit within the configured timeout and was killed.
    /// `captured` holds what it printed before that.
    SessionTimedOut {
        timeout: Duration,
        captured: Vec<String>,
    },
    /// The first retained line does not start with the prompt sentinel.
    SentinelMissing {
        sentinel: String,
        first_line: Option<String>,
    },
    /// Fewer lines were captured than the bootstrap alone produces.
    TruncatedCapture { lines: usize },
    /// Captured output has an odd number of lines, so echo/response pairs
    /// cannot be recovered.
    UnpairedOutput { lines: usize },
    /// A scenario was started but never resolved.
    InvariantViolation {
        started: usize,
        passed: usize,
        failed: usize,
    },
    /// A `--shell` name that is neither built in nor defined in the config.
    UnknownProfile { name: String, available: Vec<String> },
}

impl HarnessError {
    /// Lines the shell printed before the error, when the error carries them.
    pub fn captured(&self) -> &[String] {
        match self {
            HarnessError::SessionTimedOut { captured, .. } => captured,
            _ => &[],
        }
    }
}

impl std::error::Error for HarnessError {}

impl std::fmt::Display for HarnessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HarnessError::FixtureTemplateMissing { name, catalog } => {
                let catalog = catalog.display();
                write!(
                    f,
                    "{}\n{}",
                    error_message(cformat!("Fixture template <bold>{name}</> not found")),
                    hint_message(cformat!(
                        "Expected <bright-black>{catalog}/{name}/_git</>; set <bright-black>--fixtures</> to the catalog directory"
                    ))
                )
            }
            HarnessError::FixtureProvision { fixture, detail } => {
                write!(
                    f,
                    "{}\n{}",
                    error_message(cformat!("Failed to provision fixture <bold>{fixture}</>")),
                    format_with_gutter(detail)
                )
            }
            HarnessError::SpawnFailed { shell, detail } => {
                write!(
                    f,
                    "{}\n{}",
                    error_message(cformat!("Failed to start shell <bold>{shell}</>")),
                    format_with_gutter(detail)
                )
            }
            HarnessError::SessionTimedOut { timeout, captured } => {
                write!(
                    f,
                    "{}\n{}",
                    error_message(format!("Shell did not exit within {timeout:?} and was killed")),
                    hint_message(format!(
                        "{} lines were captured before the timeout",
                        captured.len()
                    ))
                )
            }
            HarnessError::SentinelMissing {
                sentinel,
                first_line,
            } => {
                let found = match first_line {
                    Some(line) => format!("first response line was {line:?}"),
                    None => "no response line was captured".to_string(),
                };
                write!(
                    f,
                    "{}\n{}",
                    error_message(cformat!(
                        "Harness setup failed: prompt sentinel <bold>{sentinel}</> not found"
                    )),
                    hint_message(format!(
                        "{found}; the shell did not start the way the harness expects"
                    ))
                )
            }
            HarnessError::TruncatedCapture { lines } => {
                write!(
                    f,
                    "{}",
                    error_message(format!(
                        "Harness setup failed: capture truncated after {lines} lines"
                    ))
                )
            }
            HarnessError::UnpairedOutput { lines } => {
                write!(
                    f,
                    "{}\n{}",
                    error_message(format!(
                        "Harness setup failed: {lines} captured lines do not form echo/response pairs"
                    )),
                    hint_message("Every script line must produce exactly one echo and one response line")
                )
            }
            HarnessError::InvariantViolation {
                started,
                passed,
                failed,
            } => {
                write!(
                    f,
                    "{}",
                    error_message(format!(
                        "Internal error: {started} scenarios started but {passed} passed + {failed} failed"
                    ))
                )
            }
            HarnessError::UnknownProfile { name, available } => {
                let available = available.join(", ");
                write!(
                    f,
                    "{}\n{}",
                    error_message(cformat!("Unknown shell profile <bold>{name}</>")),
                    hint_message(format!("Available profiles: {available}"))
                )
            }
        }
    }
}

/// Exit code for an error that escaped to `main`.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<HarnessError>() {
        Some(HarnessError::InvariantViolation { .. }) => EXIT_INTERNAL,
        _ => EXIT_SCENARIO_FAILED,
    }
}
