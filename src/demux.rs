//! Output demultiplexing
//!
//! With echo on, the shell prints two lines for every script line: an echo line
//! (blank for cmd) and the rendered prompt followed by the command text. The
//! subject program hooks prompt rendering, so its output is the prompt part of
//! every odd line:
//!
//! ```text
//! 0                                   echo
//! 1  ###C:\harness\out\subject.exe    installation (sentinel still in place)
//! 2                                   echo
//! 3  ###prompt $M#                    first command, rendered before it runs
//! 4                                   echo
//! 5  [master]  #ver >nul              response to `prompt $M#`
//! ```
//!
//! Responses are recovered by position alone. The parity depends only on the
//! one-line-in/one-line-out discipline of the script, so no pattern matching is
//! attempted; instead the preconditions are checked and violations fail the
//! scenario with a setup diagnostic.

use crate::error::HarnessError;

/// Retained lines produced before the first real response: the subject's
/// installation and the first prompt-format command.
pub const BOOTSTRAP_LINES: usize = 2;

/// Recover the subject's responses from a raw capture.
///
/// Preconditions, each reported as a [`HarnessError`]:
/// - a trailing blank line is tolerated and removed; after that the capture
///   must have an even number of lines (`UnpairedOutput`)
/// - at least the bootstrap pairs must be present (`TruncatedCapture`)
/// - the first retained line starts with `sentinel` (`SentinelMissing`)
pub fn demultiplex(raw: &[String], sentinel: &str) -> Result<Vec<String>, HarnessError> {
    let raw = match raw.split_last() {
        Some((last, rest)) if last.is_empty() && raw.len() % 2 == 1 => rest,
        _ => raw,
    };

    let retained: Vec<&String> = raw.iter().skip(1).step_by(2).collect();

    let Some(first) = retained.first() else {
        return Err(HarnessError::TruncatedCapture { lines: raw.len() });
    };
    if !first.starts_with(sentinel) {
        return Err(HarnessError::SentinelMissing {
            sentinel: sentinel.to_string(),
            first_line: Some((*first).clone()),
        });
    }
    if raw.len() % 2 == 1 {
        return Err(HarnessError::UnpairedOutput { lines: raw.len() });
    }
    if retained.len() < BOOTSTRAP_LINES {
        return Err(HarnessError::TruncatedCapture { lines: raw.len() });
    }

    Ok(retained
        .into_iter()
        .skip(BOOTSTRAP_LINES)
        .cloned()
        .collect())
}
