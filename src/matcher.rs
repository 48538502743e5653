//! Response matching
//!
//! Expected lines support two wildcards:
//!
//! - `None` matches anything. Used for responses whose content is not under
//!   test (e.g. the prompt right after the format command).
//! - The truncation marker `#`. When either side contains it, both sides are
//!   cut at their first `#` before comparing. The subject's prefix ends where
//!   the prompt format's literal `#` begins, and everything after it is the
//!   echoed next command, which varies with the script.
//!
//! The first mismatch ends the comparison; there is no partial credit.

use serde::Serialize;

/// Character at which both sides of a comparison are truncated.
pub const TRUNCATION_MARKER: char = '#';

/// Why a response sequence did not match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Mismatch {
    /// Different number of responses than expected lines.
    Length {
        actual: Vec<String>,
        expected: Vec<Option<String>>,
    },
    /// The response at `index` differs from its expected line after truncation.
    Content {
        index: usize,
        actual: String,
        expected: String,
    },
}

/// Cut `s` at the first occurrence of `marker`.
pub fn truncate_at(s: &str, marker: char) -> &str {
    match s.find(marker) {
        Some(pos) => &s[..pos],
        None => s,
    }
}

/// Compare a single response against a single expected line.
///
/// With `marker` set, both strings are truncated at their first marker when
/// either contains one.
pub fn line_matches(actual: &str, expected: Option<&str>, marker: Option<char>) -> bool {
    let Some(expected) = expected else {
        return true;
    };
    match marker {
        Some(m) if actual.contains(m) || expected.contains(m) => {
            truncate_at(actual, m) == truncate_at(expected, m)
        }
        _ => actual == expected,
    }
}

/// Compare recovered responses with expected lines using [`TRUNCATION_MARKER`].
pub fn match_responses(actual: &[String], expected: &[Option<String>]) -> Result<(), Mismatch> {
    match_responses_with(actual, expected, Some(TRUNCATION_MARKER))
}

/// Compare recovered responses with expected lines.
pub fn match_responses_with(
    actual: &[String],
    expected: &[Option<String>],
    marker: Option<char>,
) -> Result<(), Mismatch> {
    if actual.len() != expected.len() {
        return Err(Mismatch::Length {
            actual: actual.to_vec(),
            expected: expected.to_vec(),
        });
    }

    for (index, (line, exp)) in actual.iter().zip(expected).enumerate() {
        let Some(exp) = exp else { continue };
        if line_matches(line, Some(exp), marker) {
            continue;
        }
        // Reported truncated, as compared
        let (actual, expected) = match marker {
            Some(m) => (truncate_at(line, m), truncate_at(exp, m)),
            None => (line.as_str(), exp.as_str()),
        };
        return Err(Mismatch::Content {
            index,
            actual: actual.to_string(),
            expected: expected.to_string(),
        });
    }
    Ok(())
}
