//! Terminal styling for verdicts, diagnostics and errors.
//!
//! Color detection comes from `anstream`, so output piped into a CI log or a
//! test capture is plain text unless color is forced.
//!
//! Verdicts, diagnostic blocks and the final tally go to stdout in the order
//! scenarios ran, so two runs diff cleanly. Warnings, errors and `env_logger`
//! output go to stderr.

mod constants;
mod format;

// Re-exports from anstream (auto-detecting output)
pub use anstream::{eprintln, println};

pub use constants::*;
pub use format::{format_line_list, format_with_gutter};
