//! Symbols and message helpers for harness output.
//!
//! Every user-facing line goes through one of the `*_message` helpers so a
//! verdict reads the same in live output, `list`, and error reports:
//!
//! ```
//! use color_print::cformat;
//! use prompt_harness::styling::success_message;
//!
//! let name = "single commit on master";
//! println!("{}", success_message(cformat!("ok - <bold>{name}</>")));
//! ```
//!
//! Colors: failures red, skipped scenarios yellow, hints dim, the shell
//! profile being run cyan, passes green.

use std::fmt;

use anstyle::{AnsiColor, Color, Style};
use color_print::{cformat, cstr};

/// Gutter style for quoted content (captured lines, commands, expectations)
pub const GUTTER: Style = Style::new().bg_color(Some(Color::Ansi(AnsiColor::BrightWhite)));

/// A scenario passed
pub const PASS_SYMBOL: &str = cstr!("<green>✓</>");
/// A scenario failed, or the harness itself hit an error
pub const FAIL_SYMBOL: &str = cstr!("<red>✗</>");
/// A scenario was skipped, or a config problem was ignored
pub const SKIP_SYMBOL: &str = cstr!("<yellow>▲</>");
pub const PROGRESS_SYMBOL: &str = cstr!("<cyan>◎</>");
pub const HINT_SYMBOL: &str = cstr!("<dim>↳</>");
pub const INFO_SYMBOL: &str = cstr!("<dim>○</>");

/// A line that already carries its symbol and color.
///
/// The helpers accept `impl AsRef<str>` and this type does not implement it,
/// so a message cannot be wrapped twice:
///
/// ```compile_fail
/// use prompt_harness::styling::error_message;
///
/// let twice = error_message(error_message("Shell did not exit"));
/// ```
#[derive(Debug, Clone)]
pub struct FormattedMessage(String);

impl FormattedMessage {
    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FormattedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `FAILED` verdicts and harness errors
pub fn error_message(content: impl AsRef<str>) -> FormattedMessage {
    FormattedMessage(cformat!("{FAIL_SYMBOL} <red>{}</>", content.as_ref()))
}

/// Labels inside diagnostic blocks, and follow-up suggestions
pub fn hint_message(content: impl AsRef<str>) -> FormattedMessage {
    FormattedMessage(cformat!("{HINT_SYMBOL} <dim>{}</>", content.as_ref()))
}

/// Skipped scenarios and ignored config keys
pub fn warning_message(content: impl AsRef<str>) -> FormattedMessage {
    FormattedMessage(cformat!("{SKIP_SYMBOL} <yellow>{}</>", content.as_ref()))
}

pub fn success_message(content: impl AsRef<str>) -> FormattedMessage {
    FormattedMessage(cformat!("{PASS_SYMBOL} <green>{}</>", content.as_ref()))
}

/// The shell profile a battery is running under
pub fn progress_message(content: impl AsRef<str>) -> FormattedMessage {
    FormattedMessage(cformat!("{PROGRESS_SYMBOL} <cyan>{}</>", content.as_ref()))
}

/// Neutral status: the symbol is styled, the text is not.
pub fn info_message(content: impl AsRef<str>) -> FormattedMessage {
    FormattedMessage(format!("{INFO_SYMBOL} {}", content.as_ref()))
}
