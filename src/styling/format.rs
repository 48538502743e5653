//! Gutter formatting for quoted content.

use super::GUTTER;

/// Format multi-line content with a gutter at column 0.
///
/// Each line gets the gutter, one space, then the content at column 2, which
/// lines up with message symbols (1 column) + space (1 column). Empty input
/// lines are kept so a captured blank echo line stays visible in diagnostics.
///
/// ```
/// use prompt_harness::styling::format_with_gutter;
///
/// print!("{}", format_with_gutter("[master]  #ver >nul"));
/// ```
pub fn format_with_gutter(content: &str) -> String {
    content
        .split('\n')
        .map(|line| format!("{GUTTER} {GUTTER:#} {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render a sequence of optional lines for a diagnostic block.
///
/// `None` entries (no constraint) render as `<any>`; strings are quoted so
/// leading and trailing whitespace is visible.
pub fn format_line_list<S: AsRef<str>>(lines: &[Option<S>]) -> String {
    if lines.is_empty() {
        return "(none)".to_string();
    }
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| match line {
            Some(s) => format!("{i:>2}: {:?}", s.as_ref()),
            None => format!("{i:>2}: <any>"),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
