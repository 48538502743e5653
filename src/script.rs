//! Script rendering
//!
//! A session is driven by a script file the shell executes line by line:
//!
//! ```text
//! C:\harness\out\subject.exe          <- installs the subject into the shell
//! prompt $M#
//! %COMSPEC% /c git checkout HEAD~2 >nul 2>nul
//! ver >nul                            <- end marker, produces no output
//! ```
//!
//! `git` commands run through the profile's sub-shell invoker: the harness may
//! itself be started from a wrapper that installs `git` as a shell function or
//! batch shim, and the commands under test must reach the real binary.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tempfile::NamedTempFile;

use crate::shell_exec::ShellProfile;

const VCS_COMMAND_PREFIX: &str = "git ";

/// Render the script lines for a session.
pub fn render_lines(subject: &Path, commands: &[String], profile: &ShellProfile) -> Vec<String> {
    let mut lines = Vec::with_capacity(commands.len() + 2);
    lines.push(subject.display().to_string());
    lines.extend(
        commands
            .iter()
            .map(|command| wrap_vcs_command(command, &profile.subshell)),
    );
    lines.push(profile.end_marker.clone());
    lines
}

/// Rewrite a `git` command so it runs in a sub-shell.
///
/// Other commands are returned unchanged.
pub fn wrap_vcs_command(command: &str, subshell: &str) -> String {
    if command.starts_with(VCS_COMMAND_PREFIX) && !subshell.is_empty() {
        format!("{subshell} {command}")
    } else {
        command.to_string()
    }
}

/// A rendered script on disk, deleted on drop.
#[derive(Debug)]
pub struct Script {
    file: NamedTempFile,
    lines: Vec<String>,
}

impl Script {
    /// Render `commands` and write them to a uniquely named file.
    ///
    /// The file carries the profile's extension (`.bat` for cmd) because cmd
    /// decides how to run a file from its extension.
    pub fn write(subject: &Path, commands: &[String], profile: &ShellProfile) -> anyhow::Result<Self> {
        let lines = render_lines(subject, commands, profile);
        let suffix = format!(".{}", profile.script_extension);
        let mut file = tempfile::Builder::new()
            .prefix("prompt-harness-")
            .suffix(&suffix)
            .tempfile()
            .context("Failed to create session script")?;

        for line in &lines {
            writeln!(file, "{line}").context("Failed to write session script")?;
        }
        file.flush().context("Failed to write session script")?;
        log::debug!(
            "Wrote {} script lines to {}",
            lines.len(),
            file.path().display()
        );

        Ok(Self { file, lines })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Persist the script next to a kept fixture.
    pub fn keep_in(self, dir: &Path) -> anyhow::Result<PathBuf> {
        let name = self
            .file
            .path()
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("session-script"));
        let dest = dir.join(name);
        self.file
            .persist(&dest)
            .with_context(|| format!("Failed to keep script at {}", dest.display()))?;
        Ok(dest)
    }
}
