//! Shell profiles and process execution
//!
//! A [`ShellProfile`] describes everything the harness needs to know about the
//! shell that hosts the subject program:
//! - which executable to start and with which arguments before the script path
//! - which environment variable holds the prompt format (forced to the sentinel)
//! - how to escape one layer of shell wrapping for `git` commands
//! - which no-output command ends a script
//!
//! ## Built-in profiles
//!
//! - `cmd`: 64-bit `cmd.exe` from `System32`
//! - `cmd-x86`: 32-bit `cmd.exe` from `SysWOW64`
//!
//! Both run the script as a batch file with echo on, so every script line is
//! echoed after the rendered prompt. Further profiles (including test doubles)
//! come from the `[profiles]` table of the config file.

use std::path::{Path, PathBuf};
use std::process::{Child, Command};

/// Sub-shell invoker used by the cmd profiles.
pub const CMD_SUBSHELL: &str = "%COMSPEC% /c";

/// End-of-script marker used by the cmd profiles.
pub const CMD_END_MARKER: &str = "ver >nul";

/// Shell profile for session execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellProfile {
    /// Name used on the command line (`--shell cmd-x86`)
    pub name: String,
    /// Path to the shell executable
    pub executable: PathBuf,
    /// Arguments placed before the script path (e.g. `["/c"]` for cmd)
    pub args: Vec<String>,
    /// Environment variable holding the prompt format
    pub prompt_var: String,
    /// Prefix that runs a command in a fresh sub-shell
    pub subshell: String,
    /// Command that produces no output, appended to every script
    pub end_marker: String,
    /// Extension of the generated script file, without the dot
    pub script_extension: String,
}

impl ShellProfile {
    /// The 64-bit `cmd.exe` profile.
    pub fn cmd() -> Self {
        Self::cmd_at("cmd", r"C:\Windows\System32\cmd.exe")
    }

    /// The 32-bit `cmd.exe` profile (WOW64 on a 64-bit Windows).
    pub fn cmd_x86() -> Self {
        Self::cmd_at("cmd-x86", r"C:\Windows\SysWOW64\cmd.exe")
    }

    fn cmd_at(name: &str, executable: &str) -> Self {
        Self {
            name: name.to_string(),
            executable: PathBuf::from(executable),
            args: vec!["/c".to_string()],
            prompt_var: "PROMPT".to_string(),
            subshell: CMD_SUBSHELL.to_string(),
            end_marker: CMD_END_MARKER.to_string(),
            script_extension: "bat".to_string(),
        }
    }

    /// All built-in profiles, in the order they are listed.
    pub fn builtins() -> Vec<ShellProfile> {
        vec![Self::cmd(), Self::cmd_x86()]
    }

    /// Look up a built-in profile by name.
    pub fn builtin(name: &str) -> Option<ShellProfile> {
        Self::builtins().into_iter().find(|p| p.name == name)
    }

    /// Resolve the executable against `PATH` when it is a bare name.
    ///
    /// Absolute or relative paths are returned unchanged; cmd.exe paths are
    /// absolute so this only matters for custom profiles.
    pub fn resolved_executable(&self) -> PathBuf {
        if self.executable.components().count() > 1 {
            return self.executable.clone();
        }
        which::which(&self.executable).unwrap_or_else(|_| self.executable.clone())
    }

    /// Create a Command that runs `script` in this shell.
    ///
    /// The prompt variable is set to `sentinel`; the caller still sets the
    /// working directory and stdio.
    pub fn command(&self, script: &Path, sentinel: &str) -> Command {
        let mut cmd = Command::new(self.resolved_executable());
        cmd.args(&self.args);
        cmd.arg(script);
        cmd.env(&self.prompt_var, sentinel);
        cmd
    }

    /// Create a Command that installs `subject` and leaves the shell open.
    ///
    /// cmd's run-and-exit switch `/c` becomes `/k`. No sentinel is forced, so
    /// the user's own prompt format applies.
    pub fn interactive_command(&self, subject: &Path) -> Command {
        let mut cmd = Command::new(self.resolved_executable());
        cmd.args(self.args.iter().map(|arg| {
            if arg.eq_ignore_ascii_case("/c") {
                "/k"
            } else {
                arg.as_str()
            }
        }));
        cmd.arg(subject);
        cmd
    }
}

/// Render a Command as a single string for logging, quoting arguments that
/// need it.
fn command_string(cmd: &Command) -> String {
    std::iter::once(cmd.get_program())
        .chain(cmd.get_args())
        .map(|part| shell_escape::escape(part.to_string_lossy()).into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Execute a command to completion with timing and debug logging.
///
/// External commands that run to completion without a terminal
/// (`git init` for fresh fixtures) go through this function so logging stays
/// consistent. Shells go through [`spawn`].
///
/// ```text
/// $ git init -q [empty]
/// [ph-trace] context=empty cmd="git init -q" dur=12.3ms ok=true
/// ```
///
/// The `context` parameter is typically the fixture or scenario name.
pub fn run(cmd: &mut Command, context: Option<&str>) -> std::io::Result<std::process::Output> {
    use std::time::Instant;

    let cmd_str = command_string(cmd);
    match context {
        Some(ctx) => log::debug!("$ {} [{}]", cmd_str, ctx),
        None => log::debug!("$ {}", cmd_str),
    }

    let t0 = Instant::now();
    let result = cmd.output();
    let duration_ms = t0.elapsed().as_secs_f64() * 1000.0;

    let ctx = context.map(|c| format!("context={c} ")).unwrap_or_default();
    match &result {
        Ok(output) => log::debug!(
            "[ph-trace] {}cmd=\"{}\" dur={:.1}ms ok={}",
            ctx,
            cmd_str,
            duration_ms,
            output.status.success()
        ),
        Err(e) => log::debug!(
            "[ph-trace] {}cmd=\"{}\" dur={:.1}ms err=\"{}\"",
            ctx,
            cmd_str,
            duration_ms,
            e
        ),
    }

    result
}

/// Spawn a long-running command with debug logging.
///
/// The caller owns waiting for the returned child: the session driver waits
/// with a timeout, the `shell` subcommand waits for the user to exit.
pub fn spawn(cmd: &mut Command, context: Option<&str>) -> std::io::Result<Child> {
    let cmd_str = command_string(cmd);
    match context {
        Some(ctx) => log::debug!("$ {} [{}] (spawn)", cmd_str, ctx),
        None => log::debug!("$ {} (spawn)", cmd_str),
    }
    let result = cmd.spawn();
    match &result {
        Ok(child) => log::debug!("[ph-trace] cmd=\"{}\" pid={}", cmd_str, child.id()),
        Err(e) => log::debug!("[ph-trace] cmd=\"{}\" err=\"{}\"", cmd_str, e),
    }
    result
}
