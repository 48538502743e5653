mod list;
mod run;
mod shell;

pub(crate) use list::handle_list;
pub(crate) use run::handle_run;
pub(crate) use shell::handle_shell;

use std::path::PathBuf;

use anyhow::Context;

/// Pick the flag, then the config value, then the default, and make it
/// absolute. Sessions run inside fixture directories, so relative paths would
/// resolve against the wrong directory.
fn resolve_path(
    flag: Option<PathBuf>,
    configured: Option<&PathBuf>,
    default: &str,
) -> anyhow::Result<PathBuf> {
    let path = flag
        .or_else(|| configured.cloned())
        .unwrap_or_else(|| PathBuf::from(default));
    std::path::absolute(&path).with_context(|| format!("Failed to resolve {}", path.display()))
}
