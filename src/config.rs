//! Harness configuration
//!
//! An optional TOML file supplies defaults for the `run` and `shell`
//! subcommands and defines additional shell profiles. Command-line flags take
//! precedence over anything set here.
//!
//! ```toml
//! subject = "out/cmdEx.exe"
//! fixtures = "test_repos"
//! timeout-secs = 30
//! keep-failed-fixtures = false
//! shells = ["cmd-x86", "cmd"]
//!
//! [profiles.pwsh-cmd]
//! executable = "C:/tools/cmd.exe"
//! ```
//!
//! A `[profiles.<name>]` table whose name matches a built-in profile overrides
//! individual fields of that profile; any other name defines a new profile and
//! must set `executable`.
//!
//! ## Location
//!
//! `$PROMPT_HARNESS_CONFIG_PATH`, else `prompt-harness/config.toml` under the
//! platform config directory. A missing file is the same as an empty one.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use etcetera::base_strategy::{BaseStrategy, choose_base_strategy};
use serde::{Deserialize, Serialize};

use crate::error::HarnessError;
use crate::shell_exec::ShellProfile;

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "PROMPT_HARNESS_CONFIG_PATH";

/// Subject program path when neither flag nor config sets one.
pub const DEFAULT_SUBJECT: &str = "out/cmdEx.exe";

/// Fixture catalog when neither flag nor config sets one.
pub const DEFAULT_FIXTURES: &str = "test_repos";

/// Profile used when neither flag nor config names one.
pub const DEFAULT_SHELL: &str = "cmd-x86";

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HarnessConfig {
    /// Path to the subject program
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<PathBuf>,

    /// Fixture catalog directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixtures: Option<PathBuf>,

    /// Seconds before a session is killed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Keep the directory of failed scenarios
    #[serde(default)]
    pub keep_failed_fixtures: bool,

    /// Profiles to run the battery against, in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shells: Vec<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub profiles: BTreeMap<String, ProfileConfig>,

    /// Captures unknown fields for validation warnings
    #[serde(flatten, default, skip_serializing)]
    unknown: HashMap<String, toml::Value>,
}

/// A `[profiles.<name>]` table. Unset fields fall back to the built-in
/// profile of the same name, or to the cmd defaults.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProfileConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executable: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_var: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subshell: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_marker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_extension: Option<String>,
}

impl ProfileConfig {
    /// Build the profile called `name`, layering these fields over `base`.
    fn apply(&self, name: &str, base: ShellProfile) -> ShellProfile {
        let ProfileConfig {
            executable,
            args,
            prompt_var,
            subshell,
            end_marker,
            script_extension,
        } = self.clone();
        ShellProfile {
            name: name.to_string(),
            executable: executable.unwrap_or(base.executable),
            args: args.unwrap_or(base.args),
            prompt_var: prompt_var.unwrap_or(base.prompt_var),
            subshell: subshell.unwrap_or(base.subshell),
            end_marker: end_marker.unwrap_or(base.end_marker),
            script_extension: script_extension.unwrap_or(base.script_extension),
        }
    }
}

impl HarnessConfig {
    /// Load from the default location. A missing file yields the defaults.
    pub fn load() -> anyhow::Result<Self> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            log::debug!("No config at {}", path.display());
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(contents: &str) -> anyhow::Result<Self> {
        let config: HarnessConfig = toml::from_str(contents).context("Failed to parse TOML")?;
        if config.timeout_secs == Some(0) {
            anyhow::bail!("timeout-secs must be at least 1");
        }
        Ok(config)
    }

    /// Top-level keys that are not recognized and will be ignored, sorted.
    pub fn unknown_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.unknown.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Every profile name that can be passed to `--shell`, sorted.
    pub fn profile_names(&self) -> Vec<String> {
        let mut names: Vec<String> = ShellProfile::builtins()
            .into_iter()
            .map(|p| p.name)
            .chain(self.profiles.keys().cloned())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Look up a profile by name: config tables layered over built-ins.
    pub fn profile(&self, name: &str) -> Result<ShellProfile, HarnessError> {
        let builtin = ShellProfile::builtin(name);
        match (self.profiles.get(name), builtin) {
            (Some(table), Some(base)) => Ok(table.apply(name, base)),
            (None, Some(base)) => Ok(base),
            (Some(table), None) if table.executable.is_some() => {
                Ok(table.apply(name, ShellProfile::cmd()))
            }
            _ => Err(HarnessError::UnknownProfile {
                name: name.to_string(),
                available: self.profile_names(),
            }),
        }
    }

    /// Resolve the profiles to run: `requested` if non-empty, else the
    /// configured `shells`, else [`DEFAULT_SHELL`].
    pub fn resolve_profiles(&self, requested: &[String]) -> Result<Vec<ShellProfile>, HarnessError> {
        let names: Vec<&str> = if !requested.is_empty() {
            requested.iter().map(String::as_str).collect()
        } else if !self.shells.is_empty() {
            self.shells.iter().map(String::as_str).collect()
        } else {
            vec![DEFAULT_SHELL]
        };
        names.into_iter().map(|name| self.profile(name)).collect()
    }
}

/// Location of the config file, if one can be determined.
pub fn config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        return Some(PathBuf::from(path));
    }
    // XDG on Linux and macOS, %APPDATA% on Windows
    let strategy = choose_base_strategy().ok()?;
    Some(strategy.config_dir().join("prompt-harness").join("config.toml"))
}
