//! Repository fixtures
//!
//! Each scenario runs inside a fresh temporary directory seeded with a
//! repository state. Two kinds of fixture exist:
//!
//! - **Template**: copied from a named entry of the fixture catalog. Catalog
//!   entries keep their metadata directory as `_git` so the catalog itself can
//!   be committed (a real `.git` would be treated as a nested repository, and
//!   the subject program reacts to `.git` wherever it sees one). Provisioning
//!   renames `_git` to `.git` in the copy.
//! - **Fresh**: an empty directory where `git init` is run.
//!
//! ## Missing metadata subdirectories
//!
//! Git does not store empty directories, so a committed template of a
//! repository without commits has no `refs/heads` and no `objects`. Git itself
//! uses `refs/heads` to recognise a repository before the first commit, so
//! both are created when absent.
//!
//! The returned [`Fixture`] is a guard: dropping it removes the directory, on
//! every exit path.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::Context;
use tempfile::TempDir;

use crate::error::HarnessError;
use crate::shell_exec;

/// Name of the metadata directory inside catalog templates.
pub const PLACEHOLDER_METADATA_DIR: &str = "_git";

/// Name of the live metadata directory.
pub const METADATA_DIR: &str = ".git";

/// Subpaths of the metadata directory that must exist in every fixture.
const REQUIRED_METADATA_SUBDIRS: &[&[&str]] = &[&["refs", "heads"], &["objects"]];

/// Directory name used for fresh fixtures.
const FRESH_DIR_NAME: &str = "repo";

/// Which repository state a scenario starts from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixtureSpec {
    /// A freshly initialized, empty repository.
    Fresh,
    /// A named template from the fixture catalog.
    Template(String),
}

impl FixtureSpec {
    pub fn template(name: impl Into<String>) -> Self {
        FixtureSpec::Template(name.into())
    }

    /// Name used for logging and as the fixture's directory name.
    pub fn name(&self) -> &str {
        match self {
            FixtureSpec::Fresh => FRESH_DIR_NAME,
            FixtureSpec::Template(name) => name,
        }
    }
}

impl std::fmt::Display for FixtureSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FixtureSpec::Fresh => write!(f, "(fresh)"),
            FixtureSpec::Template(name) => write!(f, "{name}"),
        }
    }
}

/// A provisioned working directory, removed on drop.
#[derive(Debug)]
pub struct Fixture {
    temp_dir: Option<TempDir>, // None once kept
    root: PathBuf,
    name: String,
    metadata_dir_ready: bool,
}

impl Fixture {
    /// The repository working tree the shell starts in.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metadata_dir_ready(&self) -> bool {
        self.metadata_dir_ready
    }

    /// Keep the directory on disk for post-mortem inspection.
    ///
    /// Returns the temporary directory that contains the working tree.
    pub fn keep(mut self) -> PathBuf {
        let kept = match self.temp_dir.take() {
            Some(dir) => dir.keep(),
            None => self.root.clone(),
        };
        log::warn!("Keeping fixture {} at {}", self.name, kept.display());
        kept
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        if let Some(dir) = self.temp_dir.take() {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                log::warn!("Failed to remove fixture {}: {e}", path.display());
            } else {
                log::debug!("Removed fixture {}", path.display());
            }
        }
    }
}

/// Materializes fixtures from a catalog directory.
#[derive(Debug, Clone)]
pub struct FixtureProvisioner {
    catalog: PathBuf,
}

impl FixtureProvisioner {
    pub fn new(catalog: impl Into<PathBuf>) -> Self {
        Self {
            catalog: catalog.into(),
        }
    }

    /// Names of the templates in the catalog, sorted.
    pub fn templates(&self) -> anyhow::Result<Vec<String>> {
        let entries = fs::read_dir(&self.catalog)
            .with_context(|| format!("Failed to read fixture catalog {}", self.catalog.display()))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if entry.path().join(PLACEHOLDER_METADATA_DIR).is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Create a fixture for `spec` in a new temporary directory.
    pub fn provision(&self, spec: &FixtureSpec) -> anyhow::Result<Fixture> {
        let temp_dir = TempDir::new().map_err(|e| provision_error(spec, e))?;
        let root = temp_dir.path().join(spec.name());

        match spec {
            FixtureSpec::Fresh => init_fresh(&root, spec)?,
            FixtureSpec::Template(name) => self.copy_template(name, &root, spec)?,
        }

        ensure_metadata_subdirs(&root.join(METADATA_DIR)).map_err(|e| provision_error(spec, e))?;

        // cmd.exe cannot start in a `\\?\` verbatim path
        let root = dunce::canonicalize(&root).map_err(|e| provision_error(spec, e))?;
        log::debug!("Provisioned fixture {} at {}", spec, root.display());

        Ok(Fixture {
            temp_dir: Some(temp_dir),
            root,
            name: spec.name().to_string(),
            metadata_dir_ready: true,
        })
    }

    fn copy_template(&self, name: &str, dest: &Path, spec: &FixtureSpec) -> anyhow::Result<()> {
        let template = self.catalog.join(name);
        if !template.is_dir() {
            return Err(HarnessError::FixtureTemplateMissing {
                name: name.to_string(),
                catalog: self.catalog.clone(),
            }
            .into());
        }
        if !template.join(PLACEHOLDER_METADATA_DIR).is_dir() {
            return Err(HarnessError::FixtureProvision {
                fixture: name.to_string(),
                detail: format!(
                    "{} has no {PLACEHOLDER_METADATA_DIR} directory",
                    template.display()
                ),
            }
            .into());
        }

        copy_dir_recursive(&template, dest).map_err(|e| provision_error(spec, e))?;
        fs::rename(
            dest.join(PLACEHOLDER_METADATA_DIR),
            dest.join(METADATA_DIR),
        )
        .map_err(|e| provision_error(spec, e))?;
        Ok(())
    }
}

fn provision_error(spec: &FixtureSpec, e: std::io::Error) -> anyhow::Error {
    HarnessError::FixtureProvision {
        fixture: spec.to_string(),
        detail: e.to_string(),
    }
    .into()
}

fn init_fresh(root: &Path, spec: &FixtureSpec) -> anyhow::Result<()> {
    fs::create_dir(root).map_err(|e| provision_error(spec, e))?;

    let mut cmd = Command::new("git");
    cmd.args(["init", "-q"])
        .current_dir(root)
        .env("GIT_TERMINAL_PROMPT", "0")
        .env("LC_ALL", "C");
    let output = shell_exec::run(&mut cmd, Some(spec.name())).map_err(|e| provision_error(spec, e))?;
    if !output.status.success() {
        return Err(HarnessError::FixtureProvision {
            fixture: spec.to_string(),
            detail: format!(
                "git init failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        }
        .into());
    }
    Ok(())
}

/// Create the metadata subdirectories git relies on but cannot commit.
///
/// Idempotent: existing directories are left alone.
pub fn ensure_metadata_subdirs(metadata_dir: &Path) -> std::io::Result<()> {
    for parts in REQUIRED_METADATA_SUBDIRS {
        let dir = parts.iter().fold(metadata_dir.to_path_buf(), |p, c| p.join(c));
        fs::create_dir_all(&dir)?;
    }
    Ok(())
}

/// Copy a directory tree. Symlinks are skipped.
fn copy_dir_recursive(src: &Path, dest: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dest)?;

    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        if file_type.is_symlink() {
            continue;
        }

        let src_path = entry.path();
        let dest_path = dest.join(entry.file_name());
        if file_type.is_dir() {
            copy_dir_recursive(&src_path, &dest_path)?;
        } else {
            fs::copy(&src_path, &dest_path)?;
        }
    }

    Ok(())
}
