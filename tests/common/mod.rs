//! Shared helpers for integration tests
//!
//! ## Fake cmd
//!
//! The real profiles need Windows. [`fake_cmd_profile`] stands in with a
//! POSIX `sh` script that reproduces what the harness relies on from cmd with
//! echo on:
//!
//! - every script line is echoed as a blank line followed by the rendered
//!   prompt and the line itself
//! - `prompt FORMAT` changes the prompt; it starts as `$PROMPT`
//! - `$M` in the prompt renders the repository prefix, standing in for the
//!   subject program: `[branch]  `, `[(no head)]  ` before the first commit,
//!   `[abcdef0...]  ` when detached, a single space outside a repository
//! - `%COMSPEC% /c CMD` runs `CMD` in a sub-shell, output discarded
//! - `pause` blocks, like cmd waiting for a key
//!
//! ## Catalogs
//!
//! [`Catalog`] builds fixture catalogs in a temp dir. Templates store their
//! metadata directory as `_git`, as the harness expects.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use prompt_harness::config::{HarnessConfig, ProfileConfig};
use prompt_harness::fixture::PLACEHOLDER_METADATA_DIR;
use prompt_harness::shell_exec::{CMD_END_MARKER, CMD_SUBSHELL, ShellProfile};
use tempfile::TempDir;

pub const FAKE_CMD_PROFILE: &str = "fake-cmd";

const FAKE_CMD: &str = r##"#!/bin/sh
format=$PROMPT
marker='$M'
invoker='%COMSPEC% /c '

repo_prefix() {
    if [ ! -f .git/HEAD ]; then
        printf ' '
        return
    fi
    head=$(cat .git/HEAD)
    case $head in
        'ref: refs/heads/'*)
            branch=${head#ref: refs/heads/}
            if [ -f ".git/refs/heads/$branch" ]; then
                printf '[%s]  ' "$branch"
            else
                printf '[(no head)]  '
            fi
            ;;
        *)
            printf '[%s...]  ' "$(printf '%s' "$head" | cut -c1-7)"
            ;;
    esac
}

render_prompt() {
    case $format in
        *'$M'*)
            before=${format%%"$marker"*}
            after=${format#*"$marker"}
            printf '%s' "$before"
            repo_prefix
            printf '%s' "$after"
            ;;
        *)
            printf '%s' "$format"
            ;;
    esac
}

while IFS= read -r line || [ -n "$line" ]; do
    printf '\n'
    render_prompt
    printf '%s\n' "$line"
    case $line in
        'prompt '*) format=${line#prompt } ;;
        'cd '*) cd "${line#cd }" 2>/dev/null || : ;;
        "$invoker"*)
            command=${line#"$invoker"}
            sh -c "$command" >/dev/null 2>&1 || :
            ;;
        pause) sleep 30 ;;
        *) : ;;
    esac
done < "$1"
"##;

/// Write the fake cmd script into `dir` and return a profile that runs it.
pub fn fake_cmd_profile(dir: &Path) -> ShellProfile {
    ShellProfile {
        name: FAKE_CMD_PROFILE.to_string(),
        executable: PathBuf::from("sh"),
        args: vec![write_fake_cmd(dir).display().to_string()],
        prompt_var: "PROMPT".to_string(),
        subshell: CMD_SUBSHELL.to_string(),
        end_marker: CMD_END_MARKER.to_string(),
        script_extension: "bat".to_string(),
    }
}

fn write_fake_cmd(dir: &Path) -> PathBuf {
    let path = dir.join("fake-cmd.sh");
    fs::write(&path, FAKE_CMD).unwrap();
    path
}

/// A fixture catalog in a temporary directory.
pub struct Catalog {
    dir: TempDir,
}

impl Catalog {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    /// Catalog with the templates the battery names, without real history.
    ///
    /// Enough for the fake cmd to render the initial prefixes; commands that
    /// need git objects (checkout, rebase) have no effect.
    pub fn battery() -> Self {
        let catalog = Self::new();
        catalog.add_template("empty", "ref: refs/heads/master", &[]);
        catalog.add_template(
            "single_commit",
            "ref: refs/heads/master",
            &[("master", "1111111111111111111111111111111111111111")],
        );
        catalog.add_template(
            "four_linear_commits",
            "ref: refs/heads/master",
            &[("master", "4444444444444444444444444444444444444444")],
        );
        catalog.add_template(
            "conflict_rebase",
            "ref: refs/heads/child",
            &[
                ("master", "2222222222222222222222222222222222222222"),
                ("child", "3333333333333333333333333333333333333333"),
            ],
        );
        catalog
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Add a template whose `_git/HEAD` is `head` and with the given branches.
    pub fn add_template(&self, name: &str, head: &str, branches: &[(&str, &str)]) {
        let git = self.path().join(name).join(PLACEHOLDER_METADATA_DIR);
        fs::create_dir_all(&git).unwrap();
        fs::write(git.join("HEAD"), format!("{head}\n")).unwrap();
        if !branches.is_empty() {
            let heads = git.join("refs").join("heads");
            fs::create_dir_all(&heads).unwrap();
            for (branch, hash) in branches {
                fs::write(heads.join(branch), format!("{hash}\n")).unwrap();
            }
        }
        fs::write(self.path().join(name).join("file.txt"), "fixture\n").unwrap();
    }

    /// Add a template with `commits` real commits on `master`, built with git.
    ///
    /// Returns the full hashes, oldest first.
    pub fn add_git_template(&self, name: &str, commits: usize) -> Vec<String> {
        let root = self.path().join(name);
        fs::create_dir_all(&root).unwrap();
        git(&root, &["init", "-q", "-b", "master"]);
        let mut hashes = Vec::new();
        for i in 0..commits {
            fs::write(root.join("file.txt"), format!("{i}\n")).unwrap();
            git(&root, &["add", "file.txt"]);
            git(&root, &["commit", "-q", "-m", &format!("commit {i}")]);
            hashes.push(git(&root, &["rev-parse", "HEAD"]));
        }
        fs::rename(root.join(".git"), root.join(PLACEHOLDER_METADATA_DIR)).unwrap();
        hashes
    }
}

/// Run git in `dir` with a fixed identity and no user or system config.
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_CONFIG_GLOBAL", "/dev/null")
        .env("GIT_CONFIG_SYSTEM", "/dev/null")
        .env("GIT_AUTHOR_NAME", "Test")
        .env("GIT_AUTHOR_EMAIL", "test@example.com")
        .env("GIT_AUTHOR_DATE", "2025-01-01T00:00:00Z")
        .env("GIT_COMMITTER_NAME", "Test")
        .env("GIT_COMMITTER_EMAIL", "test@example.com")
        .env("GIT_COMMITTER_DATE", "2025-01-01T00:00:00Z")
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {} failed: {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Everything a CLI run needs: catalog, fake cmd, subject and config file.
pub struct TestEnv {
    pub dir: TempDir,
    pub catalog: Catalog,
}

impl TestEnv {
    pub fn new() -> Self {
        let env = Self {
            dir: TempDir::new().unwrap(),
            catalog: Catalog::battery(),
        };
        fs::write(env.subject(), "").unwrap();
        env.write_config(&HarnessConfig::default(), "");
        env
    }

    pub fn subject(&self) -> PathBuf {
        self.dir.path().join("subject.exe")
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("config.toml")
    }

    /// Write a config that selects the fake cmd, merged over `base`, followed
    /// by `extra` raw TOML.
    pub fn write_config(&self, base: &HarnessConfig, extra: &str) {
        let fake = fake_cmd_profile(self.dir.path());
        let mut config = base.clone();
        config.subject = Some(self.subject());
        config.fixtures = Some(self.catalog.path().to_path_buf());
        config.shells = vec![FAKE_CMD_PROFILE.to_string()];
        config.profiles.insert(
            FAKE_CMD_PROFILE.to_string(),
            ProfileConfig {
                executable: Some(fake.executable),
                args: Some(fake.args),
                ..ProfileConfig::default()
            },
        );
        let toml = toml::to_string(&config).unwrap();
        fs::write(self.config_path(), format!("{extra}\n{toml}")).unwrap();
    }

    /// A `prompt-harness` command isolated from the host config.
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(insta_cmd::get_cargo_bin("prompt-harness"));
        cmd.current_dir(self.dir.path())
            .env("PROMPT_HARNESS_CONFIG_PATH", self.config_path())
            .env_remove("RUST_LOG")
            .env_remove("CLICOLOR_FORCE")
            .env("NO_COLOR", "1");
        cmd
    }
}
