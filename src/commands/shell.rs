use anyhow::Context;
use color_print::cformat;
use prompt_harness::config::{DEFAULT_FIXTURES, DEFAULT_SHELL, DEFAULT_SUBJECT, HarnessConfig};
use prompt_harness::fixture::{FixtureProvisioner, FixtureSpec};
use prompt_harness::shell_exec;
use prompt_harness::styling::{eprintln, hint_message, info_message};

use super::resolve_path;
use crate::cli::ShellArgs;

/// Open an interactive shell in a throwaway fixture.
pub(crate) fn handle_shell(args: ShellArgs, config: &HarnessConfig) -> anyhow::Result<()> {
    let subject = resolve_path(args.subject, config.subject.as_ref(), DEFAULT_SUBJECT)?;
    let fixtures = resolve_path(args.fixtures, config.fixtures.as_ref(), DEFAULT_FIXTURES)?;
    let shell = args
        .shell
        .or_else(|| config.shells.first().cloned())
        .unwrap_or_else(|| DEFAULT_SHELL.to_string());
    let profile = config.profile(&shell)?;

    let spec = match args.fixture {
        Some(name) => FixtureSpec::Template(name),
        None => FixtureSpec::Fresh,
    };
    let provisioner = FixtureProvisioner::new(&fixtures);
    let fixture = match provisioner.provision(&spec) {
        Ok(fixture) => fixture,
        Err(e) => {
            if let Ok(templates) = provisioner.templates()
                && !templates.is_empty()
            {
                eprintln!(
                    "{}",
                    hint_message(format!("Available templates: {}", templates.join(", ")))
                );
            }
            return Err(e);
        }
    };

    eprintln!(
        "{}",
        info_message(cformat!(
            "Fixture <bold>{spec}</> at {}",
            fixture.root().display()
        ))
    );
    eprintln!(
        "{}",
        hint_message("The fixture is removed when the shell exits")
    );

    let mut cmd = profile.interactive_command(&subject);
    cmd.current_dir(fixture.root());
    let status = shell_exec::spawn(&mut cmd, Some(fixture.name()))
        .with_context(|| format!("Failed to start shell {}", profile.name))?
        .wait()
        .context("Failed to wait for shell")?;
    log::debug!("Interactive shell exited with {status}");

    Ok(())
}
