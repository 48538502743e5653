use std::path::PathBuf;

use clap::builder::styling::{AnsiColor, Color, Styles};
use clap::{Args, Parser, Subcommand};
use prompt_harness::report::OutputFormat;

/// Help output colors, matching the status symbols
fn help_styles() -> Styles {
    Styles::styled()
        .header(
            anstyle::Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Green))),
        )
        .usage(
            anstyle::Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Green))),
        )
        .literal(
            anstyle::Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Cyan))),
        )
        .placeholder(anstyle::Style::new().fg_color(Some(Color::Ansi(AnsiColor::Cyan))))
        .error(
            anstyle::Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Red))),
        )
}

#[derive(Parser, Debug)]
#[command(name = "prompt-harness")]
#[command(about = "Run prompt scenarios against a console prompt extension", long_about = None)]
#[command(version, styles = help_styles())]
pub(crate) struct Cli {
    /// Show progress (-v) or every spawned process (-vv)
    #[arg(
        long,
        short = 'v',
        global = true,
        action = clap::ArgAction::Count,
        help_heading = "Global Options"
    )]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Run the scenario battery
    ///
    /// Each scenario runs in its own fixture directory and shell process.
    /// Exits 1 when any scenario fails.
    Run(RunArgs),

    /// List the scenarios in the battery
    List,

    /// Open a shell in a fixture with the subject installed
    ///
    /// The fixture is removed when the shell exits.
    Shell(ShellArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct RunArgs {
    /// Subject program to install in each shell
    #[arg(long, value_name = "path")]
    pub subject: Option<PathBuf>,

    /// Fixture catalog directory
    #[arg(long, value_name = "dir")]
    pub fixtures: Option<PathBuf>,

    /// Shell profile to run against (repeatable)
    #[arg(long = "shell", value_name = "name")]
    pub shells: Vec<String>,

    /// Seconds before a session is killed
    #[arg(long, value_name = "secs", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Keep the fixture and script of failed scenarios
    #[arg(long, overrides_with = "no_keep_failed")]
    pub keep_failed: bool,

    /// Remove failed fixtures even if the config keeps them
    #[arg(long = "no-keep-failed", overrides_with = "keep_failed")]
    pub no_keep_failed: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

impl RunArgs {
    /// `--keep-failed` / `--no-keep-failed`, whichever came last.
    pub fn keep_failed_flag(&self) -> Option<bool> {
        match (self.keep_failed, self.no_keep_failed) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

#[derive(Args, Debug, Default)]
pub(crate) struct ShellArgs {
    /// Catalog template to start from; a fresh repository when omitted
    #[arg(long, value_name = "name")]
    pub fixture: Option<String>,

    /// Subject program to install
    #[arg(long, value_name = "path")]
    pub subject: Option<PathBuf>,

    /// Fixture catalog directory
    #[arg(long, value_name = "dir")]
    pub fixtures: Option<PathBuf>,

    /// Shell profile to open
    #[arg(long, value_name = "name")]
    pub shell: Option<String>,
}
