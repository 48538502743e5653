//! Scenarios and the scenario runner
//!
//! A scenario names a fixture, the commands to type after the subject is
//! installed, and one expected line per command. The runner takes each one
//! through the whole pipeline:
//!
//! ```text
//! provision fixture -> write script -> drive shell -> demultiplex -> match -> record
//! ```
//!
//! Any error on the way becomes a failed [`Verdict`]; the next scenario still
//! runs. The fixture and the script are guards, so they are removed however
//! the scenario ends, unless failed fixtures are kept for inspection.

use std::path::PathBuf;
use std::time::Duration;

use color_print::cformat;
use serde::Serialize;

use crate::aggregate::Aggregator;
use crate::demux::demultiplex;
use crate::error::HarnessError;
use crate::fixture::{FixtureProvisioner, FixtureSpec};
use crate::matcher::{Mismatch, match_responses};
use crate::script::Script;
use crate::session::{InterruptHook, SessionDriver, SessionHook};
use crate::styling::{
    error_message, format_line_list, format_with_gutter, hint_message, println, success_message,
    warning_message,
};

/// Whether the runner can execute a scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Support {
    Supported,
    /// Listed for completeness, never started.
    Unsupported(String),
}

/// One hand-authored interaction with the subject program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    pub name: String,
    pub fixture: FixtureSpec,
    pub commands: Vec<String>,
    /// One entry per command; `None` accepts any response.
    pub expected: Vec<Option<String>>,
    /// Interrupt the shell this long after it starts.
    pub interrupt_after: Option<Duration>,
    pub support: Support,
}

impl Scenario {
    pub fn new(
        name: impl Into<String>,
        fixture: FixtureSpec,
        commands: &[&str],
        expected: &[Option<&str>],
    ) -> Self {
        Self {
            name: name.into(),
            fixture,
            commands: commands.iter().map(|c| c.to_string()).collect(),
            expected: expected.iter().map(|e| e.map(str::to_string)).collect(),
            interrupt_after: None,
            support: Support::Supported,
        }
    }

    #[must_use]
    pub fn interrupt_after(mut self, delay: Duration) -> Self {
        self.interrupt_after = Some(delay);
        self
    }

    #[must_use]
    pub fn unsupported(mut self, reason: impl Into<String>) -> Self {
        self.support = Support::Unsupported(reason.into());
        self
    }
}

/// Why a scenario failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Failure {
    /// The fixture could not be created.
    Provision { message: String },
    /// The session never reached a comparable state (spawn failure, timeout,
    /// missing sentinel, unpaired output). `captured` holds the raw lines.
    Setup {
        message: String,
        captured: Vec<String>,
    },
    /// Responses were recovered but did not match `commands`' expectations.
    Mismatch {
        mismatch: Mismatch,
        commands: Vec<String>,
    },
}

impl Failure {
    fn provision(err: &anyhow::Error) -> Self {
        Failure::Provision {
            message: plain(err),
        }
    }

    fn setup(err: &anyhow::Error, captured: Vec<String>) -> Self {
        Failure::Setup {
            message: plain(err),
            captured,
        }
    }

    /// One-line summary, shown after `FAILED <name> ->`.
    pub fn summary(&self) -> String {
        match self {
            Failure::Provision { message } | Failure::Setup { message, .. } => message
                .lines()
                .next()
                .unwrap_or_default()
                .trim_start_matches(['✗', ' '])
                .to_string(),
            Failure::Mismatch {
                mismatch: Mismatch::Length { .. },
                ..
            } => "length of output and expected don't match".to_string(),
            Failure::Mismatch {
                mismatch:
                    Mismatch::Content {
                        actual, expected, ..
                    },
                ..
            } => format!("got '{actual}' vs expected '{expected}'"),
        }
    }
}

/// Strip styling from an error chain for storage in a verdict.
fn plain(err: &anyhow::Error) -> String {
    anstream::adapter::strip_str(&format!("{err:#}")).to_string()
}

/// Outcome of one scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub scenario: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<Failure>,
}

impl Verdict {
    pub fn pass(scenario: &str) -> Self {
        Self {
            scenario: scenario.to_string(),
            passed: true,
            failure: None,
        }
    }

    pub fn fail(scenario: &str, failure: Failure) -> Self {
        Self {
            scenario: scenario.to_string(),
            passed: false,
            failure: Some(failure),
        }
    }
}

/// Render the diagnostic block printed when a scenario fails.
pub fn format_failure(scenario: &Scenario, failure: &Failure) -> String {
    let name = &scenario.name;
    let mut out = vec![error_message(cformat!("FAILED <bold>{name}</> -> {}", failure.summary())).into_inner()];

    out.push(hint_message("commands:").into_inner());
    out.push(format_with_gutter(&scenario.commands.join("\n")));

    match failure {
        Failure::Provision { message } => {
            out.push(hint_message("error:").into_inner());
            out.push(format_with_gutter(message));
        }
        Failure::Setup { message, captured } => {
            out.push(hint_message("error:").into_inner());
            out.push(format_with_gutter(message));
            out.push(hint_message("captured:").into_inner());
            let captured: Vec<Option<&String>> = captured.iter().map(Some).collect();
            out.push(format_with_gutter(&format_line_list(&captured)));
        }
        Failure::Mismatch { mismatch, .. } => {
            out.push(hint_message("expect:").into_inner());
            out.push(format_with_gutter(&format_line_list(&scenario.expected)));
            if let Mismatch::Length { actual, .. } = mismatch {
                out.push(hint_message("outlines:").into_inner());
                let actual: Vec<Option<&String>> = actual.iter().map(Some).collect();
                out.push(format_with_gutter(&format_line_list(&actual)));
            }
        }
    }
    out.join("\n")
}

/// Runs scenarios against one shell profile.
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    provisioner: FixtureProvisioner,
    driver: SessionDriver,
    subject: PathBuf,
    keep_failed: bool,
    live_output: bool,
}

impl ScenarioRunner {
    pub fn new(provisioner: FixtureProvisioner, driver: SessionDriver, subject: impl Into<PathBuf>) -> Self {
        Self {
            provisioner,
            driver,
            subject: subject.into(),
            keep_failed: false,
            live_output: true,
        }
    }

    /// Keep the fixture and script of failed scenarios on disk.
    #[must_use]
    pub fn keep_failed(mut self, keep: bool) -> Self {
        self.keep_failed = keep;
        self
    }

    /// Print each verdict to stdout as soon as it is known.
    #[must_use]
    pub fn live_output(mut self, live: bool) -> Self {
        self.live_output = live;
        self
    }

    /// Run every scenario in order.
    pub fn run_all(&self, scenarios: &[Scenario], aggregator: &mut Aggregator) {
        for scenario in scenarios {
            self.run(scenario, aggregator);
        }
    }

    /// Run one scenario and record its verdict.
    ///
    /// Returns `None` for unsupported scenarios, which are recorded as skipped.
    pub fn run(&self, scenario: &Scenario, aggregator: &mut Aggregator) -> Option<Verdict> {
        if let Support::Unsupported(reason) = &scenario.support {
            aggregator.skip(&scenario.name, reason);
            if self.live_output {
                println!(
                    "{}",
                    warning_message(format!("skipped - {} ({reason})", scenario.name))
                );
            }
            return None;
        }

        let ticket = aggregator.start(&scenario.name);
        log::info!(
            "Running {} on {} [{}]",
            scenario.name,
            scenario.fixture,
            self.driver.profile().name
        );

        let verdict = match self.execute(scenario) {
            Ok(()) => Verdict::pass(&scenario.name),
            Err(failure) => Verdict::fail(&scenario.name, failure),
        };

        if self.live_output {
            match &verdict.failure {
                None => println!("{}", success_message(format!("ok - {}", scenario.name))),
                Some(failure) => println!("{}\n", format_failure(scenario, failure)),
            }
        }

        aggregator.finish(ticket, verdict.clone());
        Some(verdict)
    }

    fn execute(&self, scenario: &Scenario) -> Result<(), Failure> {
        let fixture = self
            .provisioner
            .provision(&scenario.fixture)
            .map_err(|e| Failure::provision(&e))?;

        let script = Script::write(&self.subject, &scenario.commands, self.driver.profile())
            .map_err(|e| Failure::setup(&e, Vec::new()))?;

        let hook = scenario.interrupt_after.map(|delay| InterruptHook { delay });
        let result = self
            .driver
            .drive(
                fixture.root(),
                &script,
                hook.as_ref().map(|h| h as &dyn SessionHook),
                &scenario.name,
            )
            .map_err(|e| {
                let captured = e
                    .downcast_ref::<HarnessError>()
                    .map(|err| err.captured().to_vec())
                    .unwrap_or_default();
                Failure::setup(&e, captured)
            })
            .and_then(|raw| {
                demultiplex(&raw.lines, &raw.sentinel).map_err(|e| {
                    Failure::setup(&anyhow::Error::from(e), raw.lines.clone())
                })
            })
            .and_then(|responses| {
                log::debug!("[{}] responses: {:?}", scenario.name, responses);
                match_responses(&responses, &scenario.expected)
                    .map_err(|mismatch| Failure::Mismatch {
                        mismatch,
                        commands: scenario.commands.clone(),
                    })
            });

        if result.is_err() && self.keep_failed {
            let dir = fixture.keep();
            match script.keep_in(&dir) {
                Ok(path) => log::warn!("Kept script at {}", path.display()),
                Err(e) => log::warn!("{e:#}"),
            }
            if self.live_output {
                println!(
                    "{}",
                    hint_message(format!("fixture kept at {}", dir.display()))
                );
            }
        }

        result
    }
}
