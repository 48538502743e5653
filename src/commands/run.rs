use std::time::Duration;

use color_print::cformat;
use prompt_harness::aggregate::Aggregator;
use prompt_harness::battery;
use prompt_harness::config::{DEFAULT_FIXTURES, DEFAULT_SUBJECT, HarnessConfig};
use prompt_harness::fixture::FixtureProvisioner;
use prompt_harness::report::{OutputFormat, RunReport, ShellRun};
use prompt_harness::scenario::ScenarioRunner;
use prompt_harness::session::{DEFAULT_TIMEOUT, SessionDriver};
use prompt_harness::styling::{println, progress_message, warning_message};

use super::resolve_path;
use crate::cli::RunArgs;

/// Run the battery against every selected profile.
///
/// Returns whether every scenario passed. An inconsistent aggregator is an
/// error, which `main` maps to its own exit code.
pub(crate) fn handle_run(args: RunArgs, config: &HarnessConfig) -> anyhow::Result<bool> {
    let subject = resolve_path(args.subject.clone(), config.subject.as_ref(), DEFAULT_SUBJECT)?;
    let fixtures = resolve_path(args.fixtures.clone(), config.fixtures.as_ref(), DEFAULT_FIXTURES)?;
    let timeout = args
        .timeout
        .map(Duration::from_secs)
        .or_else(|| config.timeout())
        .unwrap_or(DEFAULT_TIMEOUT);
    let keep_failed = args
        .keep_failed_flag()
        .unwrap_or(config.keep_failed_fixtures);
    let profiles = config.resolve_profiles(&args.shells)?;
    let live = args.format == OutputFormat::Text;

    if !subject.exists() {
        log::warn!("Subject {} does not exist", subject.display());
    }

    let scenarios = battery::all();
    let provisioner = FixtureProvisioner::new(&fixtures);
    let mut report = RunReport::default();

    for profile in profiles {
        if live {
            println!(
                "{}",
                progress_message(cformat!(
                    "Running {} scenarios with <bold>{}</>",
                    scenarios.len(),
                    profile.name
                ))
            );
        }
        let name = profile.name.clone();
        let driver = SessionDriver::new(profile).with_timeout(timeout);
        let runner = ScenarioRunner::new(provisioner.clone(), driver, &subject)
            .keep_failed(keep_failed)
            .live_output(live);

        let mut aggregator = Aggregator::new();
        runner.run_all(&scenarios, &mut aggregator);

        let run = ShellRun::new(&name, &aggregator)?;
        if live {
            if run.summary.skipped > 0 {
                println!(
                    "{}",
                    warning_message(format!("{} skipped", run.summary.skipped))
                );
            }
            println!("{}", run.summary);
        }
        report.runs.push(run);
    }

    if args.format == OutputFormat::Json {
        println!("{}", report.to_json()?);
    }

    Ok(report.all_passed())
}
