use std::path::Path;
use std::time::Duration;

use prompt_harness::aggregate::{Aggregator, Counters};
use prompt_harness::battery;
use prompt_harness::fixture::{FixtureProvisioner, FixtureSpec};
use prompt_harness::matcher::Mismatch;
use prompt_harness::scenario::{Failure, Scenario, ScenarioRunner};
use prompt_harness::session::SessionDriver;
use prompt_harness::shell_exec::ShellProfile;
use tempfile::TempDir;

use crate::common::{Catalog, fake_cmd_profile};

fn runner_with(profile: ShellProfile, dir: &Path, catalog: &Catalog, timeout: Duration) -> ScenarioRunner {
    let driver = SessionDriver::new(profile).with_timeout(timeout);
    ScenarioRunner::new(
        FixtureProvisioner::new(catalog.path()),
        driver,
        dir.join("subject.exe"),
    )
    .live_output(false)
}

fn runner(dir: &Path, catalog: &Catalog) -> ScenarioRunner {
    runner_with(fake_cmd_profile(dir), dir, catalog, Duration::from_secs(20))
}

#[test]
fn test_battery_against_fake_cmd() {
    let dir = TempDir::new().unwrap();
    let catalog = Catalog::battery();
    let mut aggregator = Aggregator::new();

    runner(dir.path(), &catalog).run_all(&battery::all(), &mut aggregator);

    let summary = aggregator.report().unwrap();
    assert_eq!(summary.to_string(), "3/5 passed.");
    assert_eq!(summary.skipped, 1);
    assert_eq!(aggregator.skipped()[0].scenario, "no terminate batch job prompt");

    let passed: Vec<_> = aggregator
        .verdicts()
        .iter()
        .filter(|v| v.passed)
        .map(|v| v.scenario.as_str())
        .collect();
    assert_eq!(
        passed,
        [
            "before initial commit",
            "single commit on master",
            "prompt completely empty if not in working dir"
        ]
    );

    // The catalog has no history, so checkout and rebase leave HEAD alone
    let failures: Vec<_> = aggregator
        .verdicts()
        .iter()
        .filter_map(|v| v.failure.clone())
        .collect();
    assert_eq!(
        failures,
        [
            Failure::Mismatch {
                mismatch: Mismatch::Content {
                    index: 1,
                    actual: "[master]  ".into(),
                    expected: "[7b4f1ae...]  ".into(),
                },
                commands: vec![
                    "prompt $M#".into(),
                    "git checkout HEAD~2 >nul 2>nul".into()
                ],
            },
            Failure::Mismatch {
                mismatch: Mismatch::Content {
                    index: 1,
                    actual: "[child]  ".into(),
                    expected: "[child 1/1|REBASE]  ".into(),
                },
                commands: vec!["prompt $M#".into(), "git rebase master >nul 2>nul".into()],
            },
        ]
    );
}

#[test]
fn test_repeated_runs_give_identical_verdicts() {
    let dir = TempDir::new().unwrap();
    let catalog = Catalog::battery();
    let runner = runner(dir.path(), &catalog);

    let mut first = Aggregator::new();
    let mut second = Aggregator::new();
    runner.run_all(&battery::all(), &mut first);
    runner.run_all(&battery::all(), &mut second);

    assert_eq!(first.verdicts(), second.verdicts());
    assert_eq!(first.skipped(), second.skipped());
    assert_eq!(first.counters(), second.counters());
}

#[test]
fn test_detached_head_with_real_history() {
    let dir = TempDir::new().unwrap();
    let catalog = Catalog::new();
    let hashes = catalog.add_git_template("four_linear_commits", 4);
    let expected = format!("[{}...]  #", &hashes[1][..7]);

    let scenario = Scenario::new(
        "detached head",
        FixtureSpec::template("four_linear_commits"),
        &["prompt $M#", "git checkout HEAD~2 >nul 2>nul"],
        &[Some("[master]  #"), Some(expected.as_str())],
    );
    let mut aggregator = Aggregator::new();
    let verdict = runner(dir.path(), &catalog)
        .run(&scenario, &mut aggregator)
        .unwrap();

    assert_eq!(verdict.failure, None);
    assert!(verdict.passed);
}

#[test]
fn test_fresh_repository() {
    let dir = TempDir::new().unwrap();
    let catalog = Catalog::new();
    let scenario = Scenario::new(
        "fresh repository",
        FixtureSpec::Fresh,
        &["prompt $M#", "cd .."],
        &[Some("[(no head)]  #"), Some(" ")],
    );
    let mut aggregator = Aggregator::new();
    let verdict = runner(dir.path(), &catalog)
        .run(&scenario, &mut aggregator)
        .unwrap();
    assert_eq!(verdict.failure, None);
}

#[test]
fn test_missing_template_fails_only_that_scenario() {
    let dir = TempDir::new().unwrap();
    let catalog = Catalog::battery();
    let scenarios = [
        Scenario::new(
            "needs missing template",
            FixtureSpec::template("no_such_template"),
            &["prompt $M#"],
            &[Some("[master]  #")],
        ),
        Scenario::new(
            "single commit on master",
            FixtureSpec::template("single_commit"),
            &["prompt $M#"],
            &[Some("[master]  #")],
        ),
    ];
    let mut aggregator = Aggregator::new();
    runner(dir.path(), &catalog).run_all(&scenarios, &mut aggregator);

    assert_eq!(
        aggregator.counters(),
        Counters {
            started: 2,
            passed: 1,
            failed: 1
        }
    );
    let Some(Failure::Provision { message }) = &aggregator.verdicts()[0].failure else {
        panic!("expected a provisioning failure");
    };
    assert!(message.contains("no_such_template"), "{message}");
}

#[test]
fn test_length_mismatch_reports_responses() {
    let dir = TempDir::new().unwrap();
    let catalog = Catalog::battery();
    let scenario = Scenario::new(
        "one expectation short",
        FixtureSpec::template("single_commit"),
        &["prompt $M#", "cd .."],
        &[Some("[master]  #")],
    );
    let mut aggregator = Aggregator::new();
    let verdict = runner(dir.path(), &catalog)
        .run(&scenario, &mut aggregator)
        .unwrap();
    let Some(Failure::Mismatch {
        mismatch: Mismatch::Length { actual, .. },
        ..
    }) = verdict.failure
    else {
        panic!("expected a length mismatch");
    };
    assert_eq!(actual, ["[master]  #cd ..", " #ver >nul"]);
}

#[test]
fn test_wrong_prompt_variable_is_setup_failure() {
    let dir = TempDir::new().unwrap();
    let catalog = Catalog::battery();
    let profile = ShellProfile {
        prompt_var: "PROMPT_HARNESS_UNUSED".to_string(),
        ..fake_cmd_profile(dir.path())
    };
    let scenario = Scenario::new(
        "single commit on master",
        FixtureSpec::template("single_commit"),
        &["prompt $M#"],
        &[Some("[master]  #")],
    );
    let mut aggregator = Aggregator::new();
    let verdict = runner_with(profile, dir.path(), &catalog, Duration::from_secs(20))
        .run(&scenario, &mut aggregator)
        .unwrap();

    let Some(Failure::Setup { message, captured }) = verdict.failure else {
        panic!("expected a setup failure");
    };
    assert!(message.contains("prompt sentinel ### not found"), "{message}");
    assert_eq!(captured.len(), 6);
    assert_eq!(aggregator.report().unwrap().failed, 1);
}

#[test]
fn test_hanging_shell_times_out() {
    let dir = TempDir::new().unwrap();
    let catalog = Catalog::battery();
    let scenario = Scenario::new(
        "waits for a key",
        FixtureSpec::template("empty"),
        &["prompt $M#", "pause"],
        &[None, None],
    );
    let mut aggregator = Aggregator::new();
    let verdict = runner_with(
        fake_cmd_profile(dir.path()),
        dir.path(),
        &catalog,
        Duration::from_millis(500),
    )
    .run(&scenario, &mut aggregator)
    .unwrap();

    let Some(Failure::Setup { message, captured }) = verdict.failure else {
        panic!("expected a setup failure");
    };
    assert!(message.contains("did not exit within"), "{message}");
    // Output from before the hang is kept for diagnosis
    assert!(
        captured.iter().any(|line| line.starts_with("###")),
        "{captured:?}"
    );
    assert!(captured.iter().any(|line| line.ends_with("pause")), "{captured:?}");
}

#[test]
fn test_unsupported_scenario_is_not_started() {
    let dir = TempDir::new().unwrap();
    let catalog = Catalog::battery();
    let mut aggregator = Aggregator::new();
    let runner = runner(dir.path(), &catalog);
    for scenario in battery::interrupt_scenarios() {
        assert!(runner.run(&scenario, &mut aggregator).is_none());
    }
    assert_eq!(aggregator.counters(), Counters::default());
    assert_eq!(aggregator.report().unwrap().skipped, 1);
}
