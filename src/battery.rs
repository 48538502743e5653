//! The built-in scenario battery
//!
//! Each scenario sets the prompt format to `$M#` (the subject's prefix followed
//! by a literal `#`) and checks the prefix the subject renders after each
//! command. Hashes in expected lines come from the catalog templates, so the
//! battery is tied to the catalog shipped alongside the subject.

use std::time::Duration;

use crate::fixture::FixtureSpec;
use crate::scenario::Scenario;

/// Prompt-prefix scenarios.
pub fn prompt_scenarios() -> Vec<Scenario> {
    vec![
        Scenario::new(
            "before initial commit",
            FixtureSpec::template("empty"),
            &["prompt $M#"],
            &[Some("[(no head)]  #")],
        ),
        Scenario::new(
            "single commit on master",
            FixtureSpec::template("single_commit"),
            &["prompt $M#"],
            &[Some("[master]  #")],
        ),
        Scenario::new(
            "prompt completely empty if not in working dir",
            FixtureSpec::template("empty"),
            &["prompt $M#", "cd .."],
            &[None, Some(" ")],
        ),
        Scenario::new(
            "detached head",
            FixtureSpec::template("four_linear_commits"),
            &["prompt $M#", "git checkout HEAD~2 >nul 2>nul"],
            &[Some("[master]  #"), Some("[7b4f1ae...]  #")],
        ),
        Scenario::new(
            "rebase in progress",
            FixtureSpec::template("conflict_rebase"),
            &["prompt $M#", "git rebase master >nul 2>nul"],
            &[Some("[child]  #"), Some("[child 1/1|REBASE]  #")],
        ),
    ]
}

/// Batch-job interruption scenarios.
///
/// Interrupting a running batch file makes cmd ask "Terminate batch job
/// (Y/N)?"; the subject is meant to suppress that question. No shell profile
/// delivers a console interrupt the way an interactive user does, so these are
/// listed and skipped.
pub fn interrupt_scenarios() -> Vec<Scenario> {
    vec![
        Scenario::new(
            "no terminate batch job prompt",
            FixtureSpec::template("empty"),
            &["prompt #", "pause", "pause"],
            &[Some(""), Some("")],
        )
        .interrupt_after(Duration::from_secs(1))
        .unsupported("console interrupts cannot be delivered to a piped shell"),
    ]
}

/// Every scenario, in run order.
pub fn all() -> Vec<Scenario> {
    let mut scenarios = prompt_scenarios();
    scenarios.extend(interrupt_scenarios());
    scenarios
}
