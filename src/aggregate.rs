//! Result aggregation
//!
//! The [`Aggregator`] is the only state that lives across scenarios. It is an
//! ordinary value owned by the caller and passed by `&mut` into the runner, so
//! two runs in one process never share counts.
//!
//! Each scenario is bracketed by [`Aggregator::start`], which hands out a
//! [`ScenarioTicket`], and [`Aggregator::finish`], which consumes it. A ticket
//! can only be finished once; one that is dropped unfinished leaves
//! `started > passed + failed`, which [`Aggregator::report`] turns into
//! [`HarnessError::InvariantViolation`].

use serde::Serialize;

use crate::error::HarnessError;
use crate::scenario::Verdict;

/// Scenario counts.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Counters {
    pub started: usize,
    pub passed: usize,
    pub failed: usize,
}

/// Proof that a scenario was started; consumed by [`Aggregator::finish`].
#[derive(Debug)]
#[must_use = "a started scenario must be finished"]
pub struct ScenarioTicket {
    name: String,
}

/// A scenario that was listed but not run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skipped {
    pub scenario: String,
    pub reason: String,
}

/// Final tally of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
    pub skipped: usize,
}

impl Summary {
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{} passed.", self.passed, self.total)
    }
}

/// Counts scenarios and keeps their verdicts in the order they finished.
#[derive(Debug, Default)]
pub struct Aggregator {
    counters: Counters,
    verdicts: Vec<Verdict>,
    skipped: Vec<Skipped>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record entry into a scenario.
    pub fn start(&mut self, name: &str) -> ScenarioTicket {
        self.counters.started += 1;
        log::debug!("Scenario {} started ({} so far)", name, self.counters.started);
        ScenarioTicket {
            name: name.to_string(),
        }
    }

    /// Record the outcome of a started scenario.
    pub fn finish(&mut self, ticket: ScenarioTicket, verdict: Verdict) {
        debug_assert_eq!(ticket.name, verdict.scenario);
        if verdict.passed {
            self.counters.passed += 1;
        } else {
            self.counters.failed += 1;
        }
        self.verdicts.push(verdict);
    }

    /// Record a scenario that is listed but not run. Does not touch the counters.
    pub fn skip(&mut self, scenario: &str, reason: &str) {
        self.skipped.push(Skipped {
            scenario: scenario.to_string(),
            reason: reason.to_string(),
        });
    }

    pub fn counters(&self) -> Counters {
        self.counters
    }

    pub fn verdicts(&self) -> &[Verdict] {
        &self.verdicts
    }

    pub fn skipped(&self) -> &[Skipped] {
        &self.skipped
    }

    /// Check `started == passed + failed` and produce the tally.
    pub fn report(&self) -> Result<Summary, HarnessError> {
        let Counters {
            started,
            passed,
            failed,
        } = self.counters;
        if started != passed + failed {
            return Err(HarnessError::InvariantViolation {
                started,
                passed,
                failed,
            });
        }
        Ok(Summary {
            passed,
            failed,
            total: started,
            skipped: self.skipped.len(),
        })
    }
}
