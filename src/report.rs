//! Run reports
//!
//! One [`ShellRun`] per shell profile, built from that profile's
//! [`Aggregator`] after the battery finishes. Building it checks the counter
//! invariant, so a report only exists for a consistent run.

use serde::Serialize;

use crate::aggregate::{Aggregator, Counters, Skipped, Summary};
use crate::error::HarnessError;
use crate::scenario::Verdict;

/// How `run` presents results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum::Display, strum::EnumString)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum OutputFormat {
    /// One line per scenario as it finishes, then the tally
    #[default]
    Text,
    /// A single JSON document on stdout once every profile has run
    Json,
}

/// Results of the battery against one shell profile.
#[derive(Debug, Clone, Serialize)]
pub struct ShellRun {
    pub shell: String,
    pub summary: Summary,
    pub counters: Counters,
    pub verdicts: Vec<Verdict>,
    pub skipped: Vec<Skipped>,
}

impl ShellRun {
    pub fn new(shell: &str, aggregator: &Aggregator) -> Result<Self, HarnessError> {
        let summary = aggregator.report()?;
        Ok(Self {
            shell: shell.to_string(),
            summary,
            counters: aggregator.counters(),
            verdicts: aggregator.verdicts().to_vec(),
            skipped: aggregator.skipped().to_vec(),
        })
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub runs: Vec<ShellRun>,
}

impl RunReport {
    pub fn all_passed(&self) -> bool {
        self.runs.iter().all(|run| run.summary.all_passed())
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
