//! Integration-test harness for console prompt extensions.
//!
//! The program under test hooks a command shell and prefixes its prompt with
//! repository state. The harness treats it as a black box: it seeds a
//! repository fixture, writes a script that installs the program and types
//! commands, runs the script in a real shell whose prompt format is forced to
//! a sentinel, and checks the prompt the program renders after each command.
//!
//! ```text
//! fixture ──> script ──> session ──> demux ──> matcher ──> aggregate
//! ```
//!
//! The library API is not stable; it exists for the `prompt-harness` binary
//! and its tests.

pub mod aggregate;
pub mod battery;
pub mod config;
pub mod demux;
pub mod error;
pub mod fixture;
pub mod matcher;
pub mod report;
pub mod scenario;
pub mod script;
pub mod session;
pub mod shell_exec;
pub mod styling;

pub use aggregate::Aggregator;
pub use error::HarnessError;
pub use scenario::{Scenario, ScenarioRunner, Verdict};
