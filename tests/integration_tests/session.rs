use std::path::Path;

use prompt_harness::demux::demultiplex;
use prompt_harness::fixture::{FixtureProvisioner, FixtureSpec};
use prompt_harness::script::Script;
use prompt_harness::session::{DEFAULT_SENTINEL, SessionDriver};
use rstest::rstest;
use tempfile::TempDir;

use crate::common::{Catalog, fake_cmd_profile};

fn commands(cmds: &[&str]) -> Vec<String> {
    cmds.iter().map(|c| c.to_string()).collect()
}

#[test]
fn test_raw_capture_layout() {
    let dir = TempDir::new().unwrap();
    let catalog = Catalog::battery();
    let fixture = FixtureProvisioner::new(catalog.path())
        .provision(&FixtureSpec::template("single_commit"))
        .unwrap();
    let profile = fake_cmd_profile(dir.path());
    let subject = Path::new("/opt/subject.exe");
    let script = Script::write(subject, &commands(&["prompt $M#", "cd .."]), &profile).unwrap();

    let session = SessionDriver::new(profile)
        .drive(fixture.root(), &script, None, "layout")
        .unwrap();

    assert!(session.status.success());
    assert_eq!(session.sentinel, DEFAULT_SENTINEL);
    assert_eq!(
        session.lines,
        [
            "",
            "###/opt/subject.exe",
            "",
            "###prompt $M#",
            "",
            "[master]  #cd ..",
            "",
            " #ver >nul",
        ]
    );
}

#[rstest]
fn test_response_count_matches_command_count(#[values(1, 2, 5)] n: usize) {
    let dir = TempDir::new().unwrap();
    let catalog = Catalog::battery();
    let fixture = FixtureProvisioner::new(catalog.path())
        .provision(&FixtureSpec::template("empty"))
        .unwrap();
    let profile = fake_cmd_profile(dir.path());
    let mut cmds = vec!["prompt $M#".to_string()];
    cmds.extend((1..n).map(|i| format!("rem {i}")));
    let script = Script::write(Path::new("subject.exe"), &cmds, &profile).unwrap();

    let session = SessionDriver::new(profile)
        .drive(fixture.root(), &script, None, "count")
        .unwrap();
    // subject line + commands + end marker, two lines each
    assert_eq!(session.lines.len(), 2 * (n + 2));

    let responses = demultiplex(&session.lines, &session.sentinel).unwrap();
    assert_eq!(responses.len(), n);
    assert!(responses.iter().all(|r| r.starts_with("[(no head)]  #")));
}

#[test]
fn test_custom_sentinel_reaches_shell() {
    let dir = TempDir::new().unwrap();
    let profile = fake_cmd_profile(dir.path());
    let script = Script::write(Path::new("subject.exe"), &commands(&["rem"]), &profile).unwrap();
    let session = SessionDriver::new(profile)
        .with_sentinel("@@@")
        .drive(dir.path(), &script, None, "sentinel")
        .unwrap();
    assert_eq!(session.lines[1], "@@@subject.exe");
    assert_eq!(demultiplex(&session.lines, "@@@").unwrap(), ["@@@ver >nul"]);
}
