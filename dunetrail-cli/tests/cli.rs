use std::io::Write;
use std::process::{Command, Stdio};

const STAGE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/stage.txt");
const SCRIPT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/crossing.txt");

fn dunetrail() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_dunetrail"));
    command.env("NO_COLOR", "1").env("CLICOLOR", "0");
    command
}

fn run_with_stdin(args: &[&str], input: &str) -> std::process::Output {
    let mut child = dunetrail()
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn cli");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(input.as_bytes())
        .expect("write stdin");
    child.wait_with_output().expect("run cli")
}

#[test]
fn cli_runs_a_script_file() {
    let output = dunetrail()
        .args(["--stage", STAGE, "--script", SCRIPT])
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Bought 2 food and 2 water for 12"));
    assert!(stdout.contains("1: buy food:2 water:2"));
    assert!(stdout.contains("2: go e"));
    assert!(stdout.contains("no older states"));
    assert!(stdout.contains("|     2|         e|"));
}

#[test]
fn cli_reads_commands_from_stdin() {
    let output = run_with_stdin(
        &["--stage", STAGE, "--food", "5", "--water", "5"],
        "go e; log\nquit\nstay\n",
    );
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    // Two sunny days at travel intensity from a 5/5 pack.
    assert!(stdout.contains("|     2|         e|           8|      100|     1|      1|"));
    assert!(stdout.contains("State: Ok"));
}

#[test]
fn cli_reports_unknown_start_position() {
    let output = run_with_stdin(&["--stage", STAGE, "--pos", "mirage"], "");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid starting state"));
}

#[test]
fn cli_reports_missing_stage_file() {
    let output = run_with_stdin(&["--stage", "no-such-stage.txt"], "");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to read no-such-stage.txt"));
}

#[test]
fn cli_estimate_writes_json() {
    let output = dunetrail()
        .args([
            "--stage",
            STAGE,
            "--estimate",
            "--iterations",
            "3",
            "--report",
            "json",
            "--seed",
            "42",
        ])
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json report");
    assert_eq!(report["config"]["iterations"], 3);
    let routes = report["routes"].as_array().expect("routes");
    // Two origins, one destination.
    assert_eq!(routes.len(), 2);
}

#[test]
fn cli_seeded_random_weather_is_reproducible() {
    let run = || {
        run_with_stdin(
            &["--stage", STAGE, "--random-weather", "--seed", "99"],
            "weather\n",
        )
        .stdout
    };
    let first = run();
    assert_eq!(first, run());
    assert_eq!(String::from_utf8_lossy(&first).lines().count(), 5);
}
