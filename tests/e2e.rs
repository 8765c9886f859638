use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

mod common;

#[test]
fn e2e_table_driven_fixtures() {
    // Each scenario: (fixture path, expected hour log line count)
    let scenarios = vec![
        ("tests/fixtures/steady.capture", 3usize),
        ("tests/fixtures/rollover.capture", 2),
        ("tests/fixtures/corrupt.capture", 2),
        ("tests/fixtures/day_rollover.capture", 2),
    ];

    for (fixture, expected_hour_lines) in scenarios {
        let (tmp, entries) = common::replay_fixture_and_collect(fixture);
        for name in [
            "hour_data.txt",
            "day_data.txt",
            "staff_bans_hour.png",
            "staff_bans_day.png",
        ] {
            assert!(
                entries.iter().any(|entry| entry == name),
                "missing {} for fixture {}: {:?}",
                name,
                fixture,
                entries
            );
        }
        let hour_log = fs::read_to_string(tmp.path().join("data/hour_data.txt"))
            .unwrap_or_else(|_| panic!("failed to read hour log for {fixture}"));
        assert_eq!(
            hour_log.lines().count(),
            expected_hour_lines,
            "unexpected hour log for fixture {}: {:?}",
            fixture,
            hour_log
        );
    }
}

#[test]
fn hour_rollover_drops_previous_hour_from_hour_log_only() {
    let (tmp, _entries) = common::replay_fixture_and_collect("tests/fixtures/rollover.capture");

    let hour_log =
        fs::read_to_string(tmp.path().join("data/hour_data.txt")).expect("read hour log");
    assert_eq!(hour_log, "2024-01-01 11:00 6\n2024-01-01 11:01 1\n");

    let day_log = fs::read_to_string(tmp.path().join("data/day_data.txt")).expect("read day log");
    assert_eq!(
        day_log,
        "2024-01-01 10:59 3\n2024-01-01 11:00 6\n2024-01-01 11:01 1\n"
    );
}

#[test]
fn day_rollover_drops_previous_day_from_both_logs() {
    let (tmp, _entries) =
        common::replay_fixture_and_collect("tests/fixtures/day_rollover.capture");

    let expected = "2024-01-02 00:00 3\n2024-01-02 00:01 1\n";
    let hour_log =
        fs::read_to_string(tmp.path().join("data/hour_data.txt")).expect("read hour log");
    assert_eq!(hour_log, expected);
    let day_log = fs::read_to_string(tmp.path().join("data/day_data.txt")).expect("read day log");
    assert_eq!(day_log, expected);
}

#[test]
fn corrupt_capture_lines_are_reported_and_skipped() {
    let tmp = tempfile::tempdir().expect("create tempdir");
    let data_dir = tmp.path().join("data");
    let cfg_path = tmp.path().join("banwatch.toml");
    fs::write(
        &cfg_path,
        format!(
            "service_name = \"e2e-test\"\nlog_level = \"info\"\ndata_directory = \"{}\"\n",
            data_dir.display()
        ),
    )
    .expect("write config");

    Command::new(assert_cmd::cargo::cargo_bin!("banwatch"))
        .env("RUST_LOG", "info")
        .arg("--config")
        .arg(&cfg_path)
        .arg("--replay")
        .arg("tests/fixtures/corrupt.capture")
        .assert()
        .success()
        .stderr(predicate::str::contains("capture line rejected"))
        .stderr(predicate::str::contains("capture replay completed"));

    let hour_log = fs::read_to_string(data_dir.join("hour_data.txt")).expect("read hour log");
    assert_eq!(hour_log, "2024-01-01 10:01 4\n2024-01-01 10:02 2\n");
}

#[test]
fn missing_capture_file_fails_with_context() {
    let tmp = tempfile::tempdir().expect("create tempdir");
    let cfg_path = tmp.path().join("banwatch.toml");
    fs::write(
        &cfg_path,
        format!(
            "data_directory = \"{}\"\n",
            tmp.path().join("data").display()
        ),
    )
    .expect("write config");

    Command::new(assert_cmd::cargo::cargo_bin!("banwatch"))
        .arg("--config")
        .arg(&cfg_path)
        .arg("--replay")
        .arg("tests/fixtures/does_not_exist.capture")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read capture"));
}

#[test]
fn help_flag_prints_usage() {
    Command::new(assert_cmd::cargo::cargo_bin!("banwatch"))
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: banwatch"));
}
