use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::tempdir;

// Minimal serial-simulator config: short session, records under the temp dir.
fn write_config(dir: &tempfile::TempDir, extra: &str) -> PathBuf {
    let rec = dir.path().join("rec");
    let toml = format!(
        r#"
[session]
duration_seconds = 3
threshold = 5.0

[record]
dir = {rec:?}
{extra}
"#
    );
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn pressmon(cfg: &Path) -> Command {
    let mut cmd = Command::cargo_bin("pressmon_cli").unwrap();
    cmd.env("PRESSMON_TEST_TICK_MS", "1")
        .env_remove("RUST_LOG")
        .arg("--log-level")
        .arg("error")
        .arg("--config")
        .arg(cfg);
    cmd
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["detect"], 0, "Result: PASS", "stdout")]
#[case(&["self-check"], 0, "self-check ok: serial backend, 3/3 readings", "stdout")]
#[case(&["list-ports"], 0, "", "stdout")]
#[case(&["detect", "--duration", "abc"], 2, "invalid value", "stderr")]
#[case(&["detect", "--duration", "0"], 1, "Configuration is invalid", "stderr")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");

    let mut cmd = pressmon(&cfg);
    for a in args {
        cmd.arg(a);
    }

    let assert = cmd.assert().code(exit_code);
    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

#[test]
fn detect_writes_log_and_record_into_a_session_directory() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");
    pressmon(&cfg)
        .arg("detect")
        .assert()
        .success()
        .stdout(predicate::str::contains("Record:"));

    let sessions: Vec<_> = fs::read_dir(dir.path().join("rec"))
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(sessions.len(), 1);
    let stamp = sessions[0].file_name().unwrap().to_string_lossy().into_owned();

    let record = fs::read_to_string(sessions[0].join(format!("{stamp}.txt"))).unwrap();
    let rows: Vec<&str> = record.lines().collect();
    assert_eq!(rows[0], "Time(s)\tChannel 1\tChannel 2\tChannel 3\tChannel 4");
    assert_eq!(rows.len(), 4);
    assert!(rows[1].starts_with("0\t"));

    let log = fs::read_to_string(sessions[0].join(format!("{stamp}.log"))).unwrap();
    assert!(log.lines().next().unwrap().ends_with("] detection started, duration 3s"));
    assert!(log.contains("detection finished after 3s"));
}

#[test]
fn drifting_channels_fail_the_session() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");
    pressmon(&cfg)
        .env("PRESSMON_TEST_SIM_DRIFT", "50")
        .arg("detect")
        .assert()
        .success()
        .stdout(predicate::str::contains("Result: FAIL"));
}

#[test]
fn threshold_override_is_applied() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");
    pressmon(&cfg)
        .env("PRESSMON_TEST_SIM_DRIFT", "50")
        .args(["detect", "--threshold", "1000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("threshold 1000.00"))
        .stdout(predicate::str::contains("Result: PASS"));
}

#[test]
fn closed_presence_gate_aborts_with_exit_code_3() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");
    pressmon(&cfg)
        .env("PRESSMON_TEST_SIM_PRESENCE", "2000")
        .arg("detect")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("What happened: Detection failed"));
}

#[test]
fn calibration_without_data_exits_with_code_4() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");
    pressmon(&cfg)
        .env("PRESSMON_TEST_SIM_PRESENCE", "2000")
        .arg("calibrate")
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Calibration failed"));
}

#[test]
fn saved_baseline_is_loaded_by_the_next_session() {
    let dir = tempdir().unwrap();
    let baseline = dir.path().join("baseline.csv");
    let cfg = write_config(&dir, &format!("[calibration]\nfile = {baseline:?}\n"));

    pressmon(&cfg)
        .arg("calibrate")
        .arg("--save")
        .arg(&baseline)
        .assert()
        .success()
        .stdout(predicate::str::contains("Channel 4:"));
    let csv = fs::read_to_string(&baseline).unwrap();
    assert!(csv.starts_with("channel,baseline\n"));
    assert_eq!(csv.lines().count(), 5);

    // Zeroed readings hover around 0 once the saved baseline is applied.
    let out = pressmon(&cfg)
        .arg("--json")
        .arg("detect")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8_lossy(&out);
    let report: serde_json::Value =
        serde_json::from_str(stdout.lines().last().unwrap()).unwrap();
    for ch in report["channels"].as_array().unwrap() {
        assert!(ch["initial"].as_f64().unwrap().abs() < 0.5, "{ch}");
    }
}

#[test]
fn cli_reports_bad_baseline_header() {
    let dir = tempdir().unwrap();
    let bad_csv = dir.path().join("baseline.csv");
    let mut f = fs::File::create(&bad_csv).unwrap();
    writeln!(f, "ch,value").unwrap();
    writeln!(f, "1,0.0").unwrap();
    let cfg = write_config(&dir, &format!("[calibration]\nfile = {bad_csv:?}\n"));

    pressmon(&cfg)
        .arg("detect")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid headers"));
}

#[test]
fn invalid_rotation_is_rejected() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "[logging]\nrotation = \"weekly\"\n");
    pressmon(&cfg)
        .arg("self-check")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("logging.rotation"));
}

#[test]
fn missing_config_file_is_reported() {
    let dir = tempdir().unwrap();
    pressmon(&dir.path().join("nope.toml"))
        .arg("detect")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Configuration is invalid or unreadable"));
}

#[test]
fn serial_port_without_hardware_support_is_explained() {
    if cfg!(feature = "hardware") {
        return;
    }
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");
    let text = fs::read_to_string(&cfg).unwrap();
    fs::write(&cfg, format!("[backend]\nport = \"/dev/ttyUSB9\"\n{text}")).unwrap();
    pressmon(&cfg)
        .arg("self-check")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to open the serial port"));
}

#[test]
fn saved_baseline_with_wrong_channel_count_is_rejected() {
    let dir = tempdir().unwrap();
    let csv = dir.path().join("baseline.csv");
    fs::write(&csv, "channel,baseline\n1,0.5\n2,0.5\n").unwrap();
    let cfg = write_config(&dir, &format!("[calibration]\nfile = {csv:?}\n"));
    pressmon(&cfg)
        .arg("detect")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("has 2 channels, config has 4"));
}
