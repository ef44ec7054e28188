use std::fs;

use pressmon_core::atomic::write_atomic;
use pressmon_core::logger::{FileSessionLog, NullSessionLog};
use pressmon_core::record::{render_table, write_session_record};
use pressmon_traits::SessionLog;

#[test]
fn table_has_time_column_and_one_column_per_channel() {
    let history = vec![vec![0.0, 0.5], vec![1.25, -2.0]];
    let out = String::from_utf8(render_table(&history).unwrap()).unwrap();
    assert_eq!(
        out,
        "Time(s)\tChannel 1\tChannel 2\n0\t0.0\t1.25\n1\t0.5\t-2.0\n"
    );
}

#[test]
fn short_series_are_padded_with_nan() {
    let history = vec![vec![1.0, 2.0, 3.0], vec![4.0]];
    let out = String::from_utf8(render_table(&history).unwrap()).unwrap();
    let rows: Vec<&str> = out.lines().collect();
    assert_eq!(rows[2], "1\t2.0\tNaN");
    assert_eq!(rows[3], "2\t3.0\tNaN");
}

#[test]
fn empty_history_writes_only_the_header() {
    let out = render_table(&[Vec::new(), Vec::new()]).unwrap();
    assert_eq!(out, b"Time(s)\tChannel 1\tChannel 2\n");
}

#[test]
fn record_is_written_into_new_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rec/20260101_120000/20260101_120000.txt");
    write_session_record(&path, &[vec![1.0], vec![2.0]]).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("Time(s)\tChannel 1\tChannel 2\n"));
    let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".partial"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn atomic_write_replaces_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("baseline.csv");
    write_atomic(&path, b"old").unwrap();
    write_atomic(&path, b"new contents").unwrap();
    assert_eq!(fs::read(&path).unwrap(), b"new contents");
}

#[test]
fn session_log_lines_are_timestamped_and_appended() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("s/session.log");
    {
        let mut log = FileSessionLog::open(&path).unwrap();
        assert_eq!(log.path(), path);
        log.append("detection started, duration 60s").unwrap();
    }
    let mut log = FileSessionLog::open(&path).unwrap();
    log.append("recording started").unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    for line in &lines {
        // [YYYY-MM-DD HH:MM:SS] message
        assert_eq!(&line[0..1], "[");
        assert_eq!(&line[20..22], "] ");
        assert_eq!(&line[5..6], "-");
        assert_eq!(&line[14..15], ":");
    }
    assert!(lines[0].ends_with("detection started, duration 60s"));
    assert!(lines[1].ends_with("recording started"));
}

#[test]
fn null_log_accepts_everything() {
    assert!(NullSessionLog.append("anything").is_ok());
}
