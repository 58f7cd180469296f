//! End-to-end runs of the `run` command against a temporary log directory.

use std::fs;
use std::io::Cursor;

use balsim_cli::commands::run;
use balsim_cli::{LogFormat, RunOptions};

fn options(dir: &std::path::Path) -> RunOptions {
    RunOptions {
        workers: Some(2),
        cycles: Some(60),
        seed: Some(9),
        log_dir: Some(dir.to_path_buf()),
        ..RunOptions::default()
    }
}

#[tokio::test]
async fn text_log_has_classic_sections() {
    let tmp = tempfile::tempdir().unwrap();
    let mut input = Cursor::new(String::new());
    let mut out = Vec::new();

    let report = run::run(options(tmp.path()), &mut input, &mut out).await.unwrap();
    assert_eq!(report.cycles_run, 60);
    assert!(!report.cancelled);

    let stdout = String::from_utf8(out).unwrap();
    assert!(stdout.contains("Load balancer complete. Check log file for details."));

    let log = fs::read_to_string(tmp.path().join("log.txt")).unwrap();
    assert!(log.starts_with("Load Balancer Started.\n"));
    assert!(log.contains("Number of servers: 2"));
    assert!(log.contains("Number of requests in queue: 200"));
    assert!(log.contains("######################## CYCLE 60 ########################"));
    assert!(!log.contains("CYCLE 61"));
    assert!(log.contains("######################## Load balancer closed ########################"));
    assert!(log.trim_end().ends_with(&format!(
        "Number of idle servers: {}",
        report.idle_at_shutdown
    )));
}

#[tokio::test]
async fn json_log_is_one_object_per_line() {
    let tmp = tempfile::tempdir().unwrap();
    let mut opts = options(tmp.path());
    opts.format = LogFormat::Json;
    opts.output = Some("run.jsonl".to_string());

    let mut input = Cursor::new(String::new());
    let mut out = Vec::new();
    run::run(opts, &mut input, &mut out).await.unwrap();

    let log = fs::read_to_string(tmp.path().join("run.jsonl")).unwrap();
    let events: Vec<serde_json::Value> = log
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(events.first().unwrap()["event"], "started");
    assert_eq!(events.last().unwrap()["event"], "summary");
    let cycles = events.iter().filter(|e| e["event"] == "cycle_started").count();
    assert_eq!(cycles, 60);
}

#[tokio::test]
async fn same_seed_same_log() {
    let a = tempfile::tempdir().unwrap();
    let b = tempfile::tempdir().unwrap();
    let mut out = Vec::new();
    run::run(options(a.path()), &mut Cursor::new(String::new()), &mut out)
        .await
        .unwrap();
    run::run(options(b.path()), &mut Cursor::new(String::new()), &mut out)
        .await
        .unwrap();

    assert_eq!(
        fs::read_to_string(a.path().join("log.txt")).unwrap(),
        fs::read_to_string(b.path().join("log.txt")).unwrap()
    );
}

#[tokio::test]
async fn prompts_when_flags_missing() {
    let tmp = tempfile::tempdir().unwrap();
    let opts = RunOptions {
        log_dir: Some(tmp.path().to_path_buf()),
        seed: Some(1),
        ..RunOptions::default()
    };
    let mut input = Cursor::new("5\n1\ninteractive.txt\n".to_string());
    let mut out = Vec::new();

    let report = run::run(opts, &mut input, &mut out).await.unwrap();
    assert_eq!(report.cycles_run, 5);
    assert!(tmp.path().join("interactive.txt").exists());
}
