use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "jumpwin-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_list_scenarios_writes_output() {
    let exe = env!("CARGO_BIN_EXE_jumpwin-tester");
    let output_path = temp_path("list");
    let status = Command::new(exe)
        .args(["--list-scenarios", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(output_path).expect("read output");
    assert!(content.contains("Available scenarios"));
    assert!(content.contains("gentle/agent"));
}

#[test]
fn cli_writes_json_report_for_requested_runs() {
    let exe = env!("CARGO_BIN_EXE_jumpwin-tester");
    let output_path = temp_path("run");
    let output = Command::new(exe)
        .args([
            "--seeds",
            "1",
            "--tiers",
            "gentle",
            "--runners",
            "agent,forward",
            "--concurrency",
            "2",
            "--report",
            "json",
            "--output",
        ])
        .arg(&output_path)
        .output()
        .expect("run cli");
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );

    let content = std::fs::read_to_string(output_path).expect("read output");
    let report: serde_json::Value = serde_json::from_str(&content).expect("valid json");
    let records = report["records"].as_array().expect("records array");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["seed_code"], "GC-GENTLE-1");
    assert!(records[1]["failure"].is_string());
    assert_eq!(report["aggregates"].as_array().map(Vec::len), Some(2));
}

#[test]
fn cli_rejects_unknown_tier() {
    let exe = env!("CARGO_BIN_EXE_jumpwin-tester");
    let output = Command::new(exe)
        .args(["--tiers", "nightmare", "--report", "json"])
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown tier"));
}
