// LabWired - GPIO Loopback Tester
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use std::process::{Command, Output};

fn loopback(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_labwired-loopback"))
        .args(args)
        .output()
        .expect("Failed to execute labwired-loopback")
}

fn error_lines(stdout: &str) -> Vec<&str> {
    stdout
        .lines()
        .filter(|l| l.starts_with("Loopback error on pin"))
        .collect()
}

#[test]
fn test_simulated_single_bank_passes() {
    let output = loopback(&["--simulate"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(0), "stdout: {}", stdout);
    assert!(error_lines(&stdout).is_empty());
}

#[test]
fn test_simulated_triple_bank_passes() {
    let output = loopback(&["--simulate", "--variant", "b"]);
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn test_simulated_stuck_bit_fails_with_diagnostics() {
    let output = loopback(&["--simulate", "--simulate-stuck", "3"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(1));
    let lines = error_lines(&stdout);
    // Walking one on pin 3, walking zero on the other 26 pins.
    assert_eq!(lines.len(), 27, "stdout: {}", stdout);
    assert_eq!(
        lines[0],
        "Loopback error on pin 3: wrote 0x00000008, read 0x00000000"
    );
    assert!(lines.contains(&"Loopback error on pin 0: wrote 0xfffffffe, read 0xfffffff6"));
}

#[test]
fn test_simulated_triple_bank_reports_shifted_pins() {
    let output = loopback(&["--simulate", "--variant", "b", "--simulate-stuck", "26"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(1));
    let lines = error_lines(&stdout);
    assert!(lines.contains(&"Loopback error on pin 26: wrote 0x04000000, read 0x00000000"));
    assert!(lines.contains(&"Loopback error on pin 58: wrote 0x04000000, read 0x00000000"));
    // Bit 26 is outside the status bank, so no pin 64+ reports.
    assert!(!lines.iter().any(|l| l.contains("pin 90")));
}

#[test]
fn test_json_report_is_last_line() {
    let output = loopback(&["--simulate", "--simulate-stuck", "0", "--json"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    let last = stdout.lines().last().expect("no output");
    let json: serde_json::Value = serde_json::from_str(last).expect("Failed to parse JSON");
    assert_eq!(json["result_schema_version"], "1.0");
    assert_eq!(json["status"], "fail");
    assert_eq!(json["variant"], "single_bank");
    assert_eq!(json["simulated"], true);
    assert_eq!(json["failure_count"], 27);
    assert_eq!(json["checks_performed"], 54);
    assert_eq!(json["pins"].as_array().unwrap().len(), 54);
}

#[test]
fn test_output_file_written() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("result.json");

    let output = loopback(&[
        "--simulate",
        "--variant",
        "pzsdr2",
        "--output",
        path.to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(0));

    let content = std::fs::read_to_string(&path).expect("Failed to read report");
    let json: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(json["status"], "pass");
    assert_eq!(json["config"]["variant"], "triple_bank");
    assert_eq!(json["config"]["map_size"], 0x10000);
    assert_eq!(json["checks_performed"], 156);
}

#[test]
fn test_missing_device_is_runtime_error() {
    let dir = tempfile::tempdir().unwrap();
    let device = dir.path().join("uio0");

    let output = loopback(&["--device", device.to_str().unwrap()]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(3));
    assert!(stderr.contains("failed opening"), "stderr: {}", stderr);
    assert!(error_lines(&String::from_utf8_lossy(&output.stdout)).is_empty());
}

#[test]
fn test_unlooped_backing_file_fails_every_pin() {
    // A plain file maps fine but nothing loops outputs back to inputs.
    let device = tempfile::NamedTempFile::new().unwrap();
    device.as_file().set_len(0x10000).unwrap();

    let output = loopback(&["--device", device.path().to_str().unwrap()]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(1));
    let lines = error_lines(&stdout);
    assert_eq!(lines.len(), 54);
    assert_eq!(
        lines[0],
        "Loopback error on pin 0: wrote 0x00000001, read 0x00000000"
    );
}

#[test]
fn test_map_too_small_is_config_error() {
    let device = tempfile::NamedTempFile::new().unwrap();
    device.as_file().set_len(0x10000).unwrap();

    let output = loopback(&[
        "--device",
        device.path().to_str().unwrap(),
        "--map-size",
        "0x400",
    ]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr.contains("too small"), "stderr: {}", stderr);
}

#[test]
fn test_unknown_variant_rejected() {
    let output = loopback(&["--simulate", "--variant", "c"]);
    assert_eq!(output.status.code(), Some(2));
}
