// tests/common/mod.rs
// Shared test utilities for integration tests
#![allow(dead_code)]

use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

/// Run the built profcsv binary with `args`; config files are always ignored
pub fn run_profcsv(args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_profcsv"))
        .arg("--ignore-config")
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to start profcsv");

    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.code().unwrap_or(-1),
    )
}

/// Write `file_content` to a temporary file and profile it; the path goes last
pub fn run_profcsv_with_file(args: &[&str], file_content: &str) -> (String, String, i32) {
    let temp_file = write_temp_file(file_content);
    let mut full_args = args.to_vec();
    full_args.push(temp_file.path().to_str().unwrap());
    run_profcsv(&full_args)
}

pub fn write_temp_file(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
    temp_file
        .write_all(content.as_bytes())
        .expect("Failed to write to temp file");
    temp_file.flush().expect("Failed to flush temp file");
    temp_file
}

/// Parse `fields\trecords` table output into (fields, records) pairs
pub fn parse_table(stdout: &str) -> Vec<(usize, u64)> {
    let mut lines = stdout.lines();
    assert_eq!(lines.next(), Some("fields\trecords"), "missing table header");
    lines
        .map(|line| {
            let (fields, records) = line.split_once('\t').expect("tab-separated row");
            (fields.parse().unwrap(), records.parse().unwrap())
        })
        .collect()
}

/// Deterministic CSV payload with a varying number of fields per line
pub fn sample_csv(lines: usize) -> String {
    (0..lines)
        .map(|i| {
            let fields = 1 + (i * 7) % 5;
            let row: Vec<String> = (0..fields).map(|f| format!("v{}_{}", i, f)).collect();
            row.join(",") + "\n"
        })
        .collect()
}
