// Armulet - ARM/Thumb Instruction Emulation
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use std::process::{Command, Output};

fn armulet(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_armulet"))
        .args(args)
        .output()
        .expect("Failed to execute armulet")
}

#[test]
fn test_step_prints_push_writes() {
    // push {r0, r1, lr}
    let output = armulet(&["step", "--reg", "r0=0x11", "e92d4003"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(stdout.contains("0x00008000: 0xe92d4003"), "Stdout: {}", stdout);
    assert!(
        stdout.contains("[0x7ffefff4]:4 = 0x11 (PushRegisterOnStack r0 -> [sp-12])"),
        "Stdout: {}",
        stdout
    );
    assert!(
        stdout.contains("sp = 0x7ffefff4 (AdjustStackPointer [sp-12])"),
        "Stdout: {}",
        stdout
    );
    assert!(stdout.contains("pc = 0x8004 (AdvancePc"), "Stdout: {}", stdout);
}

#[test]
fn test_step_json_lines() {
    let output = armulet(&["step", "--json", "e92d4003"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);

    let records: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("Failed to parse JSON"))
        .collect();
    // three stores, the SP writeback and the PC advance
    assert_eq!(records.len(), 5);
    assert_eq!(records[0]["target"]["type"], "memory");
    assert_eq!(records[0]["target"]["address"], 0x7ffe_fff4u64);
    assert_eq!(records[3]["target"]["type"], "register");
    assert_eq!(records[3]["value"], 0x7ffe_fff4u64);
}

#[test]
fn test_step_condition_failed() {
    // beq with Z clear
    let output = armulet(&["step", "0a000000"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("(condition failed)"), "Stdout: {}", stdout);
}

#[test]
fn test_unwind_thumb_prologue() {
    // push {r7, lr}; add r7, sp, #0
    let output = armulet(&["unwind", "--thumb", "b580", "af00"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();

    assert_eq!(lines.len(), 3, "Stdout: {}", stdout);
    assert_eq!(lines[0], "+0x0: CFA=sp+0");
    assert!(lines[1].starts_with("+0x2: CFA=sp+8"));
    assert!(lines[1].contains("r7@CFA-8"));
    assert!(lines[1].contains("lr@CFA-4"));
    assert!(lines[2].starts_with("+0x4: CFA=r7+8"));
}

#[test]
fn test_unwind_json() {
    let output = armulet(&["unwind", "--thumb", "--json", "b580"]);
    assert!(output.status.success());
    let plan: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("Failed to parse JSON");
    let rows = plan["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1]["offset"], 2);
    assert_eq!(rows[1]["cfa"]["offset"], 8);
}

#[test]
fn test_unsupported_opcode_exits_with_emulation_error() {
    // muls r0, r1, r0
    let output = armulet(&["step", "--thumb", "4348"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_bad_arguments_exit_with_config_error() {
    let output = armulet(&["step", "--reg", "r16=1", "e92d4003"]);
    assert_eq!(output.status.code(), Some(2));

    let output = armulet(&["step", "--reg", "pc=0x9000", "e92d4003"]);
    assert_eq!(output.status.code(), Some(2));

    let output = armulet(&["step", "--log-level", "loud", "e92d4003"]);
    assert_eq!(output.status.code(), Some(2));

    let output = armulet(&["step", "nothex"]);
    assert_eq!(output.status.code(), Some(2));

    let output = armulet(&["unwind", "--config", "/nonexistent/armulet.yaml", "b580"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_log_level_writes_to_stderr_only() {
    let output = armulet(&["--log-level", "trace", "step", "e92d4003"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Fetched"), "Stderr: {}", stderr);
    assert!(!stdout.contains("Fetched"), "Stdout: {}", stdout);
}
