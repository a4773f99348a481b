//! End-to-end tests for the mmu_sim binary

#![allow(deprecated)] // cargo_bin still works, just deprecated for custom build-dir

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

fn mmu_sim(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("mmu_sim").expect("Failed to find mmu_sim binary");
    cmd.arg("--pagefile").arg(dir.path().join("pagefile.sys"));
    cmd
}

#[test]
fn test_help_flag() {
    Command::cargo_bin("mmu_sim")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--pagefile"))
        .stdout(predicate::str::contains("--tick-interval"));
}

#[test]
fn test_commands_from_stdin() {
    let dir = TempDir::new().unwrap();
    mmu_sim(&dir)
        .write_stdin("WRITEW 0b1_0000_0000_0000 0b1010 0b0101\nREADN 0x1000 2\nHALT\n")
        .assert()
        .success()
        .stdout("0x0a 0x05\n");

    let raw = std::fs::read(dir.path().join("pagefile.sys")).unwrap();
    assert_eq!(raw.len(), 256 * 4096);
    assert_eq!(&raw[4096..4098], &[0x0a, 0x05]);
}

#[test]
fn test_commands_from_script() {
    let dir = TempDir::new().unwrap();
    let mut script = NamedTempFile::new().unwrap();
    writeln!(script, "WRITE 0xFFFFF 0xff").unwrap();
    writeln!(script, "WRITEZ 0xFFFFF 1").unwrap();
    writeln!(script, "READ 0xFFFFF").unwrap();

    mmu_sim(&dir)
        .arg(script.path())
        .assert()
        .success()
        .stdout("0x00\n");
}

#[test]
fn test_bad_command_is_reported_and_skipped() {
    let dir = TempDir::new().unwrap();
    mmu_sim(&dir)
        .write_stdin("FROB 1\nREAD 0\n")
        .assert()
        .success()
        .stdout("0x00\n")
        .stderr(predicate::str::contains("Unknown command: FROB"));
}

#[test]
fn test_verbose_prints_summary() {
    let dir = TempDir::new().unwrap();
    mmu_sim(&dir)
        .arg("-v")
        .write_stdin("READ 0\nHALT\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("Page faults: 1"));
}

#[test]
fn test_unwritable_pagefile_fails() {
    let dir = TempDir::new().unwrap();
    Command::cargo_bin("mmu_sim")
        .unwrap()
        .arg("--pagefile")
        .arg(dir.path().join("missing").join("pagefile.sys"))
        .write_stdin("HALT\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("backing store create failed"));
}
