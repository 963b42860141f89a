//! End-to-end CLI coverage: `faxc preprocess` and `faxc calc` driven as a
//! subprocess, the way a user actually invokes the binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn faxc() -> Command {
    Command::cargo_bin("faxc").unwrap()
}

fn write_source(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn help_mentions_both_subcommands() {
    faxc()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("preprocess"))
        .stdout(predicate::str::contains("calc"));
}

#[test]
fn preprocess_expands_object_like_macros() {
    let file = write_source("#define A 2\n#define B 3\nA+B\n");
    faxc()
        .arg("preprocess")
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("2 + 3"));
}

#[test]
fn preprocess_accepts_repeated_define_flags() {
    let file = write_source("A+B\n");
    faxc()
        .arg("preprocess")
        .arg(file.path())
        .arg("-D")
        .arg("A=10")
        .arg("-D")
        .arg("B=20")
        .assert()
        .success()
        .stdout(predicate::str::contains("10 + 20"));
}

#[test]
fn preprocess_reports_errors_and_exits_nonzero() {
    let file = write_source("#error boom\n");
    faxc()
        .arg("preprocess")
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("boom"));
}

#[test]
fn preprocess_on_a_missing_file_fails() {
    faxc()
        .arg("preprocess")
        .arg("/no/such/file.c")
        .assert()
        .failure();
}

#[test]
fn calc_evaluates_each_line_until_quit() {
    faxc()
        .arg("calc")
        .write_stdin("1+2*3\n(1<2)?10:20\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("(+ 1 (* 2 3)) = 7"))
        .stdout(predicate::str::contains("(?: (< 1 2) 10 20) = 10"));
}

#[test]
fn calc_honors_predefines() {
    faxc()
        .arg("calc")
        .arg("-D")
        .arg("N=21")
        .write_stdin("N*2\nq\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("(* 21 2) = 42"));
}
