use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn write_library(dir: &Path) {
    fs::write(
        dir.join("main.yaml"),
        "name: main\ntree:\n  - name: println\n    values:\n      text: hello\n  - name: println\n    values:\n      text: \"#who#\"\n",
    )
    .expect("write main");
    fs::write(
        dir.join("println.yaml"),
        "name: println\ntitle: Print\ncode: Println(text)\nparams:\n  - name: text\n    title: Text\n    kind: textarea\n    options:\n      required: true\n",
    )
    .expect("write println");
}

#[test]
fn compiles_to_file() {
    let dir = tempdir().expect("tempdir");
    write_library(dir.path());
    let output_path = dir.path().join("out/program.g");

    Command::cargo_bin("scriptforge")
        .expect("binary exists")
        .arg("compile")
        .arg("--library")
        .arg(dir.path())
        .arg("--script")
        .arg("main")
        .arg("--output")
        .arg(&output_path)
        .assert()
        .success();

    let program = fs::read_to_string(&output_path).expect("read program");
    assert_eq!(program.matches("func println(").count(), 1);
    assert!(program.contains("   println(STR0)\n   println(macro(STR1))\n"));
    assert!(program.contains("SetLogLevel(3)"));
}

#[test]
fn compiles_to_stdout_with_log_level() {
    let dir = tempdir().expect("tempdir");
    write_library(dir.path());

    Command::cargo_bin("scriptforge")
        .expect("binary exists")
        .args(["compile", "--script", "main", "--log-level", "debug", "--library"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("SetLogLevel(4)"))
        .stdout(predicate::str::contains("STR0 = `hello`"));
}

#[test]
fn accepts_named_log_level_in_definition() {
    let dir = tempdir().expect("tempdir");
    write_library(dir.path());
    fs::write(
        dir.path().join("println.yaml"),
        "name: println\nlog_level: debug\ncode: Println(text)\nparams:\n  - name: text\n    kind: textarea\n",
    )
    .expect("rewrite println");

    Command::cargo_bin("scriptforge")
        .expect("binary exists")
        .args(["compile", "--script", "main", "--library"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("int prevLog = SetLogLevel(4)\nPrintln(text)"));
}

#[test]
fn reports_missing_required_field() {
    let dir = tempdir().expect("tempdir");
    write_library(dir.path());
    fs::write(
        dir.path().join("main.yaml"),
        "name: main\ntree:\n  - name: println\n",
    )
    .expect("rewrite main");

    Command::cargo_bin("scriptforge")
        .expect("binary exists")
        .args(["compile", "--script", "main", "--library"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("field 'Text' of script 'Print' is required"));
}

#[test]
fn reports_unknown_root_script() {
    let dir = tempdir().expect("tempdir");
    write_library(dir.path());

    Command::cargo_bin("scriptforge")
        .expect("binary exists")
        .args(["compile", "--script", "absent", "--library"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("absent"));
}

#[test]
fn reports_missing_library() {
    let dir = tempdir().expect("tempdir");

    Command::cargo_bin("scriptforge")
        .expect("binary exists")
        .args(["compile", "--script", "main", "--library"])
        .arg(dir.path().join("missing"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load script library"));
}

#[test]
fn expands_placeholders() {
    Command::cargo_bin("scriptforge")
        .expect("binary exists")
        .args(["expand", "--var", "A=x#B#y", "--var", "B=mid", "#A# and #C#"])
        .assert()
        .success()
        .stdout("xmidy and #C#\n");
}

#[test]
fn reports_variable_loop() {
    Command::cargo_bin("scriptforge")
        .expect("binary exists")
        .args(["expand", "--var", "A=#A#", "#A#"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("A variable refers to itself"));
}

#[test]
fn lists_runtime_functions() {
    Command::cargo_bin("scriptforge")
        .expect("binary exists")
        .arg("functions")
        .assert()
        .success()
        .stdout(predicate::str::contains("macro(str) str"))
        .stdout(predicate::str::contains("SetLogLevel(int) int"));
}
