use assert_cmd::Command;
use derefguard_core::{persist, BranchKind, CfgBuilder, Expr};
use predicates::prelude::*;
use std::path::PathBuf;

fn write_flagged_cfg(dir: &std::path::Path) -> PathBuf {
    // *p; if (p) { } — the canonical dead check.
    let mut b = CfgBuilder::new();
    let p = b.param_pointer("p");
    let entry = b.create_block();
    let then_block = b.create_block();
    let exit = b.create_block();
    b.stmt(entry, Expr::deref(Expr::var(p))).unwrap();
    b.branch(entry, BranchKind::If, Expr::var(p), then_block, exit)
        .unwrap();
    b.goto(then_block, exit).unwrap();
    b.ret(exit).unwrap();
    let (cfg, decls) = b.build().unwrap();

    let path = dir.join("flagged.json");
    persist::save_cfg(&cfg, &decls, &path).unwrap();
    path
}

fn write_clean_cfg(dir: &std::path::Path) -> PathBuf {
    let mut b = CfgBuilder::new();
    let p = b.param_pointer("p");
    let entry = b.create_block();
    let then_block = b.create_block();
    let exit = b.create_block();
    b.branch(entry, BranchKind::If, Expr::var(p), then_block, exit)
        .unwrap();
    b.stmt(then_block, Expr::deref(Expr::var(p))).unwrap();
    b.goto(then_block, exit).unwrap();
    b.ret(exit).unwrap();
    let (cfg, decls) = b.build().unwrap();

    let path = dir.join("clean.json");
    persist::save_cfg(&cfg, &decls, &path).unwrap();
    path
}

#[test]
fn analyze_reports_the_dead_check_and_exits_nonzero() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_flagged_cfg(dir.path());

    Command::cargo_bin("derefguard")
        .unwrap()
        .arg("analyze")
        .arg(&input)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("null check"))
        .stdout(predicate::str::contains("p"));
}

#[test]
fn analyze_is_quiet_on_a_clean_function() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_clean_cfg(dir.path());

    Command::cargo_bin("derefguard")
        .unwrap()
        .arg("analyze")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("no findings"));
}

#[test]
fn analyze_emits_json_findings() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_flagged_cfg(dir.path());

    Command::cargo_bin("derefguard")
        .unwrap()
        .args(["analyze", "--json"])
        .arg(&input)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"polarity\""));
}

#[test]
fn dump_prints_the_cfg() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_flagged_cfg(dir.path());

    Command::cargo_bin("derefguard")
        .unwrap()
        .arg("dump")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("block0:"))
        .stdout(predicate::str::contains("*p"));
}

#[test]
fn missing_input_fails_with_a_diagnostic() {
    Command::cargo_bin("derefguard")
        .unwrap()
        .args(["analyze", "does-not-exist.json"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("failed to load CFG"));
}
