//! Integration tests for the rwmap binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn rwmap(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("rwmap").unwrap();
    cmd.current_dir(dir.path())
        .env("XDG_CONFIG_HOME", dir.path().join("xdg"))
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_cli_help() {
    let dir = TempDir::new().unwrap();
    rwmap(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("map[K]V"))
        .stdout(predicate::str::contains("--pkg"));
}

#[test]
fn test_default_output_path() {
    let dir = TempDir::new().unwrap();
    rwmap(&dir)
        .args(["--name", "Counter", "map[string]int"])
        .assert()
        .success();

    let code = fs::read_to_string(dir.path().join("001_counter.go")).unwrap();
    assert!(code.starts_with("// Code generated by rwmap; DO NOT EDIT.\n\npackage main\n"));
    assert!(code.contains("func (m *Counter) Load(key string) (value int, ok bool) {\n"));
}

#[test]
fn test_stdout_output() {
    let dir = TempDir::new().unwrap();
    rwmap(&dir)
        .args(["--pkg", "cache", "--ex", "-o", "-", "map[int64]float64"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "// Code generated by rwmap; DO NOT EDIT.\n\npackage cache\n",
        ))
        .stdout(predicate::str::contains("\tret = m.data[key] + value\n"));
    assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[test]
fn test_config_file_supplies_defaults() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("rwmap.toml"),
        "name = \"Scores\"\npackage = \"game\"\n",
    )
    .unwrap();

    rwmap(&dir).arg("map[string]uint32").assert().success();

    let code = fs::read_to_string(dir.path().join("001_scores.go")).unwrap();
    assert!(code.contains("\npackage game\n"));
    assert!(code.contains("type Scores struct {\n"));
}

#[test]
fn test_explicit_config_and_flags_override() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("custom.toml");
    fs::write(&config, "name = \"FromFile\"\nextended = true\n").unwrap();

    rwmap(&dir)
        .arg("--config")
        .arg(&config)
        .args(["--name", "FromFlag", "map[string]int"])
        .assert()
        .success();

    let code = fs::read_to_string(dir.path().join("001_fromflag.go")).unwrap();
    assert!(code.contains("type FromFlag struct {\n"));
    assert!(code.contains("\t\tm.data[key] += values[idx]\n"));
}

#[test]
fn test_no_ex_overrides_config() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("rwmap.toml"), "extended = true\n").unwrap();

    rwmap(&dir)
        .args(["--no-ex", "-o", "-", "map[string]int"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "\tpanic(\"rwmap: AddStores requires a map generated with -ex\")\n",
        ))
        .stdout(predicate::str::contains("m.data[key] += values[idx]").not());

    rwmap(&dir)
        .args(["--ex", "--no-ex", "map[string]int"])
        .assert()
        .failure();
}

#[test]
fn test_broken_config_fails() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("rwmap.toml"), "name = [").unwrap();

    rwmap(&dir)
        .arg("map[string]int")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("rwmap.toml"));
}

#[test]
fn test_non_map_argument_fails_without_output() {
    let dir = TempDir::new().unwrap();
    rwmap(&dir)
        .arg("[]string")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("rwmap::invalid_argument"));
    assert!(!dir.path().join("001_map.go").exists());
}

#[test]
fn test_malformed_type_fails() {
    let dir = TempDir::new().unwrap();
    rwmap(&dir)
        .arg("map[func(]int")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("rwmap::malformed_type"));
}

#[test]
fn test_dump_ast_prints_json() {
    let dir = TempDir::new().unwrap();
    let output = rwmap(&dir)
        .args(["--dump-ast", "map[string]bool"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let tree: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert!(tree["decls"].as_array().is_some_and(|decls| !decls.is_empty()));
}
