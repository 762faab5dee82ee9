use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn parse_jsonl(stdout: &[u8]) -> Vec<Value> {
    let s = String::from_utf8_lossy(stdout);
    s.lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str::<Value>(l).expect("valid jsonl line"))
        .collect()
}

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn shconf() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("shconf"))
}

#[test]
fn tree_emits_token_keyed_tree() {
    let temp = tempdir().unwrap();
    let input = temp.path().join("r1.txt");
    write_file(&input, "hostname R1\ninterface Fa0/0\n duplex auto\n");

    let assert = shconf().arg("tree").arg(&input).assert().success();
    let items = parse_jsonl(&assert.get_output().stdout);

    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["kind"], "tree");
    assert_eq!(items[0]["data"]["interface"]["Fa0/0"]["duplex"], "auto");
    assert_eq!(items[0]["meta"]["lines"], 3);
}

#[test]
fn tree_tab_width_changes_nesting() {
    let temp = tempdir().unwrap();
    let input = temp.path().join("tabs.txt");
    write_file(&input, "a\n\tb\n    c\n");

    // Default width: tab and four spaces are siblings
    let assert = shconf().args(["tree", "--legacy"]).arg(&input).assert().success();
    let items = parse_jsonl(&assert.get_output().stdout);
    assert_eq!(items[0]["data"]["a"]["b"], "");
    assert_eq!(items[0]["data"]["a"]["c"], "");

    let assert = shconf()
        .args(["--tab-width", "2", "tree", "--legacy"])
        .arg(&input)
        .assert()
        .success();
    let items = parse_jsonl(&assert.get_output().stdout);
    assert_eq!(items[0]["data"]["a"]["b"]["c"], "");
}

#[test]
fn tree_reports_conflicts_as_anomalies() {
    let temp = tempdir().unwrap();
    let input = temp.path().join("conflict.txt");
    write_file(&input, "mode auto\nmode auto extra\n");

    let assert = shconf().arg("tree").arg(&input).assert().success();
    let items = parse_jsonl(&assert.get_output().stdout);
    assert_eq!(items[0]["data"]["mode"]["auto"], "extra");
    assert_eq!(items[0]["meta"]["anomalies"][0]["kept"], "map");

    let assert = shconf()
        .args(["tree", "--conflict", "first"])
        .arg(&input)
        .assert()
        .success();
    let items = parse_jsonl(&assert.get_output().stdout);
    assert_eq!(items[0]["data"]["mode"], "auto");
}

#[test]
fn tree_rejects_unknown_conflict_policy() {
    let temp = tempdir().unwrap();
    let input = temp.path().join("r1.txt");
    write_file(&input, "hostname R1\n");

    shconf()
        .args(["tree", "--conflict", "loudest"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("loudest"));
}

#[test]
fn query_miss_is_not_a_failure() {
    let temp = tempdir().unwrap();
    let input = temp.path().join("r1.txt");
    write_file(&input, "hostname R1\n");

    let assert = shconf()
        .args(["query", "--xpath", "/banner"])
        .arg(&input)
        .assert()
        .success();
    let items = parse_jsonl(&assert.get_output().stdout);
    assert_eq!(items[0]["data"]["success"], false);
    assert_eq!(items[0]["data"]["count"], 0);
    assert_eq!(items[0]["data"]["error"], Value::Null);
}

#[test]
fn query_keeps_input_order_across_files() {
    let temp = tempdir().unwrap();
    let first = temp.path().join("b.txt");
    let second = temp.path().join("a.txt");
    write_file(&first, "hostname B\n");
    write_file(&second, "hostname A\n");

    let assert = shconf()
        .args(["query", "--xpath", "/hostname"])
        .arg(&first)
        .arg(&second)
        .assert()
        .success();
    let items = parse_jsonl(&assert.get_output().stdout);
    let names: Vec<_> = items.iter().map(|v| v["data"]["data"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["B", "A"]);
}

#[test]
fn query_raw_prints_bare_values() {
    let temp = tempdir().unwrap();
    let input = temp.path().join("r1.txt");
    write_file(&input, "hostname R1\n");

    shconf()
        .args(["--format", "raw", "query", "--xpath", "/hostname"])
        .arg(&input)
        .assert()
        .success()
        .stdout("R1\n");
}

#[test]
fn query_missing_file_fails() {
    let temp = tempdir().unwrap();

    shconf()
        .args(["query", "--xpath", "/hostname"])
        .arg(temp.path().join("missing.txt"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn format_env_var_is_honoured() {
    let temp = tempdir().unwrap();
    let input = temp.path().join("r1.txt");
    write_file(&input, "hostname R1\n");

    shconf()
        .env("SHCONF_FORMAT", "yaml")
        .args(["query", "--xpath", "/hostname"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("kind: query"));
}

#[test]
fn unknown_format_fails() {
    let temp = tempdir().unwrap();
    let input = temp.path().join("r1.txt");
    write_file(&input, "hostname R1\n");

    shconf()
        .args(["--format", "xml", "tree"])
        .arg(&input)
        .assert()
        .failure();
}

#[test]
fn search_all_lists_matching_keys() {
    let temp = tempdir().unwrap();
    let input = temp.path().join("r1.txt");
    write_file(
        &input,
        "interface Fa0/0\n duplex auto\ninterface Fa0/1\n shutdown\nrouter ospf 1\n",
    );

    let assert = shconf()
        .args(["search", "--all"])
        .arg(&input)
        .arg("interface")
        .assert()
        .success();
    let items = parse_jsonl(&assert.get_output().stdout);
    let keys: Vec<_> = items.iter().map(|v| v["data"]["key"].as_str().unwrap()).collect();
    assert_eq!(keys, vec!["interface Fa0/0", "interface Fa0/1"]);
    assert!(items.iter().all(|v| v["kind"] == "match"));
}

#[test]
fn unknown_section_fails() {
    let temp = tempdir().unwrap();
    let input = temp.path().join("show.txt");
    write_file(&input, "R1#show version\nIOS\n");

    shconf()
        .args(["tree", "--section", "running"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown section 'running'"));
}
