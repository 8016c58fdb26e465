//! Integration tests for `lu config` and the catalog commands.

mod common;

use common::TestEnv;
use predicates::prelude::*;
use std::fs;

const MONDAY: &str = "2024-03-04";

fn setting<'a>(show: &'a serde_json::Value, key: &str) -> &'a serde_json::Value {
    show["settings"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["key"] == key)
        .unwrap()
}

// === Config ===

#[test]
fn test_config_set_and_get() {
    let env = TestEnv::new();

    env.lu()
        .args(["config", "set", "coach-model", "gemini-1.5-flash"])
        .assert()
        .success();
    assert!(env.config_path().exists());

    let got = env.json_on(MONDAY, &["config", "get", "coach-model"]);
    assert_eq!(got["value"], "gemini-1.5-flash");

    let unset = env.json_on(MONDAY, &["config", "get", "catalog"]);
    assert!(unset["value"].is_null());
}

#[test]
fn test_config_output_format_switches_to_human() {
    let env = TestEnv::new();

    env.lu()
        .args(["config", "set", "output-format", "human"])
        .assert()
        .success();

    env.lu_on(MONDAY)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Week average:"));
}

#[test]
fn test_config_rejects_unknown_key_and_bad_values() {
    let env = TestEnv::new();

    env.lu()
        .args(["config", "set", "colour", "red"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("output-format"));

    env.lu()
        .args(["config", "set", "coach-endpoint", "ftp://example.com"])
        .assert()
        .failure();

    env.lu()
        .args(["config", "set", "action-log", "sometimes"])
        .assert()
        .failure();

    assert!(!env.config_path().exists());
}

#[test]
fn test_config_never_stores_api_key() {
    let env = TestEnv::new();

    env.lu()
        .args(["config", "set", "api-key", "secret-value"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("LU_API_KEY"));

    assert!(!env.config_path().exists());
}

#[test]
fn test_config_show_reports_sources() {
    let env = TestEnv::new();

    env.lu()
        .args(["config", "set", "coach-model", "gemini-1.5-flash"])
        .assert()
        .success();

    let show = env.json_on(MONDAY, &["config", "show"]);
    assert_eq!(setting(&show, "coach-model")["source"], "config");
    assert_eq!(setting(&show, "output-format")["source"], "default");
    assert_eq!(setting(&show, "data-dir")["source"], "env:LU_DATA_DIR");
    assert!(setting(&show, "api-key")["value"].is_null());
}

#[test]
fn test_config_show_masks_api_key() {
    let env = TestEnv::new();

    let output = env
        .lu_on(MONDAY)
        .env("LU_API_KEY", "abcd1234efgh5678")
        .args(["config", "show"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).unwrap();
    assert!(!text.contains("abcd1234efgh5678"));

    let show: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(setting(&show, "api-key")["source"], "env:LU_API_KEY");
}

#[test]
fn test_invalid_config_file_fails() {
    let env = TestEnv::new();
    fs::write(env.config_path(), "coach-endpoint \"ftp://example.com\"\n").unwrap();

    env.lu_on(MONDAY)
        .arg("status")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("\"error\""))
        .stderr(predicate::str::contains("coach-endpoint"));
}

// === Catalog ===

#[test]
fn test_catalog_lists_default() {
    let env = TestEnv::new();

    let catalog = env.json_on(MONDAY, &["catalog"]);
    assert_eq!(catalog["categories"].as_array().unwrap().len(), 5);
    assert_eq!(catalog["negative_habits"].as_array().unwrap().len(), 4);
    assert_eq!(catalog["max_points"], 100.0);

    let check = env.json_on(MONDAY, &["catalog", "--check"]);
    assert_eq!(check["valid"], true);
    assert_eq!(check["tasks"], 10);
}

#[test]
fn test_custom_catalog_from_config() {
    let env = TestEnv::new();
    let path = env.config_dir.path().join("catalog.json");
    fs::write(
        &path,
        r#"{
            "categories": [{
                "id": "health", "name": "Health", "icon": "heart", "points": 20,
                "tasks": [
                    {"id": "walk", "name": "Walk", "points": 10},
                    {"id": "stretch", "name": "Stretch", "points": 10}
                ]
            }]
        }"#,
    )
    .unwrap();

    env.lu()
        .args(["config", "set", "catalog"])
        .arg(&path)
        .assert()
        .success();

    let day = env.json_on(MONDAY, &["mark", "health", "walk", "full"]);
    assert_eq!(day["points"], 10.0);
    assert_eq!(day["max_points"], 20.0);

    // Default ids are gone
    env.lu_on(MONDAY)
        .args(["mark", "fitness", "workout", "full"])
        .assert()
        .failure();
}

#[test]
fn test_catalog_check_reports_issues() {
    let env = TestEnv::new();
    let path = env.config_dir.path().join("catalog.json");
    fs::write(
        &path,
        r#"{
            "categories": [{
                "id": "health", "name": "Health", "icon": "heart", "points": 30,
                "tasks": [{"id": "walk", "name": "Walk", "points": 10}]
            }],
            "negative_habits": [{"id": "doomscroll", "name": "Doomscroll", "penalty": 0}]
        }"#,
    )
    .unwrap();

    env.lu()
        .args(["config", "set", "catalog"])
        .arg(&path)
        .assert()
        .success();

    env.lu_on(MONDAY)
        .args(["catalog", "--check"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("2 issue(s)"))
        .stderr(predicate::str::contains("health"))
        .stderr(predicate::str::contains("doomscroll"));
}
