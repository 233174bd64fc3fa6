use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

const DB_KEYS: [&str; 6] = [
    "CLOUD_DB_NAME",
    "CLOUD_DB_USER",
    "CLOUD_DB_HOST",
    "CLOUD_DB_PORT",
    "CLOUD_DB_PASS",
    "DB_MAX_CONNECTIONS",
];

fn run_in(dir: &Path, args: &[&str]) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_next-toolchain"));
    command.args(args).current_dir(dir);
    for key in DB_KEYS {
        command.env_remove(key);
    }
    command.output().expect("binary runs")
}

fn envelope(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout is a JSON envelope")
}

#[test]
fn version_show_without_package_json_fails_with_envelope() {
    let dir = TempDir::new().unwrap();

    let output = run_in(dir.path(), &["version", "show"]);
    let json = envelope(&output);

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(json["success"], false);
    assert_eq!(json["error"]["code"], "internal.io_error");
}

#[test]
fn version_bump_rewrites_package_json() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("package.json"),
        "{\n  \"name\": \"demo\",\n  \"version\": \"1.2.3\",\n  \"private\": false\n}\n",
    )
    .unwrap();

    let output = run_in(dir.path(), &["version", "bump", "patch"]);
    let json = envelope(&output);

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["oldVersion"], "1.2.3");
    assert_eq!(json["data"]["newVersion"], "1.2.4");

    let content = fs::read_to_string(dir.path().join("package.json")).unwrap();
    assert_eq!(
        content,
        "{\n  \"name\": \"demo\",\n  \"version\": \"1.2.4\",\n  \"private\": false\n}\n"
    );
}

#[test]
fn missing_required_argument_exits_with_usage_code() {
    let dir = TempDir::new().unwrap();

    let output = run_in(dir.path(), &["version", "bump"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("required"));
}

#[test]
fn index_build_writes_sorted_barrel() {
    let dir = TempDir::new().unwrap();
    let components = dir.path().join("components");
    fs::create_dir_all(components.join("Card")).unwrap();
    fs::write(components.join("Card/index.ts"), "export {};\n").unwrap();
    fs::write(components.join("Button.tsx"), "export {};\n").unwrap();
    fs::write(components.join("styles.css"), "").unwrap();

    let output = run_in(dir.path(), &["index", "build", "components", "missing"]);
    let json = envelope(&output);

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(json["data"]["written"], 1);
    assert_eq!(json["data"]["results"][0]["status"], "written");
    assert_eq!(json["data"]["results"][1]["status"], "missing");
    assert_eq!(
        fs::read_to_string(components.join("index.ts")).unwrap(),
        "export * from './Button';\nexport * from './Card';\n"
    );
}

#[test]
fn env_list_bootstraps_registry() {
    let dir = TempDir::new().unwrap();

    let output = run_in(dir.path(), &["env", "list"]);
    let json = envelope(&output);

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(json["data"]["projects"][0]["key"], "example");
    assert!(dir
        .path()
        .join(".next-toolchain-temp/env.config.json")
        .exists());
}

#[test]
fn db_command_reports_missing_env_key() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("prod.env"), "CLOUD_DB_NAME=blog\n").unwrap();

    let output = run_in(dir.path(), &["db", "test", "--env-file", "prod.env"]);
    let json = envelope(&output);

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(json["error"]["code"], "config.missing_key");
    assert_eq!(json["error"]["details"]["key"], "CLOUD_DB_USER");
}

#[test]
fn db_config_selects_builtin_pair() {
    let dir = TempDir::new().unwrap();

    let output = run_in(dir.path(), &["db", "config", "example"]);
    let json = envelope(&output);

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(json["data"]["key"], "example");
    let conf = fs::read_to_string(dir.path().join(".next-toolchain-temp/db.conf")).unwrap();
    assert!(conf.contains("CLOUD_DB_NAME="));
}

#[test]
fn db_config_unknown_pair_lists_available() {
    let dir = TempDir::new().unwrap();

    let output = run_in(dir.path(), &["db", "config", "nope"]);
    let json = envelope(&output);

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(json["error"]["code"], "db.pair_not_found");
    assert_eq!(json["error"]["details"]["available"][0], "example");
}
