//! CLI integration tests for dialect-migrate.
//!
//! These tests verify command-line argument parsing, help output,
//! translation output and exit codes for various error conditions.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

/// Get a command for the dialect-migrate binary.
fn cmd() -> Command {
    Command::cargo_bin("dialect-migrate").unwrap()
}

/// Write `contents` to a temporary file.
fn temp_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{}", contents).unwrap();
    file
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_shows_all_commands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("convert"))
        .stdout(predicate::str::contains("split"))
        .stdout(predicate::str::contains("rules"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("health-check"));
}

#[test]
fn test_run_subcommand_help() {
    cmd()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("--continue-on-error"))
        .stdout(predicate::str::contains("--script"));
}

#[test]
fn test_convert_subcommand_help() {
    cmd()
        .args(["convert", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--target"))
        .stdout(predicate::str::contains("--output"));
}

#[test]
fn test_version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("dialect-migrate"));
}

// =============================================================================
// Global Flags Tests
// =============================================================================

#[test]
fn test_global_flags_exist() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--progress"))
        .stdout(predicate::str::contains("--output-json"))
        .stdout(predicate::str::contains("--log-format"))
        .stdout(predicate::str::contains("[default: text]"))
        .stdout(predicate::str::contains("--verbosity"))
        .stdout(predicate::str::contains("[default: info]"))
        .stdout(predicate::str::contains("[default: config.yaml]"));
}

#[test]
fn test_short_config_flag() {
    // -c should work as short for --config
    cmd()
        .args(["-c", "some_config.yaml", "--help"])
        .assert()
        .success();
}

// =============================================================================
// Convert Tests
// =============================================================================

#[test]
fn test_convert_with_explicit_target() {
    let script = temp_file("number(19)");

    cmd()
        .args(["convert", "--target", "hsql", "--script"])
        .arg(script.path())
        .assert()
        .success()
        .stdout("bigint\n");
}

#[test]
fn test_convert_mysql_modify() {
    let script = temp_file("alter table spirit.spirit_property modify (id varchar2(64 CHAR));\n");

    cmd()
        .args(["convert", "-t", "mysql", "-s"])
        .arg(script.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "alter table spirit.spirit_property modify id varchar(64);",
        ));
}

#[test]
fn test_convert_to_output_file() {
    let script = temp_file("create table t (id number(3));");
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.sql");

    cmd()
        .args(["convert", "--target", "postgres", "--script"])
        .arg(script.path())
        .arg("--output")
        .arg(&output)
        .assert()
        .success();

    let written = std::fs::read_to_string(&output).unwrap();
    assert_eq!(written, "create table t (id integer);");
}

#[test]
fn test_convert_json_output() {
    let script = temp_file("number(19)");

    cmd()
        .args(["--output-json", "convert", "--target", "sqlite", "--script"])
        .arg(script.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"target\": \"sqlite\""))
        .stdout(predicate::str::contains("\"script\": \"integer\""));
}

#[test]
fn test_convert_uses_config_target() {
    let config = temp_file("target:\n  type: mysql\n  host: localhost\n  database: app\n  user: root\n");
    let script = temp_file("select nvl(a, 0) from t");

    cmd()
        .arg("--config")
        .arg(config.path())
        .args(["convert", "--script"])
        .arg(script.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("select ifnull(a, 0) from t"));
}

#[test]
fn test_untranslatable_script_exits_with_code_2() {
    let script = temp_file("create schema test;");

    cmd()
        .args(["convert", "--target", "sqlite", "--script"])
        .arg(script.path())
        .assert()
        .code(2) // EXIT_TRANSLATION_ERROR
        .stderr(predicate::str::contains("CREATE SCHEMA"));
}

#[test]
fn test_unknown_target_is_rejected() {
    let script = temp_file("number(19)");

    cmd()
        .args(["convert", "--target", "db2", "--script"])
        .arg(script.path())
        .assert()
        .failure();
}

#[test]
fn test_missing_script_exits_with_code_7() {
    cmd()
        .args(["convert", "--target", "hsql", "--script", "nonexistent_script.sql"])
        .assert()
        .code(7); // EXIT_IO_ERROR
}

// =============================================================================
// Split and Rules Tests
// =============================================================================

#[test]
fn test_split_json_output() {
    let script = temp_file("create schema a;\n-- note\ninsert into t values ('x;y');\n");

    cmd()
        .args(["--output-json", "split", "--script"])
        .arg(script.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"create schema a\""))
        .stdout(predicate::str::contains("x;y"));
}

#[test]
fn test_rules_lists_constructs() {
    cmd()
        .args(["rules", "--target", "postgres"])
        .assert()
        .success()
        .stdout(predicate::str::contains("NUMBER type"))
        .stdout(predicate::str::contains("coalesce"));
}

// =============================================================================
// Exit Code Tests - Config Errors (Exit Code 1)
// =============================================================================

#[test]
fn test_missing_config_exits_with_code_7() {
    // Missing file is an IO error (code 7), not config error (code 1)
    cmd()
        .args(["--config", "nonexistent_config_file.yaml", "health-check"])
        .assert()
        .code(7); // EXIT_IO_ERROR - file not found
}

#[test]
fn test_invalid_yaml_exits_with_code_1() {
    let file = temp_file("invalid: yaml: content: [\n");

    cmd()
        .args(["--config", file.path().to_str().unwrap(), "health-check"])
        .assert()
        .code(1); // EXIT_CONFIG_ERROR
}

#[test]
fn test_empty_config_exits_with_code_1() {
    let file = temp_file("");

    cmd()
        .args(["--config", file.path().to_str().unwrap(), "health-check"])
        .assert()
        .code(1); // EXIT_CONFIG_ERROR
}

#[test]
fn test_missing_required_fields_exits_with_code_1() {
    // Valid YAML but missing required config fields
    let file = temp_file("target:\n  type: postgres\n  host: localhost\n");

    cmd()
        .args(["--config", file.path().to_str().unwrap(), "health-check"])
        .assert()
        .code(1); // EXIT_CONFIG_ERROR
}

// =============================================================================
// Run Tests (SQLite)
// =============================================================================

#[test]
fn test_run_against_sqlite_file() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("target.db");
    let config = temp_file(&format!(
        "target:\n  type: sqlite\n  path: {}\n",
        db.display()
    ));
    let script = temp_file(
        "create table revinfo (rev number(10,0) not null, revtstmp number(19,0), primary key (rev));\n\
         insert into revinfo values (1, 0);\n",
    );

    cmd()
        .arg("--config")
        .arg(config.path())
        .args(["--output-json", "run", "--script"])
        .arg(script.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"completed\""))
        .stdout(predicate::str::contains("\"statements_succeeded\": 2"));

    // the same script again: the table already exists
    cmd()
        .arg("--config")
        .arg(config.path())
        .args(["run", "--script"])
        .arg(script.path())
        .assert()
        .code(3); // EXIT_EXECUTION_ERROR
}

#[test]
fn test_fatal_statement_exits_with_code_4() {
    let config = temp_file("target:\n  type: sqlite\n  path: \":memory:\"\n");
    let script = temp_file("-- FATAL\ninsert into missing values (1);\ncreate table t (id integer);\n");

    cmd()
        .arg("--config")
        .arg(config.path())
        .args(["run", "--continue-on-error", "--script"])
        .arg(script.path())
        .assert()
        .code(4); // EXIT_FATAL_ERROR
}

#[test]
fn test_dry_run_does_not_connect() {
    let config = temp_file("target:\n  type: sqlite\n  path: /nonexistent/dir/target.db\n");
    let script = temp_file("create table t (id number(19));");

    cmd()
        .arg("--config")
        .arg(config.path())
        .args(["run", "--dry-run", "--script"])
        .arg(script.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run completed!"));
}

#[test]
fn test_run_without_driver_exits_with_code_1() {
    let config = temp_file("target:\n  type: hsql\n  host: localhost\n  database: db\n  user: sa\n");
    let script = temp_file("create table t (id number(19));");

    cmd()
        .arg("--config")
        .arg(config.path())
        .args(["run", "--script"])
        .arg(script.path())
        .assert()
        .code(1); // EXIT_CONFIG_ERROR
}

// =============================================================================
// No Subcommand Tests
// =============================================================================

#[test]
fn test_no_subcommand_shows_help() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}
