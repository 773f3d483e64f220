use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn curlcap() -> Command {
    cargo_bin_cmd!()
}

#[test]
fn test_help() {
    curlcap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("curl commands"));
}

#[test]
fn test_convert_reference_post() {
    curlcap()
        .args(["--no-color", "convert", "tests/fixtures/requests.jsonl"])
        .assert()
        .success()
        .stdout(predicate::str::contains(concat!(
            "\n==================== CURL COMMAND ====================\n",
            r#"curl -X POST -H 'Content-Type: application/json' -H 'X-Test: it's' -d '{"a":1}' 'https://example.com/api'"#,
            "\n======================================================\n\n",
        )));
}

#[test]
fn test_convert_drops_pseudo_header_and_binary_body() {
    curlcap()
        .args(["--no-color", "convert", "tests/fixtures/requests.jsonl"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "curl -X GET -H 'Accept: */*' 'https://example.com/health'\n",
        ))
        .stdout(predicate::str::contains(
            "curl -X PUT -H 'Content-Type: image/png' # (Binary content ignored) 'https://example.com/upload'\n",
        ))
        .stdout(predicate::str::contains("CURL COMMAND").count(3))
        .stderr(predicate::str::contains("Converted 3 request(s), skipped 0"));
}

#[test]
fn test_convert_from_stdin_with_strict_quoting() {
    curlcap()
        .args(["--no-color", "--strict-quoting", "--skip-header", "cookie", "convert"])
        .write_stdin(
            r#"{"method":"GET","url":"http://h/o'k","headers":[["Cookie","s=1"],["X-A","b'c"]]}"#,
        )
        .assert()
        .success()
        .stdout(predicate::str::contains(
            r"curl -X GET -H 'X-A: b'\''c' 'http://h/o'\''k'",
        ))
        .stdout(predicate::str::contains("Cookie").not());
}

#[test]
fn test_convert_skips_malformed_lines() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("mixed.jsonl");
    fs::write(
        &input,
        "{\"method\":\"GET\",\"url\":\"http://a/\"}\n{broken\n",
    )
    .unwrap();

    curlcap()
        .args(["--no-color", "convert"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("curl -X GET 'http://a/'"))
        .stderr(predicate::str::contains("Skipping line 2"));
}

#[test]
fn test_convert_missing_file_fails() {
    curlcap()
        .args(["convert", "does/not/exist.jsonl"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to open"));
}

#[test]
fn test_listen_rejects_bad_target() {
    curlcap()
        .args(["listen", "--port", "0", "--target", "ftp://example.com"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("http:// or https://"));
}
