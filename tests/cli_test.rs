use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

fn json_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", contents).unwrap();
    file
}

#[test]
fn test_cli_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
    let event = json_file(
        r#"{"path": "/orders", "httpMethod": "POST",
            "headers": {"Authorization": "Bearer t"}, "body": "{\"id\": 7}"}"#,
    );
    let context = json_file(r#"{"awsRequestId": "req-42"}"#);

    let mut cmd = Command::new(cargo_bin!());
    cmd.arg(event.path()).arg("--context").arg(context.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(r#""statusCode":200"#))
        .stdout(predicate::str::contains(r#""x-request-id":"req-42""#))
        .stdout(predicate::str::contains(r#"\"id\":7"#));

    Ok(())
}

#[test]
fn test_cli_missing_header_is_unauthorized() {
    let event = json_file(r#"{"path": "/orders", "headers": {}}"#);

    let mut cmd = Command::new(cargo_bin!());
    cmd.arg(event.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(r#""statusCode":401"#))
        .stdout(predicate::str::contains("Authorization failure"));
}

#[test]
fn test_cli_custom_auth_header() {
    let event = json_file(r#"{"headers": {"x-api-key": "k"}}"#);

    let mut cmd = Command::new(cargo_bin!());
    cmd.arg(event.path()).arg("--auth-header").arg("X-Api-Key");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(r#""statusCode":200"#));
}

#[test]
fn test_cli_malformed_body_is_internal_server_error() {
    let event = json_file(r#"{"headers": {"authorization": "t"}, "body": "{oops"}"#);

    let mut cmd = Command::new(cargo_bin!());
    cmd.arg(event.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(r#""statusCode":500"#));
}

#[test]
fn test_cli_reads_event_from_stdin() {
    let mut cmd = assert_cmd::Command::new(cargo_bin!());
    cmd.arg("-")
        .arg("--pretty")
        .write_stdin(r#"{"headers": {"authorization": "t"}, "path": "/stdin"}"#);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(r#""statusCode": 200"#))
        .stdout(predicate::str::contains("/stdin"));
}

#[test]
fn test_cli_rejects_malformed_event() {
    let event = json_file("{not json");

    let mut cmd = Command::new(cargo_bin!());
    cmd.arg(event.path());

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("JSON error"));
}
