//! CLI contract tests for the pure subcommands.

use assert_cmd::Command;

fn docrelay() -> Command {
    match Command::cargo_bin("docrelay") {
        Ok(cmd) => cmd,
        Err(err) => panic!("docrelay binary should build: {err}"),
    }
}

#[test]
fn validate_prints_normalized_number_and_exits_zero() {
    docrelay()
        .args(["validate", "0612345678"])
        .assert()
        .success()
        .stdout(predicates::str::contains("\"is_valid\": true"))
        .stdout(predicates::str::contains("+33612345678"));
}

#[test]
fn validate_rejects_short_number_with_nonzero_exit() {
    docrelay()
        .args(["validate", "123"])
        .assert()
        .failure()
        .stdout(predicates::str::contains(
            "Phone number must be between 10 and 15 digits",
        ));
}

#[test]
fn validate_accepts_formatted_input() {
    docrelay()
        .args(["validate", "+1 (234) 567-8901"])
        .assert()
        .success()
        .stdout(predicates::str::contains("+12345678901"));
}

#[test]
fn missing_subcommand_shows_usage() {
    docrelay()
        .assert()
        .failure()
        .stderr(predicates::str::contains("Usage"));
}

#[test]
fn send_with_unknown_tenant_fails_before_reading_the_file() {
    docrelay()
        .env_remove("DOCRELAY_CONFIG_PATH")
        .args([
            "send",
            "--tenant",
            "ghost",
            "--file",
            "missing.pdf",
            "--to",
            "+33612345678",
        ])
        .assert()
        .failure()
        .stderr(predicates::str::contains("not configured"));
}

#[test]
fn send_with_inactive_tenant_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config_path = dir.path().join("docrelay.toml");
    std::fs::write(
        &config_path,
        r#"
[[tenant]]
id = "dormant"
phone_number_id = "5647382910"
access_token = "EAAG-test-token"
active = false
"#,
    )
    .expect("write config");

    docrelay()
        .env("DOCRELAY_CONFIG_PATH", &config_path)
        .args([
            "send",
            "--tenant",
            "dormant",
            "--file",
            "missing.pdf",
            "--to",
            "+33612345678",
        ])
        .assert()
        .failure()
        .stderr(predicates::str::contains("not active"));
}

#[test]
fn send_requires_recipients() {
    docrelay()
        .args(["send", "--tenant", "acme", "--file", "missing.pdf"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("--to"));
}
