//! Integration tests for the shipkit binary.
// The cargo_bin function is marked deprecated in favor of cargo_bin! macro,
// but both work correctly. Suppressing until assert_cmd stabilizes the new API.
#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

struct Fixture {
    project: TempDir,
    templates: TempDir,
    home: TempDir,
}

impl Fixture {
    fn node() -> Self {
        let fixture = Self {
            project: TempDir::new().unwrap(),
            templates: TempDir::new().unwrap(),
            home: TempDir::new().unwrap(),
        };
        fs::write(
            fixture.project.path().join("package.json"),
            r#"{"engines": {"node": "20"}, "dependencies": {"express": "^4.18.2"}}"#,
        )
        .unwrap();
        fs::write(
            fixture.templates.path().join("node.dockerfile.template"),
            "FROM node:${language_version}\nCMD ${start_command}\n",
        )
        .unwrap();
        fs::write(
            fixture.templates.path().join("node.service.yml.template"),
            "services:\n  ${project_name}:\n    command: ${start_command}\n",
        )
        .unwrap();
        fixture
    }

    fn shipkit(&self) -> Command {
        let mut cmd = Command::new(cargo_bin("shipkit"));
        cmd.env("HOME", self.home.path())
            .env("NO_COLOR", "1")
            .env_remove("SHIPKIT_TEMPLATES")
            .arg("-y")
            .arg("-p")
            .arg(self.project.path())
            .arg("--templates")
            .arg(self.templates.path());
        cmd
    }
}

#[test]
fn cli_shows_help() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("shipkit"));
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--generator"))
        .stdout(predicate::str::contains("--daemon"));
    Ok(())
}

#[test]
fn cli_shows_version() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("shipkit"));
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    Ok(())
}

#[test]
fn version_subcommand_prints_platform() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("shipkit"));
    cmd.arg("version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")))
        .stdout(predicate::str::contains(std::env::consts::OS));
    Ok(())
}

#[test]
fn completions_subcommand() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("shipkit"));
    cmd.args(["completions", "bash"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("shipkit"));
    Ok(())
}

#[test]
fn generates_dockerfile_and_prints_git_hints() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = Fixture::node();
    fixture
        .shipkit()
        .assert()
        .success()
        .stdout(predicate::str::contains("Detected node 20 (express)"))
        .stdout(predicate::str::contains("git add Dockerfile"))
        .stdout(predicate::str::contains("cx stacks create").not());

    let dockerfile = fs::read_to_string(fixture.project.path().join("Dockerfile"))?;
    assert_eq!(dockerfile, "FROM node:20\nCMD npm start\n");
    Ok(())
}

#[test]
fn service_generator_prints_stack_hint() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = Fixture::node();
    fixture
        .shipkit()
        .args(["-g", "dockerfile,service", "-e", "staging"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "--environment='staging' --service_yaml=service.yml",
        ));

    assert!(fixture.project.path().join("service.yml").is_file());
    Ok(())
}

#[test]
fn existing_dockerfile_fails_without_overwrite() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = Fixture::node();
    fs::write(fixture.project.path().join("Dockerfile"), "FROM scratch\n")?;

    fixture
        .shipkit()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Dockerfile already exists"));

    assert_eq!(
        fs::read_to_string(fixture.project.path().join("Dockerfile"))?,
        "FROM scratch\n"
    );
    Ok(())
}

#[test]
fn overwrite_flag_replaces_dockerfile() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = Fixture::node();
    fs::write(fixture.project.path().join("Dockerfile"), "FROM scratch\n")?;

    fixture.shipkit().arg("--overwrite").assert().success();

    assert!(fs::read_to_string(fixture.project.path().join("Dockerfile"))?.starts_with("FROM node"));
    Ok(())
}

#[test]
fn unknown_generator_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = Fixture::node();
    fixture
        .shipkit()
        .args(["-g", "dockerfile,helm"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("helm"));

    assert!(!fixture.project.path().join("Dockerfile").exists());
    Ok(())
}

#[test]
fn unsupported_project_fails() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = Fixture::node();
    fs::remove_file(fixture.project.path().join("package.json"))?;

    fixture
        .shipkit()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to detect a supported framework"));
    Ok(())
}

#[test]
fn missing_daemon_config_fails() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let mut cmd = Command::new(cargo_bin("shipkit"));
    cmd.env("HOME", temp.path())
        .arg("--daemon")
        .arg("-c")
        .arg(temp.path().join("missing.yml"));
    cmd.assert().failure();
    Ok(())
}
