use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

const ENV_KEYS: [&str; 8] = [
    "GOOGLE_API_KEY",
    "GOOGLE_GENAI_USE_VERTEXAI",
    "GOOGLE_CLOUD_PROJECT",
    "GOOGLE_CLOUD_LOCATION",
    "AGENT_PATH",
    "SERVICE_NAME",
    "APP_NAME",
    "LAUNCHPAD_MODEL",
];

/// A `launchpad` command isolated from the caller's environment.
fn launchpad(workdir: &std::path::Path) -> Result<Command, Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("launchpad")?;
    for key in ENV_KEYS {
        cmd.env_remove(key);
    }
    cmd.env_remove("RUST_LOG").arg("--workdir").arg(workdir);
    Ok(cmd)
}

const VALID_ENV: &str = "\
GOOGLE_GENAI_USE_VERTEXAI=FALSE
GOOGLE_API_KEY=test-key
GOOGLE_CLOUD_PROJECT=my-proj
GOOGLE_CLOUD_LOCATION=us-central1
export AGENT_PATH=./my_agent
export SERVICE_NAME=halloween-agent
export APP_NAME=halloween_app
";

#[test]
fn init_writes_template() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    launchpad(dir.path())?
        .args(["init", "--project", "my-proj", "--service-name", "halloween-agent"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote"));

    let written = fs::read_to_string(dir.path().join(".env"))?;
    for key in &ENV_KEYS[..7] {
        assert!(written.contains(key), "template is missing {key}:\n{written}");
    }
    assert!(written.contains("GOOGLE_CLOUD_PROJECT=my-proj"));
    assert!(written.contains("export SERVICE_NAME=halloween-agent"));
    assert!(written.contains("GOOGLE_CLOUD_LOCATION=us-central1"));
    Ok(())
}

#[test]
fn init_refuses_to_overwrite() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    fs::write(dir.path().join(".env"), "KEEP=me\n")?;

    launchpad(dir.path())?
        .arg("init")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("already exists"));
    assert_eq!(fs::read_to_string(dir.path().join(".env"))?, "KEEP=me\n");

    launchpad(dir.path())?.args(["init", "--force"]).assert().success();
    assert!(fs::read_to_string(dir.path().join(".env"))?.contains("GOOGLE_API_KEY"));
    Ok(())
}

#[test]
fn dry_run_deploy_prints_exact_command() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    fs::write(dir.path().join(".env"), VALID_ENV)?;

    launchpad(dir.path())?
        .args(["--dry-run", "deploy", "--with-ui"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "uv run adk deploy cloud_run --project my-proj --region us-central1 \
             --service_name halloween-agent --app_name halloween_app --with_ui ./my_agent",
        ));
    Ok(())
}

#[test]
fn dry_run_up_lists_every_step_in_order() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    fs::write(dir.path().join(".env"), VALID_ENV)?;

    let output = launchpad(dir.path())?.args(["--dry-run", "up", "--no-init"]).output()?;
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout)?;
    let lines: Vec<&str> = stdout.lines().filter(|l| l.starts_with("[dry-run]")).collect();
    assert_eq!(lines.len(), 5, "{stdout}");
    assert!(lines[0].ends_with("gcloud auth application-default login"));
    assert!(lines[1].ends_with("gcloud config get-value project"));
    assert!(lines[2].contains("uvx agent-starter-pack enhance --adk -d agent_engine"));
    assert!(lines[3].contains("uv sync"));
    assert!(lines[4].contains("uv run adk deploy cloud_run"));
    Ok(())
}

#[test]
fn missing_config_exits_with_code_2() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;

    launchpad(dir.path())?
        .args(["--dry-run", "deploy"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("[dry-run]").not())
        .stderr(predicate::str::contains("SERVICE_NAME is not set"))
        .stderr(predicate::str::contains("APP_NAME is not set"));
    Ok(())
}

#[test]
fn invalid_service_name_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    fs::write(
        dir.path().join(".env"),
        VALID_ENV.replace("halloween-agent", "Halloween_Agent"),
    )?;

    launchpad(dir.path())?
        .args(["--dry-run", "deploy"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("SERVICE_NAME"));
    Ok(())
}

/// Stand-in `gcloud` and `uv` scripts; `gcloud config get-value project`
/// prints `project`.
#[cfg(unix)]
fn fake_toolchain(
    dir: &std::path::Path,
    project: &str,
) -> Result<std::path::PathBuf, Box<dyn std::error::Error>> {
    use std::os::unix::fs::PermissionsExt;

    let bin = dir.join("bin");
    fs::create_dir(&bin)?;
    let gcloud = format!(
        "#!/bin/sh\ncase \"$*\" in\n  --version) echo 'Google Cloud SDK 500.0.0' ;;\n  \
         'config get-value project') echo '{project}' ;;\nesac\nexit 0\n"
    );
    let uv = "#!/bin/sh\necho 'uv 0.8.0'\n";
    for (name, script) in [("gcloud", gcloud.as_str()), ("uv", uv)] {
        let path = bin.join(name);
        fs::write(&path, script)?;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
    }
    Ok(bin)
}

#[cfg(unix)]
#[test]
fn auth_save_project_writes_gcloud_project() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    fs::write(dir.path().join(".env"), format!("# deployment\n{VALID_ENV}"))?;
    let bin = fake_toolchain(dir.path(), "gcloud-proj")?;

    launchpad(dir.path())?
        .env("PATH", &bin)
        .args(["auth", "--no-init", "--save-project"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved GOOGLE_CLOUD_PROJECT=gcloud-proj"));

    let written = fs::read_to_string(dir.path().join(".env"))?;
    assert!(written.starts_with("# deployment\n"), "{written}");
    assert!(written.contains("GOOGLE_CLOUD_PROJECT=gcloud-proj\n"), "{written}");
    assert!(!written.contains("my-proj"), "{written}");
    assert!(written.contains("export AGENT_PATH=./my_agent\n"), "{written}");
    assert!(written.contains("export SERVICE_NAME=halloween-agent\n"), "{written}");
    Ok(())
}

#[cfg(unix)]
#[test]
fn auth_save_project_keeps_configured_project_when_gcloud_has_none()
-> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    fs::write(dir.path().join(".env"), VALID_ENV)?;
    let bin = fake_toolchain(dir.path(), "(unset)")?;

    launchpad(dir.path())?
        .env("PATH", &bin)
        .args(["auth", "--no-init", "--save-project"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved GOOGLE_CLOUD_PROJECT=my-proj"));
    let written = fs::read_to_string(dir.path().join(".env"))?;
    assert!(written.contains("GOOGLE_CLOUD_PROJECT=my-proj\n"), "{written}");
    Ok(())
}

#[test]
fn dry_run_save_project_leaves_env_file_alone() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    fs::write(dir.path().join(".env"), VALID_ENV)?;

    launchpad(dir.path())?
        .args(["--dry-run", "auth", "--no-init", "--save-project"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[dry-run] would set GOOGLE_CLOUD_PROJECT=my-proj"));
    assert_eq!(fs::read_to_string(dir.path().join(".env"))?, VALID_ENV);
    Ok(())
}

#[test]
fn save_project_without_any_project_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;

    launchpad(dir.path())?
        .args(["--dry-run", "auth", "--save-project"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no project to save"));
    assert!(!dir.path().join(".env").exists());
    Ok(())
}

#[cfg(unix)]
#[test]
fn doctor_fails_on_incomplete_config() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let bin = fake_toolchain(dir.path(), "(unset)")?;

    launchpad(dir.path())?
        .env("PATH", &bin)
        .arg("doctor")
        .assert()
        .code(2)
        .stdout(predicate::str::contains("ok       gcloud   Google Cloud SDK 500.0.0"))
        .stdout(predicate::str::contains("SERVICE_NAME is not set"))
        .stdout(predicate::str::contains("Ready to deploy").not());
    Ok(())
}

#[cfg(unix)]
#[test]
fn doctor_passes_with_tools_and_config() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    fs::write(dir.path().join(".env"), VALID_ENV)?;
    fs::create_dir(dir.path().join("my_agent"))?;
    let bin = fake_toolchain(dir.path(), "my-proj")?;

    launchpad(dir.path())?
        .env("PATH", &bin)
        .arg("doctor")
        .assert()
        .success()
        .stdout(predicate::str::contains("ok       uv       uv 0.8.0"))
        .stdout(predicate::str::contains("service   halloween-agent"))
        .stdout(predicate::str::contains("Ready to deploy."));
    Ok(())
}

#[test]
fn no_args_shows_help() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("launchpad")?;
    cmd.assert().failure().stderr(predicate::str::contains("Usage: launchpad"));
    Ok(())
}
