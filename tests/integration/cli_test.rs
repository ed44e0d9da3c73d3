use std::path::Path;
use std::process::{Command, Output};

fn finops_command() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_finops"));
    cmd.env_remove("RUST_LOG")
        .env_remove("FINOPS_LOG_LEVEL")
        .env_remove("FINOPS_PROFILE")
        .env("NO_COLOR", "1");
    cmd
}

fn run_finops(args: &[&str]) -> Output {
    finops_command()
        .args(args)
        .output()
        .expect("Failed to execute finops command")
}

fn run_finops_with_env(args: &[&str], env_vars: Vec<(&str, &str)>) -> Output {
    let mut cmd = finops_command();
    cmd.args(args);
    for (key, value) in env_vars {
        cmd.env(key, value);
    }
    cmd.output().expect("Failed to execute finops command")
}

/// Runs finops against shared AWS files that only define the `other` profile.
fn run_finops_offline(args: &[&str], dir: &Path) -> Output {
    let aws_config = dir.join("aws_config");
    let aws_credentials = dir.join("aws_credentials");
    std::fs::write(&aws_config, "[profile other]\nregion = us-east-1\n").unwrap();
    std::fs::write(
        &aws_credentials,
        "[other]\naws_access_key_id = AKIDEXAMPLE\naws_secret_access_key = secret\n",
    )
    .unwrap();

    let mut cmd = finops_command();
    for key in [
        "AWS_ACCESS_KEY_ID",
        "AWS_SECRET_ACCESS_KEY",
        "AWS_SESSION_TOKEN",
        "AWS_PROFILE",
        "AWS_WEB_IDENTITY_TOKEN_FILE",
        "AWS_CONTAINER_CREDENTIALS_RELATIVE_URI",
        "AWS_CONTAINER_CREDENTIALS_FULL_URI",
    ] {
        cmd.env_remove(key);
    }
    cmd.current_dir(dir)
        .env("AWS_CONFIG_FILE", &aws_config)
        .env("AWS_SHARED_CREDENTIALS_FILE", &aws_credentials)
        .env("AWS_EC2_METADATA_DISABLED", "true")
        .env("FINOPS_AWS__REGION", "us-east-1")
        .args(args)
        .output()
        .expect("Failed to execute finops command")
}

fn output_to_string(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr_to_string(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

mod version_command_tests {
    use super::*;

    #[test]
    fn test_version_command_basic() {
        let output = run_finops(&["version"]);
        let stdout = output_to_string(&output);

        assert!(output.status.success(), "version command should succeed");
        assert!(stdout.contains("finops"), "output should contain 'finops'");
        assert!(
            stdout.contains(env!("CARGO_PKG_VERSION")),
            "output should contain version number"
        );
    }

    #[test]
    fn test_version_command_detailed() {
        let output = run_finops(&["version", "--detailed"]);
        let stdout = output_to_string(&output);

        assert!(output.status.success(), "version --detailed should succeed");
        assert!(stdout.contains("Version"));
        assert!(stdout.contains("Apache-2.0"));
        assert!(stdout.contains("Cost Explorer"));
        assert!(stdout.contains("us-east-1 by default"));
    }

    #[test]
    fn test_version_flag() {
        let output = run_finops(&["--version"]);
        assert!(output.status.success());
        assert!(output_to_string(&output).contains(env!("CARGO_PKG_VERSION")));
    }
}

mod help_command_tests {
    use super::*;

    #[test]
    fn test_help_command() {
        let output = run_finops(&["--help"]);
        let stdout = output_to_string(&output);

        assert!(output.status.success(), "help should succeed");
        for command in ["costs", "categories", "config", "version"] {
            assert!(
                stdout.contains(command),
                "help should list the '{}' command",
                command
            );
        }
    }

    #[test]
    fn test_costs_help() {
        let output = run_finops(&["costs", "--help"]);
        let stdout = output_to_string(&output);

        assert!(output.status.success());
        for flag in [
            "--profile",
            "--time-range",
            "--format",
            "--export",
            "--output-dir",
            "--filename",
        ] {
            assert!(stdout.contains(flag), "costs help should list {}", flag);
        }
    }

    #[test]
    fn test_categories_help() {
        let output = run_finops(&["categories", "--help"]);
        let stdout = output_to_string(&output);

        assert!(output.status.success());
        assert!(stdout.contains("--profile"));
        assert!(stdout.contains("--time-range"));
    }
}

mod argument_validation_tests {
    use super::*;

    #[test]
    fn test_invalid_command() {
        let output = run_finops(&["not-a-command"]);
        assert!(!output.status.success());
    }

    #[test]
    fn test_zero_time_range_rejected() {
        let output = run_finops(&["costs", "--time-range", "0"]);
        let stderr = stderr_to_string(&output);

        assert!(!output.status.success());
        assert!(stderr.contains("E7001"), "stderr was: {}", stderr);
    }

    #[test]
    fn test_negative_time_range_rejected() {
        let output = run_finops(&["costs", "--time-range=-5"]);
        assert!(!output.status.success());
    }

    #[test]
    fn test_unknown_export_format_rejected() {
        let output = run_finops(&["costs", "--export", "pdf"]);
        let stderr = stderr_to_string(&output);

        assert!(!output.status.success());
        assert!(stderr.contains("pdf"), "stderr was: {}", stderr);
    }

    #[test]
    fn test_oversized_time_range_rejected() {
        let output = run_finops(&["costs", "--time-range", "4294967295"]);
        let stderr = stderr_to_string(&output);

        assert!(!output.status.success());
        assert!(stderr.contains("E7002"), "stderr was: {}", stderr);
    }

    #[test]
    fn test_unknown_output_format_rejected() {
        for command in ["costs", "categories"] {
            let output = run_finops(&[command, "--format", "xml"]);
            let stderr = stderr_to_string(&output);

            assert!(!output.status.success());
            assert!(stderr.contains("xml"), "stderr was: {}", stderr);
        }
    }

    #[test]
    fn test_verbose_flag_accepted() {
        let output = run_finops(&["-v", "version"]);
        assert!(output.status.success());
    }
}

mod profile_failure_tests {
    use super::*;

    #[test]
    fn test_unknown_profile_fails_at_session_load() {
        let dir = tempfile::tempdir().unwrap();
        let output = run_finops_offline(&["costs", "--profile", "finops-missing"], dir.path());
        let stderr = stderr_to_string(&output);

        assert!(!output.status.success());
        assert!(stderr.contains("E2006"), "stderr was: {}", stderr);
        assert!(stderr.contains("finops-missing"));
    }

    #[test]
    fn test_every_profile_reported_before_failing() {
        let dir = tempfile::tempdir().unwrap();
        let exports = dir.path().join("exports");
        let output = run_finops_offline(
            &[
                "costs",
                "--profile",
                "missing-dev",
                "--profile",
                "missing-prod",
                "--export",
                "csv",
                "--output-dir",
                exports.to_str().unwrap(),
            ],
            dir.path(),
        );
        let stdout = output_to_string(&output);
        let stderr = stderr_to_string(&output);

        assert!(!output.status.success());
        assert!(stdout.contains("missing-dev"), "stdout was: {}", stdout);
        assert!(stdout.contains("missing-prod"), "stdout was: {}", stdout);
        assert!(stderr.contains("2 of 2 profiles failed"), "stderr was: {}", stderr);
        assert!(!exports.exists());
    }
}

mod config_command_tests {
    use super::*;

    #[test]
    fn test_config_prints_json() {
        let output = run_finops(&["config"]);
        let stdout = output_to_string(&output);

        assert!(output.status.success(), "stderr: {}", stderr_to_string(&output));
        let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
        assert_eq!(value["aws"]["budgets_region"], "us-east-1");
        assert_eq!(value["export"]["filename"], "finops_report");
    }

    #[test]
    fn test_config_reads_environment() {
        let output = run_finops_with_env(
            &["config"],
            vec![
                ("FINOPS_REPORT__TIME_RANGE", "14"),
                ("FINOPS_AWS__REGION", "eu-west-1"),
            ],
        );
        let stdout = output_to_string(&output);

        assert!(output.status.success(), "stderr: {}", stderr_to_string(&output));
        let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
        assert_eq!(value["report"]["time_range"], 14);
        assert_eq!(value["aws"]["region"], "eu-west-1");
    }

    #[test]
    fn test_invalid_config_fails_gracefully() {
        let output = run_finops_with_env(&["config"], vec![("FINOPS_REPORT__TIME_RANGE", "0")]);
        let stderr = stderr_to_string(&output);

        assert!(!output.status.success());
        assert!(stderr.contains("E2005"), "stderr was: {}", stderr);
        assert!(stderr.contains("report.time_range"));
    }

    #[test]
    fn test_config_paths() {
        let output = run_finops(&["config", "--paths"]);
        let stdout = output_to_string(&output);

        assert!(output.status.success());
        assert!(stdout.contains("finops.toml"));
        assert!(stdout.contains("FINOPS_"));
    }
}
