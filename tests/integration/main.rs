//! Integration tests for setup-coursier

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    fn setup_coursier() -> Command {
        let mut cmd = cargo_bin_cmd!("setup-coursier");
        cmd.env_remove("RUNNER_TOOL_CACHE")
            .env_remove("SETUP_COURSIER_CONFIG")
            .env_remove("RUNNER_DEBUG");
        cmd
    }

    #[test]
    fn help_displays() {
        setup_coursier()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Install Coursier"));
    }

    #[test]
    fn version_displays() {
        setup_coursier()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("setup-coursier"));
    }

    #[test]
    fn platform_shows_linux_url() {
        setup_coursier()
            .args(["platform", "--target", "linux-x86_64", "--version", "2.1.24"])
            .assert()
            .success()
            .stdout(predicate::str::contains(concat!(
                "https://github.com/coursier/coursier/releases/download/",
                "v2.1.24/cs-x86_64-pc-linux.gz"
            )));
    }

    #[test]
    fn platform_shows_windows_zip() {
        setup_coursier()
            .args(["platform", "--target", "windows-arm64"])
            .assert()
            .success()
            .stdout(predicate::str::contains("cs-aarch64-pc-win32.zip"))
            .stdout(predicate::str::contains("v2.1.0-M7-39-gb8f3d7532"));
    }

    #[test]
    fn platform_rejects_unsupported_os() {
        setup_coursier()
            .args(["platform", "--target", "freebsd-x86_64"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unsupported operating system"));
    }

    #[test]
    fn platform_rejects_unsupported_arch() {
        setup_coursier()
            .args(["platform", "--target", "linux-riscv64"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unsupported architecture"))
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn cache_list_empty() {
        let temp = TempDir::new().unwrap();
        setup_coursier()
            .args(["cache", "list", "--cache-dir"])
            .arg(temp.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("No cached tools"));
    }

    #[test]
    fn cache_list_empty_json() {
        let temp = TempDir::new().unwrap();
        setup_coursier()
            .args(["cache", "list", "--format", "json"])
            .env("RUNNER_TOOL_CACHE", temp.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("[]"));
    }

    #[test]
    fn cache_path_uses_runner_tool_cache() {
        let temp = TempDir::new().unwrap();
        setup_coursier()
            .args(["cache", "path"])
            .env("RUNNER_TOOL_CACHE", temp.path())
            .assert()
            .success()
            .stdout(predicate::str::contains(temp.path().to_string_lossy().as_ref()));
    }

    #[test]
    fn config_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        setup_coursier()
            .args(["config", "path", "--config"])
            .arg(&path)
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_init_then_show() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");

        setup_coursier()
            .args(["config", "init"])
            .env("SETUP_COURSIER_CONFIG", &path)
            .assert()
            .success();
        assert!(path.exists());

        setup_coursier()
            .args(["config", "init"])
            .env("SETUP_COURSIER_CONFIG", &path)
            .assert()
            .failure()
            .stderr(predicate::str::contains("--force"));

        setup_coursier()
            .args(["config", "show"])
            .env("SETUP_COURSIER_CONFIG", &path)
            .assert()
            .success()
            .stdout(predicate::str::contains("[coursier]"));
    }

    #[test]
    fn invalid_config_fails() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[coursier\n").unwrap();

        setup_coursier()
            .args(["config", "show", "--config"])
            .arg(&path)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }

    #[test]
    fn install_rejects_unbalanced_cs_args() {
        let temp = TempDir::new().unwrap();
        setup_coursier()
            .args(["install", "--cs-args", "-r \"oops", "--cache-dir"])
            .arg(temp.path())
            .assert()
            .failure()
            .stdout(predicate::str::contains("::error::Invalid cs-args"));
    }

    #[test]
    fn install_reports_invalid_config_as_workflow_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[coursier\n").unwrap();

        setup_coursier()
            .args(["install", "--config"])
            .arg(&path)
            .assert()
            .failure()
            .stdout(predicate::str::contains("::error::Invalid configuration"));
    }

    #[test]
    fn unknown_command_fails() {
        setup_coursier().arg("frobnicate").assert().failure();
    }
}
