//! The install sequence: Coursier, then a JVM, then apps
//!
//! Each step produces an ordered list of [`EnvMutation`]s which go through
//! [`Orchestrator::apply`], the one place the job environment is changed.
//! Whatever was applied before a failure stays applied.

use crate::actions::{EnvMutation, Environment, Group};
use crate::cache::ToolCache;
use crate::error::{SetupError, SetupResult};
use crate::install::{resolve_coursier, Installer};
use crate::platform::Platform;
use crate::runner::{CommandRunner, Coursier};
use crate::ui::{self, UiContext};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;
use tracing::info;

/// Variable holding the JVM home directory
pub const JAVA_HOME: &str = "JAVA_HOME";

/// Variable telling `cs install` where to put app launchers
pub const COURSIER_BIN_DIR: &str = "COURSIER_BIN_DIR";

/// Output carrying the installed Coursier version
pub const CS_VERSION_OUTPUT: &str = "cs-version";

/// Caller-supplied inputs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inputs {
    /// Coursier release to install
    pub version: String,

    /// Arguments prepended to every `cs` invocation
    pub cs_args: Vec<String>,

    /// Specific JVM to install, e.g. `temurin:17`
    pub jvm: Option<String>,

    /// Apps to install from the contrib channel
    pub apps: Vec<String>,
}

impl Inputs {
    /// Split a whitespace-separated app list
    pub fn parse_apps(raw: &str) -> Vec<String> {
        raw.split_whitespace().map(String::from).collect()
    }
}

/// Host facts captured once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEnv {
    pub os: String,
    pub arch: String,
    /// Existing `JAVA_HOME`, if set and non-empty
    pub java_home: Option<String>,
    pub home_dir: Option<PathBuf>,
}

impl HostEnv {
    /// Capture facts about the running host
    pub fn capture() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            java_home: std::env::var(JAVA_HOME).ok().filter(|v| !v.is_empty()),
            home_dir: dirs::home_dir(),
        }
    }
}

/// What a successful run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub platform: Platform,
    pub cs_version: String,
    pub cs_dir: PathBuf,
    pub downloaded: bool,
    /// JVM home exported by this run; `None` when an existing JVM was kept
    pub java_home: Option<String>,
    pub apps: Vec<String>,
}

/// Runs the three install groups in order
pub struct Orchestrator<E: Environment> {
    cache_root: PathBuf,
    installer: Installer,
    runner: Arc<dyn CommandRunner>,
    env: E,
    applied: Vec<EnvMutation>,
}

impl<E: Environment> Orchestrator<E> {
    pub fn new(
        cache_root: impl Into<PathBuf>,
        installer: Installer,
        runner: Arc<dyn CommandRunner>,
        env: E,
    ) -> Self {
        Self {
            cache_root: cache_root.into(),
            installer,
            runner,
            env,
            applied: Vec::new(),
        }
    }

    /// Mutations applied so far, in order
    pub fn applied(&self) -> &[EnvMutation] {
        &self.applied
    }

    fn apply(&mut self, mutations: Vec<EnvMutation>) -> SetupResult<()> {
        for mutation in mutations {
            self.env.apply(&mutation)?;
            self.applied.push(mutation);
        }
        Ok(())
    }

    /// Run every group, stopping at the first error
    pub async fn run(&mut self, inputs: &Inputs, host: &HostEnv) -> SetupResult<RunSummary> {
        let platform = Platform::resolve(&host.os, &host.arch)?;
        info!("Detected platform {}", platform);

        let (cs, downloaded) = {
            let _group = Group::start("Install Coursier");
            self.install_coursier(&platform, inputs).await?
        };

        let java_home = {
            let _group = Group::start("Install JVM");
            self.install_jvm(&cs, inputs, host).await?
        };

        {
            let _group = Group::start("Install Apps");
            self.install_apps(&cs, inputs, host).await?;
        }

        let cs_dir = cs
            .binary()
            .parent()
            .map(PathBuf::from)
            .unwrap_or_default();

        Ok(RunSummary {
            platform,
            cs_version: inputs.version.clone(),
            cs_dir,
            downloaded,
            java_home,
            apps: inputs.apps.clone(),
        })
    }

    async fn install_coursier(
        &mut self,
        platform: &Platform,
        inputs: &Inputs,
    ) -> SetupResult<(Coursier, bool)> {
        let cache = ToolCache::new(&self.cache_root, platform.arch.as_str());
        let resolved =
            resolve_coursier(&cache, &self.installer, platform, &inputs.version).await?;
        self.apply(vec![EnvMutation::AddPath(resolved.dir.clone())])?;

        let cs = Coursier::new(&resolved.binary, inputs.cs_args.clone(), self.runner.clone());
        cs.run(&["--help"]).await?;

        self.apply(vec![EnvMutation::output(CS_VERSION_OUTPUT, &inputs.version)])?;
        Ok((cs, resolved.downloaded))
    }

    async fn install_jvm(
        &mut self,
        cs: &Coursier,
        inputs: &Inputs,
        host: &HostEnv,
    ) -> SetupResult<Option<String>> {
        let jvm = inputs
            .jvm
            .as_deref()
            .map(str::trim)
            .filter(|j| !j.is_empty());

        if jvm.is_none() {
            if let Some(existing) = &host.java_home {
                ui::step_info(&UiContext::detect(), &jvm_skip_message(existing));
                return Ok(None);
            }
        }

        let mut java_args = vec!["java"];
        let mut home_args = vec!["java-home"];
        if let Some(jvm) = jvm {
            java_args.extend(["--jvm", jvm]);
            home_args.extend(["--jvm", jvm]);
        }
        java_args.push("-version");

        cs.run(&java_args).await?;
        let java_home = cs.run(&home_args).await?;

        self.apply(vec![
            EnvMutation::export(JAVA_HOME, &java_home),
            EnvMutation::AddPath(PathBuf::from(&java_home).join("bin")),
        ])?;
        Ok(Some(java_home))
    }

    async fn install_apps(
        &mut self,
        cs: &Coursier,
        inputs: &Inputs,
        host: &HostEnv,
    ) -> SetupResult<()> {
        if inputs.apps.is_empty() {
            return Ok(());
        }

        let home = host.home_dir.as_ref().ok_or(SetupError::HomeDirUnavailable)?;
        let bin_dir = home.join("cs").join("bin");
        fs::create_dir_all(&bin_dir)
            .await
            .map_err(|e| SetupError::io(format!("creating {}", bin_dir.display()), e))?;

        let bin_dir_value = bin_dir.display().to_string();
        self.apply(vec![
            EnvMutation::export(COURSIER_BIN_DIR, &bin_dir_value),
            EnvMutation::AddPath(bin_dir),
        ])?;

        let mut args = vec!["install", "--contrib"];
        args.extend(inputs.apps.iter().map(String::as_str));
        cs.run_with_env(&args, &[(COURSIER_BIN_DIR.to_string(), bin_dir_value)])
            .await?;
        Ok(())
    }
}

/// Shown on every run that keeps an existing JVM, whatever the log level
fn jvm_skip_message(java_home: &str) -> String {
    format!("skipping, JVM is already installed in {}", java_home)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::install::tests::FakeFetcher;
    use crate::runner::tests::FakeRunner;
    use serial_test::serial;
    use tempfile::TempDir;

    const VERSION: &str = "2.1.0-M7-39-gb8f3d7532";

    /// Accepts every mutation; the orchestrator keeps its own record
    #[derive(Default)]
    struct NullEnvironment;

    impl Environment for NullEnvironment {
        fn apply(&mut self, _mutation: &EnvMutation) -> SetupResult<()> {
            Ok(())
        }
    }

    fn host(temp: &TempDir, java_home: Option<&str>) -> HostEnv {
        HostEnv {
            os: "linux".to_string(),
            arch: "x86_64".to_string(),
            java_home: java_home.map(String::from),
            home_dir: Some(temp.path().join("home")),
        }
    }

    fn inputs(jvm: Option<&str>, apps: &str) -> Inputs {
        Inputs {
            version: VERSION.to_string(),
            cs_args: vec![],
            jvm: jvm.map(String::from),
            apps: Inputs::parse_apps(apps),
        }
    }

    fn java_home_runner() -> Arc<FakeRunner> {
        FakeRunner::new(|args| {
            if args.first().map(String::as_str) == Some("java-home") {
                Ok("/opt/jdk".to_string())
            } else {
                Ok(String::new())
            }
        })
    }

    fn orchestrator(
        temp: &TempDir,
        fetcher: Arc<FakeFetcher>,
        runner: Arc<FakeRunner>,
    ) -> Orchestrator<NullEnvironment> {
        let installer =
            Installer::new(fetcher, temp.path().join("tmp"), "https://example/releases");
        Orchestrator::new(temp.path().join("cache"), installer, runner, NullEnvironment)
    }

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|a| a.to_string()).collect()
    }

    #[tokio::test]
    async fn end_to_end_linux_with_scalafmt() {
        let temp = TempDir::new().unwrap();
        let fetcher = FakeFetcher::gzip(b"cs");
        let runner = java_home_runner();
        let mut orch = orchestrator(&temp, fetcher.clone(), runner.clone());

        let summary = orch
            .run(&inputs(Some(""), "scalafmt"), &host(&temp, None))
            .await
            .unwrap();

        assert_eq!(fetcher.count(), 1);
        assert_eq!(
            runner.args(),
            vec![
                strings(&["--help"]),
                strings(&["java", "-version"]),
                strings(&["java-home"]),
                strings(&["install", "--contrib", "scalafmt"]),
            ]
        );

        let bin_dir = temp.path().join("home").join("cs").join("bin");
        assert!(bin_dir.is_dir());
        let calls = runner.calls.lock().unwrap();
        assert_eq!(
            calls[3].2,
            vec![(COURSIER_BIN_DIR.to_string(), bin_dir.display().to_string())]
        );
        drop(calls);

        let cs_dir = temp.path().join("cache").join("cs").join(VERSION).join("x86_64");
        assert_eq!(
            orch.applied(),
            &[
                EnvMutation::AddPath(cs_dir.clone()),
                EnvMutation::output(CS_VERSION_OUTPUT, VERSION),
                EnvMutation::export(JAVA_HOME, "/opt/jdk"),
                EnvMutation::AddPath(PathBuf::from("/opt/jdk/bin")),
                EnvMutation::export(COURSIER_BIN_DIR, bin_dir.display().to_string()),
                EnvMutation::AddPath(bin_dir.clone()),
            ]
        );

        assert_eq!(summary.cs_version, VERSION);
        assert_eq!(summary.cs_dir, cs_dir);
        assert!(summary.downloaded);
        assert_eq!(summary.java_home.as_deref(), Some("/opt/jdk"));
        assert_eq!(summary.apps, vec!["scalafmt"]);
    }

    #[tokio::test]
    async fn existing_java_home_skips_jvm_install() {
        let temp = TempDir::new().unwrap();
        let runner = java_home_runner();
        let mut orch = orchestrator(&temp, FakeFetcher::gzip(b"cs"), runner.clone());

        let summary = orch
            .run(&inputs(None, ""), &host(&temp, Some("/usr/lib/jvm/default")))
            .await
            .unwrap();

        assert_eq!(runner.args(), vec![strings(&["--help"])]);
        assert_eq!(summary.java_home, None);
        assert!(!orch
            .applied()
            .iter()
            .any(|m| matches!(m, EnvMutation::ExportVariable { .. })));
    }

    #[tokio::test]
    async fn explicit_jvm_installs_despite_java_home() {
        let temp = TempDir::new().unwrap();
        let runner = java_home_runner();
        let mut orch = orchestrator(&temp, FakeFetcher::gzip(b"cs"), runner.clone());

        orch.run(
            &inputs(Some("temurin:17"), ""),
            &host(&temp, Some("/usr/lib/jvm/default")),
        )
        .await
        .unwrap();

        assert_eq!(
            runner.args(),
            vec![
                strings(&["--help"]),
                strings(&["java", "--jvm", "temurin:17", "-version"]),
                strings(&["java-home", "--jvm", "temurin:17"]),
            ]
        );
    }

    #[tokio::test]
    async fn blank_apps_install_nothing() {
        let temp = TempDir::new().unwrap();
        let runner = java_home_runner();
        let mut orch = orchestrator(&temp, FakeFetcher::gzip(b"cs"), runner.clone());

        orch.run(&inputs(None, "  \t \n"), &host(&temp, Some("/jdk")))
            .await
            .unwrap();

        assert_eq!(runner.args(), vec![strings(&["--help"])]);
        assert!(!orch.applied().iter().any(
            |m| matches!(m, EnvMutation::ExportVariable { name, .. } if name == COURSIER_BIN_DIR)
        ));
        assert!(!temp.path().join("home").join("cs").exists());
    }

    #[tokio::test]
    async fn cs_args_prefix_every_invocation() {
        let temp = TempDir::new().unwrap();
        let runner = java_home_runner();
        let mut orch = orchestrator(&temp, FakeFetcher::gzip(b"cs"), runner.clone());
        let mut inputs = inputs(None, "bloop");
        inputs.cs_args = strings(&["-r", "https://repo.example/maven"]);

        orch.run(&inputs, &host(&temp, Some("/jdk"))).await.unwrap();

        for args in runner.args() {
            assert_eq!(&args[..2], &strings(&["-r", "https://repo.example/maven"])[..]);
        }
        assert_eq!(runner.args().len(), 2);
    }

    #[tokio::test]
    async fn cached_launcher_is_not_downloaded_again() {
        let temp = TempDir::new().unwrap();
        let fetcher = FakeFetcher::gzip(b"cs");

        let mut first = orchestrator(&temp, fetcher.clone(), java_home_runner());
        first.run(&inputs(None, ""), &host(&temp, Some("/jdk"))).await.unwrap();
        let first_path = first.applied()[0].clone();

        let mut second = orchestrator(&temp, fetcher.clone(), java_home_runner());
        let summary = second
            .run(&inputs(None, ""), &host(&temp, Some("/jdk")))
            .await
            .unwrap();

        assert_eq!(fetcher.count(), 1);
        assert!(!summary.downloaded);
        assert_eq!(second.applied()[0], first_path);
    }

    #[tokio::test]
    async fn unsupported_arch_fails_before_download() {
        let temp = TempDir::new().unwrap();
        let fetcher = FakeFetcher::gzip(b"cs");
        let runner = java_home_runner();
        let mut orch = orchestrator(&temp, fetcher.clone(), runner.clone());
        let mut host = host(&temp, None);
        host.arch = "mips".to_string();

        let err = orch.run(&inputs(None, ""), &host).await.unwrap_err();

        assert!(matches!(err, SetupError::UnsupportedArch(_)));
        assert_eq!(fetcher.count(), 0);
        assert!(runner.args().is_empty());
    }

    #[tokio::test]
    async fn unsupported_os_produces_no_binary() {
        let temp = TempDir::new().unwrap();
        let fetcher = FakeFetcher::gzip(b"cs");
        let mut orch = orchestrator(&temp, fetcher.clone(), java_home_runner());
        let mut host = host(&temp, None);
        host.os = "freebsd".to_string();

        let err = orch.run(&inputs(None, ""), &host).await.unwrap_err();

        assert!(matches!(err, SetupError::UnsupportedOs(_)));
        assert_eq!(fetcher.count(), 0);
        assert!(orch.applied().is_empty());
        assert!(!temp.path().join("cache").exists());
    }

    #[tokio::test]
    async fn failure_keeps_earlier_mutations_and_stops() {
        let temp = TempDir::new().unwrap();
        let runner = FakeRunner::new(|args| {
            if args.first().map(String::as_str) == Some("java") {
                Err(SetupError::CommandExit {
                    command: "cs java -version".to_string(),
                    code: Some(1),
                })
            } else {
                Ok(String::new())
            }
        });
        let mut orch = orchestrator(&temp, FakeFetcher::gzip(b"cs"), runner.clone());

        let err = orch
            .run(&inputs(None, "scalafmt"), &host(&temp, None))
            .await
            .unwrap_err();

        assert!(matches!(err, SetupError::CommandExit { .. }));
        assert_eq!(orch.applied().len(), 2);
        assert!(matches!(orch.applied()[0], EnvMutation::AddPath(_)));
        assert_eq!(runner.args().len(), 2);
    }

    #[tokio::test]
    async fn apps_without_home_dir_fail() {
        let temp = TempDir::new().unwrap();
        let mut orch = orchestrator(&temp, FakeFetcher::gzip(b"cs"), java_home_runner());
        let mut host = host(&temp, Some("/jdk"));
        host.home_dir = None;

        let err = orch.run(&inputs(None, "scalafmt"), &host).await.unwrap_err();
        assert!(matches!(err, SetupError::HomeDirUnavailable));
    }

    #[test]
    fn jvm_skip_message_names_existing_home() {
        assert_eq!(
            jvm_skip_message("/usr/lib/jvm/default"),
            "skipping, JVM is already installed in /usr/lib/jvm/default"
        );
    }

    #[test]
    fn parse_apps_splits_on_any_whitespace() {
        assert_eq!(
            Inputs::parse_apps(" scalafmt  bloop\tammonite\n"),
            vec!["scalafmt", "bloop", "ammonite"]
        );
        assert!(Inputs::parse_apps("   ").is_empty());
    }

    #[test]
    #[serial]
    fn capture_ignores_empty_java_home() {
        let original = std::env::var_os(JAVA_HOME);

        std::env::set_var(JAVA_HOME, "");
        assert_eq!(HostEnv::capture().java_home, None);

        std::env::set_var(JAVA_HOME, "/opt/jdk-21");
        assert_eq!(HostEnv::capture().java_home.as_deref(), Some("/opt/jdk-21"));

        match original {
            Some(v) => std::env::set_var(JAVA_HOME, v),
            None => std::env::remove_var(JAVA_HOME),
        }
    }
}
