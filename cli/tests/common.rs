use once_cell::sync::Lazy;
use std::{
    env,
    ffi::OsStr,
    fs,
    path::PathBuf,
    process::{Command, Output},
};
use uuid::Uuid;

static TEST_CLI: Lazy<TestCli> = Lazy::new(|| {
    let cli_path = env::current_exe()
        .ok()
        .and_then(|path| Some(path.parent()?.parent()?.join("mutuals")))
        .expect("Could not resolve CLI executable from test executable");
    TestCli { cli_path }
});

pub struct TestCli {
    cli_path: PathBuf,
}

/// The result of running the CLI once.
pub struct Run {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl Run {
    /// Non-empty stdout lines, sorted, since pipeline output comes in no particular order.
    pub fn sorted_lines(&self) -> Vec<&str> {
        let mut lines: Vec<_> = self.stdout.lines().filter(|line| !line.is_empty()).collect();
        lines.sort_unstable();
        lines
    }
}

impl TestCli {
    pub fn get() -> &'static Self {
        &TEST_CLI
    }

    /// A config file path unique to one test, removed once the test is done with it.
    pub fn config_file() -> ConfigFile {
        ConfigFile(env::temp_dir().join(format!("mutuals-test-{}.json", Uuid::new_v4())))
    }

    pub fn command(&self, endpoint: &str, config_file: &ConfigFile) -> Command {
        let mut command = Command::new(&self.cli_path);
        command
            .arg("--config-file")
            .arg(&config_file.0)
            .arg("--endpoint")
            .arg(endpoint)
            .arg("--token")
            .arg("test-token");
        command
    }

    pub fn run(
        &self,
        endpoint: &str,
        config_file: &ConfigFile,
        args: impl IntoIterator<Item = impl AsRef<OsStr>>,
    ) -> Run {
        let Output {
            status,
            stdout,
            stderr,
        } = self
            .command(endpoint, config_file)
            .args(args)
            .output()
            .expect("Could not run CLI");

        Run {
            code: status.code(),
            stdout: String::from_utf8(stdout).unwrap(),
            stderr: String::from_utf8(stderr).unwrap(),
        }
    }

    /// Run the CLI and panic unless it exits successfully.
    pub fn run_ok(
        &self,
        endpoint: &str,
        config_file: &ConfigFile,
        args: impl IntoIterator<Item = impl AsRef<OsStr>>,
    ) -> Run {
        let run = self.run(endpoint, config_file, args);
        if run.code != Some(0) {
            panic!(
                "failed to run command (exit code {:?}):\n{}",
                run.code, run.stderr
            );
        }
        run
    }
}

pub struct ConfigFile(pub PathBuf);

impl Drop for ConfigFile {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.0);
    }
}
