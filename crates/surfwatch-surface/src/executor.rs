//! CommandRunner trait and ProcessRunner (sync subprocess wrapper).
//! Both the probe provider and the input driver shell out through it,
//! so tests can inject canned output.

use std::io::Read;
use std::process::{Command, Stdio};
use std::thread::JoinHandle;
use std::time::Duration;

use wait_timeout::ChildExt;

use crate::error::SurfaceError;

/// Upper bound on a single external command run.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

/// Trait for executing external commands. Enables mock injection for testing.
pub trait CommandRunner: Send + Sync {
    fn run(&self, program: &str, args: &[&str]) -> Result<String, SurfaceError>;
}

impl<T: CommandRunner + ?Sized> CommandRunner for &T {
    fn run(&self, program: &str, args: &[&str]) -> Result<String, SurfaceError> {
        (**self).run(program, args)
    }
}

/// Real executor using `std::process::Command`, killed after `timeout`.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    envs: Vec<(String, String)>,
    timeout: Duration,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self {
            envs: Vec::new(),
            timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<String, SurfaceError> {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for (k, v) in &self.envs {
            cmd.env(k, v);
        }
        let mut child = cmd.spawn().map_err(SurfaceError::Io)?;
        // Drained on their own threads so a chatty child cannot fill a pipe
        // and stall before exiting.
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let Some(status) = child.wait_timeout(self.timeout).map_err(SurfaceError::Io)? else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(SurfaceError::CommandFailed(format!(
                "{program}: timed out after {:?}",
                self.timeout
            )));
        };

        let stdout = collect(stdout);
        if !status.success() {
            let stderr = collect(stderr);
            return Err(SurfaceError::CommandFailed(format!(
                "{program}: exit code {}: {}",
                status.code().unwrap_or(-1),
                String::from_utf8_lossy(&stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }
}

fn drain(mut pipe: impl Read + Send + 'static) -> JoinHandle<Vec<u8>> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn collect(reader: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    reader
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}

/// Split a command line on whitespace into program and arguments.
pub fn split_command(line: &str) -> Option<(&str, Vec<&str>)> {
    let mut parts = line.split_whitespace();
    let program = parts.next()?;
    Some((program, parts.collect()))
}
