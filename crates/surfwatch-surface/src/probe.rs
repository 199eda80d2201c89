//! Snapshot provider backed by an external probe command.
//!
//! The probe (for example a UI Automation dumper) prints one JSON
//! [`SnapshotFrame`] on stdout per invocation.

use std::sync::atomic::{AtomicBool, Ordering};

use surfwatch_core::Snapshot;

use crate::error::SurfaceError;
use crate::executor::{CommandRunner, split_command};
use crate::frame::SnapshotFrame;
use crate::provider::SurfaceProvider;

pub struct ProbeSurface<R: CommandRunner> {
    runner: R,
    program: String,
    args: Vec<String>,
    /// Optional liveness command; exit status 0 means alive.
    alive_command: Option<(String, Vec<String>)>,
    /// `alive` flag of the most recent successfully parsed frame.
    last_alive: AtomicBool,
}

impl<R: CommandRunner> ProbeSurface<R> {
    /// Build from a whitespace-separated command line.
    pub fn new(runner: R, command: &str) -> Result<Self, SurfaceError> {
        let (program, args) = owned_command(command)?;
        Ok(Self {
            runner,
            program,
            args,
            alive_command: None,
            last_alive: AtomicBool::new(true),
        })
    }

    pub fn with_alive_command(mut self, command: &str) -> Result<Self, SurfaceError> {
        self.alive_command = Some(owned_command(command)?);
        Ok(self)
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn run_probe(&self) -> Result<SnapshotFrame, SurfaceError> {
        let args: Vec<&str> = self.args.iter().map(String::as_str).collect();
        let stdout = self.runner.run(&self.program, &args)?;
        SnapshotFrame::parse(&stdout)
    }
}

fn owned_command(line: &str) -> Result<(String, Vec<String>), SurfaceError> {
    let (program, args) = split_command(line)
        .ok_or_else(|| SurfaceError::CommandFailed("empty probe command".to_string()))?;
    Ok((
        program.to_string(),
        args.into_iter().map(str::to_string).collect(),
    ))
}

impl<R: CommandRunner> SurfaceProvider for ProbeSurface<R> {
    fn snapshot(&self) -> Result<Snapshot, SurfaceError> {
        let frame = self.run_probe()?;
        self.last_alive.store(frame.alive, Ordering::Relaxed);
        frame.to_snapshot()
    }

    fn surface_alive(&self) -> bool {
        match self.alive_command {
            Some((ref program, ref args)) => {
                let args: Vec<&str> = args.iter().map(String::as_str).collect();
                match self.runner.run(program, &args) {
                    Ok(_) => true,
                    Err(e) => {
                        tracing::debug!("liveness probe failed: {e}");
                        false
                    }
                }
            }
            None => self.last_alive.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Returns canned stdout per program and records invocations.
    struct FakeRunner {
        responses: Vec<(String, Result<String, String>)>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeRunner {
        fn new(responses: Vec<(&str, Result<&str, &str>)>) -> Self {
            Self {
                responses: responses
                    .into_iter()
                    .map(|(p, r)| (p.to_string(), r.map(str::to_string).map_err(str::to_string)))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl CommandRunner for FakeRunner {
        fn run(&self, program: &str, args: &[&str]) -> Result<String, SurfaceError> {
            self.calls
                .lock()
                .expect("lock")
                .push(format!("{program} {}", args.join(" ")));
            match self.responses.iter().find(|(p, _)| p == program) {
                Some((_, Ok(out))) => Ok(out.clone()),
                Some((_, Err(e))) => Err(SurfaceError::CommandFailed(e.clone())),
                None => Err(SurfaceError::CommandFailed(format!("unknown {program}"))),
            }
        }
    }

    #[test]
    fn snapshot_parses_probe_output() {
        let runner = FakeRunner::new(vec![(
            "uia-dump",
            Ok(r#"{"label":"Chat","items":[{"content":"hi"}]}"#),
        )]);
        let probe = ProbeSurface::new(&runner, "uia-dump --window Chat").expect("probe");

        let snap = probe.snapshot().expect("snapshot");
        assert_eq!(snap.label, "Chat");
        assert_eq!(snap.len(), 1);
        assert_eq!(
            runner.calls.lock().expect("lock").as_slice(),
            ["uia-dump --window Chat"]
        );
        assert!(probe.surface_alive());
    }

    #[test]
    fn alive_flag_from_last_frame() {
        let runner = FakeRunner::new(vec![("uia-dump", Ok(r#"{"alive":false}"#))]);
        let probe = ProbeSurface::new(&runner, "uia-dump").expect("probe");
        assert!(probe.surface_alive(), "alive until a frame says otherwise");

        probe.snapshot().expect("snapshot");
        assert!(!probe.surface_alive());
    }

    #[test]
    fn alive_command_exit_status_wins() {
        let runner = FakeRunner::new(vec![
            ("uia-dump", Ok(r#"{"alive":true}"#)),
            ("pgrep", Err("exit code 1")),
        ]);
        let probe = ProbeSurface::new(&runner, "uia-dump")
            .expect("probe")
            .with_alive_command("pgrep -x WeChat")
            .expect("alive command");

        probe.snapshot().expect("snapshot");
        assert!(!probe.surface_alive());
    }

    #[test]
    fn probe_failure_propagates() {
        let runner = FakeRunner::new(vec![("uia-dump", Err("timeout"))]);
        let probe = ProbeSurface::new(&runner, "uia-dump").expect("probe");
        let err = probe.snapshot().expect_err("fails");
        assert!(matches!(err, SurfaceError::CommandFailed(_)));
        assert!(probe.surface_alive(), "a failed run is not a disappearance");
    }

    #[test]
    fn empty_command_rejected() {
        let runner = FakeRunner::new(vec![]);
        assert!(ProbeSurface::new(&runner, "  ").is_err());
    }
}
