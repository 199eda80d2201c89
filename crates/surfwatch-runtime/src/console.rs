//! Line-oriented control console over stdin.

use std::io::Write;
use std::sync::Arc;

use surfwatch_surface::ActionDispatcher;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::diagnose::run_diagnose;
use crate::engine::Engine;

/// Polls performed by the `debug` command.
pub const DEBUG_TICKS: u64 = 20;

const HELP: &str = "\
commands:
  start            start watching
  stop             stop watching
  status           show engine status
  cooldown [secs]  show or set the cooldown after each action
  debug            print verdicts for a few polls (engine must be stopped)
  test             perform the action once
  help             show this help
  quit             stop and exit";

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Start,
    Stop,
    Status,
    ShowCooldown,
    SetCooldown(f64),
    Debug,
    Test,
    Help,
    Quit,
    Empty,
    Invalid(String),
}

pub fn parse_command(line: &str) -> ConsoleCommand {
    let mut parts = line.split_whitespace();
    let Some(head) = parts.next() else {
        return ConsoleCommand::Empty;
    };
    let arg = parts.next();
    match (head.to_ascii_lowercase().as_str(), arg) {
        ("start", None) => ConsoleCommand::Start,
        ("stop", None) => ConsoleCommand::Stop,
        ("status", None) => ConsoleCommand::Status,
        ("cooldown", None) => ConsoleCommand::ShowCooldown,
        ("cooldown", Some(v)) => match v.parse::<f64>() {
            Ok(secs) => ConsoleCommand::SetCooldown(secs),
            Err(_) => ConsoleCommand::Invalid(format!("not a number: {v}")),
        },
        ("debug", None) => ConsoleCommand::Debug,
        ("test", None) => ConsoleCommand::Test,
        ("help" | "?", _) => ConsoleCommand::Help,
        ("quit" | "exit" | "q", _) => ConsoleCommand::Quit,
        _ => ConsoleCommand::Invalid(format!("unknown command: {}", line.trim())),
    }
}

/// Read commands until `quit` or end of input. The engine is stopped on exit.
pub async fn run_console<R, W>(engine: &mut Engine, input: R, out: &mut W) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    writeln!(out, "{HELP}")?;
    loop {
        write!(out, "> ")?;
        out.flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        match parse_command(&line) {
            ConsoleCommand::Start => {
                if engine.start() {
                    writeln!(out, "watching")?;
                } else {
                    writeln!(out, "already watching")?;
                }
            }
            ConsoleCommand::Stop => {
                if engine.stop().await {
                    writeln!(out, "stopped")?;
                } else {
                    writeln!(out, "not running")?;
                }
            }
            ConsoleCommand::Status => writeln!(out, "{}", engine.status())?,
            ConsoleCommand::ShowCooldown => {
                let s = engine.status();
                if s.cooldown.active {
                    writeln!(
                        out,
                        "cooldown {:.1}s, {:.1}s left",
                        s.cooldown.duration_seconds, s.cooldown.remaining_seconds
                    )?;
                } else {
                    writeln!(out, "cooldown {:.1}s", engine.cooldown_secs())?;
                }
            }
            ConsoleCommand::SetCooldown(secs) => match engine.set_cooldown(secs) {
                Ok(()) => writeln!(out, "cooldown set to {secs}s")?,
                Err(e) => writeln!(out, "{e}")?,
            },
            ConsoleCommand::Debug => {
                if engine.is_running() {
                    writeln!(out, "stop watching before running debug")?;
                } else {
                    let deps = Arc::clone(engine.deps());
                    run_diagnose(&deps, Some(DEBUG_TICKS), out).await?;
                }
            }
            ConsoleCommand::Test => {
                let dispatcher = Arc::clone(&engine.deps().dispatcher);
                match tokio::task::spawn_blocking(move || dispatcher.perform_action()).await? {
                    Ok(()) => writeln!(out, "action performed")?,
                    Err(e) => writeln!(out, "action failed: {e}")?,
                }
            }
            ConsoleCommand::Help => writeln!(out, "{HELP}")?,
            ConsoleCommand::Quit => break,
            ConsoleCommand::Empty => {}
            ConsoleCommand::Invalid(msg) => writeln!(out, "{msg}\n{HELP}")?,
        }
    }
    engine.stop().await;
    writeln!(out, "bye")?;
    Ok(())
}
