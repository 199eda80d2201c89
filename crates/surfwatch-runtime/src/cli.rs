//! CLI definition using clap derive.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Overrides;

#[derive(Parser)]
#[command(name = "surfwatch", about = "react to new messages without reacting to your own")]
pub struct Cli {
    /// JSON config file (missing file = defaults)
    #[arg(long, short = 'c', global = true, env = "SURFWATCH_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub run: RunOpts,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the engine until ctrl-c or the surface disappears
    Watch,
    /// Interactive console (start/stop/status/cooldown/debug/test)
    Console,
    /// Print every detection verdict without dispatching
    Diagnose(DiagnoseOpts),
    /// Perform the configured action once
    TestAction,
}

/// Overrides shared by all subcommands.
#[derive(clap::Args, Default)]
pub struct RunOpts {
    /// Replay snapshots from a fixture instead of probing
    #[arg(long, global = true)]
    pub replay: Option<PathBuf>,

    /// Log instead of clicking
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Cooldown after each action, in seconds
    #[arg(long, global = true)]
    pub cooldown: Option<f64>,

    /// Poll interval in milliseconds
    #[arg(long, global = true)]
    pub interval_ms: Option<u64>,
}

impl RunOpts {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            replay: self.replay.clone(),
            dry_run: self.dry_run,
            cooldown_secs: self.cooldown,
            interval_ms: self.interval_ms,
        }
    }
}

#[derive(clap::Args, Default)]
pub struct DiagnoseOpts {
    /// Stop after this many polls (default: until ctrl-c)
    #[arg(long)]
    pub ticks: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_overrides_after_subcommand() {
        let cli = Cli::try_parse_from([
            "surfwatch",
            "diagnose",
            "--ticks",
            "5",
            "--replay",
            "demos/chat.json",
            "--cooldown",
            "1.5",
        ])
        .expect("parse");
        let Some(Command::Diagnose(opts)) = cli.command else {
            panic!("expected diagnose");
        };
        assert_eq!(opts.ticks, Some(5));
        let o = cli.run.overrides();
        assert_eq!(o.replay, Some(PathBuf::from("demos/chat.json")));
        assert_eq!(o.cooldown_secs, Some(1.5));
        assert!(!o.dry_run);
    }

    #[test]
    fn no_subcommand_defaults_to_none() {
        let cli = Cli::try_parse_from(["surfwatch", "--dry-run"]).expect("parse");
        assert!(cli.command.is_none());
        assert!(cli.run.dry_run);
    }

    #[test]
    fn cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
