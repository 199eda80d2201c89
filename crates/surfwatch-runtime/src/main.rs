//! surfwatch: watches a chat surface and reacts to new incoming messages
//! without reacting to its own reactions.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use surfwatch_core::{Detector, SystemClock};
use surfwatch_surface::ActionDispatcher;

mod cli;
mod config;
mod console;
mod diagnose;
mod engine;
mod poll_loop;
mod status;

use config::Config;
use engine::Engine;
use poll_loop::LoopDeps;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    let filter = std::env::var("SURFWATCH_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    let mut config = Config::load(args.config.as_deref())?;
    config.apply(&args.run.overrides());
    config.validate()?;

    match args.command.unwrap_or(cli::Command::Watch) {
        cli::Command::Watch => cmd_watch(&config).await?,
        cli::Command::Console => {
            let mut engine = build_engine(&config)?;
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            console::run_console(&mut engine, stdin, &mut std::io::stdout()).await?;
        }
        cli::Command::Diagnose(opts) => {
            let deps = build_deps(&config, false)?;
            let mut stdout = std::io::stdout();
            tokio::select! {
                res = diagnose::run_diagnose(&deps, opts.ticks, &mut stdout) => { res?; }
                _ = tokio::signal::ctrl_c() => tracing::info!("received ctrl-c, diagnostic run ended"),
            }
        }
        cli::Command::TestAction => {
            let dispatcher = config.build_dispatcher()?;
            tokio::task::spawn_blocking(move || dispatcher.perform_action())
                .await?
                .context("action failed")?;
            println!("action performed");
        }
    }

    Ok(())
}

fn build_deps(config: &Config, dispatch_enabled: bool) -> anyhow::Result<LoopDeps> {
    Ok(LoopDeps {
        surface: config.build_surface()?,
        dispatcher: config.build_dispatcher()?,
        detector: Detector::new(config.detector.clone())?,
        clock: Arc::new(SystemClock),
        check_interval: config.check_interval(),
        dispatch_enabled,
    })
}

fn build_engine(config: &Config) -> anyhow::Result<Engine> {
    let deps = build_deps(config, true)?;
    Ok(Engine::new(deps, config.cooldown_secs, config.stop_timeout())?)
}

/// Run until ctrl-c or until the surface goes away.
async fn cmd_watch(config: &Config) -> anyhow::Result<()> {
    let mut engine = build_engine(config)?;
    engine.start();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            res = &mut ctrl_c => {
                res.context("failed to listen for ctrl-c")?;
                tracing::info!("received ctrl-c, shutting down");
                break;
            }
            () = tokio::time::sleep(Duration::from_millis(250)) => {
                if !engine.is_running() {
                    break;
                }
            }
        }
    }

    engine.stop().await;
    println!("{}", engine.status());
    Ok(())
}
