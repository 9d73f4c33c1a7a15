use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use host_integration::LocalHost;
use menu_core::{load_settings, load_settings_from, SessionEvent, SessionRouter};
use tokio::sync::broadcast::{error::TryRecvError, Receiver};

mod scenarios;

#[derive(Parser, Debug)]
struct Cli {
    /// Settings file; defaults to ./menu.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Print session events as JSON lines.
    #[arg(long)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Counter {
        #[arg(long, default_value_t = 3)]
        up: u32,
        #[arg(long, default_value_t = 1)]
        down: u32,
    },
    Confirm {
        #[arg(long, default_value_t = 2)]
        dismiss_attempts: u32,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => load_settings_from(path)?,
        None => load_settings(),
    };
    let host = Arc::new(LocalHost::new());
    let router = SessionRouter::new(host.clone(), settings);
    let mut events = router.subscribe();

    match cli.command {
        Command::Counter { up, down } => scenarios::run_counter(&host, &router, up, down)?,
        Command::Confirm { dismiss_attempts } => {
            scenarios::run_confirm(&host, &router, dismiss_attempts)?
        }
    }

    print_events(&mut events, cli.json)
}

fn print_events(events: &mut Receiver<SessionEvent>, json: bool) -> Result<()> {
    loop {
        match events.try_recv() {
            Ok(event) if json => {
                println!(
                    "{}",
                    serde_json::to_string(&event).context("failed to encode session event")?
                );
            }
            Ok(event) => println!("{event:?}"),
            Err(TryRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "demo: session event buffer overflowed");
            }
            Err(TryRecvError::Empty | TryRecvError::Closed) => return Ok(()),
        }
    }
}
