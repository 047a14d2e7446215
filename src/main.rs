//! keyhud entry point and TUI run loop

mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use crossterm::event::EventStream;
use futures::StreamExt;
use ratatui::prelude::*;
use std::fs::OpenOptions;
use std::io::{stdout, Read};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, RunArgs};
use keyhud::config::{default_log_path, HudConfig};
use keyhud::host::{load_message_file, send_message, HostListener};
use keyhud::input::{ReleaseFallback, TerminalCapture};
use keyhud::ticker::TokioTicker;
use keyhud::tui::{render, App};
use keyhud_core::{HostMessage, Hud, KeyInputs, PlacementDescriptor, HIDE_KEY_INPUTS};

/// How often quiet keys are checked when releases are synthesized
const FALLBACK_POLL: Duration = Duration::from_millis(50);

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Run(RunArgs::default()));

    // The TUI owns the terminal, so `run` logs to a file unless told otherwise
    let log_file = match &command {
        Commands::Run(_) => Some(cli.log_file.unwrap_or_else(default_log_path)),
        _ => cli.log_file,
    };
    init_logging(&cli.log_level, log_file.as_deref())?;

    let config_path = cli.config.unwrap_or_else(HudConfig::default_path);

    match command {
        Commands::Run(args) => {
            info!("Loading config from {:?}", config_path);
            let config = HudConfig::load(&config_path)?;
            run_tui(config, args).await
        }
        Commands::Send { input, socket } => {
            let config = HudConfig::load(&config_path)?;
            let text = read_input(&input)?;
            let socket = socket.unwrap_or_else(|| config.socket_path());
            let msg = send_message(&socket, &text).await?;
            info!("Sent {} to {}", msg.action(), socket.display());
            Ok(())
        }
        Commands::Hide { socket } => {
            let config = HudConfig::load(&config_path)?;
            let socket = socket.unwrap_or_else(|| config.socket_path());
            let text = serde_json::json!({ "action": HIDE_KEY_INPUTS }).to_string();
            send_message(&socket, &text).await?;
            info!("Sent {} to {}", HIDE_KEY_INPUTS, socket.display());
            Ok(())
        }
        Commands::InitConfig { force } => {
            if config_path.exists() && !force {
                bail!(
                    "{} already exists (use --force to overwrite)",
                    config_path.display()
                );
            }
            HudConfig::default().save(&config_path)?;
            info!("Wrote default config to {}", config_path.display());
            Ok(())
        }
    }
}

fn init_logging(level: &str, file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    match file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        Ok(text)
    } else {
        std::fs::read_to_string(input).with_context(|| format!("Failed to read {input}"))
    }
}

/// Run with TUI
async fn run_tui(config: HudConfig, args: RunArgs) -> Result<()> {
    let policy = args.on_complete.map(Into::into).unwrap_or(config.on_complete);
    let default_position = args
        .position
        .map(PlacementDescriptor::from)
        .unwrap_or_else(|| config.default_position.clone());

    let (ticker, mut tick_rx) = TokioTicker::new();
    let mut hud = Hud::new(ticker, policy, default_position);

    // Startup inputs are read before the terminal is taken over so errors stay visible
    if let Some(path) = &args.inputs {
        hud.apply(load_message_file(path)?);
    } else if args.demo {
        hud.set_key_inputs(KeyInputs::demo());
    }

    let socket_path: PathBuf = args.socket.unwrap_or_else(|| config.socket_path());
    let (host_tx, mut host_rx) = mpsc::unbounded_channel::<HostMessage>();
    let listener = HostListener::bind(&socket_path, host_tx)?;

    let capture = TerminalCapture::acquire()?;
    let fallback = config.release_fallback().map(ReleaseFallback::new);
    if !capture.reports_releases() {
        match &fallback {
            Some(_) => warn!(
                "Terminal does not report key releases; keys release after {}ms without repeats",
                config.release_fallback_ms
            ),
            None => warn!("Terminal does not report key releases and the fallback is disabled"),
        }
    }

    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;
    let mut app = App::new(hud, listener.path().to_path_buf(), fallback);

    let mut events = EventStream::new();
    let mut poll = tokio::time::interval(FALLBACK_POLL);
    poll.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let result: Result<()> = loop {
        if app.take_dirty() {
            if let Err(e) = terminal.draw(|f| render::render(f, &app)) {
                break Err(e.into());
            }
        }

        tokio::select! {
            event = events.next() => match event {
                Some(Ok(event)) => app.handle_event(event, Instant::now()),
                Some(Err(e)) => break Err(e.into()),
                None => {
                    debug!("Terminal event stream closed");
                    break Ok(());
                }
            },

            Some(msg) = host_rx.recv() => app.handle_host_message(msg),

            Some(tag) = tick_rx.recv() => app.handle_tick(&tag),

            _ = poll.tick(), if app.fallback.as_ref().is_some_and(|f| f.is_active()) => {
                app.expire_fallback(Instant::now());
            }
        }

        if app.should_quit {
            break Ok(());
        }
    };

    // Cleanup
    app.hud.teardown();
    drop(terminal);
    drop(capture);
    drop(listener);
    info!("Exiting");

    result
}
