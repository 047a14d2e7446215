// CLI definitions using clap

use clap::{Args, Parser, Subcommand, ValueEnum};
use keyhud_core::{AnchorPreset, CompletionPolicy};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "keyhud")]
#[command(author, version, about = "Key prompt HUD with hold-to-activate progress")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file path (default: ~/.config/keyhud/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    /// Log file (default for `run`: ~/.local/state/keyhud/keyhud.log)
    #[arg(long, global = true, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the HUD and wait for host messages (default)
    Run(RunArgs),

    /// Send one message to a running HUD
    #[command(visible_alias = "s")]
    Send {
        /// JSON message file, or - for stdin
        #[arg(default_value = "-")]
        input: String,
        /// Socket path (default: $XDG_RUNTIME_DIR/keyhud.sock)
        #[arg(short, long)]
        socket: Option<PathBuf>,
    },

    /// Hide the HUD of a running instance
    Hide {
        /// Socket path (default: $XDG_RUNTIME_DIR/keyhud.sock)
        #[arg(short, long)]
        socket: Option<PathBuf>,
    },

    /// Write the default settings file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Default)]
pub struct RunArgs {
    /// Socket path (default: $XDG_RUNTIME_DIR/keyhud.sock)
    #[arg(short, long)]
    pub socket: Option<PathBuf>,

    /// Show these key inputs at startup (JSON message file)
    #[arg(long, value_name = "FILE", conflicts_with = "demo")]
    pub inputs: Option<PathBuf>,

    /// Show the built-in F1/F2 prompts at startup
    #[arg(long)]
    pub demo: bool,

    /// Default placement when the host sends none (e.g. middle-bottom)
    #[arg(short, long)]
    pub position: Option<AnchorPreset>,

    /// What a completed hold shows until release
    #[arg(long, value_enum)]
    pub on_complete: Option<OnComplete>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OnComplete {
    /// Stay at 100
    Hold,
    /// Drop back to 0
    Reset,
}

impl From<OnComplete> for CompletionPolicy {
    fn from(value: OnComplete) -> Self {
        match value {
            OnComplete::Hold => CompletionPolicy::Hold,
            OnComplete::Reset => CompletionPolicy::Reset,
        }
    }
}
