//! Command line flags

use clap::Parser;
use mira_core::Mode;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "mira")]
#[command(about = "MIRA - webcam companion that watches, reads the mood and talks back", long_about = None)]
#[command(version)]
pub struct Cli {
    /// What MIRA runs as: commentary (pose + emotion) or security (objects)
    #[arg(long, short)]
    pub mode: Option<Mode>,

    /// TOML configuration file
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Camera device index
    #[arg(long)]
    pub camera: Option<u32>,

    /// Chat-completion endpoint URL
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Model name sent to the endpoint
    #[arg(long)]
    pub model: Option<String>,

    /// Directory holding the vision model files
    #[arg(long)]
    pub model_dir: Option<PathBuf>,

    /// Seconds between two reactions
    #[arg(long)]
    pub cooldown: Option<f64>,

    /// Quicker commentary preset (4 s cooldown)
    #[arg(long)]
    pub fast: bool,

    /// Run without a window until the stream ends or Ctrl-C
    #[arg(long)]
    pub headless: bool,

    /// Log filter (error, warn, info, debug, trace or a RUST_LOG directive)
    #[arg(long)]
    pub log_level: Option<String>,
}
