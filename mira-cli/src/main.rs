// MIRA command line entry point

use anyhow::{Context, Result};
use clap::Parser;
use mira_cli::{run, App, Cli, MiraConfig, StopReason};
use mira_eye::{
    perception, CameraManager, DisplayWindow, EmotionClassifier, FerPlusClassifier, FrameSink, ModelManager,
};
use mira_llm::ChatCompletionClient;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    let config = MiraConfig::load(&cli).context("Failed to load configuration")?;
    let mode = config.mode;
    info!(%mode, endpoint = %config.reaction.endpoint, "Starting MIRA");

    let vision = Arc::new(config.vision.clone());
    ModelManager::new(Arc::clone(&vision))
        .ensure_for_mode(mode)
        .await
        .context("Failed to prepare model files")?;

    let perception = perception::for_mode(mode, &vision.model_path, &vision)
        .context("Failed to load perception model")?;
    let emotion: Option<Arc<dyn EmotionClassifier>> = if mode.uses_emotion() {
        let classifier = FerPlusClassifier::from_model_dir(&vision.model_path, &vision)
            .context("Failed to load emotion classifier")?;
        Some(Arc::new(classifier))
    } else {
        None
    };
    let generator = Arc::new(
        ChatCompletionClient::new(config.reaction.clone()).context("Failed to build reaction client")?,
    );

    let stop = Arc::new(AtomicBool::new(false));
    let interrupt = Arc::clone(&stop);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl-C received, stopping");
                interrupt.store(true, Ordering::SeqCst);
            }
            Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
        }
    });

    let mut app = App::new(&config, perception, emotion, generator, tokio::runtime::Handle::current());
    let headless = cli.headless;

    let render = tokio::task::spawn_blocking(move || -> Result<StopReason> {
        let mut camera = CameraManager::new(vision);
        camera.initialize().context("Failed to open camera")?;

        let mut window = if headless {
            None
        } else {
            Some(DisplayWindow::open(mode.window_title()).context("Failed to open display window")?)
        };

        let reason = run(
            &mut app,
            &mut camera,
            window.as_mut().map(|w| w as &mut dyn FrameSink),
            &stop,
        )
        .context("Render loop failed")?;

        camera.release();
        Ok(reason)
    });

    let reason = render.await.context("Render loop panicked")??;
    info!(?reason, "Goodbye");
    Ok(())
}
