//! Binary for downloading vision models from command line

use mira_core::Mode;
use mira_eye::config::VisionConfig;
use mira_eye::error::VisionError;
use mira_eye::models::{ModelAsset, ModelManager};
use std::env;
use std::sync::Arc;

const USAGE: &str = "Usage: download_model <pose|detect|emotion|face|commentary|security|all>";

#[tokio::main]
async fn main() -> Result<(), VisionError> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("{}", USAGE);
        std::process::exit(1);
    }

    let target = args[1].to_lowercase();
    let assets: Vec<ModelAsset> = if target == "all" {
        ModelAsset::all().to_vec()
    } else if let Ok(asset) = target.parse::<ModelAsset>() {
        vec![asset]
    } else if let Ok(mode) = target.parse::<Mode>() {
        ModelAsset::for_mode(mode).to_vec()
    } else {
        eprintln!("Unknown model: {}", target);
        eprintln!("{}", USAGE);
        std::process::exit(1);
    };

    let config = VisionConfig {
        auto_download: true,
        ..VisionConfig::default()
    };
    let manager = ModelManager::new(Arc::new(config));

    for asset in assets {
        println!("Fetching {}...", asset.file_name());
        let path = manager.ensure_asset(asset).await?;
        println!("{} ready at {:?}", asset.file_name(), path);
    }

    Ok(())
}
