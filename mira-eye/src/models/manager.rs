//! Model file management with auto-download

use crate::config::VisionConfig;
use crate::error::VisionError;
use mira_core::Mode;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

const YOLO_POSE_URL: &str = "https://github.com/ultralytics/assets/releases/download/v8.2.0/yolov8n-pose.onnx";
const YOLO_DETECT_URL: &str = "https://github.com/ultralytics/assets/releases/download/v8.2.0/yolov8n.onnx";
const FERPLUS_URL: &str =
    "https://github.com/onnx/models/raw/main/validated/vision/body_analysis/emotion_ferplus/model/emotion-ferplus-8.onnx";
const FACE_CASCADE_URL: &str =
    "https://raw.githubusercontent.com/opencv/opencv/4.x/data/haarcascades/haarcascade_frontalface_default.xml";

const MAX_MODEL_SIZE: usize = 2_000_000_000;
const MIN_MODEL_SIZE: usize = 1024;
const DOWNLOAD_TIMEOUT_SECS: u64 = 3600;

/// Files the pipeline loads from the model directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelAsset {
    /// YOLOv8n pose (17 COCO keypoints per person)
    Pose,
    /// YOLOv8n detection (80 COCO classes)
    Detect,
    /// FER+ facial emotion classifier
    Emotion,
    /// OpenCV frontal-face Haar cascade
    FaceCascade,
}

impl ModelAsset {
    pub fn file_name(&self) -> &'static str {
        match self {
            ModelAsset::Pose => "yolov8n-pose.onnx",
            ModelAsset::Detect => "yolov8n.onnx",
            ModelAsset::Emotion => "emotion-ferplus-8.onnx",
            ModelAsset::FaceCascade => "haarcascade_frontalface_default.xml",
        }
    }

    pub fn url(&self) -> &'static str {
        match self {
            ModelAsset::Pose => YOLO_POSE_URL,
            ModelAsset::Detect => YOLO_DETECT_URL,
            ModelAsset::Emotion => FERPLUS_URL,
            ModelAsset::FaceCascade => FACE_CASCADE_URL,
        }
    }

    /// Expected SHA-256 in hex; empty skips verification
    pub fn checksum(&self) -> &'static str {
        ""
    }

    /// Assets required to run the given mode
    pub fn for_mode(mode: Mode) -> &'static [ModelAsset] {
        match mode {
            Mode::Commentary => &[ModelAsset::Pose, ModelAsset::Emotion, ModelAsset::FaceCascade],
            Mode::Security => &[ModelAsset::Detect],
        }
    }

    pub fn all() -> &'static [ModelAsset] {
        &[
            ModelAsset::Pose,
            ModelAsset::Detect,
            ModelAsset::Emotion,
            ModelAsset::FaceCascade,
        ]
    }
}

impl std::str::FromStr for ModelAsset {
    type Err = VisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pose" => Ok(ModelAsset::Pose),
            "detect" | "yolo" => Ok(ModelAsset::Detect),
            "emotion" | "ferplus" => Ok(ModelAsset::Emotion),
            "face" | "cascade" => Ok(ModelAsset::FaceCascade),
            other => Err(VisionError::Model(format!("Unknown model: {}", other))),
        }
    }
}

/// Resolves model files in the model directory, downloading missing ones
pub struct ModelManager {
    config: Arc<VisionConfig>,
}

impl ModelManager {
    pub fn new(config: Arc<VisionConfig>) -> Self {
        Self { config }
    }

    /// Ensure model directory exists
    pub fn ensure_model_dir(&self) -> Result<PathBuf, VisionError> {
        let model_path = &self.config.model_path;
        if !model_path.exists() {
            fs::create_dir_all(model_path).map_err(|e| {
                VisionError::Io(std::io::Error::new(
                    e.kind(),
                    format!("Failed to create model directory: {}", e),
                ))
            })?;
            info!("Created model directory: {:?}", model_path);
        }
        Ok(model_path.clone())
    }

    /// Path of a known asset, downloading it if missing
    pub async fn ensure_asset(&self, asset: ModelAsset) -> Result<PathBuf, VisionError> {
        self.ensure_model(asset.file_name(), asset.url(), asset.checksum()).await
    }

    /// Resolve every asset the mode needs
    pub async fn ensure_for_mode(&self, mode: Mode) -> Result<Vec<PathBuf>, VisionError> {
        let mut paths = Vec::new();
        for asset in ModelAsset::for_mode(mode) {
            paths.push(self.ensure_asset(*asset).await?);
        }
        Ok(paths)
    }

    /// Download model if not present
    pub async fn ensure_model(&self, model_name: &str, url: &str, checksum: &str) -> Result<PathBuf, VisionError> {
        if model_name.is_empty() || model_name.len() > 255 {
            return Err(VisionError::Model("Invalid model name".to_string()));
        }

        if model_name.contains("..") || model_name.contains('/') || model_name.contains('\\') {
            return Err(VisionError::Model("Model name contains invalid characters".to_string()));
        }

        if url.is_empty() || url.len() > 2048 {
            return Err(VisionError::Model("Invalid URL".to_string()));
        }

        if !url.starts_with("https://") {
            return Err(VisionError::Model("Only HTTPS URLs are allowed for model downloads".to_string()));
        }

        let model_path = self.config.model_path.join(model_name);
        if !model_path.starts_with(&self.config.model_path) {
            return Err(VisionError::Model("Path traversal detected".to_string()));
        }

        if model_path.exists() {
            info!("Model {} found at {:?}", model_name, model_path);
            return Ok(model_path);
        }

        if !self.config.auto_download {
            return Err(VisionError::Model(format!(
                "Model {} missing from {:?} and auto_download is disabled",
                model_name, self.config.model_path
            )));
        }

        self.ensure_model_dir()?;
        info!("Downloading model {} from {}", model_name, url);

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
            .build()?;

        let response = client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(VisionError::Model(format!(
                "Failed to download model: HTTP {}",
                response.status()
            )));
        }

        if let Some(content_length) = response.content_length() {
            if content_length > MAX_MODEL_SIZE as u64 {
                return Err(VisionError::Model(format!(
                    "Model too large: {} bytes (max {} bytes)",
                    content_length, MAX_MODEL_SIZE
                )));
            }
        }

        let bytes = response.bytes().await?;
        verify_payload(model_name, &bytes, checksum)?;

        let temp_path = self.config.model_path.join(format!("{}.tmp", model_name));
        write_atomically(&temp_path, &model_path, &bytes).await?;

        info!("Model {} saved to {:?} ({} bytes)", model_name, model_path, bytes.len());
        Ok(model_path)
    }
}

/// Write `bytes` to `temp_path`, then rename it onto `target`.
///
/// The temporary file is removed when the rename fails.
pub(crate) async fn write_atomically(temp_path: &Path, target: &Path, bytes: &[u8]) -> Result<(), VisionError> {
    tokio::fs::write(temp_path, bytes).await?;
    if let Err(e) = tokio::fs::rename(temp_path, target).await {
        if let Err(cleanup) = tokio::fs::remove_file(temp_path).await {
            warn!("Failed to remove {:?}: {}", temp_path, cleanup);
        }
        return Err(VisionError::Io(e));
    }
    Ok(())
}

/// Size bounds and optional SHA-256 check on a downloaded payload
pub fn verify_payload(model_name: &str, bytes: &[u8], checksum: &str) -> Result<(), VisionError> {
    if bytes.len() > MAX_MODEL_SIZE {
        return Err(VisionError::Model(format!(
            "Downloaded model too large: {} bytes (max {} bytes)",
            bytes.len(),
            MAX_MODEL_SIZE
        )));
    }

    if bytes.len() < MIN_MODEL_SIZE {
        return Err(VisionError::Model("Downloaded file too small, likely corrupted".to_string()));
    }

    if checksum.is_empty() {
        info!("Checksum verification skipped for model {}", model_name);
        return Ok(());
    }

    let computed = hex::encode(Sha256::digest(bytes));
    if !computed.eq_ignore_ascii_case(checksum) {
        return Err(VisionError::Model(format!(
            "Checksum mismatch for model {}: expected {}, got {}",
            model_name, checksum, computed
        )));
    }
    info!("Verified checksum for model {}", model_name);
    Ok(())
}
