//! Configuration for mira-eye

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Camera, model and detection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    /// USB camera device index (0, 1, 2, etc.)
    pub camera_id: u32,
    /// Requested capture rate (frames per second)
    pub frame_rate: u32,
    /// Requested camera resolution (width, height)
    pub resolution: (u32, u32),
    /// Directory holding the model files
    pub model_path: PathBuf,
    /// Download missing model files on startup
    pub auto_download: bool,
    /// Minimum class score kept by the detectors
    pub confidence_threshold: f32,
    /// IoU above which overlapping boxes of one class are merged
    pub nms_threshold: f32,
    /// Keypoint used for the gesture heuristic (COCO-17 index)
    pub gesture_joint: usize,
    /// Normalized height under which the gesture joint counts as raised
    pub gesture_threshold: f32,
    /// ONNX Runtime intra-op threads per session
    pub inference_threads: usize,
}

impl Default for VisionConfig {
    fn default() -> Self {
        let model_path = dirs::home_dir()
            .map(|mut p| {
                p.push(".mira");
                p.push("models");
                p
            })
            .unwrap_or_else(|| PathBuf::from("./models"));

        Self {
            camera_id: 0,
            frame_rate: 30,
            resolution: (640, 480),
            model_path,
            auto_download: true,
            confidence_threshold: 0.25,
            nms_threshold: 0.45,
            gesture_joint: mira_core::gesture::LEFT_WRIST,
            gesture_threshold: mira_core::gesture::RAISED_THRESHOLD,
            inference_threads: 4,
        }
    }
}

impl VisionConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.frame_rate == 0 || self.frame_rate > 120 {
            return Err("Frame rate must be between 1 and 120".to_string());
        }

        if self.resolution.0 == 0 || self.resolution.1 == 0 {
            return Err("Resolution must be non-zero".to_string());
        }

        if self.resolution.0 > 7680 || self.resolution.1 > 4320 {
            return Err("Resolution too large (max 8K)".to_string());
        }

        if self.camera_id > 100 {
            return Err("Camera ID too large (max 100)".to_string());
        }

        for (name, value) in [
            ("confidence_threshold", self.confidence_threshold),
            ("nms_threshold", self.nms_threshold),
            ("gesture_threshold", self.gesture_threshold),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(format!("{} must be between 0 and 1", name));
            }
        }

        if self.gesture_joint >= 17 {
            return Err("Gesture joint must be a COCO-17 keypoint index (0-16)".to_string());
        }

        if self.inference_threads == 0 || self.inference_threads > 64 {
            return Err("Inference threads must be between 1 and 64".to_string());
        }

        Ok(())
    }
}
