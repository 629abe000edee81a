//! mira-eye: camera, perception models and HUD for MIRA
//!
//! Wraps the webcam, the YOLOv8 pose/detection models, the FER+ emotion
//! classifier and the OpenCV overlay drawn on every frame.

pub mod camera;
pub mod config;
pub mod display;
pub mod emotion;
pub mod error;
pub mod hud;
pub mod models;
pub mod perception;
mod utils;

pub use camera::{CameraManager, FrameSource};
pub use config::VisionConfig;
pub use display::{DisplayWindow, FrameSink};
pub use emotion::{EmotionClassifier, FerPlusClassifier};
pub use error::VisionError;
pub use hud::{HudConfig, HudRenderer, HudView, Status};
pub use models::{ModelAsset, ModelManager};
pub use perception::{ObjectDetector, Perception, PoseEstimator};
