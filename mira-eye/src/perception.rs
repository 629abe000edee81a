//! Per-frame perception models

use crate::config::VisionConfig;
use crate::error::VisionError;
use crate::models::{YoloModel, YoloTask};
use mira_core::{FrameAnalysis, Mode};
use opencv::core::Mat;
use std::path::Path;

/// Runs once per frame on the render thread
pub trait Perception: Send + Sync {
    fn name(&self) -> &'static str;

    fn analyze(&self, frame: &Mat) -> Result<FrameAnalysis, VisionError>;
}

/// People boxes with 17 normalized COCO keypoints each
pub struct PoseEstimator {
    model: YoloModel,
}

impl PoseEstimator {
    pub fn load(model_path: &Path, config: &VisionConfig) -> Result<Self, VisionError> {
        Ok(Self {
            model: YoloModel::load(model_path, YoloTask::Pose, config)?,
        })
    }
}

impl Perception for PoseEstimator {
    fn name(&self) -> &'static str {
        "yolov8-pose"
    }

    fn analyze(&self, frame: &Mat) -> Result<FrameAnalysis, VisionError> {
        self.model.infer(frame)
    }
}

/// Labelled COCO boxes, no keypoints
pub struct ObjectDetector {
    model: YoloModel,
}

impl ObjectDetector {
    pub fn load(model_path: &Path, config: &VisionConfig) -> Result<Self, VisionError> {
        Ok(Self {
            model: YoloModel::load(model_path, YoloTask::Detect, config)?,
        })
    }
}

impl Perception for ObjectDetector {
    fn name(&self) -> &'static str {
        "yolov8-detect"
    }

    fn analyze(&self, frame: &Mat) -> Result<FrameAnalysis, VisionError> {
        let mut analysis = self.model.infer(frame)?;
        analysis.subjects.clear();
        Ok(analysis)
    }
}

/// Load the perception model a mode runs on
pub fn for_mode(mode: Mode, model_dir: &Path, config: &VisionConfig) -> Result<Box<dyn Perception>, VisionError> {
    use crate::models::ModelAsset;

    Ok(match mode {
        Mode::Commentary => Box::new(PoseEstimator::load(
            &model_dir.join(ModelAsset::Pose.file_name()),
            config,
        )?),
        Mode::Security => Box::new(ObjectDetector::load(
            &model_dir.join(ModelAsset::Detect.file_name()),
            config,
        )?),
    })
}
