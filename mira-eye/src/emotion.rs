//! Facial emotion classification

use crate::config::VisionConfig;
use crate::error::VisionError;
use crate::models::{FerPlusModel, ModelAsset};
use opencv::{
    core::{Mat, Rect, Size, Vector},
    imgproc,
    objdetect::CascadeClassifier,
    prelude::*,
};
use parking_lot::Mutex;
use std::path::Path;
use tracing::debug;

/// Dominant emotion of the most prominent face in a frame
pub trait EmotionClassifier: Send + Sync {
    fn dominant_emotion(&self, frame: &Mat) -> Result<String, VisionError>;
}

/// Pick the face with the largest area
pub fn largest_face(faces: &[Rect]) -> Option<Rect> {
    faces
        .iter()
        .copied()
        .filter(|r| r.width > 0 && r.height > 0)
        .max_by_key(|r| r.width as i64 * r.height as i64)
}

/// Haar-cascade face crop fed to the FER+ model.
///
/// With no face found the whole frame is classified.
pub struct FerPlusClassifier {
    faces: Mutex<CascadeClassifier>,
    model: FerPlusModel,
}

impl FerPlusClassifier {
    pub fn load(cascade_path: &Path, model_path: &Path, threads: usize) -> Result<Self, VisionError> {
        if !cascade_path.exists() {
            return Err(VisionError::Model(format!("Face cascade not found: {:?}", cascade_path)));
        }

        let cascade_str = cascade_path
            .to_str()
            .ok_or_else(|| VisionError::Model(format!("Non UTF-8 cascade path: {:?}", cascade_path)))?;
        let faces = CascadeClassifier::new(cascade_str)?;
        if faces.empty()? {
            return Err(VisionError::Model(format!("Face cascade is empty: {:?}", cascade_path)));
        }

        Ok(Self {
            faces: Mutex::new(faces),
            model: FerPlusModel::load(model_path, threads)?,
        })
    }

    /// Load from the standard file names in the model directory
    pub fn from_model_dir(model_dir: &Path, config: &VisionConfig) -> Result<Self, VisionError> {
        Self::load(
            &model_dir.join(ModelAsset::FaceCascade.file_name()),
            &model_dir.join(ModelAsset::Emotion.file_name()),
            config.inference_threads,
        )
    }

    fn detect_faces(&self, gray: &Mat) -> Result<Vec<Rect>, VisionError> {
        let mut faces = Vector::<Rect>::new();
        self.faces.lock().detect_multi_scale(
            gray,
            &mut faces,
            1.1,
            5,
            0,
            Size::new(48, 48),
            Size::new(0, 0),
        )?;
        Ok(faces.to_vec())
    }
}

impl EmotionClassifier for FerPlusClassifier {
    fn dominant_emotion(&self, frame: &Mat) -> Result<String, VisionError> {
        if frame.empty() {
            return Err(VisionError::Processing("Empty frame".to_string()));
        }

        let mut gray = Mat::default();
        imgproc::cvt_color(frame, &mut gray, imgproc::COLOR_BGR2GRAY, 0)?;

        let faces = self.detect_faces(&gray)?;
        let label = match largest_face(&faces) {
            Some(face) => {
                debug!("Classifying face {:?} of {} found", face, faces.len());
                let crop = Mat::roi(&gray, face)?.try_clone()?;
                self.model.classify(&crop)?
            }
            None => {
                debug!("No face found, classifying whole frame");
                self.model.classify(&gray)?
            }
        };

        Ok(label.to_string())
    }
}
