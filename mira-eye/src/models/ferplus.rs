//! FER+ facial emotion model

use crate::error::VisionError;
use crate::models::yolo::build_session;
use crate::utils::{gray_to_nchw, softmax};
use opencv::core::Mat;
use ort::session::Session;
use ort::value::Tensor;
use parking_lot::Mutex;
use std::path::Path;
use tracing::{debug, info};

/// Output order of the FER+ classifier
pub const EMOTION_LABELS: &[&str] = &[
    "neutral", "happy", "surprise", "sad", "angry", "disgust", "fear", "contempt",
];

/// Side length of the grayscale face crop the model expects
pub const FACE_SIZE: u32 = 64;

/// Label with the highest probability, and that probability
pub fn dominant_emotion(logits: &[f32]) -> Result<(&'static str, f32), VisionError> {
    if logits.len() != EMOTION_LABELS.len() {
        return Err(VisionError::Processing(format!(
            "Emotion output has {} scores, expected {}",
            logits.len(),
            EMOTION_LABELS.len()
        )));
    }

    let probs = softmax(logits);
    // Ties resolve to the earliest label
    let (index, probability) = probs
        .iter()
        .copied()
        .enumerate()
        .fold((0usize, 0.0f32), |best, (i, p)| if p > best.1 { (i, p) } else { best });

    if probability <= 0.0 {
        return Err(VisionError::Processing("Emotion scores are not finite".to_string()));
    }
    Ok((EMOTION_LABELS[index], probability))
}

pub struct FerPlusModel {
    session: Mutex<Session>,
}

impl FerPlusModel {
    pub fn load(model_path: &Path, threads: usize) -> Result<Self, VisionError> {
        if !model_path.exists() {
            return Err(VisionError::Model(format!("Model file not found: {:?}", model_path)));
        }

        let session = build_session(model_path, threads)?;
        info!("FER+ model loaded from {:?}", model_path);
        Ok(Self {
            session: Mutex::new(session),
        })
    }

    /// Classify a single-channel face crop of any size
    pub fn classify(&self, face: &Mat) -> Result<&'static str, VisionError> {
        let input = gray_to_nchw(face, FACE_SIZE, FACE_SIZE)?;
        let tensor = Tensor::from_array(input)?;

        let mut session = self.session.lock();
        let outputs = session.run(ort::inputs![tensor])?;
        let scores = outputs[0].try_extract_array::<f32>()?;
        let logits: Vec<f32> = scores.iter().copied().collect();

        let (label, probability) = dominant_emotion(&logits)?;
        debug!("Dominant emotion {} ({:.2})", label, probability);
        Ok(label)
    }
}
