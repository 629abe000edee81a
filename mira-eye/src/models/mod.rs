//! Model files and ONNX inference

pub mod ferplus;
pub mod manager;
pub mod yolo;

pub use ferplus::{FerPlusModel, EMOTION_LABELS};
pub use manager::{ModelAsset, ModelManager};
pub use yolo::{YoloModel, YoloTask, COCO_CLASSES};
