//! mira-core: session state and frame-level decisions for MIRA
//!
//! Everything in this crate is independent of the camera, the vision
//! models and the chat endpoint, so the render loop's decisions (when to
//! sample, what counts as a threat, how the pose reads, how text wraps)
//! can be exercised without hardware.

pub mod config;
pub mod detection;
pub mod error;
pub mod gesture;
pub mod sampler;
pub mod session;
pub mod situation;
pub mod text;
pub mod threat;

pub use config::{Mode, SamplerConfig};
pub use detection::{BoundingBox, Detection, FrameAnalysis, Keypoint, Subject};
pub use error::{Error, Result};
pub use gesture::Gesture;
pub use sampler::{Sampler, Trigger};
pub use session::{ReactionGuard, SessionState, SessionView};
pub use situation::{Situation, Tone};
pub use threat::ThreatAssessment;
