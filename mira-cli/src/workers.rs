//! Bodies of the side tasks
//!
//! Failures are logged and leave the session as it was.

use mira_core::{ReactionGuard, SessionState, Situation};
use mira_eye::EmotionClassifier;
use mira_llm::ReactionGenerator;
use opencv::core::Mat;
use tracing::{debug, warn};

/// Classify `frame` and store the label
pub fn refresh_emotion(classifier: &dyn EmotionClassifier, frame: &Mat, session: &SessionState) {
    match classifier.dominant_emotion(frame) {
        Ok(label) => {
            debug!(emotion = %label, "Emotion refreshed");
            session.set_emotion(label);
        }
        Err(e) => warn!("Emotion refresh failed, keeping {:?}: {}", session.emotion(), e),
    }
}

/// Ask the generator for a reaction and store it.
///
/// The guard marks the reaction slot busy until this returns or the task
/// is aborted.
pub async fn request_reaction(generator: &dyn ReactionGenerator, situation: Situation, guard: ReactionGuard) {
    match generator.react(&situation).await {
        Ok(text) => {
            debug!(generator = generator.name(), "Reaction received");
            guard.session().set_reaction(text);
        }
        Err(e) => warn!(generator = generator.name(), "Reaction request failed: {}", e),
    }
}
