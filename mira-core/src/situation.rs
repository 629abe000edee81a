//! Situation summaries sent to the reaction generator

use crate::gesture::Gesture;
use crate::threat::ThreatAssessment;
use serde::{Deserialize, Serialize};

/// Framing of the reaction prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tone {
    Commentary,
    Alert,
}

/// What MIRA saw when the sampler fired
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Situation {
    /// Commentary mode: latest emotion and coarse pose
    Mood { emotion: String, gesture: Gesture },
    /// Security mode: kept labels split by danger
    Scene { threats: Vec<String>, benign: Vec<String> },
}

impl Situation {
    pub fn mood(emotion: impl Into<String>, gesture: Gesture) -> Self {
        Situation::Mood {
            emotion: emotion.into(),
            gesture,
        }
    }

    pub fn scene(assessment: &ThreatAssessment) -> Self {
        Situation::Scene {
            threats: assessment.threat_labels(),
            benign: assessment.benign_labels(),
        }
    }

    pub fn tone(&self) -> Tone {
        match self {
            Situation::Scene { threats, .. } if !threats.is_empty() => Tone::Alert,
            _ => Tone::Commentary,
        }
    }

    /// User message for the chat request
    pub fn describe(&self) -> String {
        match self {
            Situation::Mood { emotion, gesture } => format!(
                "The user looks {} and is {}. Give a short, sharp comment.",
                emotion,
                gesture.describe()
            ),
            Situation::Scene { threats, benign } => {
                let in_view = if benign.is_empty() {
                    "nobody".to_string()
                } else {
                    benign.join(", ")
                };
                if threats.is_empty() {
                    format!("In view: {}. No dangerous objects. Give a short status comment.", in_view)
                } else {
                    format!(
                        "ALERT: dangerous objects detected: {}. Also in view: {}. Issue a short warning.",
                        threats.join(", "),
                        in_view
                    )
                }
            }
        }
    }
}
