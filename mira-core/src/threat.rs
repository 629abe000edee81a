//! Dangerous-object screening for security mode

use crate::detection::Detection;

/// Labels that raise the alarm
pub const DANGEROUS_LABELS: &[&str] = &["knife", "scissors", "baseball bat"];

pub const PERSON_LABEL: &str = "person";

pub fn is_dangerous(label: &str) -> bool {
    DANGEROUS_LABELS.contains(&label)
}

/// Whether security mode draws and reports this label at all
pub fn is_relevant(label: &str) -> bool {
    label == PERSON_LABEL || is_dangerous(label)
}

/// Detections of one frame, reduced to people and dangerous objects
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ThreatAssessment {
    /// Kept detections, in model order
    pub relevant: Vec<Detection>,
}

impl ThreatAssessment {
    pub fn is_threat(&self) -> bool {
        self.relevant.iter().any(|d| is_dangerous(&d.label))
    }

    pub fn people(&self) -> usize {
        self.relevant.iter().filter(|d| d.label == PERSON_LABEL).count()
    }

    /// Dangerous labels, one entry per detection
    pub fn threat_labels(&self) -> Vec<String> {
        self.relevant
            .iter()
            .filter(|d| is_dangerous(&d.label))
            .map(|d| d.label.clone())
            .collect()
    }

    /// Non-dangerous kept labels, one entry per detection
    pub fn benign_labels(&self) -> Vec<String> {
        self.relevant
            .iter()
            .filter(|d| !is_dangerous(&d.label))
            .map(|d| d.label.clone())
            .collect()
    }
}

pub fn assess(detections: &[Detection]) -> ThreatAssessment {
    ThreatAssessment {
        relevant: detections
            .iter()
            .filter(|d| is_relevant(&d.label))
            .cloned()
            .collect(),
    }
}
