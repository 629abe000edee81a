//! Mode switch and sampler timing

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Which program MIRA runs as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Pose estimation + emotion sampling, sarcastic commentary
    #[default]
    Commentary,
    /// Object detection, dangerous-object alerts
    Security,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Commentary => "commentary",
            Mode::Security => "security",
        }
    }

    /// Whether this mode samples the emotion classifier
    pub fn uses_emotion(&self) -> bool {
        matches!(self, Mode::Commentary)
    }

    /// Title of the display window
    pub fn window_title(&self) -> &'static str {
        match self {
            Mode::Commentary => "MIRA VISION",
            Mode::Security => "MIRA SECURITY",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "commentary" | "pose" => Ok(Mode::Commentary),
            "security" | "object" => Ok(Mode::Security),
            other => Err(Error::UnknownMode(other.to_string())),
        }
    }
}

/// Cooldowns gating the side analyses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Minimum interval between two triggers, in seconds
    pub cooldown_secs: f64,
    /// Interval used while a dangerous object is in view, in seconds
    pub emergency_cooldown_secs: f64,
    /// Emotion refreshes allowed to run at the same time
    pub max_emotion_tasks: usize,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: 15.0,
            emergency_cooldown_secs: 5.0,
            max_emotion_tasks: 2,
        }
    }
}

impl SamplerConfig {
    /// The quicker commentary preset
    pub fn fast() -> Self {
        Self {
            cooldown_secs: 4.0,
            ..Self::default()
        }
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs_f64(self.cooldown_secs)
    }

    pub fn emergency_cooldown(&self) -> Duration {
        Duration::from_secs_f64(self.emergency_cooldown_secs)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("cooldown_secs", self.cooldown_secs),
            ("emergency_cooldown_secs", self.emergency_cooldown_secs),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::Configuration(format!(
                    "{} must be a positive number of seconds, got {}",
                    name, value
                )));
            }
            if value > 86_400.0 {
                return Err(Error::Configuration(format!("{} too large (max one day)", name)));
            }
        }

        if self.max_emotion_tasks == 0 || self.max_emotion_tasks > 16 {
            return Err(Error::Configuration(
                "max_emotion_tasks must be between 1 and 16".to_string(),
            ));
        }

        Ok(())
    }
}
