//! Wall-clock gate for the side analyses

use crate::config::SamplerConfig;
use std::time::{Duration, Instant};
use tracing::debug;

/// What to start on a frame that passed the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trigger {
    pub refresh_emotion: bool,
    pub request_reaction: bool,
}

/// Lets the side analyses run at most once per cooldown.
///
/// Owned by the render loop. The first poll always fires.
#[derive(Debug, Clone)]
pub struct Sampler {
    regular: Duration,
    emergency: Duration,
    refresh_emotion: bool,
    last_trigger: Option<Instant>,
}

impl Sampler {
    pub fn new(regular: Duration, emergency: Duration) -> Self {
        Self {
            regular,
            emergency,
            refresh_emotion: true,
            last_trigger: None,
        }
    }

    pub fn from_config(config: &SamplerConfig) -> Self {
        Self::new(config.cooldown(), config.emergency_cooldown())
    }

    /// Whether triggers include an emotion refresh
    pub fn with_emotion(mut self, refresh_emotion: bool) -> Self {
        self.refresh_emotion = refresh_emotion;
        self
    }

    pub fn cooldown(&self, urgent: bool) -> Duration {
        if urgent {
            self.emergency
        } else {
            self.regular
        }
    }

    pub fn last_trigger(&self) -> Option<Instant> {
        self.last_trigger
    }

    /// Decide whether this frame triggers the side analyses.
    ///
    /// Fires when more than the cooldown has elapsed since the last
    /// trigger, resetting the timestamp to `now`. `urgent` selects the
    /// emergency cooldown; `reaction_busy` suppresses the reaction request
    /// but not the emotion refresh.
    pub fn poll(&mut self, now: Instant, urgent: bool, reaction_busy: bool) -> Option<Trigger> {
        let cooldown = self.cooldown(urgent);
        if let Some(last) = self.last_trigger {
            if now.saturating_duration_since(last) <= cooldown {
                return None;
            }
        }

        self.last_trigger = Some(now);
        let trigger = Trigger {
            refresh_emotion: self.refresh_emotion,
            request_reaction: !reaction_busy,
        };
        debug!(
            urgent,
            cooldown_ms = cooldown.as_millis() as u64,
            refresh_emotion = trigger.refresh_emotion,
            request_reaction = trigger.request_reaction,
            "Sampler triggered"
        );
        Some(trigger)
    }
}
