//! Session state shared between the render loop and side tasks
//!
//! The render loop reads the latest reaction and emotion every frame;
//! background tasks replace them when fresh output arrives. Reads may be
//! stale but never torn.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Reaction shown before the first answer arrives
pub const DEFAULT_REACTION: &str = "Analyzing...";

/// Emotion assumed before the first classification
pub const DEFAULT_EMOTION: &str = "neutral";

#[derive(Debug)]
pub struct SessionState {
    reaction: RwLock<String>,
    emotion: RwLock<String>,
    reaction_busy: AtomicBool,
}

/// Copy of the displayable fields, taken once per frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    pub reaction: String,
    pub emotion: String,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            reaction: RwLock::new(DEFAULT_REACTION.to_string()),
            emotion: RwLock::new(DEFAULT_EMOTION.to_string()),
            reaction_busy: AtomicBool::new(false),
        }
    }

    pub fn reaction(&self) -> String {
        self.reaction.read().clone()
    }

    pub fn set_reaction(&self, text: impl Into<String>) {
        *self.reaction.write() = text.into();
    }

    pub fn emotion(&self) -> String {
        self.emotion.read().clone()
    }

    pub fn set_emotion(&self, label: impl Into<String>) {
        *self.emotion.write() = label.into();
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            reaction: self.reaction(),
            emotion: self.emotion(),
        }
    }

    pub fn is_reaction_busy(&self) -> bool {
        self.reaction_busy.load(Ordering::Acquire)
    }

    /// Mark a reaction request as in flight.
    ///
    /// Returns `None` while another request holds the flag. The flag is
    /// cleared when the returned guard is dropped, whether the request
    /// succeeded, failed, panicked or was aborted.
    pub fn try_begin_reaction(self: &Arc<Self>) -> Option<ReactionGuard> {
        self.reaction_busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ReactionGuard {
                session: Arc::clone(self),
            })
    }
}

/// Holds the reaction busy flag; see [`SessionState::try_begin_reaction`]
#[derive(Debug)]
pub struct ReactionGuard {
    session: Arc<SessionState>,
}

impl ReactionGuard {
    pub fn session(&self) -> &Arc<SessionState> {
        &self.session
    }
}

impl Drop for ReactionGuard {
    fn drop(&mut self) {
        self.session.reaction_busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let session = SessionState::new();
        assert_eq!(session.reaction(), DEFAULT_REACTION);
        assert_eq!(session.emotion(), DEFAULT_EMOTION);
        assert!(!session.is_reaction_busy());
    }

    #[test]
    fn test_setters_and_view() {
        let session = SessionState::new();
        session.set_reaction("Nice hat.");
        session.set_emotion("happy");
        assert_eq!(
            session.view(),
            SessionView {
                reaction: "Nice hat.".to_string(),
                emotion: "happy".to_string(),
            }
        );
    }

    #[test]
    fn test_guard_is_single_flight() {
        let session = Arc::new(SessionState::new());
        let guard = session.try_begin_reaction().expect("first request should start");
        assert!(session.is_reaction_busy());
        assert!(session.try_begin_reaction().is_none());
        drop(guard);
        assert!(!session.is_reaction_busy());
        assert!(session.try_begin_reaction().is_some());
    }

    #[test]
    fn test_guard_released_on_panic() {
        let session = Arc::new(SessionState::new());
        let cloned = session.clone();
        let result = std::thread::spawn(move || {
            let _guard = cloned.try_begin_reaction().unwrap();
            panic!("request blew up");
        })
        .join();
        assert!(result.is_err());
        assert!(!session.is_reaction_busy());
    }

    #[test]
    fn test_concurrent_readers_and_writers() {
        let session = Arc::new(SessionState::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let session = session.clone();
                std::thread::spawn(move || {
                    for j in 0..100 {
                        session.set_reaction(format!("reaction {}-{}", i, j));
                        let text = session.reaction();
                        assert!(text.starts_with("reaction ") || text == DEFAULT_REACTION);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(session.reaction().starts_with("reaction "));
    }
}
