//! Tracks the side tasks the render loop starts

use parking_lot::Mutex;
use std::future::Future;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Owns the handles of in-flight emotion refreshes and reaction requests.
///
/// Emotion refreshes are CPU-bound and run on the blocking pool, at most
/// `max_emotion_tasks` at a time. Reaction requests are async HTTP calls;
/// their single-flight rule lives in the session's busy flag.
pub struct TaskSupervisor {
    runtime: Handle,
    max_emotion_tasks: usize,
    emotion: Mutex<Vec<JoinHandle<()>>>,
    reaction: Mutex<Vec<JoinHandle<()>>>,
}

impl TaskSupervisor {
    pub fn new(runtime: Handle, max_emotion_tasks: usize) -> Self {
        Self {
            runtime,
            max_emotion_tasks: max_emotion_tasks.max(1),
            emotion: Mutex::new(Vec::new()),
            reaction: Mutex::new(Vec::new()),
        }
    }

    /// Start a blocking emotion refresh; false when the slot is full
    pub fn spawn_emotion<F>(&self, task: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        let mut handles = self.emotion.lock();
        handles.retain(|h| !h.is_finished());
        if handles.len() >= self.max_emotion_tasks {
            debug!(
                running = handles.len(),
                "Emotion refresh skipped, {} already running",
                self.max_emotion_tasks
            );
            return false;
        }

        handles.push(self.runtime.spawn_blocking(task));
        true
    }

    /// Start an async reaction request
    pub fn spawn_reaction<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut handles = self.reaction.lock();
        handles.retain(|h| !h.is_finished());
        handles.push(self.runtime.spawn(task));
    }

    pub fn emotion_in_flight(&self) -> usize {
        let mut handles = self.emotion.lock();
        handles.retain(|h| !h.is_finished());
        handles.len()
    }

    pub fn reaction_in_flight(&self) -> usize {
        let mut handles = self.reaction.lock();
        handles.retain(|h| !h.is_finished());
        handles.len()
    }

    /// Abort reaction requests and abandon running emotion refreshes.
    ///
    /// Blocking tasks cannot be interrupted; their results land in the
    /// session, which nobody reads any more.
    pub fn shutdown(&self) {
        let reactions = std::mem::take(&mut *self.reaction.lock());
        let emotions = std::mem::take(&mut *self.emotion.lock());

        let aborted = reactions.iter().filter(|h| !h.is_finished()).count();
        for handle in &reactions {
            handle.abort();
        }
        let abandoned = emotions.iter().filter(|h| !h.is_finished()).count();

        info!(aborted, abandoned, "Side tasks shut down");
    }

    /// Wait for every tracked task to finish
    #[cfg(test)]
    pub async fn wait_idle(&self) {
        loop {
            let pending: Vec<JoinHandle<()>> = {
                let mut emotion = self.emotion.lock();
                let mut reaction = self.reaction.lock();
                emotion.drain(..).chain(reaction.drain(..)).collect()
            };
            if pending.is_empty() {
                return;
            }
            for handle in pending {
                let _ = handle.await;
            }
        }
    }
}

impl Drop for TaskSupervisor {
    fn drop(&mut self) {
        for handle in self.reaction.get_mut().iter() {
            handle.abort();
        }
    }
}
