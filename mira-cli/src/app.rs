//! The render loop and the per-frame pipeline

use crate::config::MiraConfig;
use crate::supervisor::TaskSupervisor;
use crate::workers::{refresh_emotion, request_reaction};
use mira_core::gesture;
use mira_core::threat;
use mira_core::{FrameAnalysis, Mode, Sampler, SessionState, Situation};
use mira_eye::{
    EmotionClassifier, FrameSink, FrameSource, HudRenderer, HudView, Perception, Status, VisionError,
};
use mira_llm::ReactionGenerator;
use opencv::core::Mat;
use opencv::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

/// Why the render loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// No more frames, or the source failed
    EndOfStream,
    /// The quit key was pressed
    QuitKey,
    /// Ctrl-C
    Interrupted,
}

/// Per-frame state machine: perceive, sample, dispatch, draw
pub struct App {
    mode: Mode,
    session: Arc<SessionState>,
    sampler: Sampler,
    perception: Box<dyn Perception>,
    emotion: Option<Arc<dyn EmotionClassifier>>,
    generator: Arc<dyn ReactionGenerator>,
    hud: HudRenderer,
    supervisor: TaskSupervisor,
    gesture_joint: usize,
    gesture_threshold: f32,
    frames: u64,
}

impl App {
    pub fn new(
        config: &MiraConfig,
        perception: Box<dyn Perception>,
        emotion: Option<Arc<dyn EmotionClassifier>>,
        generator: Arc<dyn ReactionGenerator>,
        runtime: Handle,
    ) -> Self {
        let emotion = emotion.filter(|_| config.mode.uses_emotion());
        let sampler = Sampler::from_config(&config.sampler).with_emotion(emotion.is_some());

        info!(
            mode = %config.mode,
            perception = perception.name(),
            generator = generator.name(),
            emotion = emotion.is_some(),
            "MIRA pipeline ready"
        );

        Self {
            mode: config.mode,
            session: Arc::new(SessionState::new()),
            sampler,
            perception,
            emotion,
            generator,
            hud: HudRenderer::new(config.hud.clone()),
            supervisor: TaskSupervisor::new(runtime, config.sampler.max_emotion_tasks),
            gesture_joint: config.vision.gesture_joint,
            gesture_threshold: config.vision.gesture_threshold,
            frames: 0,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn session(&self) -> &Arc<SessionState> {
        &self.session
    }

    pub fn supervisor(&self) -> &TaskSupervisor {
        &self.supervisor
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Process one frame and return it annotated.
    ///
    /// Perception errors propagate; side-task failures never reach here.
    pub fn on_frame(&mut self, frame: &Mat, now: Instant) -> Result<Mat, VisionError> {
        self.frames += 1;
        let analysis = self.perception.analyze(frame)?;

        let (status, urgent, situation, shown) = match self.mode {
            Mode::Security => {
                let assessment = threat::assess(&analysis.detections);
                let threat = assessment.is_threat();
                let situation = Situation::scene(&assessment);
                // Only people and dangerous objects are drawn
                let shown = FrameAnalysis::new(assessment.relevant, Vec::new());
                (Status::Security { threat }, threat, situation, shown)
            }
            Mode::Commentary => {
                let gesture = gesture::classify(&analysis.subjects, self.gesture_joint, self.gesture_threshold);
                let emotion = self.session.emotion();
                (
                    Status::Mood { emotion: emotion.clone() },
                    false,
                    Situation::mood(emotion, gesture),
                    analysis,
                )
            }
        };

        if let Some(trigger) = self.sampler.poll(now, urgent, self.session.is_reaction_busy()) {
            if trigger.refresh_emotion {
                self.dispatch_emotion(frame)?;
            }
            if trigger.request_reaction {
                self.dispatch_reaction(situation);
            }
        }

        let view = HudView {
            status,
            reaction: self.session.reaction(),
        };
        self.hud.render(frame, &shown, &view)
    }

    fn dispatch_emotion(&self, frame: &Mat) -> Result<(), VisionError> {
        let Some(classifier) = &self.emotion else {
            return Ok(());
        };

        let classifier = Arc::clone(classifier);
        let session = Arc::clone(&self.session);
        let snapshot = frame.try_clone()?;
        self.supervisor
            .spawn_emotion(move || refresh_emotion(classifier.as_ref(), &snapshot, &session));
        Ok(())
    }

    fn dispatch_reaction(&self, situation: Situation) {
        let Some(guard) = self.session.try_begin_reaction() else {
            debug!("Reaction already in flight");
            return;
        };

        debug!(tone = ?situation.tone(), "Requesting reaction");
        let generator = Arc::clone(&self.generator);
        self.supervisor
            .spawn_reaction(async move { request_reaction(generator.as_ref(), situation, guard).await });
    }

    /// Stop every side task
    pub fn shutdown(&self) {
        self.supervisor.shutdown();
        info!(frames = self.frames, "MIRA stopped");
    }
}

/// Drive `app` until the stream ends, the sink asks to quit or `stop` is set.
///
/// Side tasks are shut down however the loop ends.
pub fn run(
    app: &mut App,
    source: &mut dyn FrameSource,
    sink: Option<&mut dyn FrameSink>,
    stop: &AtomicBool,
) -> Result<StopReason, VisionError> {
    let result = drive(app, source, sink, stop);
    app.shutdown();
    result
}

fn drive(
    app: &mut App,
    source: &mut dyn FrameSource,
    mut sink: Option<&mut dyn FrameSink>,
    stop: &AtomicBool,
) -> Result<StopReason, VisionError> {
    loop {
        if stop.load(Ordering::SeqCst) {
            info!("Interrupted");
            return Ok(StopReason::Interrupted);
        }

        let frame = match source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                info!("End of stream");
                return Ok(StopReason::EndOfStream);
            }
            Err(e) => {
                warn!("Frame acquisition failed, stopping: {}", e);
                return Ok(StopReason::EndOfStream);
            }
        };

        let annotated = app.on_frame(&frame, Instant::now())?;

        if let Some(sink) = sink.as_deref_mut() {
            if sink.present(&annotated)? {
                info!("Quit requested");
                return Ok(StopReason::QuitKey);
            }
        }
    }
}
