// Frame-by-frame walk through the decisions the render loop makes

use mira_core::gesture::{self, Gesture, LEFT_WRIST, RAISED_THRESHOLD};
use mira_core::text::wrap_chunks;
use mira_core::threat;
use mira_core::{BoundingBox, Detection, Keypoint, Sampler, SamplerConfig, SessionState, Situation, Subject};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn det(label: &str) -> Detection {
    Detection::new(BoundingBox::new(10.0, 10.0, 50.0, 90.0), 0, label, 0.7)
}

fn subject_with_wrist(y: f32) -> Subject {
    let mut keypoints = vec![Keypoint::new(0.5, 0.6, 0.9); 17];
    keypoints[LEFT_WRIST] = Keypoint::new(0.4, y, 0.9);
    Subject::new(keypoints)
}

#[test]
fn test_security_sequence_switches_cooldown() {
    let mut sampler = Sampler::from_config(&SamplerConfig::default()).with_emotion(false);
    let session = Arc::new(SessionState::new());
    let start = Instant::now();

    // Calm scene: first frame fires, then the regular cooldown applies
    let calm = threat::assess(&[det("person"), det("chair")]);
    assert!(!calm.is_threat());
    let trigger = sampler.poll(start, calm.is_threat(), session.is_reaction_busy()).unwrap();
    assert!(!trigger.refresh_emotion);
    assert!(trigger.request_reaction);
    assert!(sampler
        .poll(start + Duration::from_secs(6), calm.is_threat(), false)
        .is_none());

    // A knife appears: the emergency cooldown has already passed
    let armed = threat::assess(&[det("person"), det("knife")]);
    assert!(armed.is_threat());
    let situation = Situation::scene(&armed);
    assert_eq!(
        situation,
        Situation::Scene {
            threats: vec!["knife".to_string()],
            benign: vec!["person".to_string()],
        }
    );

    let guard = session.try_begin_reaction().unwrap();
    let trigger = sampler
        .poll(start + Duration::from_secs(6), armed.is_threat(), session.is_reaction_busy())
        .unwrap();
    // Reaction slot taken, so only the timestamp moves
    assert!(!trigger.request_reaction);
    drop(guard);
    assert!(!session.is_reaction_busy());

    assert!(sampler
        .poll(start + Duration::from_secs(11), true, false)
        .is_none());
    assert!(sampler
        .poll(start + Duration::from_millis(11_001), true, false)
        .is_some());
}

#[test]
fn test_commentary_gesture_follows_wrist() {
    let raised = [subject_with_wrist(0.2)];
    let lowered = [subject_with_wrist(RAISED_THRESHOLD)];

    assert_eq!(gesture::classify(&raised, LEFT_WRIST, RAISED_THRESHOLD), Gesture::Excited);
    assert_eq!(gesture::classify(&lowered, LEFT_WRIST, RAISED_THRESHOLD), Gesture::Still);
    assert_eq!(gesture::classify(&[], LEFT_WRIST, RAISED_THRESHOLD), Gesture::Still);

    let situation = Situation::mood("happy", Gesture::Excited);
    let message = situation.describe();
    assert!(message.contains("happy"));
    assert!(message.contains(Gesture::Excited.describe()));
}

#[test]
fn test_reaction_lines_cover_whole_text() {
    let reaction = format!("MIRA: {}", "x".repeat(130));
    let lines = wrap_chunks(&reaction, 60);

    assert_eq!(lines.len(), 3);
    assert!(lines.iter().all(|l| l.chars().count() <= 60));
    assert_eq!(lines.concat(), reaction);
}
