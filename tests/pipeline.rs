use std::{
    cell::{Cell, RefCell},
    collections::BTreeMap,
    rc::Rc,
};

use log::LevelFilter;
use simple_logger::SimpleLogger;
use wakepipe::{
    Detection, NoiseResetMode, PipelineConfig, PipelineEvent, PipelineState, VoiceActivityClassifier,
    WakeDetectionPipeline, WakeError, WakeWordScorer,
};

const FRAME: usize = 480;
const PRE_ROLL_FRAMES: usize = 13;
const POST_ROLL_FRAMES: usize = 16;
const SILENCE: i16 = 328; // rms ~ 0.01
const SPEECH: i16 = 9830; // rms ~ 0.3

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
enum Wakeword {
    Alexa,
    Computer,
}

/// Returns the configured scores and records the length of every scored buffer.
struct ScriptedScorer {
    fail: bool,
    calls: Rc<RefCell<Vec<usize>>>,
}
impl WakeWordScorer for ScriptedScorer {
    type Label = Wakeword;
    fn score(&mut self, samples: &[i16]) -> Result<BTreeMap<Wakeword, f32>, WakeError> {
        self.calls.borrow_mut().push(samples.len());
        if self.fail {
            return Err(WakeError::Scorer("model unavailable".to_string()));
        }
        Ok(BTreeMap::from([
            (Wakeword::Alexa, 0.8),
            (Wakeword::Computer, 0.1),
        ]))
    }
}

/// Voice activity controlled by the test.
fn scripted_vad() -> (Rc<Cell<bool>>, impl VoiceActivityClassifier) {
    let voiced = Rc::new(Cell::new(false));
    let flag = voiced.clone();
    (voiced, move |_frame: &[i16]| flag.get())
}

fn frame(amplitude: i16) -> Vec<i16> {
    (0..FRAME)
        .map(|i| if i % 2 == 0 { amplitude } else { -amplitude })
        .collect()
}

struct Harness<V: VoiceActivityClassifier> {
    pipeline: WakeDetectionPipeline<V, ScriptedScorer>,
    voiced: Rc<Cell<bool>>,
    calls: Rc<RefCell<Vec<usize>>>,
}
impl<V: VoiceActivityClassifier> Harness<V> {
    fn feed(&mut self, amplitude: i16, voiced: bool, count: usize) -> Vec<Detection<Wakeword>> {
        self.voiced.set(voiced);
        (0..count)
            .filter_map(|_| self.pipeline.process_frame(&frame(amplitude)).unwrap())
            .collect()
    }
    fn silence(&mut self, count: usize) -> Vec<Detection<Wakeword>> {
        self.feed(SILENCE, false, count)
    }
    fn speech(&mut self, count: usize) -> Vec<Detection<Wakeword>> {
        self.feed(SPEECH, true, count)
    }
}

fn harness_with(config: PipelineConfig, fail: bool) -> Harness<impl VoiceActivityClassifier> {
    SimpleLogger::new().with_level(LevelFilter::Debug).init().ok();
    let (voiced, vad) = scripted_vad();
    let calls = Rc::new(RefCell::new(Vec::new()));
    let scorer = ScriptedScorer {
        fail,
        calls: calls.clone(),
    };
    Harness {
        pipeline: WakeDetectionPipeline::new(&config, vad, scorer).unwrap(),
        voiced,
        calls,
    }
}

fn harness() -> Harness<impl VoiceActivityClassifier> {
    harness_with(PipelineConfig::default(), false)
}

#[test]
fn it_detects_one_utterance_end_to_end() {
    let mut harness = harness();
    assert!(harness.silence(100).is_empty());
    assert_eq!(harness.pipeline.state(), PipelineState::Idle);
    assert!((harness.pipeline.threshold() - 0.02).abs() < 0.001);
    // ~1s of speech followed by 600ms of silence
    let mut detections = harness.speech(33);
    assert_eq!(harness.pipeline.state(), PipelineState::Recording);
    detections.extend(harness.silence(20));
    assert_eq!(detections.len(), 1);
    assert_eq!(harness.calls.borrow().len(), 1);
    let detection = &detections[0];
    assert_eq!(
        detection.utterance.len(),
        (PRE_ROLL_FRAMES + 33 + POST_ROLL_FRAMES) * FRAME
    );
    assert_eq!(detection.best_match(), Some((&Wakeword::Alexa, 0.8)));
    assert!(detection.is_triggered(0.5));
    assert_eq!(harness.pipeline.state(), PipelineState::Idle);
    assert!(!harness.pipeline.noise_threshold().is_locked());
}

#[test]
fn it_recovers_the_pre_roll() {
    let mut harness = harness();
    let silence_frames = (0..20).map(|i| frame(100 + i)).collect::<Vec<_>>();
    harness.voiced.set(false);
    for silence in &silence_frames {
        assert!(harness.pipeline.process_frame(silence).unwrap().is_none());
    }
    let mut detections = harness.speech(1);
    detections.extend(harness.silence(POST_ROLL_FRAMES));
    assert_eq!(detections.len(), 1);
    let frames = detections[0].utterance.frames(FRAME).collect::<Vec<_>>();
    assert_eq!(frames.len(), PRE_ROLL_FRAMES + 1 + POST_ROLL_FRAMES);
    for (index, recovered) in frames[..PRE_ROLL_FRAMES].iter().enumerate() {
        assert_eq!(*recovered, &silence_frames[20 - PRE_ROLL_FRAMES + index][..]);
    }
    assert_eq!(frames[PRE_ROLL_FRAMES], &frame(SPEECH)[..]);
}

#[test]
fn it_recovers_a_partial_pre_roll() {
    let mut harness = harness();
    harness.silence(3);
    let mut detections = harness.speech(1);
    detections.extend(harness.silence(POST_ROLL_FRAMES));
    assert_eq!(detections.len(), 1);
    assert_eq!(
        detections[0].utterance.len(),
        (3 + 1 + POST_ROLL_FRAMES) * FRAME
    );
}

#[test]
fn it_waits_for_the_whole_post_roll() {
    let mut harness = harness();
    harness.silence(20);
    harness.speech(10);
    // a short pause doesn't end the utterance
    assert!(harness.silence(POST_ROLL_FRAMES - 1).is_empty());
    assert_eq!(harness.pipeline.state(), PipelineState::Recording);
    assert!(harness.speech(5).is_empty());
    assert!(harness.silence(POST_ROLL_FRAMES - 1).is_empty());
    assert_eq!(harness.pipeline.state(), PipelineState::Recording);
    assert_eq!(harness.silence(1).len(), 1);
    assert_eq!(harness.pipeline.state(), PipelineState::Idle);
}

#[test]
fn it_discards_utterances_below_the_min_duration() {
    let mut config = PipelineConfig::default();
    config.segmentation.min_utterance_ms = 5000;
    let mut harness = harness_with(config, false);
    harness.silence(20);
    harness.speech(5);
    assert!(harness.silence(POST_ROLL_FRAMES).is_empty());
    assert_eq!(harness.pipeline.state(), PipelineState::Idle);
    assert!(harness.calls.borrow().is_empty());
    assert!(!harness.pipeline.noise_threshold().is_locked());
}

#[test]
fn it_never_detects_during_cooldown() {
    let mut harness = harness();
    harness.silence(20);
    harness.pipeline.enter_cooldown();
    assert_eq!(harness.pipeline.state(), PipelineState::Cooldown);
    assert!(harness.speech(100).is_empty());
    assert_eq!(harness.pipeline.state(), PipelineState::Cooldown);
    assert!(harness.silence(POST_ROLL_FRAMES - 1).is_empty());
    assert_eq!(harness.pipeline.state(), PipelineState::Cooldown);
    assert!(harness.silence(1).is_empty());
    assert_eq!(harness.pipeline.state(), PipelineState::Idle);
    assert!(harness.calls.borrow().is_empty());
    // listening resumes
    harness.speech(1);
    assert_eq!(harness.pipeline.state(), PipelineState::Recording);
}

#[test]
fn it_returns_to_idle_when_the_scorer_fails() {
    let mut harness = harness_with(PipelineConfig::default(), true);
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    harness.pipeline = harness
        .pipeline
        .with_observer(move |event: &PipelineEvent| sink.borrow_mut().push(event.clone()));
    harness.silence(20);
    harness.speech(10);
    assert!(harness.silence(POST_ROLL_FRAMES).is_empty());
    assert_eq!(harness.calls.borrow().len(), 1);
    assert_eq!(harness.pipeline.state(), PipelineState::Idle);
    assert!(!harness.pipeline.noise_threshold().is_locked());
    assert!(events
        .borrow()
        .iter()
        .any(|event| matches!(event, PipelineEvent::ScoringFailed { .. })));
    // the next utterance is still processed
    harness.speech(10);
    harness.silence(POST_ROLL_FRAMES);
    assert_eq!(harness.calls.borrow().len(), 2);
}

#[test]
fn it_notifies_the_observer() {
    let mut harness = harness();
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    harness.pipeline = harness
        .pipeline
        .with_observer(move |event: &PipelineEvent| sink.borrow_mut().push(event.clone()));
    harness.silence(20);
    harness.speech(10);
    harness.silence(POST_ROLL_FRAMES);
    harness.pipeline.enter_cooldown();
    harness.silence(POST_ROLL_FRAMES);
    let events = events.borrow();
    assert_eq!(events.len(), 5);
    assert!(matches!(events[0], PipelineEvent::SpeechStarted { .. }));
    assert_eq!(
        events[1],
        PipelineEvent::UtteranceCompleted {
            samples: (PRE_ROLL_FRAMES + 10 + POST_ROLL_FRAMES) * FRAME
        }
    );
    assert_eq!(events[2], PipelineEvent::Scored { labels: 2 });
    assert_eq!(events[3], PipelineEvent::CooldownStarted);
    assert_eq!(events[4], PipelineEvent::CooldownFinished);
}

#[test]
fn it_completes_utterances_at_the_max_duration() {
    let mut config = PipelineConfig::default();
    config.segmentation.max_utterance_ms = Some(1500);
    let mut harness = harness_with(config, false);
    harness.silence(PRE_ROLL_FRAMES);
    let detections = harness.speech(60);
    assert_eq!(detections.len(), 1);
    assert_eq!(detections[0].utterance.len(), 50 * FRAME);
    assert_eq!(harness.pipeline.state(), PipelineState::Recording);
}

#[test]
fn it_keeps_the_state_on_invalid_frames() {
    let mut harness = harness();
    harness.silence(20);
    harness.speech(3);
    let pending = harness.pipeline.pending_utterance_len();
    assert!(matches!(
        harness.pipeline.process_frame(&[0; 10]),
        Err(WakeError::InvalidFrame { .. })
    ));
    assert_eq!(harness.pipeline.state(), PipelineState::Recording);
    assert_eq!(harness.pipeline.pending_utterance_len(), pending);
}

#[test]
fn it_processes_byte_buffers() {
    let mut harness = harness();
    assert_eq!(harness.pipeline.bytes_per_frame(), FRAME * 2);
    let to_bytes = |amplitude: i16| {
        frame(amplitude)
            .iter()
            .flat_map(|sample| sample.to_le_bytes())
            .collect::<Vec<u8>>()
    };
    let mut detections = Vec::new();
    harness.voiced.set(false);
    for _ in 0..20 {
        detections.extend(harness.pipeline.process_bytes(&to_bytes(SILENCE)).unwrap());
    }
    harness.voiced.set(true);
    for _ in 0..10 {
        detections.extend(harness.pipeline.process_bytes(&to_bytes(SPEECH)).unwrap());
    }
    harness.voiced.set(false);
    for _ in 0..POST_ROLL_FRAMES {
        detections.extend(harness.pipeline.process_bytes(&to_bytes(SILENCE)).unwrap());
    }
    assert_eq!(detections.len(), 1);
    assert!(matches!(
        harness.pipeline.process_bytes(&[0_u8; 3]),
        Err(WakeError::InvalidBuffer { .. })
    ));
}

#[test]
fn it_requires_voice_and_energy_for_speech() {
    let mut harness = harness();
    harness.silence(50);
    // loud but not voiced
    harness.feed(SPEECH, false, 5);
    assert_eq!(harness.pipeline.state(), PipelineState::Idle);
    // voiced but under the noise threshold
    harness.feed(SILENCE, true, 5);
    assert_eq!(harness.pipeline.state(), PipelineState::Idle);
    harness.speech(1);
    assert_eq!(harness.pipeline.state(), PipelineState::Recording);
}

const PLAYBACK: i16 = 2950; // rms ~ 0.09

fn observed<V: VoiceActivityClassifier>(
    harness: Harness<V>,
) -> (Harness<V>, Rc<RefCell<Vec<PipelineEvent>>>) {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    let Harness {
        pipeline,
        voiced,
        calls,
    } = harness;
    let pipeline =
        pipeline.with_observer(move |event: &PipelineEvent| sink.borrow_mut().push(event.clone()));
    (
        Harness {
            pipeline,
            voiced,
            calls,
        },
        events,
    )
}

#[test]
fn it_holds_and_releases_a_caller_lock() {
    let mut harness = harness();
    harness.silence(100);
    let floor = harness.pipeline.threshold();
    assert!((floor - 0.02).abs() < 0.001);
    harness.pipeline.lock_noise_floor();
    harness.pipeline.enter_cooldown();
    harness.feed(PLAYBACK, false, 40);
    assert_eq!(harness.pipeline.state(), PipelineState::Idle);
    assert!(harness.pipeline.noise_threshold().is_locked());
    assert_eq!(harness.pipeline.threshold(), floor);
    harness.pipeline.unlock_noise_floor();
    assert!(!harness.pipeline.noise_threshold().is_locked());
    assert!(harness.pipeline.noise_threshold().is_empty());
    harness.feed(PLAYBACK, false, 20);
    assert_eq!(harness.pipeline.noise_threshold().len(), 20);
    assert!((harness.pipeline.threshold() - 0.18).abs() < 0.001);
}

#[test]
fn it_gates_with_a_custom_energy_fn() {
    let mut muted = harness();
    muted.pipeline = muted.pipeline.with_energy_fn(|_: &[i16]| 0.);
    muted.silence(20);
    assert!(muted.speech(10).is_empty());
    assert_eq!(muted.pipeline.state(), PipelineState::Idle);
    // energy above the documented range is clamped before gating
    let (mut harness, events) = observed(harness());
    harness.pipeline = harness
        .pipeline
        .with_energy_fn(|frame: &[i16]| if frame[0] > 5000 { 5. } else { 0.01 });
    harness.silence(20);
    assert!((harness.pipeline.threshold() - 0.02).abs() < 1e-6);
    harness.speech(1);
    assert_eq!(harness.pipeline.state(), PipelineState::Recording);
    match events.borrow()[0] {
        PipelineEvent::SpeechStarted { level, threshold } => {
            assert_eq!(level, 1.);
            assert!((threshold - 0.02).abs() < 1e-6);
        }
        ref other => panic!("unexpected event {:?}", other),
    };
}

#[test]
fn retain_mode_keeps_the_noise_estimate_across_utterances() {
    let mut config = PipelineConfig::default();
    config.noise.reset_mode = NoiseResetMode::Retain;
    let mut harness = harness_with(config, false);
    harness.silence(20);
    harness.speech(10);
    assert_eq!(harness.silence(POST_ROLL_FRAMES).len(), 1);
    assert_eq!(harness.pipeline.state(), PipelineState::Idle);
    assert!(!harness.pipeline.noise_threshold().is_locked());
    assert_eq!(harness.pipeline.noise_threshold().len(), 20);
    assert!((harness.pipeline.threshold() - 0.02).abs() < 0.001);
    // the default mode empties it
    let mut cleared = harness_with(PipelineConfig::default(), false);
    cleared.silence(20);
    cleared.speech(10);
    cleared.silence(POST_ROLL_FRAMES);
    assert!(cleared.pipeline.noise_threshold().is_empty());
}

#[test]
fn it_notifies_discarded_utterances() {
    let mut config = PipelineConfig::default();
    config.segmentation.min_utterance_ms = 5000;
    let (mut harness, events) = observed(harness_with(config, false));
    harness.silence(20);
    harness.speech(5);
    harness.silence(POST_ROLL_FRAMES);
    let events = events.borrow();
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], PipelineEvent::SpeechStarted { .. }));
    assert_eq!(
        events[1],
        PipelineEvent::UtteranceDiscarded {
            samples: (PRE_ROLL_FRAMES + 5 + POST_ROLL_FRAMES) * FRAME
        }
    );
}

#[cfg(feature = "record")]
#[test]
fn it_records_scored_utterances() {
    let dir = std::env::temp_dir().join(format!("wakepipe-records-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let mut config = PipelineConfig::default();
    config.record_path = Some(dir.to_string_lossy().to_string());
    let mut harness = harness_with(config, false);
    harness.silence(20);
    harness.speech(10);
    assert_eq!(harness.silence(POST_ROLL_FRAMES).len(), 1);
    assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 1);
    std::fs::remove_dir_all(dir).ok();
}
