use std::collections::VecDeque;

use log::{debug, info, warn};

use crate::{
    audio::{rms_level, AudioFrame, FrameEncoder},
    capabilities::{PipelineEvent, PipelineObserver, VoiceActivityClassifier, WakeWordScorer},
    config::SlidingWindowConfig,
    AdaptiveNoiseThreshold, Detection, Utterance, WakeError,
};

/// Scores the trailing audio window on every frame that passes the speech prefilter.
///
/// Cheaper to reason about than utterance segmentation but it runs the scorer
/// once per voiced frame, so it only fits scorers cheap enough for that.
/// After a detection every frame is ignored until the cooldown expires.
pub struct SlidingWindowDetector<V, S>
where
    V: VoiceActivityClassifier,
    S: WakeWordScorer,
{
    vad: V,
    scorer: S,
    noise_threshold: AdaptiveNoiseThreshold,
    energy_fn: fn(&[i16]) -> f32,
    observer: Option<Box<dyn PipelineObserver>>,
    encoder: FrameEncoder,
    sample_rate: usize,
    samples_per_frame: usize,
    score_threshold: f32,
    cooldown_frames: usize,
    // state
    window: VecDeque<i16>,
    cooldown_remaining: usize,
}
impl<V, S> SlidingWindowDetector<V, S>
where
    V: VoiceActivityClassifier,
    S: WakeWordScorer,
{
    pub fn new(config: &SlidingWindowConfig, vad: V, scorer: S) -> Result<Self, WakeError> {
        config.validate()?;
        let segmentation = &config.pipeline.segmentation;
        let encoder = FrameEncoder::new(
            &config.pipeline.fmt,
            segmentation.frame_ms,
            segmentation.sample_rate,
        )?;
        let window_samples = config.window_samples();
        Ok(SlidingWindowDetector {
            vad,
            scorer,
            noise_threshold: AdaptiveNoiseThreshold::from_config(
                &config.pipeline.noise,
                segmentation.frames_in(config.pipeline.noise.window_ms),
            ),
            energy_fn: rms_level,
            observer: None,
            encoder,
            sample_rate: segmentation.sample_rate,
            samples_per_frame: segmentation.samples_per_frame(),
            score_threshold: config.score_threshold,
            cooldown_frames: config.cooldown_frames(),
            window: VecDeque::from(vec![0; window_samples]),
            cooldown_remaining: 0,
        })
    }
    pub fn with_energy_fn(mut self, energy_fn: fn(&[i16]) -> f32) -> Self {
        self.energy_fn = energy_fn;
        self
    }
    pub fn with_observer<O: PipelineObserver + 'static>(mut self, observer: O) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }
    pub fn process_frame(&mut self, frame: &[i16]) -> Result<Option<Detection<S::Label>>, WakeError> {
        if frame.len() != self.samples_per_frame {
            return Err(WakeError::InvalidFrame {
                expected: self.samples_per_frame,
                actual: frame.len(),
            });
        }
        Ok(self.step(frame))
    }
    pub fn process_bytes(&mut self, buffer: &[u8]) -> Result<Vec<Detection<S::Label>>, WakeError> {
        let frames: Vec<AudioFrame> = self.encoder.encode(buffer)?;
        Ok(frames
            .iter()
            .filter_map(|frame| self.step(frame))
            .collect())
    }
    /// Suppresses detections for the configured cooldown.
    pub fn enter_cooldown(&mut self) {
        self.cooldown_remaining = self.cooldown_frames;
        debug!("cooldown started");
        self.notify(PipelineEvent::CooldownStarted);
    }
    pub fn is_cooling_down(&self) -> bool {
        self.cooldown_remaining > 0
    }
    pub fn threshold(&self) -> f32 {
        self.noise_threshold.threshold()
    }
    pub fn samples_per_frame(&self) -> usize {
        self.samples_per_frame
    }
    pub fn bytes_per_frame(&self) -> usize {
        self.encoder.get_input_byte_length()
    }
    pub fn window_len(&self) -> usize {
        self.window.len()
    }
    fn step(&mut self, frame: &[i16]) -> Option<Detection<S::Label>> {
        let window_len = self.window.len();
        self.window.extend(frame.iter().copied());
        let overflow = self.window.len().saturating_sub(window_len);
        self.window.drain(..overflow);
        if self.cooldown_remaining > 0 {
            self.cooldown_remaining -= 1;
            if self.cooldown_remaining == 0 {
                debug!("cooldown finished");
                self.notify(PipelineEvent::CooldownFinished);
            }
            return None;
        }
        let level = (self.energy_fn)(frame).clamp(0., 1.);
        let voiced = self.vad.classify(frame);
        self.noise_threshold.observe_level(level, voiced);
        if !voiced || level <= self.noise_threshold.threshold() {
            return None;
        }
        let samples = self.window.make_contiguous().to_vec();
        let scores = match self.scorer.score(&samples) {
            Ok(scores) => scores,
            Err(err) => {
                warn!("{}", err);
                self.notify(PipelineEvent::ScoringFailed {
                    reason: err.to_string(),
                });
                return None;
            }
        };
        if !scores.values().any(|score| *score >= self.score_threshold) {
            return None;
        }
        info!("wake word detected on the sliding window");
        self.notify(PipelineEvent::Scored {
            labels: scores.len(),
        });
        self.enter_cooldown();
        Some(Detection {
            scores,
            utterance: Utterance::new(samples, self.sample_rate),
        })
    }
    fn notify(&mut self, event: PipelineEvent) {
        if let Some(observer) = self.observer.as_mut() {
            observer.on_event(&event);
        }
    }
}
