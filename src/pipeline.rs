use log::{debug, info, trace, warn};

use crate::{
    audio::{rms_level, AudioFrame, FrameEncoder},
    capabilities::{PipelineEvent, PipelineObserver, VoiceActivityClassifier, WakeWordScorer},
    config::PipelineConfig,
    internal::BoundedWindow,
    AdaptiveNoiseThreshold, Detection, Utterance, WakeError,
};

/// State of the wake detection pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    /// Waiting for speech onset.
    Idle,
    /// Accumulating an utterance.
    Recording,
    /// Waiting for trailing silence after a completed interaction.
    Cooldown,
}

/// Frame by frame wake word gating.
///
/// Speech onset (voiced frame louder than the adaptive noise threshold) starts
/// an utterance seeded with the pre-roll frames, continuous trailing silence
/// ends it, and the scorer runs once per completed utterance.
/// Frames must be processed in arrival order from a single thread.
pub struct WakeDetectionPipeline<V, S>
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
    post_roll_frames: usize,
    cooldown_frames: usize,
    min_utterance_samples: usize,
    max_utterance_samples: Option<usize>,
    #[cfg(feature = "record")]
    record_path: Option<String>,
    // state
    state: PipelineState,
    pre_roll: BoundedWindow<AudioFrame>,
    utterance: Vec<i16>,
    /// Non-speech flags of the latest frames, used while recording and in cooldown.
    silence_run: BoundedWindow<bool>,
}
impl<V, S> WakeDetectionPipeline<V, S>
where
    V: VoiceActivityClassifier,
    S: WakeWordScorer,
{
    pub fn new(config: &PipelineConfig, vad: V, scorer: S) -> Result<Self, WakeError> {
        config.validate()?;
        let segmentation = &config.segmentation;
        let encoder = FrameEncoder::new(&config.fmt, segmentation.frame_ms, segmentation.sample_rate)?;
        let noise_window_frames = segmentation.frames_in(config.noise.window_ms);
        debug!(
            "pipeline ready: {} samples per frame, pre-roll {} frames, post-roll {} frames, noise window {} frames",
            segmentation.samples_per_frame(),
            segmentation.pre_roll_frames(),
            segmentation.post_roll_frames(),
            noise_window_frames
        );
        Ok(WakeDetectionPipeline {
            vad,
            scorer,
            noise_threshold: AdaptiveNoiseThreshold::from_config(&config.noise, noise_window_frames),
            energy_fn: rms_level,
            observer: None,
            encoder,
            sample_rate: segmentation.sample_rate,
            samples_per_frame: segmentation.samples_per_frame(),
            post_roll_frames: segmentation.post_roll_frames(),
            cooldown_frames: segmentation.cooldown_frames(),
            min_utterance_samples: segmentation.min_utterance_samples(),
            max_utterance_samples: segmentation.max_utterance_samples(),
            #[cfg(feature = "record")]
            record_path: config.record_path.clone(),
            state: PipelineState::Idle,
            pre_roll: BoundedWindow::new(segmentation.pre_roll_frames()),
            utterance: Vec::new(),
            silence_run: BoundedWindow::new(segmentation.post_roll_frames()),
        })
    }
    /// Replaces the frame energy function, it must return values in range 0 - 1.
    pub fn with_energy_fn(mut self, energy_fn: fn(&[i16]) -> f32) -> Self {
        self.energy_fn = energy_fn;
        self
    }
    pub fn with_observer<O: PipelineObserver + 'static>(mut self, observer: O) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }
    /// Processes one frame of `samples_per_frame` samples.
    ///
    /// Returns the scores of an utterance when this frame completes it.
    /// A frame of the wrong length is rejected without touching the state.
    pub fn process_frame(&mut self, frame: &[i16]) -> Result<Option<Detection<S::Label>>, WakeError> {
        if frame.len() != self.samples_per_frame {
            return Err(WakeError::InvalidFrame {
                expected: self.samples_per_frame,
                actual: frame.len(),
            });
        }
        Ok(self.step(AudioFrame::from(frame)))
    }
    /// Processes a byte buffer of `bytes_per_frame` bytes in the configured input format.
    pub fn process_bytes(&mut self, buffer: &[u8]) -> Result<Vec<Detection<S::Label>>, WakeError> {
        let frames = self.encoder.encode(buffer)?;
        Ok(frames
            .into_iter()
            .filter_map(|frame| self.step(frame))
            .collect())
    }
    /// Forces the cooldown state, the in progress utterance, if any, is dropped.
    pub fn enter_cooldown(&mut self) {
        if self.state == PipelineState::Recording {
            debug!("utterance abandoned, entering cooldown");
            self.utterance.clear();
            self.noise_threshold.reset();
        }
        self.silence_run.reset_with_capacity(self.cooldown_frames);
        self.state = PipelineState::Cooldown;
        debug!("cooldown started");
        self.notify(PipelineEvent::CooldownStarted);
    }
    /// Returns to the initial state.
    pub fn reset(&mut self) {
        self.state = PipelineState::Idle;
        self.utterance.clear();
        self.pre_roll.clear();
        self.silence_run.clear();
        self.noise_threshold.clear();
        self.encoder.reset();
    }
    /// Freezes the noise estimate until `unlock_noise_floor` or the end of the current or next utterance.
    pub fn lock_noise_floor(&mut self) {
        self.noise_threshold.lock();
    }
    /// Releases the noise estimate, collected levels are kept or dropped as the reset mode says.
    pub fn unlock_noise_floor(&mut self) {
        self.noise_threshold.reset();
    }
    pub fn state(&self) -> PipelineState {
        self.state
    }
    pub fn threshold(&self) -> f32 {
        self.noise_threshold.threshold()
    }
    pub fn noise_threshold(&self) -> &AdaptiveNoiseThreshold {
        &self.noise_threshold
    }
    pub fn sample_rate(&self) -> usize {
        self.sample_rate
    }
    pub fn samples_per_frame(&self) -> usize {
        self.samples_per_frame
    }
    pub fn bytes_per_frame(&self) -> usize {
        self.encoder.get_input_byte_length()
    }
    /// Samples recorded for the utterance in progress.
    pub fn pending_utterance_len(&self) -> usize {
        self.utterance.len()
    }
    fn step(&mut self, frame: AudioFrame) -> Option<Detection<S::Label>> {
        let level = (self.energy_fn)(&frame).clamp(0., 1.);
        let voiced = self.vad.classify(&frame);
        self.noise_threshold.observe_level(level, voiced);
        let threshold = self.noise_threshold.threshold();
        let is_speech = voiced && level > threshold;
        trace!(
            "{:?} | level {:.3} | threshold {:.3} | speech {}",
            self.state,
            level,
            threshold,
            is_speech
        );
        let detection = match self.state {
            PipelineState::Idle => {
                if is_speech {
                    self.start_utterance(&frame, level, threshold);
                }
                None
            }
            PipelineState::Recording => {
                self.utterance.extend_from_slice(&frame);
                self.silence_run.push(!is_speech);
                let trailing_silence = self.silence_run.is_saturated_with(|silent| silent);
                let max_reached = self
                    .max_utterance_samples
                    .is_some_and(|max_samples| self.utterance.len() >= max_samples);
                if max_reached && !trailing_silence {
                    debug!("max utterance duration reached");
                }
                if trailing_silence || max_reached {
                    self.finish_utterance()
                } else {
                    None
                }
            }
            PipelineState::Cooldown => {
                self.silence_run.push(!is_speech);
                if self.silence_run.is_saturated_with(|silent| silent) {
                    self.state = PipelineState::Idle;
                    debug!("cooldown finished");
                    self.notify(PipelineEvent::CooldownFinished);
                }
                None
            }
        };
        self.pre_roll.push(frame);
        detection
    }
    fn start_utterance(&mut self, frame: &AudioFrame, level: f32, threshold: f32) {
        self.noise_threshold.lock();
        debug!(
            "speech detected (level {:.3}, threshold {:.3}), recording utterance",
            level, threshold
        );
        self.utterance.clear();
        for previous in self.pre_roll.iter() {
            self.utterance.extend_from_slice(previous);
        }
        self.utterance.extend_from_slice(frame);
        self.silence_run.reset_with_capacity(self.post_roll_frames);
        self.state = PipelineState::Recording;
        self.notify(PipelineEvent::SpeechStarted { level, threshold });
    }
    fn finish_utterance(&mut self) -> Option<Detection<S::Label>> {
        let samples = std::mem::take(&mut self.utterance);
        self.state = PipelineState::Idle;
        self.silence_run.clear();
        self.noise_threshold.reset();
        let utterance = Utterance::new(samples, self.sample_rate);
        if utterance.len() < self.min_utterance_samples {
            warn!(
                "utterance too short to score ({}ms), discarding",
                utterance.duration_ms()
            );
            self.notify(PipelineEvent::UtteranceDiscarded {
                samples: utterance.len(),
            });
            return None;
        }
        info!("speech ended, utterance length {}ms", utterance.duration_ms());
        self.notify(PipelineEvent::UtteranceCompleted {
            samples: utterance.len(),
        });
        match self.scorer.score(utterance.samples()) {
            Ok(scores) if scores.is_empty() => {
                debug!("scorer returned no labels");
                None
            }
            Ok(scores) => {
                info!("utterance scored for {} labels", scores.len());
                self.notify(PipelineEvent::Scored {
                    labels: scores.len(),
                });
                let detection = Detection { scores, utterance };
                #[cfg(feature = "record")]
                self.record(&detection);
                Some(detection)
            }
            Err(err) => {
                warn!("{}", err);
                self.notify(PipelineEvent::ScoringFailed {
                    reason: err.to_string(),
                });
                None
            }
        }
    }
    #[cfg(feature = "record")]
    fn record(&self, detection: &Detection<S::Label>) {
        if let Some(record_path) = self.record_path.as_ref() {
            let millis = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|elapsed| elapsed.as_millis())
                .unwrap_or_default();
            let path = std::path::Path::new(record_path).join(format!("utterance-{}.wav", millis));
            match detection.utterance.save_wav(&path) {
                Ok(()) => debug!("utterance recorded to {}", path.display()),
                Err(err) => warn!("unable to record utterance: {}", err),
            }
        }
    }
    fn notify(&mut self, event: PipelineEvent) {
        if let Some(observer) = self.observer.as_mut() {
            observer.on_event(&event);
        }
    }
}
