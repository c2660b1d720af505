use crate::{
    audio::{Endianness, SampleFormat},
    constants::{
        DEFAULT_COOLDOWN_MS, DEFAULT_FALLBACK_THRESHOLD, DEFAULT_FRAME_MS,
        DEFAULT_MIN_UTTERANCE_MS, DEFAULT_NOISE_WINDOW_MS, DEFAULT_POST_ROLL_MS,
        DEFAULT_PRE_ROLL_MS, DEFAULT_SAMPLE_RATE, DEFAULT_SLIDING_COOLDOWN_MS,
        DEFAULT_SLIDING_SCORE_THRESHOLD, DEFAULT_SLIDING_WINDOW_MS, DEFAULT_THRESHOLD_MULTIPLIER,
        MAX_TRAILING_SILENCE_MS,
    },
    WakeError,
};
/// Format of the byte buffers given to `process_bytes`.
#[cfg_attr(feature = "debug", derive(Debug))]
#[derive(Clone)]
pub struct AudioFmt {
    /// Sample rate of the input audio stream.
    pub sample_rate: usize,
    /// Sample type and its bit size.
    pub sample_format: SampleFormat,
    /// Number of interleaved channels, only the first one is used.
    pub channels: u16,
    /// Byte order of the encoded samples.
    pub endianness: Endianness,
}
impl Default for AudioFmt {
    fn default() -> AudioFmt {
        AudioFmt {
            sample_rate: DEFAULT_SAMPLE_RATE,
            sample_format: SampleFormat::I16,
            channels: 1,
            endianness: Endianness::Little,
        }
    }
}
impl TryFrom<hound::WavSpec> for AudioFmt {
    type Error = WakeError;
    fn try_from(spec: hound::WavSpec) -> Result<Self, Self::Error> {
        let sample_format = match spec.sample_format {
            hound::SampleFormat::Int => SampleFormat::int_of_size(spec.bits_per_sample),
            hound::SampleFormat::Float => SampleFormat::float_of_size(spec.bits_per_sample),
        }
        .ok_or_else(|| {
            WakeError::UnsupportedFormat(format!(
                "{} bits per sample is not supported",
                spec.bits_per_sample
            ))
        })?;
        Ok(AudioFmt {
            sample_rate: spec.sample_rate as usize,
            sample_format,
            channels: spec.channels,
            endianness: Endianness::Little,
        })
    }
}

/// What `AdaptiveNoiseThreshold::reset` does with the collected noise levels.
#[cfg_attr(feature = "debug", derive(Debug))]
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum NoiseResetMode {
    /// Unlock and forget the collected levels.
    Clear,
    /// Unlock only, old levels are overwritten as new ones arrive.
    Retain,
}
#[cfg(feature = "display")]
impl std::fmt::Display for NoiseResetMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            NoiseResetMode::Clear => write!(f, "clear"),
            NoiseResetMode::Retain => write!(f, "retain"),
        }
    }
}
#[cfg(feature = "display")]
impl std::str::FromStr for NoiseResetMode {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, String> {
        match s.to_lowercase().as_str() {
            "clear" => Ok(Self::Clear),
            "retain" => Ok(Self::Retain),
            _ => Err("Unknown noise reset mode".to_string()),
        }
    }
}

/// Configures the adaptive noise threshold.
#[cfg_attr(feature = "debug", derive(Debug))]
#[derive(Clone)]
pub struct NoiseThresholdConfig {
    /// Duration of non-speech audio whose levels are averaged.
    pub window_ms: usize,
    /// Factor applied to the averaged noise level.
    pub multiplier: f32,
    /// Threshold used while no noise level has been collected.
    pub fallback: f32,
    /// Behavior of the reset at the end of each utterance.
    pub reset_mode: NoiseResetMode,
}
impl Default for NoiseThresholdConfig {
    fn default() -> NoiseThresholdConfig {
        NoiseThresholdConfig {
            window_ms: DEFAULT_NOISE_WINDOW_MS,
            multiplier: DEFAULT_THRESHOLD_MULTIPLIER,
            fallback: DEFAULT_FALLBACK_THRESHOLD,
            reset_mode: NoiseResetMode::Clear,
        }
    }
}

/// Configures how the audio is split into frames and utterances.
#[cfg_attr(feature = "debug", derive(Debug))]
#[derive(Clone)]
pub struct SegmentationConfig {
    /// Sample rate of the frames processed by the detector.
    pub sample_rate: usize,
    /// Duration of a frame.
    pub frame_ms: usize,
    /// Audio kept from before the speech onset.
    pub pre_roll_ms: usize,
    /// Continuous silence that ends an utterance.
    pub post_roll_ms: usize,
    /// Utterances shorter than this are discarded without scoring.
    pub min_utterance_ms: usize,
    /// Utterances are force-completed at this duration. Unbounded if unset.
    pub max_utterance_ms: Option<usize>,
    /// Continuous silence that ends the cooldown.
    pub cooldown_ms: usize,
}
impl Default for SegmentationConfig {
    fn default() -> SegmentationConfig {
        SegmentationConfig {
            sample_rate: DEFAULT_SAMPLE_RATE,
            frame_ms: DEFAULT_FRAME_MS,
            pre_roll_ms: DEFAULT_PRE_ROLL_MS,
            post_roll_ms: DEFAULT_POST_ROLL_MS,
            min_utterance_ms: DEFAULT_MIN_UTTERANCE_MS,
            max_utterance_ms: None,
            cooldown_ms: DEFAULT_COOLDOWN_MS,
        }
    }
}
impl SegmentationConfig {
    pub fn samples_per_frame(&self) -> usize {
        self.sample_rate * self.frame_ms / 1000
    }
    pub fn pre_roll_frames(&self) -> usize {
        self.frames_in(self.pre_roll_ms)
    }
    pub fn post_roll_frames(&self) -> usize {
        self.frames_in(self.post_roll_ms)
    }
    pub fn cooldown_frames(&self) -> usize {
        self.frames_in(self.cooldown_ms)
    }
    pub fn min_utterance_samples(&self) -> usize {
        self.sample_rate * self.min_utterance_ms / 1000
    }
    pub fn max_utterance_samples(&self) -> Option<usize> {
        self.max_utterance_ms
            .map(|max_ms| self.sample_rate * max_ms / 1000)
    }
    pub(crate) fn frames_in(&self, duration_ms: usize) -> usize {
        if self.frame_ms == 0 {
            0
        } else {
            duration_ms / self.frame_ms
        }
    }
    fn validate_frame(&self) -> Result<(), WakeError> {
        if self.sample_rate == 0 || self.frame_ms == 0 || self.samples_per_frame() == 0 {
            return Err(WakeError::Config(format!(
                "a {}ms frame at {}Hz contains no samples",
                self.frame_ms, self.sample_rate
            )));
        }
        Ok(())
    }
    fn validate(&self) -> Result<(), WakeError> {
        self.validate_frame()?;
        validate_silence_window("post-roll", self.post_roll_ms, self.post_roll_frames())?;
        validate_silence_window("cooldown", self.cooldown_ms, self.cooldown_frames())?;
        if let Some(max_utterance_ms) = self.max_utterance_ms {
            if max_utterance_ms < self.post_roll_ms + self.frame_ms {
                return Err(WakeError::Config(format!(
                    "max utterance duration {}ms can not hold speech plus the {}ms post-roll",
                    max_utterance_ms, self.post_roll_ms
                )));
            }
            if max_utterance_ms < self.pre_roll_ms + self.frame_ms {
                return Err(WakeError::Config(format!(
                    "max utterance duration {}ms can not hold the {}ms pre-roll plus the onset frame",
                    max_utterance_ms, self.pre_roll_ms
                )));
            }
            if max_utterance_ms < self.min_utterance_ms {
                return Err(WakeError::Config(format!(
                    "max utterance duration {}ms is below the min utterance duration {}ms",
                    max_utterance_ms, self.min_utterance_ms
                )));
            }
        }
        Ok(())
    }
}

fn validate_silence_window(name: &str, duration_ms: usize, frames: usize) -> Result<(), WakeError> {
    if frames == 0 {
        return Err(WakeError::Config(format!(
            "{} duration {}ms is shorter than a frame",
            name, duration_ms
        )));
    }
    if duration_ms > MAX_TRAILING_SILENCE_MS {
        return Err(WakeError::Config(format!(
            "{} duration {}ms exceeds the {}ms limit",
            name, duration_ms, MAX_TRAILING_SILENCE_MS
        )));
    }
    Ok(())
}

impl NoiseThresholdConfig {
    fn validate(&self, segmentation: &SegmentationConfig) -> Result<(), WakeError> {
        if segmentation.frames_in(self.window_ms) == 0 {
            return Err(WakeError::Config(format!(
                "noise window {}ms is shorter than a frame",
                self.window_ms
            )));
        }
        if !self.multiplier.is_finite() || self.multiplier <= 0. {
            return Err(WakeError::Config(format!(
                "threshold multiplier must be positive, got {}",
                self.multiplier
            )));
        }
        if !(self.fallback > 0. && self.fallback <= 1.) {
            return Err(WakeError::Config(format!(
                "fallback threshold must be in (0, 1], got {}",
                self.fallback
            )));
        }
        Ok(())
    }
}

/// Encapsulates the wake detection pipeline configuration.
#[cfg_attr(feature = "debug", derive(Debug))]
#[derive(Clone, Default)]
pub struct PipelineConfig {
    /// Format of the byte buffers given to `process_bytes`.
    pub fmt: AudioFmt,
    /// Configures the adaptive noise threshold.
    pub noise: NoiseThresholdConfig,
    /// Configures frames and utterance boundaries.
    pub segmentation: SegmentationConfig,
    #[cfg(feature = "record")]
    /// Directory where every scored utterance is saved as a wav file.
    pub record_path: Option<String>,
}
impl PipelineConfig {
    /// Checks the configuration, the pipeline constructor calls it.
    pub fn validate(&self) -> Result<(), WakeError> {
        self.segmentation.validate()?;
        self.validate_input()
    }
    /// Checks the input format, frame and noise settings shared by both detectors.
    fn validate_input(&self) -> Result<(), WakeError> {
        self.segmentation.validate_frame()?;
        self.noise.validate(&self.segmentation)?;
        if self.fmt.channels == 0 || self.fmt.sample_rate == 0 {
            return Err(WakeError::Config(
                "input format requires at least one channel and a sample rate".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configures the sliding window detector.
#[cfg_attr(feature = "debug", derive(Debug))]
#[derive(Clone)]
pub struct SlidingWindowConfig {
    /// Shared audio, noise and frame settings. Pre-roll, post-roll and
    /// utterance limits don't apply to this detector.
    pub pipeline: PipelineConfig,
    /// Duration of the trailing audio window given to the scorer.
    pub window_ms: usize,
    /// Min score some label needs to emit a detection.
    pub score_threshold: f32,
    /// Time detections are suppressed after one is emitted.
    pub cooldown_ms: usize,
}
impl Default for SlidingWindowConfig {
    fn default() -> SlidingWindowConfig {
        SlidingWindowConfig {
            pipeline: PipelineConfig::default(),
            window_ms: DEFAULT_SLIDING_WINDOW_MS,
            score_threshold: DEFAULT_SLIDING_SCORE_THRESHOLD,
            cooldown_ms: DEFAULT_SLIDING_COOLDOWN_MS,
        }
    }
}
impl SlidingWindowConfig {
    pub fn window_samples(&self) -> usize {
        self.pipeline.segmentation.sample_rate * self.window_ms / 1000
    }
    pub fn cooldown_frames(&self) -> usize {
        self.pipeline.segmentation.frames_in(self.cooldown_ms)
    }
    pub fn validate(&self) -> Result<(), WakeError> {
        self.pipeline.validate_input()?;
        if self.window_samples() < self.pipeline.segmentation.samples_per_frame() {
            return Err(WakeError::Config(format!(
                "scoring window {}ms is shorter than a frame",
                self.window_ms
            )));
        }
        validate_silence_window("cooldown", self.cooldown_ms, self.cooldown_frames())?;
        if !(0. ..=1.).contains(&self.score_threshold) {
            return Err(WakeError::Config(format!(
                "score threshold must be in [0, 1], got {}",
                self.score_threshold
            )));
        }
        Ok(())
    }
}

/// Configures the relative energy vad sensibility.
#[cfg_attr(feature = "debug", derive(Debug))]
#[derive(Clone, Copy)]
pub enum VADMode {
    Easy,
    Medium,
    Hard,
}
impl VADMode {
    pub(crate) fn get_value(&self) -> f32 {
        match &self {
            VADMode::Easy => 2.,
            VADMode::Medium => 2.5,
            VADMode::Hard => 3.,
        }
    }
}
#[cfg(feature = "display")]
impl std::fmt::Display for VADMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            VADMode::Easy => write!(f, "easy"),
            VADMode::Medium => write!(f, "medium"),
            VADMode::Hard => write!(f, "hard"),
        }
    }
}
#[cfg(feature = "display")]
impl std::str::FromStr for VADMode {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, String> {
        match s.to_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            _ => Err("Unknown vad mode".to_string()),
        }
    }
}
