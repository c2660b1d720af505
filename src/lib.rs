mod audio;
mod capabilities;
mod config;
mod constants;
mod detection;
mod error;
mod internal;
mod noise_threshold;
mod pipeline;
mod sliding_window;
mod vad;
pub use audio::rms_level;
pub use audio::AudioFrame;
pub use audio::Endianness;
pub use audio::FrameEncoder;
pub use audio::Sample;
pub use audio::SampleFormat;
pub use capabilities::{PipelineEvent, PipelineObserver, VoiceActivityClassifier, WakeWordScorer};
pub use config::AudioFmt;
pub use config::NoiseResetMode;
pub use config::NoiseThresholdConfig;
pub use config::PipelineConfig;
pub use config::SegmentationConfig;
pub use config::SlidingWindowConfig;
pub use config::VADMode;
pub use constants::MAX_TRAILING_SILENCE_MS;
pub use detection::{Detection, Utterance};
pub use error::WakeError;
pub use noise_threshold::AdaptiveNoiseThreshold;
pub use pipeline::{PipelineState, WakeDetectionPipeline};
pub use sliding_window::SlidingWindowDetector;
pub use vad::RelativeEnergyVad;
#[cfg(feature = "vad")]
pub use vad::{WebRtcClassifier, WebRtcVadMode};
