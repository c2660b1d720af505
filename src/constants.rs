pub(crate) const DEFAULT_SAMPLE_RATE: usize = 16000;
pub(crate) const DEFAULT_FRAME_MS: usize = 30;
// segmentation
pub(crate) const DEFAULT_PRE_ROLL_MS: usize = 400;
pub(crate) const DEFAULT_POST_ROLL_MS: usize = 500;
pub(crate) const DEFAULT_COOLDOWN_MS: usize = 500;
/// 1280 samples at 16kHz, the smallest chunk the scoring models accept.
pub(crate) const DEFAULT_MIN_UTTERANCE_MS: usize = 80;
/// Upper bound for any trailing-silence window (post-roll and cooldown).
pub const MAX_TRAILING_SILENCE_MS: usize = 10_000;
// noise threshold
pub(crate) const DEFAULT_NOISE_WINDOW_MS: usize = 3000;
pub(crate) const DEFAULT_THRESHOLD_MULTIPLIER: f32 = 2.0;
pub(crate) const DEFAULT_FALLBACK_THRESHOLD: f32 = 0.15;
// sliding window
pub(crate) const DEFAULT_SLIDING_WINDOW_MS: usize = 1000;
pub(crate) const DEFAULT_SLIDING_SCORE_THRESHOLD: f32 = 0.5;
pub(crate) const DEFAULT_SLIDING_COOLDOWN_MS: usize = 2000;
// relative energy vad
pub(crate) const VAD_ENERGY_WINDOW: usize = 50;
pub(crate) const VAD_MIN_LOUD_FRAMES: usize = 10;
pub(crate) const VAD_DEFAULT_HANGOVER_FRAMES: usize = 30;
// pcm
pub(crate) const PCM_16_MAX: f32 = i16::MAX as f32;
