use log::trace;

use crate::{
    audio::rms_level, config::NoiseThresholdConfig, internal::BoundedWindow, NoiseResetMode,
};

/// Rolling estimate of the ambient noise level.
///
/// Only levels of non-speech frames are collected, and none while locked,
/// so the speaker's voice never raises the noise floor. The detection
/// threshold is the mean of the collected levels times the multiplier.
pub struct AdaptiveNoiseThreshold {
    multiplier: f32,
    fallback: f32,
    reset_mode: NoiseResetMode,
    // state
    locked: bool,
    levels: BoundedWindow<f32>,
}
impl AdaptiveNoiseThreshold {
    pub fn new(window_frames: usize, multiplier: f32, fallback: f32) -> Self {
        AdaptiveNoiseThreshold {
            multiplier,
            fallback,
            reset_mode: NoiseResetMode::Clear,
            locked: false,
            levels: BoundedWindow::new(window_frames),
        }
    }
    pub(crate) fn from_config(config: &NoiseThresholdConfig, window_frames: usize) -> Self {
        let mut threshold = Self::new(window_frames, config.multiplier, config.fallback);
        threshold.reset_mode = config.reset_mode;
        threshold
    }
    /// Collects the frame level unless locked or the frame is speech.
    pub fn observe(&mut self, frame: &[i16], is_speech: bool) {
        if self.accepts(is_speech) {
            self.admit(rms_level(frame));
        }
    }
    /// Same as `observe` for an already computed level.
    pub fn observe_level(&mut self, level: f32, is_speech: bool) {
        if self.accepts(is_speech) {
            self.admit(level.clamp(0., 1.));
        }
    }
    fn accepts(&self, is_speech: bool) -> bool {
        !self.locked && !is_speech
    }
    fn admit(&mut self, level: f32) {
        self.levels.push(level);
        trace!("noise level {:.4} admitted ({} levels)", level, self.levels.len());
    }
    pub fn threshold(&self) -> f32 {
        if self.levels.is_empty() {
            self.fallback
        } else {
            let mean = self.levels.iter().sum::<f32>() / self.levels.len() as f32;
            mean * self.multiplier
        }
    }
    /// Freezes the estimate.
    pub fn lock(&mut self) {
        self.locked = true;
    }
    /// Unlocks the estimate. In `Clear` mode the collected levels are dropped too.
    pub fn reset(&mut self) {
        self.locked = false;
        if self.reset_mode == NoiseResetMode::Clear {
            self.levels.clear();
        }
    }
    /// Unlocks the estimate and drops the collected levels regardless of the reset mode.
    pub fn clear(&mut self) {
        self.locked = false;
        self.levels.clear();
    }
    pub fn set_reset_mode(&mut self, reset_mode: NoiseResetMode) {
        self.reset_mode = reset_mode;
    }
    pub fn is_locked(&self) -> bool {
        self.locked
    }
    /// Number of collected levels.
    pub fn len(&self) -> usize {
        self.levels.len()
    }
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
    pub fn capacity(&self) -> usize {
        self.levels.capacity()
    }
    /// Collected levels, oldest first.
    pub fn levels(&self) -> Vec<f32> {
        self.levels.iter().copied().collect()
    }
}
