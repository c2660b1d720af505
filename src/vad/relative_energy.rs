use crate::{
    capabilities::VoiceActivityClassifier,
    config::VADMode,
    constants::{PCM_16_MAX, VAD_DEFAULT_HANGOVER_FRAMES, VAD_ENERGY_WINDOW, VAD_MIN_LOUD_FRAMES},
};

/// Self calibrating energy classifier.
///
/// Keeps the energy of the latest frames and reports voice once enough of them
/// exceed the quietest one by the mode factor. Voice is then reported for a
/// hangover of frames so short pauses don't split words.
pub struct RelativeEnergyVad {
    mode: VADMode,
    hangover_frames: usize,
    // state
    index: usize,
    window: Vec<f32>,
    counter: usize,
}
impl RelativeEnergyVad {
    pub fn new(mode: VADMode) -> RelativeEnergyVad {
        Self::with_hangover(mode, VAD_DEFAULT_HANGOVER_FRAMES)
    }
    pub fn with_hangover(mode: VADMode, hangover_frames: usize) -> RelativeEnergyVad {
        RelativeEnergyVad {
            mode,
            hangover_frames,
            index: 0,
            window: vec![f32::NAN; VAD_ENERGY_WINDOW],
            counter: 0,
        }
    }
    pub fn is_voice(&mut self, frame: &[i16]) -> bool {
        let value: f32 = frame
            .iter()
            .map(|sample| {
                let normalized = *sample as f32 / PCM_16_MAX;
                normalized * normalized
            })
            .sum();
        self.window[self.index] = value;
        self.index = (self.index + 1) % self.window.len();
        let min = self
            .window
            .iter()
            .filter(|v| !v.is_nan())
            .min_by(|a, b| a.total_cmp(b))
            .copied()
            .unwrap_or(value);
        let th = min * self.mode.get_value();
        let count = self.window.iter().filter(|v| **v > th).count();
        if count > VAD_MIN_LOUD_FRAMES {
            self.counter = self.hangover_frames;
        }
        if self.counter > 0 {
            self.counter -= 1;
            true
        } else {
            false
        }
    }
    pub fn reset(&mut self) {
        self.window.fill(f32::NAN);
        self.counter = 0;
        self.index = 0;
    }
}
impl VoiceActivityClassifier for RelativeEnergyVad {
    fn classify(&mut self, frame: &[i16]) -> bool {
        self.is_voice(frame)
    }
}
