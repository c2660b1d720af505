use std::ops::Deref;

use crate::constants::PCM_16_MAX;

/// Immutable block of 16-bit mono samples covering one frame duration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioFrame {
    samples: Box<[i16]>,
}
impl AudioFrame {
    pub fn new(samples: Vec<i16>) -> Self {
        AudioFrame {
            samples: samples.into_boxed_slice(),
        }
    }
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }
    /// Normalized RMS level of the frame.
    pub fn rms_level(&self) -> f32 {
        rms_level(&self.samples)
    }
}
impl Deref for AudioFrame {
    type Target = [i16];
    fn deref(&self) -> &[i16] {
        &self.samples
    }
}
impl From<&[i16]> for AudioFrame {
    fn from(samples: &[i16]) -> Self {
        AudioFrame::new(samples.to_vec())
    }
}
impl From<Vec<i16>> for AudioFrame {
    fn from(samples: Vec<i16>) -> Self {
        AudioFrame::new(samples)
    }
}

/// Root mean square of the samples, normalized to the [0, 1] range.
///
/// This is the default frame energy function of the detectors.
pub fn rms_level(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.;
    }
    let sum_squared: f32 = samples
        .iter()
        .map(|sample| {
            let value = *sample as f32 / PCM_16_MAX;
            value * value
        })
        .sum();
    (sum_squared / samples.len() as f32).sqrt().clamp(0., 1.)
}

#[test]
fn rms_level_is_normalized() {
    assert_eq!(rms_level(&[]), 0.);
    assert_eq!(rms_level(&[0; 480]), 0.);
    assert_eq!(rms_level(&[i16::MIN; 480]), 1.);
    let level = rms_level(&[3277, -3277, 3277, -3277]);
    assert!((level - 0.1).abs() < 1e-3, "level was {}", level);
}
