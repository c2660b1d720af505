use log::warn;
use webrtc_vad::{SampleRate, Vad};

use crate::{capabilities::VoiceActivityClassifier, WakeError};

pub type WebRtcVadMode = webrtc_vad::VadMode;

/// Voice activity classifier backed by the WebRTC vad.
///
/// Frames must last 10, 20 or 30 ms.
pub struct WebRtcClassifier {
    vad: Vad,
}
impl WebRtcClassifier {
    pub fn new(sample_rate: usize, mode: WebRtcVadMode) -> Result<Self, WakeError> {
        let rate = match sample_rate {
            8000 => SampleRate::Rate8kHz,
            16000 => SampleRate::Rate16kHz,
            32000 => SampleRate::Rate32kHz,
            48000 => SampleRate::Rate48kHz,
            _ => {
                return Err(WakeError::Vad(format!(
                    "unsupported sample rate {}Hz",
                    sample_rate
                )))
            }
        };
        Ok(WebRtcClassifier {
            vad: Vad::new_with_rate_and_mode(rate, mode),
        })
    }
}
impl VoiceActivityClassifier for WebRtcClassifier {
    fn classify(&mut self, frame: &[i16]) -> bool {
        match self.vad.is_voice_segment(frame) {
            Ok(is_voice) => is_voice,
            Err(()) => {
                warn!("vad failed on a {} samples frame", frame.len());
                false
            }
        }
    }
}

#[test]
fn it_rejects_unsupported_rates() {
    assert!(WebRtcClassifier::new(44100, WebRtcVadMode::VeryAggressive).is_err());
    let mut classifier = WebRtcClassifier::new(16000, WebRtcVadMode::VeryAggressive).unwrap();
    assert!(!classifier.classify(&[0; 480]));
}
