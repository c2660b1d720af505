use std::{collections::BTreeMap, path::Path};

use crate::WakeError;

/// Audio captured for one candidate utterance, 16-bit mono.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Utterance {
    samples: Vec<i16>,
    sample_rate: usize,
}
impl Utterance {
    pub fn new(samples: Vec<i16>, sample_rate: usize) -> Self {
        Utterance {
            samples,
            sample_rate,
        }
    }
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }
    pub fn into_samples(self) -> Vec<i16> {
        self.samples
    }
    pub fn sample_rate(&self) -> usize {
        self.sample_rate
    }
    pub fn len(&self) -> usize {
        self.samples.len()
    }
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
    pub fn duration_ms(&self) -> usize {
        if self.sample_rate == 0 {
            0
        } else {
            self.samples.len() * 1000 / self.sample_rate
        }
    }
    /// Iterates the audio in blocks of `samples_per_frame`, the last one may be shorter.
    pub fn frames(&self, samples_per_frame: usize) -> std::slice::Chunks<'_, i16> {
        self.samples.chunks(samples_per_frame.max(1))
    }
    /// Writes the audio as a 16-bit mono wav file.
    pub fn save_wav<P: AsRef<Path>>(&self, path: P) -> Result<(), WakeError> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate as u32,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec)?;
        for sample in &self.samples {
            writer.write_sample(*sample)?;
        }
        writer.finalize()?;
        Ok(())
    }
}

/// Scores obtained for a completed utterance and the audio that produced them.
#[derive(Clone, Debug)]
pub struct Detection<L> {
    /// Confidence per wake word label, not normalized across labels.
    pub scores: BTreeMap<L, f32>,
    pub utterance: Utterance,
}
impl<L: Ord> Detection<L> {
    /// Label with the highest score.
    pub fn best_match(&self) -> Option<(&L, f32)> {
        self.scores
            .iter()
            .map(|(label, score)| (label, *score))
            .max_by(|a, b| a.1.total_cmp(&b.1))
    }
    pub fn score(&self, label: &L) -> Option<f32> {
        self.scores.get(label).copied()
    }
    /// True if some label scores at least `threshold`.
    pub fn is_triggered(&self, threshold: f32) -> bool {
        self.scores.values().any(|score| *score >= threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_finds_the_best_match() {
        let detection = Detection {
            scores: BTreeMap::from([("alexa", 0.8), ("hey_alexa", 0.3), ("computer", 0.1)]),
            utterance: Utterance::new(vec![0; 1600], 16000),
        };
        assert_eq!(detection.best_match(), Some((&"alexa", 0.8)));
        assert_eq!(detection.score(&"computer"), Some(0.1));
        assert!(detection.is_triggered(0.5));
        assert!(!detection.is_triggered(0.9));
        assert_eq!(detection.utterance.duration_ms(), 100);
    }

    #[test]
    fn it_splits_the_utterance_in_frames() {
        let utterance = Utterance::new((0..1000).map(|i| i as i16).collect(), 16000);
        let frames = utterance.frames(480).collect::<Vec<_>>();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[1][0], 480);
        assert_eq!(frames[2].len(), 40);
    }

    #[test]
    fn it_saves_wav_files() {
        let path = std::env::temp_dir().join(format!("wakepipe-utterance-{}.wav", std::process::id()));
        let utterance = Utterance::new(vec![100, -100, 200, -200], 16000);
        utterance.save_wav(&path).unwrap();
        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_rate, 16000);
        let samples = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(samples, vec![100, -100, 200, -200]);
        std::fs::remove_file(path).ok();
    }
}
