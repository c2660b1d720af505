use std::collections::BTreeMap;

use crate::WakeError;

/// Per-frame speech classifier.
pub trait VoiceActivityClassifier {
    /// Returns true if the frame contains speech.
    fn classify(&mut self, frame: &[i16]) -> bool;
}
impl<F> VoiceActivityClassifier for F
where
    F: FnMut(&[i16]) -> bool,
{
    fn classify(&mut self, frame: &[i16]) -> bool {
        self(frame)
    }
}

/// Wake word model invoked on complete audio buffers.
///
/// Scores are independent per label, in range 0 - 1.
/// The label type can be a fixed enum when the wake words are known upfront.
pub trait WakeWordScorer {
    type Label: Ord + Clone;
    fn score(&mut self, samples: &[i16]) -> Result<BTreeMap<Self::Label, f32>, WakeError>;
}

/// Notable pipeline transitions, delivered to the [`PipelineObserver`].
#[derive(Clone, Debug, PartialEq)]
pub enum PipelineEvent {
    /// Speech onset detected, recording started.
    SpeechStarted { level: f32, threshold: f32 },
    /// Trailing silence (or the max duration) reached with an utterance long enough to score.
    UtteranceCompleted { samples: usize },
    /// Utterance dropped without scoring.
    UtteranceDiscarded { samples: usize },
    /// The scorer returned a confidence map for these labels.
    Scored { labels: usize },
    ScoringFailed { reason: String },
    CooldownStarted,
    CooldownFinished,
}

/// Receives pipeline events synchronously from the frame processing call.
pub trait PipelineObserver {
    fn on_event(&mut self, event: &PipelineEvent);
}
impl<F> PipelineObserver for F
where
    F: FnMut(&PipelineEvent),
{
    fn on_event(&mut self, event: &PipelineEvent) {
        self(event)
    }
}
