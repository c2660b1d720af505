mod relative_energy;
#[cfg(feature = "vad")]
mod webrtc;
pub use relative_energy::RelativeEnergyVad;
#[cfg(feature = "vad")]
pub use webrtc::{WebRtcClassifier, WebRtcVadMode};
