mod encoder;
mod frame;
mod sample_types;
pub use encoder::FrameEncoder;
pub use frame::{rms_level, AudioFrame};
pub use sample_types::{Endianness, Sample, SampleFormat};
