use log::debug;
use rubato::{FftFixedInOut, Resampler};

use crate::{
    audio::{sample_types::decode_samples, AudioFrame},
    config::AudioFmt,
    constants::PCM_16_MAX,
    Endianness, SampleFormat, WakeError,
};

/// Converts raw input buffers into the 16-bit mono frames the detectors consume.
///
/// Input is decoded from its sample format, the first channel is kept and,
/// when the input rate differs from the detector rate, it's resampled.
/// Resampled output that doesn't complete a frame is carried over to the next call.
pub struct FrameEncoder {
    resampler: Option<FftFixedInOut<f32>>,
    source_sample_format: SampleFormat,
    source_channels: u16,
    source_endianness: Endianness,
    input_samples_per_frame: usize,
    output_samples_per_frame: usize,
    pending: Vec<i16>,
}
impl FrameEncoder {
    pub fn new(
        input_fmt: &AudioFmt,
        frame_length_ms: usize,
        target_sample_rate: usize,
    ) -> Result<FrameEncoder, WakeError> {
        if input_fmt.channels == 0 || input_fmt.sample_rate == 0 {
            return Err(WakeError::Config(
                "input format requires at least one channel and a sample rate".to_string(),
            ));
        }
        let output_samples_per_frame = target_sample_rate * frame_length_ms / 1000;
        let mut input_samples_per_channel = input_fmt.sample_rate * frame_length_ms / 1000;
        let resampler = if input_fmt.sample_rate != target_sample_rate {
            let resampler = FftFixedInOut::<f32>::new(
                input_fmt.sample_rate,
                target_sample_rate,
                input_samples_per_channel,
                1,
            )
            .map_err(|err| WakeError::Resampler(err.to_string()))?;
            input_samples_per_channel = resampler.input_frames_next();
            debug!(
                "resampling input from {}Hz to {}Hz, {} samples per input frame",
                input_fmt.sample_rate, target_sample_rate, input_samples_per_channel
            );
            Some(resampler)
        } else {
            None
        };
        Ok(FrameEncoder {
            resampler,
            source_sample_format: input_fmt.sample_format,
            source_channels: input_fmt.channels,
            source_endianness: input_fmt.endianness,
            input_samples_per_frame: input_samples_per_channel * input_fmt.channels as usize,
            output_samples_per_frame,
            pending: Vec::with_capacity(output_samples_per_frame * 2),
        })
    }
    pub fn get_input_frame_length(&self) -> usize {
        self.input_samples_per_frame
    }
    pub fn get_output_frame_length(&self) -> usize {
        self.output_samples_per_frame
    }
    pub fn get_input_byte_length(&self) -> usize {
        self.input_samples_per_frame * self.source_sample_format.get_bytes_per_sample()
    }
    /// Decodes one input buffer, returns the frames it completes (usually one).
    pub fn encode(&mut self, buffer: &[u8]) -> Result<Vec<AudioFrame>, WakeError> {
        if buffer.len() != self.get_input_byte_length() {
            return Err(WakeError::InvalidBuffer {
                expected: self.get_input_byte_length(),
                actual: buffer.len(),
            });
        }
        let float_samples = match self.source_sample_format {
            SampleFormat::I8 => decode_samples::<i8>(buffer, self.source_endianness),
            SampleFormat::I16 => decode_samples::<i16>(buffer, self.source_endianness),
            SampleFormat::I32 => decode_samples::<i32>(buffer, self.source_endianness),
            SampleFormat::F32 => decode_samples::<f32>(buffer, self.source_endianness),
        };
        let mono_samples = if self.source_channels != 1 {
            float_samples
                .chunks_exact(self.source_channels as usize)
                .map(|chunk| chunk[0])
                .collect::<Vec<f32>>()
        } else {
            float_samples
        };
        let samples = match self.resampler.as_mut() {
            Some(resampler) => resampler
                .process(&[mono_samples], None)
                .map_err(|err| WakeError::Resampler(err.to_string()))?
                .into_iter()
                .next()
                .unwrap_or_default(),
            None => mono_samples,
        };
        self.pending.extend(samples.into_iter().map(to_pcm_16));
        let mut frames = Vec::new();
        while self.pending.len() >= self.output_samples_per_frame {
            let frame = self
                .pending
                .drain(..self.output_samples_per_frame)
                .collect::<Vec<i16>>();
            frames.push(AudioFrame::new(frame));
        }
        Ok(frames)
    }
    /// Drops carried over samples.
    pub fn reset(&mut self) {
        self.pending.clear();
    }
}

fn to_pcm_16(sample: f32) -> i16 {
    (sample * PCM_16_MAX).round().clamp(i16::MIN as f32, PCM_16_MAX) as i16
}
