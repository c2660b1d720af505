/// Indicates the sample format type and size of a byte stream
#[cfg_attr(feature = "debug", derive(Debug))]
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    I8,
    I16,
    I32,
    F32,
}
impl SampleFormat {
    pub fn get_bits_per_sample(&self) -> u16 {
        match self {
            SampleFormat::I8 => 8,
            SampleFormat::I16 => 16,
            SampleFormat::I32 | SampleFormat::F32 => 32,
        }
    }
    pub fn get_bytes_per_sample(&self) -> usize {
        (self.get_bits_per_sample() / 8) as usize
    }
    pub fn int_of_size(bit_size: u16) -> Option<Self> {
        match bit_size {
            8 => Some(SampleFormat::I8),
            16 => Some(SampleFormat::I16),
            32 => Some(SampleFormat::I32),
            _ => None,
        }
    }
    pub fn float_of_size(bit_size: u16) -> Option<Self> {
        match bit_size {
            32 => Some(SampleFormat::F32),
            _ => None,
        }
    }
}
#[cfg(feature = "display")]
impl std::fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            SampleFormat::I8 => write!(f, "i8"),
            SampleFormat::I16 => write!(f, "i16"),
            SampleFormat::I32 => write!(f, "i32"),
            SampleFormat::F32 => write!(f, "f32"),
        }
    }
}

/// Indicates the sample byte order in the audio byte stream
#[cfg_attr(feature = "debug", derive(Debug))]
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Big,
    Little,
    Native,
}

/// Sample number types the frame encoder can decode.
pub trait Sample: Sized + Copy + 'static {
    const FORMAT: SampleFormat;
    fn decode(bytes: &[u8], endianness: Endianness) -> Self;
    /// Value normalized to the [-1, 1] range.
    fn into_f32(self) -> f32;
}

macro_rules! impl_sample {
    ($ty:ty, $format:ident, $size:literal, $to_f32:expr) => {
        impl Sample for $ty {
            const FORMAT: SampleFormat = SampleFormat::$format;
            fn decode(bytes: &[u8], endianness: Endianness) -> Self {
                let mut raw = [0_u8; $size];
                raw.copy_from_slice(&bytes[..$size]);
                match endianness {
                    Endianness::Little => <$ty>::from_le_bytes(raw),
                    Endianness::Big => <$ty>::from_be_bytes(raw),
                    Endianness::Native => <$ty>::from_ne_bytes(raw),
                }
            }
            fn into_f32(self) -> f32 {
                $to_f32(self)
            }
        }
    };
}
impl_sample!(i8, I8, 1, |v: i8| v as f32 / i8::MAX as f32);
impl_sample!(i16, I16, 2, |v: i16| v as f32 / i16::MAX as f32);
impl_sample!(i32, I32, 4, |v: i32| v as f32 / i32::MAX as f32);
impl_sample!(f32, F32, 4, |v: f32| v);

/// Decodes a byte buffer into normalized float samples.
pub(crate) fn decode_samples<T: Sample>(buffer: &[u8], endianness: Endianness) -> Vec<f32> {
    buffer
        .chunks_exact(T::FORMAT.get_bytes_per_sample())
        .map(|bytes| T::decode(bytes, endianness).into_f32())
        .collect()
}
