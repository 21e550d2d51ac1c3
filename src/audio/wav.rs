//! In-memory WAV encoding and decoding via hound.

use std::io::Cursor;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

/// Layout of interleaved 16-bit PCM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

impl PcmFormat {
    pub const fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }
}

/// Encode interleaved samples as a 16-bit PCM WAV file.
pub fn encode_wav(samples: &[i16], format: PcmFormat) -> Result<Vec<u8>, hound::Error> {
    let spec = WavSpec {
        channels: format.channels,
        sample_rate: format.sample_rate,
        bits_per_sample: 16, // Always write as 16-bit
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::with_capacity(44 + samples.len() * 2));
    {
        let mut writer = WavWriter::new(&mut cursor, spec)?;
        for &sample in samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

/// Decode a WAV file into interleaved 16-bit samples.
pub fn decode_wav(bytes: &[u8]) -> Result<(PcmFormat, Vec<i16>), hound::Error> {
    let reader = WavReader::new(Cursor::new(bytes))?;
    let spec = reader.spec();
    let format = PcmFormat::new(spec.sample_rate, spec.channels);

    let samples = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Int, 16) => reader.into_samples::<i16>().collect::<Result<Vec<_>, _>>()?,
        (SampleFormat::Int, bits) => {
            let shift = i32::from(bits).saturating_sub(16);
            reader
                .into_samples::<i32>()
                .map(|s| {
                    s.map(|v| {
                        if shift >= 0 {
                            (v >> shift) as i16
                        } else {
                            (v << -shift) as i16
                        }
                    })
                })
                .collect::<Result<Vec<_>, _>>()?
        }
        (SampleFormat::Float, _) => reader
            .into_samples::<f32>()
            .map(|s| s.map(f32_to_i16))
            .collect::<Result<Vec<_>, _>>()?,
    };

    Ok((format, samples))
}

/// Decode 16-bit WAV produced by a streaming writer.
///
/// Writers that stream to a pipe cannot seek back to patch the data length,
/// so the header may announce more samples than exist. Samples are read
/// until the data runs out.
pub fn decode_streamed_wav(bytes: &[u8]) -> Result<(PcmFormat, Vec<i16>), hound::Error> {
    let reader = WavReader::new(Cursor::new(bytes))?;
    let spec = reader.spec();
    if spec.sample_format != SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(hound::Error::Unsupported);
    }
    let format = PcmFormat::new(spec.sample_rate, spec.channels);
    let samples = reader.into_samples::<i16>().map_while(Result::ok).collect();
    Ok((format, samples))
}

/// Convert any cpal sample type to i16 for WAV writing.
pub fn sample_to_i16<T>(sample: T) -> i16
where
    T: cpal::Sample,
    f32: cpal::FromSample<T>,
{
    f32_to_i16(<f32 as cpal::FromSample<T>>::from_sample_(sample))
}

fn f32_to_i16(sample: f32) -> i16 {
    // Clamp and convert to i16
    let clamped = sample.clamp(-1.0, 1.0);
    (clamped * i16::MAX as f32) as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_to_i16() {
        assert_eq!(sample_to_i16(0.0f32), 0);
        assert_eq!(sample_to_i16(1.0f32), i16::MAX);
        assert_eq!(sample_to_i16(-1.0f32), -i16::MAX);

        // Clamping
        assert_eq!(sample_to_i16(2.0f32), i16::MAX);
        assert_eq!(sample_to_i16(-2.0f32), -i16::MAX);
    }

    #[test]
    fn encoded_wav_has_riff_header_and_decodes_back() {
        let format = PcmFormat::new(16_000, 1);
        let samples = vec![0i16, 1000, -1000, i16::MAX];
        let bytes = encode_wav(&samples, format).unwrap();

        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");

        let (decoded_format, decoded) = decode_wav(&bytes).unwrap();
        assert_eq!(decoded_format, format);
        assert_eq!(decoded, samples);
    }

    #[test]
    fn streamed_wav_with_oversized_header_decodes_available_samples() {
        let format = PcmFormat::new(22_050, 1);
        let mut bytes = encode_wav(&[5, 6, 7], format).unwrap();
        // Patch the data chunk length to the "unknown" marker used by pipes.
        let data_pos = bytes.windows(4).position(|w| w == b"data").unwrap();
        bytes[data_pos + 4..data_pos + 8].copy_from_slice(&0x7fff_f000u32.to_le_bytes());

        let (decoded_format, samples) = decode_streamed_wav(&bytes).unwrap();
        assert_eq!(decoded_format, format);
        assert_eq!(samples, vec![5, 6, 7]);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode_wav(b"This is not a valid WAV file content").is_err());
    }
}
