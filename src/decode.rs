//! Input decoding: turns user-supplied file bytes into a `SourceAudio`.
//!
//! WAV is always available (hound); MP3 input needs the `mp3` feature.
//! A decode failure leaves no partial state: the session keeps its previous
//! asset until a successful load replaces it.

use std::io::Cursor;

use hound::SampleFormat;
use log::debug;

use crate::error::DecodeError;
use crate::source::SourceAudio;

/// Sniff the container from the byte header and decode.
pub fn decode_bytes(bytes: &[u8]) -> Result<SourceAudio, DecodeError> {
    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE" {
        return decode_wav_bytes(bytes);
    }

    #[cfg(feature = "mp3")]
    {
        decode_mp3_bytes(bytes)
    }
    #[cfg(not(feature = "mp3"))]
    {
        Err(DecodeError::UnsupportedFormat(
            "not a RIFF/WAVE container (enable the `mp3` feature for MP3 input)".to_string(),
        ))
    }
}

/// Decode a WAV file: integer PCM is scaled by 2^(bits-1), float passes
/// through. More than two channels are rejected, not downmixed.
pub fn decode_wav_bytes(bytes: &[u8]) -> Result<SourceAudio, DecodeError> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes))?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<Vec<_>, _>>()?,
        SampleFormat::Int => {
            let full_scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|x| x as f32 / full_scale))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    debug!(
        "decoded WAV: {} ch, {} Hz, {} interleaved samples",
        spec.channels,
        spec.sample_rate,
        samples.len()
    );
    SourceAudio::from_interleaved(&samples, spec.channels, spec.sample_rate)
}

/// Decode an MP3 stream by concatenating its frames.
#[cfg(feature = "mp3")]
pub fn decode_mp3_bytes(bytes: &[u8]) -> Result<SourceAudio, DecodeError> {
    use minimp3::{Decoder, Error as Mp3Error, Frame};

    let mut decoder = Decoder::new(Cursor::new(bytes));
    let mut samples: Vec<f32> = Vec::new();
    let mut channels: u16 = 0;
    let mut sample_rate: u32 = 0;

    loop {
        match decoder.next_frame() {
            Ok(Frame {
                data,
                sample_rate: rate,
                channels: frame_channels,
                ..
            }) => {
                if channels == 0 {
                    channels = frame_channels as u16;
                    sample_rate = rate as u32;
                }
                samples.extend(data.iter().map(|&s| s as f32 / 32768.0));
            }
            Err(Mp3Error::Eof) => break,
            Err(e) => {
                return Err(DecodeError::Malformed(format!("MP3 decode failed: {e:?}")));
            }
        }
    }

    if samples.is_empty() {
        return Err(DecodeError::EmptySource);
    }
    debug!("decoded MP3: {channels} ch, {sample_rate} Hz, {} samples", samples.len());
    SourceAudio::from_interleaved(&samples, channels, sample_rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_wav_i16(channels: u16, sample_rate: u32, frames: &[i16]) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for &s in frames {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn decodes_mono_int_pcm() {
        let bytes = write_wav_i16(1, 22050, &[0, 16384, -16384, -32768]);
        let src = decode_bytes(&bytes).unwrap();
        assert_eq!(src.channel_count(), 1);
        assert_eq!(src.sample_rate(), 22050);
        assert_eq!(src.frames(), 4);
        let data = src.channel(0);
        assert!((data[0] - 0.0).abs() < 1e-6);
        assert!((data[1] - 0.5).abs() < 1e-6);
        assert!((data[2] + 0.5).abs() < 1e-6);
        assert!((data[3] + 1.0).abs() < 1e-6);
    }

    #[test]
    fn decodes_stereo_into_planar_channels() {
        let bytes = write_wav_i16(2, 44100, &[100, -100, 200, -200]);
        let src = decode_bytes(&bytes).unwrap();
        assert_eq!(src.channel_count(), 2);
        assert_eq!(src.frames(), 2);
        assert!(src.channel(0)[0] > 0.0 && src.channel(0)[1] > 0.0);
        assert!(src.channel(1)[0] < 0.0 && src.channel(1)[1] < 0.0);
    }

    #[test]
    fn decodes_float_wav() {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 48000,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for s in [0.0f32, 0.5, -0.25] {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        let src = decode_wav_bytes(&cursor.into_inner()).unwrap();
        assert_eq!(src.channel(0), &[0.0, 0.5, -0.25]);
    }

    #[test]
    fn rejects_more_than_two_channels() {
        let bytes = write_wav_i16(3, 44100, &[0, 0, 0, 1, 1, 1]);
        assert!(matches!(
            decode_bytes(&bytes),
            Err(DecodeError::UnsupportedChannelCount(3))
        ));
    }

    #[test]
    fn garbage_bytes_fail_cleanly() {
        assert!(decode_wav_bytes(&[0u8; 64]).is_err());
        assert!(decode_wav_bytes(b"RIFF").is_err());
    }
}
