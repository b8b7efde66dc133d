use crate::errors::{constants::WAV_HEADER_LEN, Result, VoiceTextError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampleType {
    UnsignedInt,
    SignedInt,
}

/// Output format derived from a [`WavHeader`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channel_count: u16,
    pub sample_size: u16,
    pub sample_type: SampleType,
}

impl AudioFormat {
    pub fn bytes_per_sample(&self) -> usize {
        usize::from(self.sample_size / 8)
    }
}

/// RIFF / fmt / data preamble that precedes the PCM payload.
///
/// All multi-byte fields are little-endian on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WavHeader {
    pub riff_id: [u8; 4],
    pub riff_size: u32,
    pub wave_tag: [u8; 4],
    pub fmt_id: [u8; 4],
    pub fmt_size: u32,
    pub audio_format: u16,
    pub num_channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub data_id: [u8; 4],
    pub data_size: u32,
}

fn tag(bytes: &[u8], offset: usize) -> [u8; 4] {
    [
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ]
}

fn u16_le(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn u32_le(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(tag(bytes, offset))
}

fn check_tag(chunk: &'static str, found: [u8; 4], expected: &[u8; 4]) -> Result<()> {
    if &found != expected {
        tracing::error!(
            chunk,
            found = %String::from_utf8_lossy(&found),
            "WAV header validation failed"
        );
        return Err(VoiceTextError::malformed_header(chunk, found));
    }
    Ok(())
}

impl WavHeader {
    /// Parse and validate the first [`WAV_HEADER_LEN`] bytes of `bytes`.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < WAV_HEADER_LEN {
            Self::check_riff_id(bytes)?;
            return Err(VoiceTextError::TruncatedHeader {
                received: bytes.len(),
            });
        }

        let header = Self {
            riff_id: tag(bytes, 0),
            riff_size: u32_le(bytes, 4),
            wave_tag: tag(bytes, 8),
            fmt_id: tag(bytes, 12),
            fmt_size: u32_le(bytes, 16),
            audio_format: u16_le(bytes, 20),
            num_channels: u16_le(bytes, 22),
            sample_rate: u32_le(bytes, 24),
            byte_rate: u32_le(bytes, 28),
            block_align: u16_le(bytes, 32),
            bits_per_sample: u16_le(bytes, 34),
            data_id: tag(bytes, 36),
            data_size: u32_le(bytes, 40),
        };
        header.validate()?;

        Ok(header)
    }

    /// Check the leading `RIFF` tag of a body that may be shorter than a
    /// full header. Fewer than four bytes pass unchecked.
    pub fn check_riff_id(bytes: &[u8]) -> Result<()> {
        if bytes.len() < 4 {
            return Ok(());
        }
        check_tag("RIFF id", tag(bytes, 0), b"RIFF")
    }

    fn validate(&self) -> Result<()> {
        check_tag("RIFF id", self.riff_id, b"RIFF")?;
        check_tag("RIFF wave", self.wave_tag, b"WAVE")?;
        check_tag("fmt id", self.fmt_id, b"fmt ")?;
        check_tag("data id", self.data_id, b"data")
    }

    pub fn to_audio_format(&self) -> Result<AudioFormat> {
        let sample_type = match self.bits_per_sample {
            8 => SampleType::UnsignedInt,
            16 | 32 => SampleType::SignedInt,
            other => return Err(VoiceTextError::UnsupportedSampleSize(other)),
        };

        if self.num_channels == 0 {
            return Err(VoiceTextError::invalid_audio_format("zero channels"));
        }
        if self.sample_rate == 0 {
            return Err(VoiceTextError::invalid_audio_format("zero sample rate"));
        }

        Ok(AudioFormat {
            sample_rate: self.sample_rate,
            channel_count: self.num_channels,
            sample_size: self.bits_per_sample,
            sample_type,
        })
    }
}

/// Serialize a PCM header, used to build fixtures.
#[cfg(test)]
pub(crate) fn encode_header(
    sample_rate: u32,
    channels: u16,
    bits: u16,
    data_size: u32,
) -> Vec<u8> {
    let block_align = channels * bits / 8;
    let mut bytes = Vec::with_capacity(WAV_HEADER_LEN);
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_size).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");
    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&channels.to_le_bytes());
    bytes.extend_from_slice(&sample_rate.to_le_bytes());
    bytes.extend_from_slice(&(sample_rate * u32::from(block_align)).to_le_bytes());
    bytes.extend_from_slice(&block_align.to_le_bytes());
    bytes.extend_from_slice(&bits.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_size.to_le_bytes());
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mono_16bit() {
        let header = WavHeader::parse(&encode_header(22050, 1, 16, 4410)).unwrap();
        assert_eq!(header.audio_format, 1);
        assert_eq!(header.num_channels, 1);
        assert_eq!(header.sample_rate, 22050);
        assert_eq!(header.byte_rate, 44100);
        assert_eq!(header.block_align, 2);
        assert_eq!(header.bits_per_sample, 16);
        assert_eq!(header.data_size, 4410);

        assert_eq!(
            header.to_audio_format().unwrap(),
            AudioFormat {
                sample_rate: 22050,
                channel_count: 1,
                sample_size: 16,
                sample_type: SampleType::SignedInt,
            }
        );
    }

    #[test]
    fn test_sample_types() {
        let format = WavHeader::parse(&encode_header(8000, 1, 8, 0))
            .unwrap()
            .to_audio_format()
            .unwrap();
        assert_eq!(format.sample_type, SampleType::UnsignedInt);
        assert_eq!(format.bytes_per_sample(), 1);

        let format = WavHeader::parse(&encode_header(48000, 2, 32, 0))
            .unwrap()
            .to_audio_format()
            .unwrap();
        assert_eq!(format.sample_type, SampleType::SignedInt);
        assert_eq!(format.bytes_per_sample(), 4);
    }

    #[test]
    fn test_unsupported_sample_size() {
        let header = WavHeader::parse(&encode_header(44100, 1, 24, 0)).unwrap();
        assert!(matches!(
            header.to_audio_format(),
            Err(VoiceTextError::UnsupportedSampleSize(24))
        ));
    }

    #[test]
    fn test_zero_channels_rejected() {
        let header = WavHeader::parse(&encode_header(44100, 0, 16, 0)).unwrap();
        assert!(matches!(
            header.to_audio_format(),
            Err(VoiceTextError::InvalidAudioFormat(_))
        ));
    }

    #[test]
    fn test_zero_sample_rate_rejected() {
        let header = WavHeader::parse(&encode_header(0, 1, 16, 0)).unwrap();
        match header.to_audio_format() {
            Err(VoiceTextError::InvalidAudioFormat(message)) => {
                assert_eq!(message, "zero sample rate")
            }
            other => panic!("Expected InvalidAudioFormat, got {:?}", other),
        }
    }

    #[test]
    fn test_riff_mismatch() {
        let mut bytes = encode_header(22050, 1, 16, 0);
        bytes[..4].copy_from_slice(b"RIFX");
        match WavHeader::parse(&bytes) {
            Err(VoiceTextError::MalformedResponseHeader { chunk, found }) => {
                assert_eq!(chunk, "RIFF id");
                assert_eq!(&found, b"RIFX");
            }
            other => panic!("Expected MalformedResponseHeader, got {:?}", other),
        }
    }

    #[test]
    fn test_validation_order() {
        let mut bytes = encode_header(22050, 1, 16, 0);
        bytes[8..12].copy_from_slice(b"AVI ");
        bytes[36..40].copy_from_slice(b"LIST");
        assert!(matches!(
            WavHeader::parse(&bytes),
            Err(VoiceTextError::MalformedResponseHeader {
                chunk: "RIFF wave",
                ..
            })
        ));

        let mut bytes = encode_header(22050, 1, 16, 0);
        bytes[12..16].copy_from_slice(b"junk");
        assert!(matches!(
            WavHeader::parse(&bytes),
            Err(VoiceTextError::MalformedResponseHeader { chunk: "fmt id", .. })
        ));

        let mut bytes = encode_header(22050, 1, 16, 0);
        bytes[36..40].copy_from_slice(b"LIST");
        assert!(matches!(
            WavHeader::parse(&bytes),
            Err(VoiceTextError::MalformedResponseHeader {
                chunk: "data id",
                ..
            })
        ));
    }

    #[test]
    fn test_truncated() {
        let bytes = encode_header(22050, 1, 16, 0);
        assert!(matches!(
            WavHeader::parse(&bytes[..20]),
            Err(VoiceTextError::TruncatedHeader { received: 20 })
        ));
    }

    #[test]
    fn test_short_body_checks_riff_id() {
        assert!(matches!(
            WavHeader::parse(b"Service Unavailable"),
            Err(VoiceTextError::MalformedResponseHeader {
                chunk: "RIFF id",
                found: [b'S', b'e', b'r', b'v'],
            })
        ));
        assert!(matches!(
            WavHeader::parse(b"<h"),
            Err(VoiceTextError::TruncatedHeader { received: 2 })
        ));
    }
}
