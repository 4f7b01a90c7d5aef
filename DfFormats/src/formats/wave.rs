//! Uncompressed PCM WAVE (`.WAV`)
//!
//! Read as one fixed 44-byte header (RIFF chunk, `fmt ` chunk and `data`
//! chunk declarations together) followed by the sample bytes. Only the
//! canonical layout is accepted: 16-byte PCM `fmt ` chunk, `data` chunk
//! immediately after it.
//!
//! ## Round trip
//!
//! A file whose derived fields (`ByteRate`, `BlockAlign`, both sizes) are
//! consistent round-trips byte for byte. Derived fields are never trusted on
//! load and are recomputed on save.

use std::io::{Read, Write};
use std::time::Duration;

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::binary::{read_payload, read_struct, write_struct, FixedLayout, FourCc};
use crate::dispatch::ResourceKind;
use crate::error::{Error, Result};
use crate::formats::resource::{Loadable, Resource, Savable};

/// `AudioFormat` value for integer PCM.
pub const PCM_FORMAT: u16 = 1;

/// Size of the PCM `fmt ` chunk payload.
pub const FMT_CHUNK_SIZE: u32 = 16;

/// The canonical 44-byte WAVE header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct WaveHeader {
    chunk_id: FourCc,
    chunk_size: u32,
    format: FourCc,
    subchunk1_id: FourCc,
    subchunk1_size: u32,
    audio_format: u16,
    channels: u16,
    sample_rate: u32,
    byte_rate: u32,
    block_align: u16,
    bits_per_sample: u16,
    subchunk2_id: FourCc,
    subchunk2_size: u32,
}

fn read_tag<R: Read + ?Sized>(reader: &mut R) -> Result<FourCc> {
    let mut tag = [0u8; 4];
    reader.read_exact(&mut tag)?;
    Ok(FourCc(tag))
}

impl FixedLayout for WaveHeader {
    const SIZE: usize = 44;

    fn read_fields<B: ByteOrder, R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        Ok(Self {
            chunk_id: read_tag(reader)?,
            chunk_size: reader.read_u32::<B>()?,
            format: read_tag(reader)?,
            subchunk1_id: read_tag(reader)?,
            subchunk1_size: reader.read_u32::<B>()?,
            audio_format: reader.read_u16::<B>()?,
            channels: reader.read_u16::<B>()?,
            sample_rate: reader.read_u32::<B>()?,
            byte_rate: reader.read_u32::<B>()?,
            block_align: reader.read_u16::<B>()?,
            bits_per_sample: reader.read_u16::<B>()?,
            subchunk2_id: read_tag(reader)?,
            subchunk2_size: reader.read_u32::<B>()?,
        })
    }

    fn write_fields<B: ByteOrder, W: Write + ?Sized>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(self.chunk_id.as_bytes())?;
        writer.write_u32::<B>(self.chunk_size)?;
        writer.write_all(self.format.as_bytes())?;
        writer.write_all(self.subchunk1_id.as_bytes())?;
        writer.write_u32::<B>(self.subchunk1_size)?;
        writer.write_u16::<B>(self.audio_format)?;
        writer.write_u16::<B>(self.channels)?;
        writer.write_u32::<B>(self.sample_rate)?;
        writer.write_u32::<B>(self.byte_rate)?;
        writer.write_u16::<B>(self.block_align)?;
        writer.write_u16::<B>(self.bits_per_sample)?;
        writer.write_all(self.subchunk2_id.as_bytes())?;
        writer.write_u32::<B>(self.subchunk2_size)?;
        Ok(())
    }
}

fn mismatch(field: &'static str, found: impl ToString, expected: impl ToString) -> Error {
    Error::InvalidWaveHeader {
        field,
        found: found.to_string(),
        expected: expected.to_string(),
    }
}

impl WaveHeader {
    /// Check every structural field; the first mismatch fails the whole header.
    fn validate(&self) -> Result<()> {
        if self.chunk_id != FourCc::RIFF {
            return Err(mismatch("ChunkId", self.chunk_id, FourCc::RIFF));
        }
        if self.format != FourCc::WAVE {
            return Err(mismatch("Format", self.format, FourCc::WAVE));
        }
        if self.subchunk1_id != FourCc::FMT {
            return Err(mismatch("Subchunk1Id", self.subchunk1_id, FourCc::FMT));
        }
        if self.subchunk1_size != FMT_CHUNK_SIZE {
            return Err(mismatch("Subchunk1Size", self.subchunk1_size, FMT_CHUNK_SIZE));
        }
        if self.audio_format != PCM_FORMAT {
            return Err(mismatch("AudioFormat", self.audio_format, PCM_FORMAT));
        }
        if self.subchunk2_id != FourCc::DATA {
            return Err(mismatch("Subchunk2Id", self.subchunk2_id, FourCc::DATA));
        }
        let expected_size = u64::from(self.subchunk2_size) + u64::from(self.subchunk1_size) + 20;
        if u64::from(self.chunk_size) != expected_size {
            return Err(mismatch("ChunkSize", self.chunk_size, expected_size));
        }
        Ok(())
    }
}

/// A PCM audio clip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wave {
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    /// Interleaved sample bytes.
    pub data: Vec<u8>,
}

impl Wave {
    #[must_use]
    pub fn new(channels: u16, sample_rate: u32, bits_per_sample: u16, data: Vec<u8>) -> Self {
        Self {
            channels,
            sample_rate,
            bits_per_sample,
            data,
        }
    }

    /// Bytes per sample frame (all channels).
    #[must_use]
    pub fn block_align(&self) -> u16 {
        self.channels.saturating_mul(self.bits_per_sample.div_ceil(8))
    }

    /// Bytes per second of audio.
    #[must_use]
    pub fn byte_rate(&self) -> u32 {
        self.sample_rate.saturating_mul(u32::from(self.block_align()))
    }

    /// Number of sample frames in `data`.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        match self.block_align() {
            0 => 0,
            align => self.data.len() / usize::from(align),
        }
    }

    /// Playback length of the clip.
    #[must_use]
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        let nanos = self.frame_count() as u128 * 1_000_000_000 / u128::from(self.sample_rate);
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }

    fn header(&self) -> Result<WaveHeader> {
        let too_large = || Error::DataTooLarge {
            what: "WAVE data",
            size: self.data.len() as u64,
        };
        let data_size = u32::try_from(self.data.len()).map_err(|_| too_large())?;
        let chunk_size = data_size
            .checked_add(FMT_CHUNK_SIZE + 20)
            .ok_or_else(too_large)?;

        Ok(WaveHeader {
            chunk_id: FourCc::RIFF,
            chunk_size,
            format: FourCc::WAVE,
            subchunk1_id: FourCc::FMT,
            subchunk1_size: FMT_CHUNK_SIZE,
            audio_format: PCM_FORMAT,
            channels: self.channels,
            sample_rate: self.sample_rate,
            byte_rate: self.byte_rate(),
            block_align: self.block_align(),
            bits_per_sample: self.bits_per_sample,
            subchunk2_id: FourCc::DATA,
            subchunk2_size: data_size,
        })
    }
}

impl Resource for Wave {
    const KIND: ResourceKind = ResourceKind::Wave;
}

impl Loadable for Wave {
    fn load<R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let header: WaveHeader = read_struct::<_, LittleEndian, _>(reader)?;
        header.validate()?;

        let data = read_payload(reader, u64::from(header.subchunk2_size))?;
        tracing::debug!(
            "Read WAVE: {} ch, {} Hz, {} bit, {} bytes",
            header.channels,
            header.sample_rate,
            header.bits_per_sample,
            data.len()
        );

        Ok(Self {
            channels: header.channels,
            sample_rate: header.sample_rate,
            bits_per_sample: header.bits_per_sample,
            data,
        })
    }
}

impl Savable for Wave {
    fn save<W: Write + ?Sized>(&self, writer: &mut W) -> Result<()> {
        write_struct::<_, LittleEndian, _>(writer, &self.header()?)?;
        writer.write_all(&self.data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip() -> Wave {
        Wave::new(2, 11025, 16, (0u8..40).collect())
    }

    #[test]
    fn test_header_layout() {
        let bytes = clip().to_bytes().unwrap();
        assert_eq!(bytes.len(), 44 + 40);
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(u32::from_le_bytes(bytes[4..8].try_into().unwrap()), 76);
        assert_eq!(&bytes[8..16], b"WAVEfmt ");
        assert_eq!(u32::from_le_bytes(bytes[16..20].try_into().unwrap()), 16);
        assert_eq!(u16::from_le_bytes(bytes[20..22].try_into().unwrap()), 1);
        assert_eq!(u32::from_le_bytes(bytes[28..32].try_into().unwrap()), 44100);
        assert_eq!(u16::from_le_bytes(bytes[32..34].try_into().unwrap()), 4);
        assert_eq!(&bytes[36..40], b"data");
        assert_eq!(u32::from_le_bytes(bytes[40..44].try_into().unwrap()), 40);
    }

    #[test]
    fn test_byte_exact_round_trip() {
        let bytes = clip().to_bytes().unwrap();
        let wave = Wave::load_bytes(&bytes).unwrap();
        assert_eq!(wave, clip());
        assert_eq!(wave.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn test_single_field_corruption_is_rejected() {
        let good = clip().to_bytes().unwrap();
        let cases: [(usize, &[u8], &str); 7] = [
            (0, b"RIFX", "ChunkId"),
            (8, b"WAVF", "Format"),
            (12, b"fmt_", "Subchunk1Id"),
            (16, &18u32.to_le_bytes(), "Subchunk1Size"),
            (20, &3u16.to_le_bytes(), "AudioFormat"),
            (36, b"DATA", "Subchunk2Id"),
            (4, &77u32.to_le_bytes(), "ChunkSize"),
        ];

        for (offset, patch, field) in cases {
            let mut bytes = good.clone();
            bytes[offset..offset + patch.len()].copy_from_slice(patch);
            match Wave::load_bytes(&bytes) {
                Err(Error::InvalidWaveHeader { field: f, .. }) => assert_eq!(f, field),
                other => panic!("expected {field} rejection, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_truncated_samples() {
        let bytes = clip().to_bytes().unwrap();
        let err = Wave::load_bytes(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(err, Error::UnexpectedEof));
    }

    #[test]
    fn test_save_recomputes_derived_fields() {
        let bytes = clip().to_bytes().unwrap();
        let mut wave = Wave::load_bytes(&bytes).unwrap();
        wave.channels = 1;
        wave.bits_per_sample = 8;
        wave.data.truncate(10);

        let saved = wave.to_bytes().unwrap();
        assert_eq!(u32::from_le_bytes(saved[4..8].try_into().unwrap()), 46);
        assert_eq!(u32::from_le_bytes(saved[28..32].try_into().unwrap()), 11025);
        assert_eq!(u16::from_le_bytes(saved[32..34].try_into().unwrap()), 1);
        assert_eq!(u32::from_le_bytes(saved[40..44].try_into().unwrap()), 10);
        assert_eq!(Wave::load_bytes(&saved).unwrap(), wave);
    }

    #[test]
    fn test_duration() {
        let wave = Wave::new(1, 1000, 8, vec![0; 500]);
        assert_eq!(wave.duration(), Duration::from_millis(500));
        assert_eq!(Wave::new(1, 0, 8, vec![0; 4]).duration(), Duration::ZERO);
    }
}
