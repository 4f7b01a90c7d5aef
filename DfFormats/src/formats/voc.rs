//! Creative Labs voice file (`.VOC`, Landru type `VOIC`)
//!
//! A fixed 26-byte header followed by a stream of typed blocks, each
//! `type: u8` + 24-bit little-endian size + payload. The stream ends at a
//! type-0 block.
//!
//! Read-only: the type implements [`Loadable`] but not `Savable`. PCM blocks
//! can be transcoded with [`CreativeVoice::to_wave`].

use std::io::Read;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::binary::{fixed_str, read_payload};
use crate::dispatch::ResourceKind;
use crate::error::{Error, Result};
use crate::formats::resource::{Loadable, Resource};
use crate::formats::wave::Wave;

/// File signature, including the DOS end-of-file byte.
pub const VOC_MAGIC: &[u8; 20] = b"Creative Voice File\x1A";

/// Size of the header this crate understands.
const HEADER_SIZE: u16 = 26;

/// Sample encoding of a sound block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VocCodec {
    /// 8-bit unsigned PCM.
    Pcm8,
    /// 16-bit signed little-endian PCM.
    Pcm16,
    /// Any compressed encoding (Creative ADPCM, A-law, mu-law, ...).
    Other(u16),
}

impl VocCodec {
    fn from_code(code: u16) -> Self {
        match code {
            0 => Self::Pcm8,
            4 => Self::Pcm16,
            other => Self::Other(other),
        }
    }

    fn bits_per_sample(self) -> Option<u16> {
        match self {
            Self::Pcm8 => Some(8),
            Self::Pcm16 => Some(16),
            Self::Other(_) => None,
        }
    }
}

/// One block of the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VocBlock {
    /// Type 1: samples with a time-constant sample rate.
    SoundData {
        sample_rate: u32,
        codec: VocCodec,
        data: Vec<u8>,
    },
    /// Type 2: more samples in the format of the previous sound block.
    Continuation(Vec<u8>),
    /// Type 3: a run of silence.
    Silence { samples: u32, sample_rate: u32 },
    /// Type 4.
    Marker(u16),
    /// Type 5: NUL-terminated text.
    Text(String),
    /// Type 6: repeat the following blocks `count + 1` times (`0xFFFF` loops
    /// forever).
    RepeatStart(u16),
    /// Type 7.
    RepeatEnd,
    /// Type 8: overrides rate and channel count of the next type-1 block.
    Extended {
        time_constant: u16,
        codec: u8,
        stereo: bool,
    },
    /// Type 9: samples with explicit rate, depth and channel count.
    SoundDataNew {
        sample_rate: u32,
        bits_per_sample: u8,
        channels: u8,
        codec: VocCodec,
        data: Vec<u8>,
    },
    /// A block type this crate does not interpret.
    Unknown { block_type: u8, data: Vec<u8> },
}

/// A decoded voice file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreativeVoice {
    /// Format version, `major << 8 | minor`.
    pub version: u16,
    pub blocks: Vec<VocBlock>,
}

/// Sample rate from a type-1 time constant.
fn rate_from_time_constant(divisor: u8) -> u32 {
    1_000_000 / (256 - u32::from(divisor))
}

/// Sample rate from a type-8 time constant (already scaled by channels).
fn rate_from_extended(time_constant: u16, channels: u32) -> u32 {
    256_000_000 / (channels * (65536 - u32::from(time_constant)))
}

fn block_bytes<'a>(data: &'a [u8], need: usize, what: &'static str) -> Result<&'a [u8]> {
    if data.len() < need {
        return Err(Error::InvalidChunkSize {
            what,
            size: data.len() as u64,
        });
    }
    Ok(data)
}

fn parse_block(block_type: u8, data: Vec<u8>, pending: &mut Option<u32>) -> Result<VocBlock> {
    let block = match block_type {
        1 => {
            let head = block_bytes(&data, 2, "VOC sound block")?;
            let mut sample_rate = rate_from_time_constant(head[0]);
            let codec = VocCodec::from_code(u16::from(head[1]));
            // A preceding extended block wins over the time constant
            if let Some(rate) = pending.take() {
                sample_rate = rate;
            }
            VocBlock::SoundData {
                sample_rate,
                codec,
                data: data[2..].to_vec(),
            }
        }
        2 => VocBlock::Continuation(data),
        3 => {
            let head = block_bytes(&data, 3, "VOC silence block")?;
            VocBlock::Silence {
                samples: u32::from(u16::from_le_bytes([head[0], head[1]])) + 1,
                sample_rate: rate_from_time_constant(head[2]),
            }
        }
        4 => {
            let head = block_bytes(&data, 2, "VOC marker block")?;
            VocBlock::Marker(u16::from_le_bytes([head[0], head[1]]))
        }
        5 => VocBlock::Text(fixed_str(&data)),
        6 => {
            let head = block_bytes(&data, 2, "VOC repeat block")?;
            VocBlock::RepeatStart(u16::from_le_bytes([head[0], head[1]]))
        }
        7 => VocBlock::RepeatEnd,
        8 => {
            let head = block_bytes(&data, 4, "VOC extended block")?;
            let time_constant = u16::from_le_bytes([head[0], head[1]]);
            let stereo = head[3] != 0;
            let channels = if stereo { 2 } else { 1 };
            *pending = Some(rate_from_extended(time_constant, channels));
            VocBlock::Extended {
                time_constant,
                codec: head[2],
                stereo,
            }
        }
        9 => {
            let head = block_bytes(&data, 12, "VOC sound block")?;
            VocBlock::SoundDataNew {
                sample_rate: u32::from_le_bytes([head[0], head[1], head[2], head[3]]),
                bits_per_sample: head[4],
                channels: head[5],
                codec: VocCodec::from_code(u16::from_le_bytes([head[6], head[7]])),
                data: data[12..].to_vec(),
            }
        }
        other => {
            tracing::warn!("Skipping unknown VOC block type {}", other);
            VocBlock::Unknown {
                block_type: other,
                data,
            }
        }
    };
    Ok(block)
}

impl CreativeVoice {
    /// Format of the audio, taken from the first sound block.
    ///
    /// Returns `(sample_rate, channels, codec)`.
    #[must_use]
    pub fn format(&self) -> Option<(u32, u16, VocCodec)> {
        let mut channels = 1;
        for block in &self.blocks {
            match block {
                VocBlock::Extended { stereo, .. } => channels = if *stereo { 2 } else { 1 },
                VocBlock::SoundData {
                    sample_rate, codec, ..
                } => return Some((*sample_rate, channels, *codec)),
                VocBlock::SoundDataNew {
                    sample_rate,
                    channels,
                    codec,
                    ..
                } => return Some((*sample_rate, u16::from(*channels), *codec)),
                _ => {}
            }
        }
        None
    }

    /// Concatenate every PCM block into one [`Wave`].
    ///
    /// Silence blocks become runs of silent samples. Repeat markers are not
    /// expanded; the looped section is emitted once.
    ///
    /// # Errors
    /// [`Error::UnsupportedFormat`] if the file holds no sound, uses a
    /// compressed codec, or changes format between blocks.
    pub fn to_wave(&self) -> Result<Wave> {
        let unsupported = |message: String| Error::UnsupportedFormat {
            format: "VOC",
            message,
        };

        let (sample_rate, channels, codec) = self
            .format()
            .ok_or_else(|| unsupported("no sound data blocks".to_string()))?;
        let bits = codec
            .bits_per_sample()
            .ok_or_else(|| unsupported(format!("codec {codec:?} is not PCM")))?;
        let silence_byte = if bits == 8 { 0x80 } else { 0 };
        let frame = usize::from(channels) * usize::from(bits / 8);

        let check = |rate: u32, block_channels: u16, block_bits: u16, block_codec: VocCodec| {
            if rate == sample_rate
                && block_channels == channels
                && block_bits == bits
                && block_codec == codec
            {
                Ok(())
            } else {
                Err(unsupported(format!(
                    "format changes mid-stream ({rate} Hz {block_channels}ch {block_bits}-bit \
                     after {sample_rate} Hz {channels}ch {bits}-bit)"
                )))
            }
        };

        let mut pcm = Vec::new();
        let mut extended_channels = 1;
        for block in &self.blocks {
            match block {
                VocBlock::Extended { stereo, .. } => extended_channels = if *stereo { 2 } else { 1 },
                VocBlock::SoundData {
                    sample_rate: rate,
                    codec: block_codec,
                    data,
                } => {
                    let block_bits = block_codec.bits_per_sample().unwrap_or(0);
                    check(*rate, extended_channels, block_bits, *block_codec)?;
                    extended_channels = 1;
                    pcm.extend_from_slice(data);
                }
                VocBlock::SoundDataNew {
                    sample_rate: rate,
                    bits_per_sample,
                    channels: block_channels,
                    codec: block_codec,
                    data,
                } => {
                    check(
                        *rate,
                        u16::from(*block_channels),
                        u16::from(*bits_per_sample),
                        *block_codec,
                    )?;
                    pcm.extend_from_slice(data);
                }
                VocBlock::Continuation(data) => pcm.extend_from_slice(data),
                VocBlock::Silence { samples, .. } => {
                    let len = *samples as usize * frame;
                    pcm.resize(pcm.len() + len, silence_byte);
                }
                _ => {}
            }
        }

        Ok(Wave::new(channels, sample_rate, bits, pcm))
    }
}

impl Resource for CreativeVoice {
    const KIND: ResourceKind = ResourceKind::CreativeVoice;
}

impl Loadable for CreativeVoice {
    fn load<R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let mut magic = [0u8; 20];
        reader.read_exact(&mut magic)?;
        if &magic != VOC_MAGIC {
            return Err(Error::InvalidMagic {
                format: "VOC",
                expected: "Creative Voice File",
                found: magic.to_vec(),
            });
        }

        let header_size = reader.read_u16::<LittleEndian>()?;
        let version = reader.read_u16::<LittleEndian>()?;
        let checksum = reader.read_u16::<LittleEndian>()?;
        if header_size < HEADER_SIZE {
            return Err(Error::InvalidChunkSize {
                what: "VOC header",
                size: u64::from(header_size),
            });
        }
        if checksum != (!version).wrapping_add(0x1234) {
            return Err(Error::InvalidMagic {
                format: "VOC",
                expected: "version checksum",
                found: checksum.to_le_bytes().to_vec(),
            });
        }
        read_payload(reader, u64::from(header_size - HEADER_SIZE))?;

        let mut blocks = Vec::new();
        let mut pending = None;
        loop {
            let mut block_type = [0u8; 1];
            if reader.read(&mut block_type)? == 0 {
                tracing::warn!("VOC stream ended without a terminator block");
                break;
            }
            if block_type[0] == 0 {
                break;
            }
            let size = reader.read_u24::<LittleEndian>()?;
            let data = read_payload(reader, u64::from(size))?;
            blocks.push(parse_block(block_type[0], data, &mut pending)?);
        }

        tracing::debug!("Read VOC {}.{}: {} blocks", version >> 8, version & 0xFF, blocks.len());
        Ok(Self { version, blocks })
    }
}
