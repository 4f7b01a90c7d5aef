//! Standard MIDI file (`.MID`)
//!
//! A big-endian chunk stream: one `MThd` header chunk, then `MTrk` chunks and
//! any vendor chunks. Track payloads are kept as opaque event bytes; nothing
//! below the chunk level is decoded.
//!
//! ## Round trip
//!
//! Header fields and track bytes round-trip exactly. Vendor chunks are kept
//! in an ordered multi-map keyed by tag and are written between the header
//! and the first track, so a file that interleaves vendor chunks with tracks
//! comes back with the vendor chunks moved forward. Tests pin this write
//! order.

mod reader;
mod writer;

use std::io::{Read, Write};

use byteorder::{ByteOrder, ReadBytesExt, WriteBytesExt};
use indexmap::IndexMap;

use crate::binary::{FixedLayout, FourCc};
use crate::dispatch::ResourceKind;
use crate::error::{Error, Result};
use crate::formats::resource::{Loadable, Resource, Savable};

pub(crate) use reader::read_midi;
pub(crate) use writer::write_midi;

/// Length of the `MThd` payload this crate writes.
pub const HEADER_PAYLOAD_SIZE: u32 = 6;

/// Sequence layout declared in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u16)]
pub enum MidiFormat {
    /// One track holding every channel.
    SingleTrack = 0,
    /// Several tracks played simultaneously.
    #[default]
    MultiTrack = 1,
    /// Several independent single-track songs.
    MultiSong = 2,
}

impl TryFrom<u16> for MidiFormat {
    type Error = Error;

    fn try_from(value: u16) -> Result<Self> {
        match value {
            0 => Ok(Self::SingleTrack),
            1 => Ok(Self::MultiTrack),
            2 => Ok(Self::MultiSong),
            other => Err(Error::UnsupportedFormat {
                format: "MIDI",
                message: format!("file format kind {other}"),
            }),
        }
    }
}

/// Header timing field.
///
/// The top bit of the 16-bit field selects the variant; the low 15 bits are
/// the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Division {
    /// Delta times are in ticks per quarter note.
    TicksPerBeat(u16),
    /// Delta times are SMPTE-based (frames per second and ticks per frame,
    /// packed in the low 15 bits).
    FramesPerSecond(u16),
}

impl Division {
    const SMPTE_FLAG: u16 = 0x8000;
    const VALUE_MASK: u16 = 0x7FFF;

    #[must_use]
    pub fn from_raw(raw: u16) -> Self {
        if raw & Self::SMPTE_FLAG == 0 {
            Self::TicksPerBeat(raw & Self::VALUE_MASK)
        } else {
            Self::FramesPerSecond(raw & Self::VALUE_MASK)
        }
    }

    #[must_use]
    pub fn to_raw(self) -> u16 {
        match self {
            Self::TicksPerBeat(v) => v & Self::VALUE_MASK,
            Self::FramesPerSecond(v) => Self::SMPTE_FLAG | (v & Self::VALUE_MASK),
        }
    }
}

impl Default for Division {
    fn default() -> Self {
        Self::TicksPerBeat(480)
    }
}

/// The fixed part of the `MThd` payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MidiHeader {
    pub format: u16,
    pub tracks: u16,
    pub division: u16,
}

impl FixedLayout for MidiHeader {
    const SIZE: usize = HEADER_PAYLOAD_SIZE as usize;

    fn read_fields<B: ByteOrder, R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        Ok(Self {
            format: reader.read_u16::<B>()?,
            tracks: reader.read_u16::<B>()?,
            division: reader.read_u16::<B>()?,
        })
    }

    fn write_fields<B: ByteOrder, W: Write + ?Sized>(&self, writer: &mut W) -> Result<()> {
        writer.write_u16::<B>(self.format)?;
        writer.write_u16::<B>(self.tracks)?;
        writer.write_u16::<B>(self.division)?;
        Ok(())
    }
}

/// A decoded MIDI file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Midi {
    pub format: MidiFormat,
    pub division: Division,
    /// Encoded event bytes of each `MTrk` chunk, in file order.
    pub tracks: Vec<Vec<u8>>,
    /// Non-track chunks keyed by tag, in order of first appearance.
    ///
    /// `MThd` and `MTrk` must not be used as keys; they are written by the
    /// header and track lists.
    pub extra_chunks: IndexMap<FourCc, Vec<Vec<u8>>>,
}

impl Midi {
    #[must_use]
    pub fn new(format: MidiFormat, division: Division) -> Self {
        Self {
            format,
            division,
            tracks: Vec::new(),
            extra_chunks: IndexMap::new(),
        }
    }

    /// Number of tracks that will be declared in the header on save.
    #[must_use]
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn add_track(&mut self, data: Vec<u8>) {
        self.tracks.push(data);
    }

    /// Insert a track before `index`.
    ///
    /// # Panics
    /// Panics if `index > track_count()`.
    pub fn insert_track(&mut self, index: usize, data: Vec<u8>) {
        self.tracks.insert(index, data);
    }

    pub fn remove_track(&mut self, index: usize) -> Option<Vec<u8>> {
        (index < self.tracks.len()).then(|| self.tracks.remove(index))
    }

    /// Move the track at `from` so it ends up at `to`.
    ///
    /// Returns false if either index is out of range.
    pub fn move_track(&mut self, from: usize, to: usize) -> bool {
        if from >= self.tracks.len() || to >= self.tracks.len() {
            return false;
        }
        let track = self.tracks.remove(from);
        self.tracks.insert(to, track);
        true
    }

    /// Append a pass-through chunk.
    ///
    /// # Errors
    /// Returns [`Error::InvalidEntryName`] for the reserved `MThd`/`MTrk` tags.
    pub fn add_extra_chunk(&mut self, tag: FourCc, data: Vec<u8>) -> Result<()> {
        if tag == FourCc::MTHD || tag == FourCc::MTRK {
            return Err(Error::InvalidEntryName(tag.to_string()));
        }
        self.extra_chunks.entry(tag).or_default().push(data);
        Ok(())
    }

    /// All pass-through chunks with the given tag.
    #[must_use]
    pub fn extra_chunks_tagged(&self, tag: FourCc) -> &[Vec<u8>] {
        self.extra_chunks.get(&tag).map_or(&[][..], Vec::as_slice)
    }
}

impl Resource for Midi {
    const KIND: ResourceKind = ResourceKind::Midi;
}

impl Loadable for Midi {
    fn load<R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        read_midi(reader)
    }
}

impl Savable for Midi {
    fn save<W: Write + ?Sized>(&self, writer: &mut W) -> Result<()> {
        write_midi(self, writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_division_round_trip() {
        for raw in [0x0060u16, 0x01E0, 0x7FFF, 0x8000, 0xE728, 0xFFFF] {
            assert_eq!(Division::from_raw(raw).to_raw(), raw);
        }
        assert_eq!(Division::from_raw(0x01E0), Division::TicksPerBeat(480));
        assert_eq!(Division::from_raw(0xE728), Division::FramesPerSecond(0x6728));
    }

    #[test]
    fn test_unknown_format_kind() {
        assert!(MidiFormat::try_from(3).unwrap_err().is_format());
    }

    #[test]
    fn test_track_list_edits() {
        let mut midi = Midi::default();
        midi.add_track(vec![1]);
        midi.add_track(vec![2]);
        midi.insert_track(0, vec![0]);
        assert!(midi.move_track(2, 0));
        assert_eq!(midi.tracks, vec![vec![2], vec![0], vec![1]]);
        assert_eq!(midi.remove_track(1), Some(vec![0]));
        assert_eq!(midi.remove_track(5), None);
        assert!(!midi.move_track(0, 9));
        assert_eq!(midi.track_count(), 2);
    }

    #[test]
    fn test_second_header_is_rejected() {
        let header = [
            b'M', b'T', b'h', b'd', 0, 0, 0, 6, 0, 0, 0, 1, 0, 0x60,
        ];
        let mut input = header.to_vec();
        input.extend_from_slice(&header);
        input.extend_from_slice(b"MTrk\0\0\0\x04\x00\xFF\x2F\x00");

        let err = Midi::load_bytes(&input).unwrap_err();
        assert!(matches!(err, Error::DuplicateMidiHeader));
        assert!(err.is_format());
    }

    #[test]
    fn test_reserved_extra_tags() {
        let mut midi = Midi::default();
        assert!(midi.add_extra_chunk(FourCc::MTRK, vec![]).is_err());
        midi.add_extra_chunk(FourCc(*b"MDpg"), vec![1]).unwrap();
        midi.add_extra_chunk(FourCc(*b"MDpg"), vec![2]).unwrap();
        assert_eq!(midi.extra_chunks_tagged(FourCc(*b"MDpg")), &[vec![1], vec![2]]);
        assert!(midi.extra_chunks_tagged(FourCc(*b"XTRA")).is_empty());
    }
}
