//! Dark Forces General MIDI sequence (`.GMD`, Landru type `GMID`)
//!
//! A standard MIDI chunk stream wrapped in a single big-endian `MIDI` chunk.
//! The game stores its iMUSE cue data in `MDpg` chunks alongside the tracks;
//! those are kept as pass-through chunks of the inner [`Midi`].

use std::io::{Read, Write};

use byteorder::BigEndian;

use crate::binary::{read_payload, FourCc};
use crate::dispatch::ResourceKind;
use crate::error::{Error, Result};
use crate::formats::chunk::{try_read_chunk_header, write_chunk};
use crate::formats::midi::{read_midi, write_midi, Midi};
use crate::formats::resource::{Loadable, Resource, Savable};

/// Tag of the iMUSE cue chunks found in Dark Forces sequences.
pub const IMUSE_CUE_TAG: FourCc = FourCc(*b"MDpg");

/// A MIDI sequence in its Dark Forces wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DfGeneralMidi {
    pub midi: Midi,
}

impl DfGeneralMidi {
    #[must_use]
    pub fn new(midi: Midi) -> Self {
        Self { midi }
    }

    #[must_use]
    pub fn into_midi(self) -> Midi {
        self.midi
    }

    /// The iMUSE cue chunks carried by this sequence.
    #[must_use]
    pub fn cue_chunks(&self) -> &[Vec<u8>] {
        self.midi.extra_chunks_tagged(IMUSE_CUE_TAG)
    }
}

impl From<Midi> for DfGeneralMidi {
    fn from(midi: Midi) -> Self {
        Self { midi }
    }
}

impl Resource for DfGeneralMidi {
    const KIND: ResourceKind = ResourceKind::GeneralMidi;
}

impl Loadable for DfGeneralMidi {
    fn load<R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let header = try_read_chunk_header::<BigEndian, _>(reader)?.ok_or(Error::UnexpectedEof)?;
        if header.tag != FourCc::MIDI {
            return Err(Error::InvalidMagic {
                format: "GMD",
                expected: "MIDI",
                found: header.tag.as_bytes().to_vec(),
            });
        }

        // The inner stream may not run past the wrapper
        let payload = read_payload(reader, u64::from(header.size))?;
        let midi = read_midi(&mut payload.as_slice())?;
        Ok(Self { midi })
    }
}

impl Savable for DfGeneralMidi {
    fn save<W: Write + ?Sized>(&self, writer: &mut W) -> Result<()> {
        let mut payload = Vec::new();
        write_midi(&self.midi, &mut payload)?;
        write_chunk::<BigEndian, _>(writer, FourCc::MIDI, &payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::midi::{Division, MidiFormat};

    fn sample() -> DfGeneralMidi {
        let mut midi = Midi::new(MidiFormat::MultiTrack, Division::TicksPerBeat(120));
        midi.add_extra_chunk(IMUSE_CUE_TAG, vec![0, 1, 2, 3]).unwrap();
        midi.add_track(vec![0x00, 0xFF, 0x2F, 0x00]);
        DfGeneralMidi::new(midi)
    }

    #[test]
    fn test_wrapper_layout() {
        let bytes = sample().to_bytes().unwrap();
        assert_eq!(&bytes[..4], b"MIDI");
        let size = u32::from_be_bytes(bytes[4..8].try_into().unwrap());
        assert_eq!(size as usize, bytes.len() - 8);
        assert_eq!(&bytes[8..12], b"MThd");
    }

    #[test]
    fn test_round_trip() {
        let gmd = sample();
        let bytes = gmd.to_bytes().unwrap();
        let back = DfGeneralMidi::load_bytes(&bytes).unwrap();
        assert_eq!(back, gmd);
        assert_eq!(back.cue_chunks(), &[vec![0, 1, 2, 3]]);
        assert_eq!(back.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn test_bare_midi_is_rejected() {
        let bare = sample().midi.to_bytes().unwrap();
        assert!(matches!(
            DfGeneralMidi::load_bytes(&bare),
            Err(Error::InvalidMagic { format: "GMD", .. })
        ));
    }

    #[test]
    fn test_inner_stream_bounded_by_wrapper() {
        let mut bytes = sample().to_bytes().unwrap();
        // Declare one more track than the wrapper holds
        bytes[18..20].copy_from_slice(&2u16.to_be_bytes());
        assert!(matches!(
            DfGeneralMidi::load_bytes(&bytes),
            Err(Error::MissingTracks { declared: 2, found: 1 })
        ));
    }
}
