//! MIDI chunk stream writing

use std::io::Write;

use byteorder::BigEndian;

use super::{Midi, MidiHeader};
use crate::binary::{write_struct, FourCc};
use crate::error::{Error, Result};
use crate::formats::chunk::write_chunk;

/// Encode a MIDI file: `MThd`, then pass-through chunks, then `MTrk` chunks.
///
/// The header's track count is taken from the live track list.
///
/// # Errors
/// Returns [`Error::TooManyEntries`] if there are more than 65535 tracks.
pub(crate) fn write_midi<W: Write + ?Sized>(midi: &Midi, writer: &mut W) -> Result<()> {
    let tracks = u16::try_from(midi.tracks.len()).map_err(|_| Error::TooManyEntries {
        count: midi.tracks.len(),
    })?;

    let header = MidiHeader {
        format: midi.format as u16,
        tracks,
        division: midi.division.to_raw(),
    };
    let mut payload = Vec::new();
    write_struct::<_, BigEndian, _>(&mut payload, &header)?;
    write_chunk::<BigEndian, _>(writer, FourCc::MTHD, &payload)?;

    for (tag, chunks) in &midi.extra_chunks {
        for data in chunks {
            write_chunk::<BigEndian, _>(writer, *tag, data)?;
        }
    }

    for track in &midi.tracks {
        write_chunk::<BigEndian, _>(writer, FourCc::MTRK, track)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::midi::{Division, MidiFormat};
    use crate::formats::resource::{Loadable, Savable};
    use pretty_assertions::assert_eq;

    fn chunk(tag: &[u8; 4], data: &[u8]) -> Vec<u8> {
        let mut out = tag.to_vec();
        out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        out.extend_from_slice(data);
        out
    }

    fn header(format: u16, tracks: u16, division: u16) -> Vec<u8> {
        let mut payload = Vec::new();
        payload.extend_from_slice(&format.to_be_bytes());
        payload.extend_from_slice(&tracks.to_be_bytes());
        payload.extend_from_slice(&division.to_be_bytes());
        chunk(b"MThd", &payload)
    }

    const TRACK_A: &[u8] = &[0x00, 0x90, 0x3C, 0x40, 0x60, 0x80, 0x3C, 0x00, 0x00, 0xFF, 0x2F, 0x00];
    const TRACK_B: &[u8] = &[0x00, 0xFF, 0x2F, 0x00];

    #[test]
    fn test_canonical_file_round_trips_exactly() {
        let mut bytes = header(1, 2, 96);
        bytes.extend(chunk(b"MTrk", TRACK_A));
        bytes.extend(chunk(b"MTrk", TRACK_B));

        let midi = Midi::load_bytes(&bytes).unwrap();
        assert_eq!(midi.format, MidiFormat::MultiTrack);
        assert_eq!(midi.division, Division::TicksPerBeat(96));
        assert_eq!(midi.tracks, vec![TRACK_A.to_vec(), TRACK_B.to_vec()]);

        assert_eq!(midi.to_bytes().unwrap(), bytes);
    }

    // Vendor chunks move ahead of the tracks on save; this is the documented
    // legacy write order, not an accident.
    #[test]
    fn test_interleaved_vendor_chunk_is_written_before_tracks() {
        let mut bytes = header(1, 2, 96);
        bytes.extend(chunk(b"MTrk", TRACK_A));
        bytes.extend(chunk(b"XTRA", b"vendor"));
        bytes.extend(chunk(b"MTrk", TRACK_B));

        let midi = Midi::load_bytes(&bytes).unwrap();
        assert_eq!(midi.extra_chunks_tagged(FourCc(*b"XTRA")), &[b"vendor".to_vec()]);

        let mut expected = header(1, 2, 96);
        expected.extend(chunk(b"XTRA", b"vendor"));
        expected.extend(chunk(b"MTrk", TRACK_A));
        expected.extend(chunk(b"MTrk", TRACK_B));
        assert_eq!(midi.to_bytes().unwrap(), expected);
    }

    #[test]
    fn test_track_count_follows_live_list() {
        let mut bytes = header(1, 1, 96);
        bytes.extend(chunk(b"MTrk", TRACK_A));
        let mut midi = Midi::load_bytes(&bytes).unwrap();

        midi.add_track(TRACK_B.to_vec());
        midi.insert_track(0, TRACK_B.to_vec());
        let saved = midi.to_bytes().unwrap();
        assert_eq!(&saved[10..12], &3u16.to_be_bytes());

        midi.remove_track(0);
        midi.remove_track(0);
        midi.remove_track(0);
        let saved = midi.to_bytes().unwrap();
        assert_eq!(&saved[10..12], &0u16.to_be_bytes());
        assert_eq!(Midi::load_bytes(&saved).unwrap().track_count(), 0);
    }

    #[test]
    fn test_header_must_come_first() {
        let mut bytes = chunk(b"MTrk", TRACK_A);
        bytes.extend(header(0, 1, 96));
        let err = Midi::load_bytes(&bytes).unwrap_err();
        assert!(matches!(err, Error::MissingMidiHeader { found } if found == FourCc::MTRK));
    }

    #[test]
    fn test_stream_ends_before_declared_tracks() {
        let mut bytes = header(1, 3, 96);
        bytes.extend(chunk(b"MTrk", TRACK_A));
        bytes.extend(chunk(b"XTRA", b"x"));
        let err = Midi::load_bytes(&bytes).unwrap_err();
        assert!(matches!(err, Error::MissingTracks { declared: 3, found: 1 }));
        assert!(err.is_format());
    }

    #[test]
    fn test_long_header_payload_is_skipped() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&0u16.to_be_bytes());
        payload.extend_from_slice(&1u16.to_be_bytes());
        payload.extend_from_slice(&0xE728u16.to_be_bytes());
        payload.extend_from_slice(&[0xAA, 0xBB]);
        let mut bytes = chunk(b"MThd", &payload);
        bytes.extend(chunk(b"MTrk", TRACK_B));

        let midi = Midi::load_bytes(&bytes).unwrap();
        assert_eq!(midi.format, MidiFormat::SingleTrack);
        assert_eq!(midi.division, Division::FramesPerSecond(0x6728));
        assert_eq!(midi.tracks.len(), 1);
    }

    #[test]
    fn test_short_header_is_rejected() {
        let bytes = chunk(b"MThd", &[0, 1]);
        assert!(matches!(
            Midi::load_bytes(&bytes),
            Err(Error::InvalidChunkSize { what: "MThd", size: 2 })
        ));
    }
}
