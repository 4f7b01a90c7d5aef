//! MIDI chunk stream reading

use std::io::{self, Read};

use byteorder::BigEndian;
use indexmap::IndexMap;

use super::{Division, Midi, MidiFormat, MidiHeader, HEADER_PAYLOAD_SIZE};
use crate::binary::{read_struct, FourCc};
use crate::error::{Error, Result};
use crate::formats::chunk::{try_read_chunk, try_read_chunk_header};

/// Decode a MIDI chunk stream.
///
/// Reads the `MThd` chunk, then chunks until as many `MTrk` chunks as the
/// header declares have been collected. Anything after the last track is
/// left unread.
///
/// # Errors
///
/// Returns [`Error::MissingMidiHeader`] if the first chunk is not `MThd`.
/// Returns [`Error::DuplicateMidiHeader`] if another `MThd` comes before the
/// last track.
/// Returns [`Error::MissingTracks`] if the stream ends before the declared
/// track count is reached.
/// Returns [`Error::UnexpectedEof`] if a chunk is cut off.
pub(crate) fn read_midi<R: Read + ?Sized>(reader: &mut R) -> Result<Midi> {
    let first = try_read_chunk_header::<BigEndian, _>(reader)?.ok_or(Error::UnexpectedEof)?;
    if first.tag != FourCc::MTHD {
        return Err(Error::MissingMidiHeader { found: first.tag });
    }
    if first.size < HEADER_PAYLOAD_SIZE {
        return Err(Error::InvalidChunkSize {
            what: "MThd",
            size: u64::from(first.size),
        });
    }

    let header: MidiHeader = read_struct::<_, BigEndian, _>(reader)?;

    // Longer headers are allowed; the extra bytes are not ours to interpret
    let extra = u64::from(first.size - HEADER_PAYLOAD_SIZE);
    if extra > 0 {
        let skipped = io::copy(&mut Read::take(&mut *reader, extra), &mut io::sink())?;
        if skipped < extra {
            return Err(Error::UnexpectedEof);
        }
        tracing::debug!("Skipped {} extra MThd bytes", extra);
    }

    let format = MidiFormat::try_from(header.format)?;
    let division = Division::from_raw(header.division);
    let declared = usize::from(header.tracks);

    let mut tracks = Vec::with_capacity(declared);
    let mut extra_chunks: IndexMap<FourCc, Vec<Vec<u8>>> = IndexMap::new();

    while tracks.len() < declared {
        let Some(chunk) = try_read_chunk::<BigEndian, _>(reader)? else {
            return Err(Error::MissingTracks {
                declared: header.tracks,
                found: tracks.len(),
            });
        };

        if chunk.tag == FourCc::MTRK {
            tracks.push(chunk.data);
        } else if chunk.tag == FourCc::MTHD {
            return Err(Error::DuplicateMidiHeader);
        } else {
            tracing::debug!("Keeping pass-through chunk {} ({} bytes)", chunk.tag, chunk.data.len());
            extra_chunks.entry(chunk.tag).or_default().push(chunk.data);
        }
    }

    tracing::debug!(
        "Read MIDI: format {:?}, {} tracks, {} extra chunk tags",
        format,
        tracks.len(),
        extra_chunks.len()
    );

    Ok(Midi {
        format,
        division,
        tracks,
        extra_chunks,
    })
}
