//! LucasArts Landru LFD archives
//!
//! ```text
//! "RMAP" "resource" u32 size     resource map header (size = 16 * count)
//! { type[4] name[8] u32 size }   one record per resource
//! then per resource:
//! { type[4] name[8] u32 size }   resource header, repeated
//! payload
//! ```
//!
//! Sizes are little-endian. Type and name are NUL-padded. Entries are
//! exposed as `NAME.TYPE`, e.g. `jabba.VOIC`.

use std::io::{Read, Seek, SeekFrom, Write};

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};

use super::{is_name_char, ArchiveFormat, DirectoryEntry, PlannedEntry, MAX_FIELD_VALUE};
use crate::binary::{read_fixed_str, read_payload, read_struct, write_fixed_str, write_struct, FixedLayout};
use crate::dispatch::{detect_file_type_by_landru_type, ResourceKind};
use crate::error::{Error, Result};

/// Type of the resource map that opens every LFD.
pub const RMAP_TYPE: &str = "RMAP";

/// Name of the resource map.
pub const RMAP_NAME: &str = "resource";

const TYPE_FIELD: usize = 4;
const NAME_FIELD: usize = 8;

/// Header of a resource, also used for the resource map records.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LfdHeader {
    resource_type: String,
    name: String,
    size: u32,
}

impl FixedLayout for LfdHeader {
    const SIZE: usize = TYPE_FIELD + NAME_FIELD + 4;

    fn read_fields<B: ByteOrder, R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        Ok(Self {
            resource_type: read_fixed_str(reader, TYPE_FIELD)?,
            name: read_fixed_str(reader, NAME_FIELD)?,
            size: reader.read_u32::<B>()?,
        })
    }

    fn write_fields<B: ByteOrder, W: Write + ?Sized>(&self, writer: &mut W) -> Result<()> {
        write_fixed_str(writer, &self.resource_type, TYPE_FIELD)?;
        write_fixed_str(writer, &self.name, NAME_FIELD)?;
        writer.write_u32::<B>(self.size)?;
        Ok(())
    }
}

impl LfdHeader {
    fn for_entry(entry: &PlannedEntry) -> Result<Self> {
        let (name, resource_type) = split_lfd_name(&entry.name)?;
        Ok(Self {
            resource_type: resource_type.to_string(),
            name: name.to_string(),
            size: entry.size,
        })
    }

    fn entry_name(&self) -> String {
        format!("{}.{}", self.name, self.resource_type)
    }
}

/// Split an entry name `NAME.TYPE` into `(name, type)`.
///
/// # Errors
/// [`Error::InvalidEntryName`] if there is no `.TYPE` suffix or either part
/// is empty; [`Error::NameTooLong`] if a part does not fit its field.
pub fn split_lfd_name(entry_name: &str) -> Result<(&str, &str)> {
    let invalid = || Error::InvalidEntryName(entry_name.to_string());
    let (name, resource_type) = entry_name.rsplit_once('.').ok_or_else(invalid)?;

    for (part, width) in [(name, NAME_FIELD), (resource_type, TYPE_FIELD)] {
        if part.is_empty() || !part.chars().all(is_name_char) {
            return Err(invalid());
        }
        if part.chars().count() > width {
            return Err(Error::NameTooLong {
                name: entry_name.to_string(),
                max: width,
            });
        }
    }
    Ok((name, resource_type))
}

/// The LFD archive format.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lfd;

impl ArchiveFormat for Lfd {
    const NAME: &'static str = "LFD";
    const KIND: ResourceKind = ResourceKind::Lfd;
    const MAX_ENTRIES: usize = (MAX_FIELD_VALUE / LfdHeader::SIZE as u64) as usize;
    const ENTRY_HEADER_SIZE: u64 = LfdHeader::SIZE as u64;

    fn validate_name(name: &str) -> Result<()> {
        split_lfd_name(name).map(|_| ())
    }

    fn read_directory<R: Read + Seek>(reader: &mut R) -> Result<Vec<DirectoryEntry>> {
        reader.seek(SeekFrom::Start(0))?;
        let map: LfdHeader = read_struct::<_, LittleEndian, _>(reader)?;
        if map.resource_type != RMAP_TYPE {
            return Err(Error::InvalidMagic {
                format: "LFD",
                expected: RMAP_TYPE,
                found: map.resource_type.into_bytes(),
            });
        }
        if map.size as usize % LfdHeader::SIZE != 0 {
            return Err(Error::InvalidChunkSize {
                what: "LFD resource map",
                size: u64::from(map.size),
            });
        }

        let table = read_payload(reader, u64::from(map.size))?;
        let mut position = (LfdHeader::SIZE + table.len()) as u64;
        let mut entries = Vec::with_capacity(table.len() / LfdHeader::SIZE);

        // The map only lists resources; offsets come from walking the
        // resource headers that follow it
        for record in table.chunks_exact(LfdHeader::SIZE) {
            let listed: LfdHeader = read_struct::<_, LittleEndian, _>(&mut &record[..])?;
            reader.seek(SeekFrom::Start(position))?;
            let header: LfdHeader = read_struct::<_, LittleEndian, _>(reader)?;

            if !header.resource_type.eq_ignore_ascii_case(&listed.resource_type)
                || !header.name.eq_ignore_ascii_case(&listed.name)
            {
                return Err(Error::InvalidEntry {
                    name: listed.entry_name(),
                    message: format!("resource map disagrees with header {}", header.entry_name()),
                });
            }
            if header.size != listed.size {
                tracing::warn!(
                    "LFD entry {} listed as {} bytes but header says {}",
                    header.entry_name(),
                    listed.size,
                    header.size
                );
            }

            let offset = position + LfdHeader::SIZE as u64;
            entries.push(DirectoryEntry {
                name: header.entry_name(),
                offset,
                size: u64::from(header.size),
            });
            position = offset + u64::from(header.size);
        }

        Ok(entries)
    }

    fn header_size(count: usize) -> u64 {
        ((count + 1) * LfdHeader::SIZE) as u64
    }

    fn write_header<W: Write + ?Sized>(
        writer: &mut W,
        entries: &[PlannedEntry],
        _payload_end: u32,
    ) -> Result<()> {
        let map_size = entries.len() * LfdHeader::SIZE;
        let map = LfdHeader {
            resource_type: RMAP_TYPE.to_string(),
            name: RMAP_NAME.to_string(),
            size: u32::try_from(map_size).map_err(|_| Error::TooManyEntries {
                count: entries.len(),
            })?,
        };
        write_struct::<_, LittleEndian, _>(writer, &map)?;
        for entry in entries {
            write_struct::<_, LittleEndian, _>(writer, &LfdHeader::for_entry(entry)?)?;
        }
        Ok(())
    }

    fn write_entry_header<W: Write + ?Sized>(writer: &mut W, entry: &PlannedEntry) -> Result<()> {
        write_struct::<_, LittleEndian, _>(writer, &LfdHeader::for_entry(entry)?)
    }

    fn entry_kind(name: &str) -> Option<ResourceKind> {
        let (_, resource_type) = name.rsplit_once('.')?;
        detect_file_type_by_landru_type(resource_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::LfdArchive;
    use pretty_assertions::assert_eq;

    fn sample() -> Vec<u8> {
        let mut archive = LfdArchive::new();
        archive.add_bytes("jabba.VOIC", vec![1, 2, 3]).unwrap();
        archive.add_bytes("stalk.GMID", vec![4, 5]).unwrap();
        archive.to_bytes().unwrap()
    }

    #[test]
    fn test_layout() {
        let bytes = sample();
        assert_eq!(&bytes[0..12], b"RMAPresource");
        assert_eq!(u32::from_le_bytes(bytes[12..16].try_into().unwrap()), 32);
        assert_eq!(&bytes[16..28], b"VOICjabba\0\0\0");
        assert_eq!(&bytes[32..44], b"GMIDstalk\0\0\0");
        // First resource header repeats the map record, then its payload
        assert_eq!(&bytes[48..64], &bytes[16..32]);
        assert_eq!(&bytes[64..67], &[1, 2, 3]);
        assert_eq!(&bytes[67..79], b"GMIDstalk\0\0\0");
        assert_eq!(&bytes[83..], &[4, 5]);
    }

    #[test]
    fn test_open_computes_offsets() {
        let mut archive = LfdArchive::from_bytes(sample()).unwrap();
        let entries = archive.entries();
        assert_eq!(entries[0].name, "jabba.VOIC");
        assert_eq!(entries[0].offset, Some(64));
        assert_eq!(entries[1].offset, Some(83));
        assert_eq!(archive.extract("STALK.gmid").unwrap(), vec![4, 5]);
    }

    #[test]
    fn test_round_trip_is_exact() {
        let bytes = sample();
        let mut archive = LfdArchive::from_bytes(bytes.clone()).unwrap();
        assert_eq!(archive.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn test_high_bit_name_round_trip() {
        let mut archive = LfdArchive::new();
        archive.add_bytes("r\u{E9}bel.VOIC", vec![7]).unwrap();
        let bytes = archive.to_bytes().unwrap();
        assert_eq!(&bytes[16..28], b"VOICr\xE9bel\0\0\0");

        let mut reopened = LfdArchive::from_bytes(bytes.clone()).unwrap();
        assert_eq!(reopened.entries()[0].name, "r\u{E9}bel.VOIC");
        assert_eq!(reopened.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn test_map_mismatch() {
        let mut bytes = sample();
        bytes[52] = b'X';
        assert!(matches!(
            LfdArchive::from_bytes(bytes),
            Err(Error::InvalidEntry { .. })
        ));
    }

    #[test]
    fn test_not_an_lfd() {
        let err = LfdArchive::from_bytes(b"GOB\n\x08\0\0\0\0\0\0\0\0\0\0\0".to_vec()).unwrap_err();
        assert!(matches!(err, Error::InvalidMagic { format: "LFD", .. }));
    }

    #[test]
    fn test_name_rules() {
        assert_eq!(split_lfd_name("jabba.VOIC").unwrap(), ("jabba", "VOIC"));
        assert_eq!(split_lfd_name("a.b.PLTT").unwrap(), ("a.b", "PLTT"));
        assert!(matches!(split_lfd_name("noext"), Err(Error::InvalidEntryName(_))));
        assert!(matches!(split_lfd_name(".VOIC"), Err(Error::InvalidEntryName(_))));
        assert!(matches!(
            split_lfd_name("ninechars.VOIC"),
            Err(Error::NameTooLong { max: 8, .. })
        ));
        assert!(matches!(
            split_lfd_name("name.TOOLONG"),
            Err(Error::NameTooLong { max: 4, .. })
        ));
    }

    #[test]
    fn test_entry_kind_from_landru_type() {
        assert_eq!(Lfd::entry_kind("jabba.VOIC"), Some(ResourceKind::CreativeVoice));
        assert_eq!(Lfd::entry_kind("stalk.gmid"), Some(ResourceKind::GeneralMidi));
        assert_eq!(Lfd::entry_kind("jabba.DELT"), None);
    }
}
