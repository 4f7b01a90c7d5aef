//! Dark Forces GOB archives
//!
//! ```text
//! header     "GOB\n"  u32 directory offset
//! payloads   entry bytes, back to back
//! directory  u32 count, then per entry:
//!            u32 offset, u32 size, char name[13]
//! ```
//!
//! All numbers are little-endian. Names are up to 12 characters (8.3 DOS
//! names) NUL-padded to 13 bytes and are matched case-insensitively.

use std::io::{Read, Seek, SeekFrom, Write};

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};

use super::{is_name_char, ArchiveFormat, DirectoryEntry, PlannedEntry};
use crate::binary::{read_fixed_str, read_struct, write_fixed_str, write_struct, FixedLayout, FourCc};
use crate::dispatch::ResourceKind;
use crate::error::{Error, Result};

/// GOB file magic.
pub const MAGIC: FourCc = FourCc(*b"GOB\n");

/// Width of the name field.
const NAME_FIELD: usize = 13;

/// Longest name that still leaves room for a terminating NUL.
pub const MAX_NAME_LEN: usize = NAME_FIELD - 1;

#[derive(Debug, Clone, Copy)]
struct GobHeader {
    magic: FourCc,
    directory_offset: u32,
}

impl FixedLayout for GobHeader {
    const SIZE: usize = 8;

    fn read_fields<B: ByteOrder, R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        Ok(Self {
            magic: FourCc(magic),
            directory_offset: reader.read_u32::<B>()?,
        })
    }

    fn write_fields<B: ByteOrder, W: Write + ?Sized>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(self.magic.as_bytes())?;
        writer.write_u32::<B>(self.directory_offset)?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct GobDirEntry {
    offset: u32,
    size: u32,
    name: String,
}

impl FixedLayout for GobDirEntry {
    const SIZE: usize = 8 + NAME_FIELD;

    fn read_fields<B: ByteOrder, R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let offset = reader.read_u32::<B>()?;
        let size = reader.read_u32::<B>()?;
        Ok(Self {
            offset,
            size,
            name: read_fixed_str(reader, NAME_FIELD)?,
        })
    }

    fn write_fields<B: ByteOrder, W: Write + ?Sized>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32::<B>(self.offset)?;
        writer.write_u32::<B>(self.size)?;
        write_fixed_str(writer, &self.name, NAME_FIELD)
    }
}

/// The GOB archive format.
#[derive(Debug, Clone, Copy, Default)]
pub struct Gob;

impl ArchiveFormat for Gob {
    const NAME: &'static str = "GOB";
    const KIND: ResourceKind = ResourceKind::Gob;
    const MAX_ENTRIES: usize = u32::MAX as usize;

    fn validate_name(name: &str) -> Result<()> {
        if name.is_empty() || !name.chars().all(|c| is_name_char(c) && c != '/' && c != '\\') {
            return Err(Error::InvalidEntryName(name.to_string()));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(Error::NameTooLong {
                name: name.to_string(),
                max: MAX_NAME_LEN,
            });
        }
        Ok(())
    }

    fn read_directory<R: Read + Seek>(reader: &mut R) -> Result<Vec<DirectoryEntry>> {
        reader.seek(SeekFrom::Start(0))?;
        let header: GobHeader = read_struct::<_, LittleEndian, _>(reader)?;
        if header.magic != MAGIC {
            return Err(Error::InvalidMagic {
                format: "GOB",
                expected: "GOB\\n",
                found: header.magic.as_bytes().to_vec(),
            });
        }

        let stream_len = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(u64::from(header.directory_offset)))?;
        let count = reader.read_u32::<LittleEndian>()?;

        let table_size = u64::from(count) * GobDirEntry::SIZE as u64;
        if u64::from(header.directory_offset) + 4 + table_size > stream_len {
            return Err(Error::InvalidChunkSize {
                what: "GOB directory",
                size: table_size,
            });
        }

        (0..count)
            .map(|_| {
                let entry: GobDirEntry = read_struct::<_, LittleEndian, _>(reader)?;
                Ok(DirectoryEntry {
                    name: entry.name,
                    offset: u64::from(entry.offset),
                    size: u64::from(entry.size),
                })
            })
            .collect()
    }

    fn header_size(_count: usize) -> u64 {
        GobHeader::SIZE as u64
    }

    fn write_header<W: Write + ?Sized>(
        writer: &mut W,
        _entries: &[PlannedEntry],
        payload_end: u32,
    ) -> Result<()> {
        write_struct::<_, LittleEndian, _>(
            writer,
            &GobHeader {
                magic: MAGIC,
                directory_offset: payload_end,
            },
        )
    }

    fn write_directory<W: Write + ?Sized>(writer: &mut W, entries: &[PlannedEntry]) -> Result<()> {
        let count = u32::try_from(entries.len()).map_err(|_| Error::TooManyEntries {
            count: entries.len(),
        })?;
        writer.write_u32::<LittleEndian>(count)?;
        for entry in entries {
            write_struct::<_, LittleEndian, _>(
                writer,
                &GobDirEntry {
                    offset: entry.offset,
                    size: entry.size,
                    name: entry.name.clone(),
                },
            )?;
        }
        Ok(())
    }
}
