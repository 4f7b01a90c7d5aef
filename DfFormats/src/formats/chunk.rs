//! Tagged, length-prefixed chunks (`tag[4]` + `u32` size + payload)

use std::io::{Read, Write};

use byteorder::{ByteOrder, ReadBytesExt, WriteBytesExt};

use crate::binary::{read_payload, FixedLayout, FourCc};
use crate::error::{Error, Result};

/// Header preceding every chunk payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub tag: FourCc,
    pub size: u32,
}

impl FixedLayout for ChunkHeader {
    const SIZE: usize = 8;

    fn read_fields<B: ByteOrder, R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let mut tag = [0u8; 4];
        reader.read_exact(&mut tag)?;
        let size = reader.read_u32::<B>()?;
        Ok(Self {
            tag: FourCc(tag),
            size,
        })
    }

    fn write_fields<B: ByteOrder, W: Write + ?Sized>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(self.tag.as_bytes())?;
        writer.write_u32::<B>(self.size)?;
        Ok(())
    }
}

/// A chunk with its payload.
///
/// The size is not stored; it is always taken from `data.len()` on write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub tag: FourCc,
    pub data: Vec<u8>,
}

impl Chunk {
    #[must_use]
    pub fn new(tag: FourCc, data: Vec<u8>) -> Self {
        Self { tag, data }
    }
}

/// Read the next chunk header, or `None` if the stream is cleanly at its end.
///
/// A header cut off part way is [`Error::UnexpectedEof`].
pub fn try_read_chunk_header<B: ByteOrder, R: Read + ?Sized>(
    reader: &mut R,
) -> Result<Option<ChunkHeader>> {
    let mut buf = [0u8; ChunkHeader::SIZE];
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    match filled {
        0 => Ok(None),
        ChunkHeader::SIZE => Ok(Some(ChunkHeader::read_fields::<B, _>(&mut &buf[..])?)),
        _ => Err(Error::UnexpectedEof),
    }
}

/// Read the next full chunk, or `None` at a clean end of stream.
pub fn try_read_chunk<B: ByteOrder, R: Read + ?Sized>(reader: &mut R) -> Result<Option<Chunk>> {
    let Some(header) = try_read_chunk_header::<B, _>(reader)? else {
        return Ok(None);
    };
    let data = read_payload(reader, u64::from(header.size))?;
    Ok(Some(Chunk::new(header.tag, data)))
}

/// Size field value for a payload of `len` bytes.
pub fn chunk_size(what: &'static str, len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| Error::DataTooLarge {
        what,
        size: len as u64,
    })
}

/// Write one chunk, computing its size from the payload.
pub fn write_chunk<B: ByteOrder, W: Write + ?Sized>(
    writer: &mut W,
    tag: FourCc,
    data: &[u8],
) -> Result<()> {
    let size = chunk_size("chunk payload", data.len())?;
    crate::binary::write_struct::<_, B, _>(writer, &ChunkHeader { tag, size })?;
    writer.write_all(data)?;
    Ok(())
}
