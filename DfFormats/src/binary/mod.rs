//! Fixed-layout binary structures with explicit byte order
//!
//! Every on-disk header in this crate implements [`FixedLayout`]. The byte
//! order is a type parameter (`byteorder::LittleEndian` or `BigEndian`), so
//! each multi-byte field is swapped as it is read or written regardless of
//! the host's native order.
//!
//! ```
//! use byteorder::BigEndian;
//! use dfformats::binary::{read_struct, write_struct, FixedLayout};
//! # use dfformats::Result;
//! # use byteorder::{ByteOrder, ReadBytesExt, WriteBytesExt};
//! # use std::io::{Read, Write};
//! #[derive(Debug, PartialEq)]
//! struct Pair { a: u16, b: u32 }
//!
//! impl FixedLayout for Pair {
//!     const SIZE: usize = 6;
//!     fn read_fields<B: ByteOrder, R: Read + ?Sized>(r: &mut R) -> Result<Self> {
//!         Ok(Self { a: r.read_u16::<B>()?, b: r.read_u32::<B>()? })
//!     }
//!     fn write_fields<B: ByteOrder, W: Write + ?Sized>(&self, w: &mut W) -> Result<()> {
//!         w.write_u16::<B>(self.a)?;
//!         w.write_u32::<B>(self.b)?;
//!         Ok(())
//!     }
//! }
//!
//! let mut bytes = Vec::new();
//! write_struct::<_, BigEndian, _>(&mut bytes, &Pair { a: 1, b: 2 })?;
//! assert_eq!(bytes, [0, 1, 0, 0, 0, 2]);
//! let back: Pair = read_struct::<_, BigEndian, _>(&mut bytes.as_slice())?;
//! assert_eq!(back, Pair { a: 1, b: 2 });
//! # Ok::<(), dfformats::Error>(())
//! ```

mod fourcc;

pub use fourcc::FourCc;

use std::io::{Read, Write};

use byteorder::ByteOrder;

use crate::error::{Error, Result};

/// A structure with a fixed on-disk size.
pub trait FixedLayout: Sized {
    /// Encoded size in bytes.
    const SIZE: usize;

    /// Decode the fields in order from `reader`.
    ///
    /// Called by [`read_struct`] on a buffer of exactly [`Self::SIZE`] bytes.
    fn read_fields<B: ByteOrder, R: Read + ?Sized>(reader: &mut R) -> Result<Self>;

    /// Encode the fields in order to `writer`.
    fn write_fields<B: ByteOrder, W: Write + ?Sized>(&self, writer: &mut W) -> Result<()>;
}

/// Read one `T` from `reader` in byte order `B`.
///
/// Exactly `T::SIZE` bytes are consumed before any field is decoded, so a
/// truncated stream fails with [`Error::UnexpectedEof`] and never yields a
/// half-decoded value.
pub fn read_struct<T, B, R>(reader: &mut R) -> Result<T>
where
    T: FixedLayout,
    B: ByteOrder,
    R: Read + ?Sized,
{
    let mut buf = vec![0u8; T::SIZE];
    reader.read_exact(&mut buf)?;
    T::read_fields::<B, _>(&mut buf.as_slice())
}

/// Write `value` to `writer` in byte order `B`.
///
/// The value is encoded into a private buffer first; the caller's value is
/// only borrowed.
pub fn write_struct<T, B, W>(writer: &mut W, value: &T) -> Result<()>
where
    T: FixedLayout,
    B: ByteOrder,
    W: Write + ?Sized,
{
    let mut buf = Vec::with_capacity(T::SIZE);
    value.write_fields::<B, _>(&mut buf)?;
    debug_assert_eq!(buf.len(), T::SIZE, "FixedLayout::SIZE disagrees with write_fields");
    writer.write_all(&buf)?;
    Ok(())
}

/// Convert a fixed-width NUL-padded field to text.
///
/// Trims at the first NUL; a field with no NUL uses its full width. Each
/// byte becomes the char with the same code point (Latin-1), so DOS code
/// page names survive [`encode_fixed_str`] unchanged.
#[must_use]
pub fn fixed_str(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    bytes[..end].iter().copied().map(char::from).collect()
}

/// Read a `width`-byte NUL-padded text field.
pub fn read_fixed_str<R: Read + ?Sized>(reader: &mut R, width: usize) -> Result<String> {
    let mut buf = vec![0u8; width];
    reader.read_exact(&mut buf)?;
    Ok(fixed_str(&buf))
}

/// Encode `text` into a `width`-byte NUL-padded field.
///
/// Each char is stored as one byte. A text that fills the field exactly is
/// stored without a terminator.
///
/// # Errors
/// Returns [`Error::InvalidEntryName`] if `text` has a char above U+00FF,
/// or [`Error::NameTooLong`] if it does not fit.
pub fn encode_fixed_str(text: &str, width: usize) -> Result<Vec<u8>> {
    let bytes = text
        .chars()
        .map(u8::try_from)
        .collect::<std::result::Result<Vec<u8>, _>>()
        .map_err(|_| Error::InvalidEntryName(text.to_string()))?;
    if bytes.len() > width {
        return Err(Error::NameTooLong {
            name: text.to_string(),
            max: width,
        });
    }
    let mut buf = vec![0u8; width];
    buf[..bytes.len()].copy_from_slice(&bytes);
    Ok(buf)
}

/// Write `text` as a `width`-byte NUL-padded field.
pub fn write_fixed_str<W: Write + ?Sized>(writer: &mut W, text: &str, width: usize) -> Result<()> {
    writer.write_all(&encode_fixed_str(text, width)?)?;
    Ok(())
}

/// Read exactly `size` payload bytes.
///
/// The buffer grows as data arrives instead of trusting `size` for the
/// allocation, so a corrupt size field cannot trigger a huge allocation.
pub fn read_payload<R: Read + ?Sized>(reader: &mut R, size: u64) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    Read::take(&mut *reader, size).read_to_end(&mut data)?;
    if (data.len() as u64) < size {
        return Err(Error::UnexpectedEof);
    }
    Ok(data)
}
