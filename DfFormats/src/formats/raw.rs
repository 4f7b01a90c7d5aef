//! Opaque resource bytes
//!
//! Used for any entry whose type does not resolve to a codec. Loads the
//! whole remaining stream and writes it back unchanged.

use std::io::{Read, Write};

use crate::dispatch::ResourceKind;
use crate::error::Result;
use crate::formats::resource::{Loadable, Resource, Savable};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawFile {
    pub data: Vec<u8>,
}

impl RawFile {
    #[must_use]
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }
}

impl From<Vec<u8>> for RawFile {
    fn from(data: Vec<u8>) -> Self {
        Self { data }
    }
}

impl Resource for RawFile {
    const KIND: ResourceKind = ResourceKind::Raw;
}

impl Loadable for RawFile {
    fn load<R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Ok(Self { data })
    }
}

impl Savable for RawFile {
    fn save<W: Write + ?Sized>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.data)?;
        Ok(())
    }
}
