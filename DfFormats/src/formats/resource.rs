//! Load/save contract shared by every resource codec
//!
//! Capabilities are expressed as traits: a type that can be decoded
//! implements [`Loadable`], a type that can be encoded implements
//! [`Savable`]. Read-only formats simply lack the `Savable` impl, so trying
//! to save one is a compile error rather than a runtime surprise.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::dispatch::ResourceKind;
use crate::error::{Error, Result};

/// Common metadata of a resource type.
pub trait Resource {
    /// Dispatch token for this type.
    const KIND: ResourceKind;

    /// Whether the type can be decoded from a stream.
    const CAN_LOAD: bool = Self::KIND.can_load();

    /// Whether the type can be encoded to a stream.
    const CAN_SAVE: bool = Self::KIND.can_save();
}

/// A resource that can be decoded from a byte stream.
pub trait Loadable: Resource + Sized {
    /// Decode a resource starting at the reader's current position.
    ///
    /// On error nothing is returned, so a caller replacing an existing record
    /// with `*record = T::load(..)?` keeps its previous state.
    fn load<R: Read + ?Sized>(reader: &mut R) -> Result<Self>;

    /// Decode a resource from an in-memory buffer.
    fn load_bytes(data: &[u8]) -> Result<Self> {
        let mut slice = data;
        Self::load(&mut slice)
    }

    /// Decode a resource from a file on disk.
    fn load_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::from_path(e, path))?;
        let mut reader = BufReader::new(file);
        Self::load(&mut reader)
    }
}

/// A resource that can be encoded to a byte stream.
pub trait Savable: Resource {
    /// Write a complete, independently parseable resource at the writer's
    /// current position.
    fn save<W: Write + ?Sized>(&self, writer: &mut W) -> Result<()>;

    /// Encode the resource into a new buffer.
    fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        self.save(&mut data)?;
        Ok(data)
    }

    /// Encode the resource into a file on disk, replacing it.
    fn save_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        self.save(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::Wave;
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let err = Wave::load_file(dir.path().join("MISSING.WAV")).unwrap_err();
        assert!(err.is_not_found());
        assert!(matches!(err, Error::FileNotFound(_)));
    }

    #[test]
    fn test_save_then_load_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("TONE.WAV");
        let wave = Wave::new(1, 11025, 8, vec![0x80, 0x90]);
        wave.save_file(&path).unwrap();
        assert_eq!(Wave::load_file(&path).unwrap(), wave);
    }
}
