//! Error types for `dfformats`

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::binary::FourCc;
use crate::dispatch::ResourceKind;

/// Broad category of an [`Error`].
///
/// Callers use this to tell "the data is corrupt" apart from "the thing does
/// not exist" (offer to create it) and "the value does not fit the format".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Structural or content violation in the data being decoded.
    Format,
    /// A named entry, resource or path does not resolve.
    NotFound,
    /// A value exceeds a field width mandated by the format.
    Capacity,
    /// Failure of the underlying stream.
    Io,
}

/// The error type for `dfformats` operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from the underlying stream.
    #[error("IO error: {0}")]
    Io(std::io::Error),

    // ==================== Format Errors ====================
    /// The stream ended before a complete structure could be read.
    #[error("unexpected end of file")]
    UnexpectedEof,

    /// A magic number or tag did not match.
    #[error("invalid {format} magic: expected {expected}, found {found:?}")]
    InvalidMagic {
        /// Name of the format being read.
        format: &'static str,
        /// The expected magic, printable.
        expected: &'static str,
        /// The bytes actually found.
        found: Vec<u8>,
    },

    /// A WAVE header field failed validation.
    #[error("invalid WAVE header: {field} is {found}, expected {expected}")]
    InvalidWaveHeader {
        /// Name of the offending header field.
        field: &'static str,
        /// Printable found value.
        found: String,
        /// Printable expected value.
        expected: String,
    },

    /// The first chunk of a MIDI stream was not `MThd`.
    #[error("MIDI stream does not start with MThd (found {found})")]
    MissingMidiHeader {
        /// The tag of the first chunk.
        found: FourCc,
    },

    /// A MIDI stream holds a second `MThd` chunk.
    #[error("MIDI stream has more than one MThd chunk")]
    DuplicateMidiHeader,

    /// The MIDI stream ended before the declared number of tracks was read.
    #[error("MIDI header declares {declared} tracks but only {found} were present")]
    MissingTracks {
        /// Track count from the header.
        declared: u16,
        /// Tracks actually read.
        found: usize,
    },

    /// A chunk or block declared a size that is impossible for its type.
    #[error("invalid size {size} for {what}")]
    InvalidChunkSize {
        /// What was being read.
        what: &'static str,
        /// The declared size.
        size: u64,
    },

    /// A sub-format, codec or version that this library does not handle.
    #[error("unsupported {format}: {message}")]
    UnsupportedFormat {
        /// Name of the format being read.
        format: &'static str,
        /// Description of what is unsupported.
        message: String,
    },

    /// A container directory entry is inconsistent with the archive.
    #[error("invalid entry '{name}': {message}")]
    InvalidEntry {
        /// The entry name.
        name: String,
        /// Description of the inconsistency.
        message: String,
    },

    /// The resource type is read-only.
    #[error("{0} resources cannot be saved")]
    SaveNotSupported(ResourceKind),

    /// The resource type has no decoder.
    #[error("{0} resources cannot be loaded as a single resource")]
    LoadNotSupported(ResourceKind),

    // ==================== Not Found Errors ====================
    /// The requested entry is not in the container.
    #[error("entry not found in archive: {0}")]
    EntryNotFound(String),

    /// The requested path resolves neither to a file nor to a container entry.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    // ==================== Capacity Errors ====================
    /// An entry is too large for the container's size field.
    #[error("entry '{name}' is too large: {size} bytes (max {max})")]
    EntryTooLarge {
        /// The entry name.
        name: String,
        /// The entry size.
        size: u64,
        /// The largest size the format can record.
        max: u64,
    },

    /// A name does not fit its fixed-width field.
    #[error("name '{name}' is longer than {max} bytes")]
    NameTooLong {
        /// The offending name.
        name: String,
        /// The field width.
        max: usize,
    },

    /// A name cannot be represented in the container at all.
    #[error("invalid entry name '{0}'")]
    InvalidEntryName(String),

    /// The container holds more entries than its count field allows.
    #[error("too many entries: {count}")]
    TooManyEntries {
        /// The number of entries.
        count: usize,
    },

    /// A resource payload is too large for the format's size fields.
    #[error("{what} is too large: {size} bytes")]
    DataTooLarge {
        /// What was being written.
        what: &'static str,
        /// The payload size.
        size: u64,
    },

    /// A value is outside the range its field can encode.
    #[error("{what} value {value} is out of range (max {max})")]
    ValueOutOfRange {
        /// What was being written.
        what: &'static str,
        /// The offending value.
        value: u64,
        /// The largest value the field holds.
        max: u64,
    },

    // ==================== Configuration Errors ====================
    /// The locator configuration file could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

impl Error {
    /// The taxonomy category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) => ErrorKind::Io,
            Error::EntryNotFound(_) | Error::FileNotFound(_) => ErrorKind::NotFound,
            Error::EntryTooLarge { .. }
            | Error::NameTooLong { .. }
            | Error::InvalidEntryName(_)
            | Error::TooManyEntries { .. }
            | Error::DataTooLarge { .. }
            | Error::ValueOutOfRange { .. } => ErrorKind::Capacity,
            _ => ErrorKind::Format,
        }
    }

    /// Shorthand for `kind() == ErrorKind::Format`.
    #[must_use]
    pub fn is_format(&self) -> bool {
        self.kind() == ErrorKind::Format
    }

    /// Shorthand for `kind() == ErrorKind::NotFound`.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Wrap an error from opening `path`; a missing file becomes
    /// [`Error::FileNotFound`].
    pub(crate) fn from_path(err: std::io::Error, path: &Path) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Error::FileNotFound(path.to_path_buf()),
            _ => Error::from(err),
        }
    }
}

// A short read is truncated content, not a stream failure
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::UnexpectedEof
        } else {
            Error::Io(err)
        }
    }
}

/// A specialized Result type for `dfformats` operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_read_is_format_error() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short");
        let err = Error::from(io);
        assert!(matches!(err, Error::UnexpectedEof));
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_other_io_errors_pass_through() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        let err = Error::from(io);
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_missing_path_is_not_found() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = Error::from_path(io, Path::new("DARK.GOB"));
        assert!(matches!(err, Error::FileNotFound(ref p) if p == Path::new("DARK.GOB")));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_error_kinds() {
        assert!(Error::EntryNotFound("A.PAL".into()).is_not_found());
        assert_eq!(
            Error::NameTooLong { name: "X".into(), max: 12 }.kind(),
            ErrorKind::Capacity
        );
        assert!(Error::SaveNotSupported(ResourceKind::CreativeVoice).is_format());
    }
}
