//! Types shared by the flat archive formats

use std::path::PathBuf;

/// Where the bytes of an entry currently live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntrySource {
    /// A byte range of the archive stream the entry was read from.
    Archive { offset: u64, size: u64 },
    /// A file on disk, added but not yet saved. The size is the file length
    /// recorded when the entry was added.
    File { path: PathBuf, size: u64 },
    /// An in-memory buffer, added but not yet saved.
    Bytes(Vec<u8>),
}

impl EntrySource {
    #[must_use]
    pub fn size(&self) -> u64 {
        match self {
            Self::Archive { size, .. } | Self::File { size, .. } => *size,
            Self::Bytes(data) => data.len() as u64,
        }
    }

    /// True for entries that only exist in memory until the archive is saved.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        !matches!(self, Self::Archive { .. })
    }
}

/// One named entry of an open archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub source: EntrySource,
}

/// Directory listing of one entry, as returned by
/// [`Archive::entries`](super::Archive::entries).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    pub name: String,
    /// Payload offset in the archive stream; `None` for pending entries.
    pub offset: Option<u64>,
    pub size: u64,
}

impl From<&ArchiveEntry> for EntryInfo {
    fn from(entry: &ArchiveEntry) -> Self {
        let offset = match entry.source {
            EntrySource::Archive { offset, .. } => Some(offset),
            _ => None,
        };
        Self {
            name: entry.name.clone(),
            offset,
            size: entry.source.size(),
        }
    }
}

/// Directory record produced by a format reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub name: String,
    pub offset: u64,
    pub size: u64,
}

/// An entry with its final position, computed before a save starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedEntry {
    pub name: String,
    /// Payload offset in the new archive.
    pub offset: u32,
    pub size: u32,
}

/// Progress information during archive operations
#[derive(Debug, Clone)]
pub struct ArchiveProgress {
    /// Current operation phase
    pub phase: ArchivePhase,
    /// Current item number (1-indexed)
    pub current: usize,
    /// Total number of items
    pub total: usize,
    /// Current entry being processed (if applicable)
    pub current_file: Option<String>,
}

impl ArchiveProgress {
    #[must_use]
    pub fn new(phase: ArchivePhase, current: usize, total: usize) -> Self {
        Self {
            phase,
            current,
            total,
            current_file: None,
        }
    }

    #[must_use]
    pub fn with_file(
        phase: ArchivePhase,
        current: usize,
        total: usize,
        file: impl Into<String>,
    ) -> Self {
        Self {
            phase,
            current,
            total,
            current_file: Some(file.into()),
        }
    }
}

/// Phase of an archive operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchivePhase {
    /// Computing the new layout
    Planning,
    /// Copying entry payloads
    WritingEntries,
    /// Writing the directory
    WritingDirectory,
    /// Writing extracted entries to disk
    ExtractingFiles,
    /// Operation complete
    Complete,
}

impl ArchivePhase {
    /// Get a human-readable description of this phase
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Planning => "Planning layout",
            Self::WritingEntries => "Writing entries",
            Self::WritingDirectory => "Writing directory",
            Self::ExtractingFiles => "Extracting files",
            Self::Complete => "Complete",
        }
    }
}

/// Progress callback type for archive operations
pub type ProgressCallback<'a> = &'a dyn Fn(&ArchiveProgress);
