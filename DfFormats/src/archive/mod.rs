//! Flat named-entry archives (GOB, LFD)
//!
//! Both formats are a directory of `(name, offset, size)` records plus the
//! entry payloads. [`Archive`] holds the directory and the stream it was read
//! from; the format itself is a type parameter implementing
//! [`ArchiveFormat`].
//!
//! Edits (`add_*`, `remove`, `move_entry`) only change the in-memory entry
//! list. Nothing is written until [`Archive::save_to`] or
//! [`Archive::save_file`], which lay out every entry contiguously in list
//! order and rewrite the directory to match.
//!
//! ```no_run
//! use dfformats::archive::GobArchive;
//!
//! let mut gob = GobArchive::open_file("SOUNDS.GOB")?;
//! for entry in gob.entries() {
//!     println!("{} ({} bytes)", entry.name, entry.size);
//! }
//! let bytes = gob.extract("BOOM1.VOC")?;
//! gob.add_bytes("COPY.VOC", bytes)?;
//! gob.save_file("SOUNDS.GOB")?;
//! # Ok::<(), dfformats::Error>(())
//! ```

mod gob;
mod lfd;
mod types;

pub use gob::Gob;
pub use lfd::{split_lfd_name, Lfd};
pub use types::{
    ArchiveEntry, ArchivePhase, ArchiveProgress, DirectoryEntry, EntryInfo, EntrySource,
    PlannedEntry, ProgressCallback,
};

use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Read, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::binary::read_payload;
use crate::dispatch::{detect_file_type_by_name, load_any, AnyResource, ResourceKind};
use crate::error::{Error, Result};
use crate::formats::Loadable;

/// A GOB archive.
pub type GobArchive<R = BufReader<File>> = Archive<Gob, R>;

/// An LFD archive.
pub type LfdArchive<R = BufReader<File>> = Archive<Lfd, R>;

/// Largest value a 32-bit size or offset field can hold.
pub const MAX_FIELD_VALUE: u64 = 0xFFFF_FFFF;

/// Printable ASCII or a high-bit byte of the DOS code page.
pub(crate) fn is_name_char(c: char) -> bool {
    c.is_ascii_graphic() || ('\u{80}'..='\u{FF}').contains(&c)
}

/// On-disk layout of one flat archive format.
///
/// Saving happens in four steps, all driven by [`Archive`]: offsets are
/// planned from [`header_size`](Self::header_size) and
/// [`ENTRY_HEADER_SIZE`](Self::ENTRY_HEADER_SIZE), then the header, each
/// entry (per-entry header + payload) and finally the trailing directory are
/// written.
pub trait ArchiveFormat {
    /// Short display name of the format.
    const NAME: &'static str;

    /// Dispatch kind of archives in this format.
    const KIND: ResourceKind;

    /// Largest number of entries the directory can record.
    const MAX_ENTRIES: usize;

    /// Largest entry payload the directory can record.
    const MAX_ENTRY_SIZE: u64 = MAX_FIELD_VALUE;

    /// Bytes written in front of every payload.
    const ENTRY_HEADER_SIZE: u64 = 0;

    /// Check that `name` can be stored in the directory.
    fn validate_name(name: &str) -> Result<()>;

    /// Parse the directory without reading any payload.
    fn read_directory<R: Read + Seek>(reader: &mut R) -> Result<Vec<DirectoryEntry>>;

    /// Bytes before the first entry of an archive with `count` entries.
    fn header_size(count: usize) -> u64;

    /// Write the archive header. `payload_end` is the offset just past the
    /// last payload.
    fn write_header<W: Write + ?Sized>(
        writer: &mut W,
        entries: &[PlannedEntry],
        payload_end: u32,
    ) -> Result<()>;

    /// Write the per-entry header preceding a payload.
    fn write_entry_header<W: Write + ?Sized>(_writer: &mut W, _entry: &PlannedEntry) -> Result<()> {
        Ok(())
    }

    /// Write the directory that follows the payloads.
    fn write_directory<W: Write + ?Sized>(_writer: &mut W, _entries: &[PlannedEntry]) -> Result<()> {
        Ok(())
    }

    /// Resource kind of an entry, from its name.
    fn entry_kind(name: &str) -> Option<ResourceKind> {
        detect_file_type_by_name(name)
    }
}

/// An open flat archive.
///
/// `R` is the stream the directory was read from; entries that came from it
/// are read back lazily on [`extract`](Self::extract) and during saves.
#[derive(Debug)]
pub struct Archive<F: ArchiveFormat, R> {
    reader: R,
    entries: Vec<ArchiveEntry>,
    _format: PhantomData<F>,
}

impl<F: ArchiveFormat> Archive<F, Cursor<Vec<u8>>> {
    /// An empty archive with no backing stream.
    #[must_use]
    pub fn new() -> Self {
        Self {
            reader: Cursor::new(Vec::new()),
            entries: Vec::new(),
            _format: PhantomData,
        }
    }

    /// Open an archive held in memory.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::open(Cursor::new(data))
    }
}

impl<F: ArchiveFormat> Default for Archive<F, Cursor<Vec<u8>>> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: ArchiveFormat> Archive<F, BufReader<File>> {
    /// Open an archive file.
    pub fn open_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::from_path(e, path))?;
        tracing::debug!("Opening {} archive {}", F::NAME, path.display());
        Self::open(BufReader::new(file))
    }
}

impl<F: ArchiveFormat, R: Read + Seek> Archive<F, R> {
    /// Parse the directory of an archive stream.
    ///
    /// Payloads are not read, but every entry must lie inside the stream.
    pub fn open(mut reader: R) -> Result<Self> {
        let directory = F::read_directory(&mut reader)?;
        let stream_len = reader.seek(SeekFrom::End(0))?;

        let mut entries = Vec::with_capacity(directory.len());
        for record in directory {
            let end = record.offset.checked_add(record.size);
            if end.is_none_or(|end| end > stream_len) {
                return Err(Error::InvalidEntry {
                    name: record.name,
                    message: format!(
                        "range {}+{} lies outside the {stream_len}-byte archive",
                        record.offset, record.size
                    ),
                });
            }
            entries.push(ArchiveEntry {
                name: record.name,
                source: EntrySource::Archive {
                    offset: record.offset,
                    size: record.size,
                },
            });
        }

        tracing::debug!("Read {} directory: {} entries", F::NAME, entries.len());
        Ok(Self {
            reader,
            entries,
            _format: PhantomData,
        })
    }

    /// List every entry without reading payloads.
    #[must_use]
    pub fn entries(&self) -> Vec<EntryInfo> {
        self.entries.iter().map(EntryInfo::from).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the entry called `name`, compared case-insensitively.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.name.eq_ignore_ascii_case(name))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Directory record of the entry called `name`.
    #[must_use]
    pub fn entry(&self, name: &str) -> Option<EntryInfo> {
        self.position(name).map(|i| EntryInfo::from(&self.entries[i]))
    }

    /// Read the bytes of an entry.
    ///
    /// # Errors
    /// [`Error::EntryNotFound`] if no entry has that name.
    pub fn extract(&mut self, name: &str) -> Result<Vec<u8>> {
        let index = self
            .position(name)
            .ok_or_else(|| Error::EntryNotFound(name.to_string()))?;
        let mut data = Vec::new();
        read_source(&mut self.reader, &self.entries[index].source, &mut data)?;
        Ok(data)
    }

    /// Read an entry and decode it as `T`.
    pub fn extract_as<T: Loadable>(&mut self, name: &str) -> Result<T> {
        let data = self.extract(name)?;
        T::load_bytes(&data)
    }

    /// Read an entry and decode it with the codec its name selects.
    ///
    /// Entries of unknown type, and nested archives, come back as
    /// [`AnyResource::Raw`]; open a nested archive with [`Archive::from_bytes`].
    pub fn extract_any(&mut self, name: &str) -> Result<AnyResource> {
        let data = self.extract(name)?;
        let kind = F::entry_kind(name)
            .filter(|kind| kind.can_load())
            .unwrap_or(ResourceKind::Raw);
        load_any(kind, &mut data.as_slice())
    }

    /// Write every entry to `dest`, one file per entry.
    ///
    /// Returns the number of files written.
    pub fn extract_all(&mut self, dest: impl AsRef<Path>, progress: ProgressCallback) -> Result<usize> {
        let dest = dest.as_ref();
        std::fs::create_dir_all(dest)?;

        let total = self.entries.len();
        let mut buf = Vec::new();
        for (i, entry) in self.entries.iter().enumerate() {
            // Names come from foreign directories; never let one escape `dest`
            let file_name = Path::new(&entry.name);
            if file_name.file_name() != Some(file_name.as_os_str()) {
                return Err(Error::InvalidEntryName(entry.name.clone()));
            }
            progress(&ArchiveProgress::with_file(
                ArchivePhase::ExtractingFiles,
                i + 1,
                total,
                &entry.name,
            ));

            buf.clear();
            read_source(&mut self.reader, &entry.source, &mut buf)?;
            std::fs::write(dest.join(file_name), &buf)?;
        }

        progress(&ArchiveProgress::new(ArchivePhase::Complete, total, total));
        tracing::info!("Extracted {} entries to {}", total, dest.display());
        Ok(total)
    }

    /// Add (or replace) an entry backed by a file on disk.
    ///
    /// The file is not read until the archive is saved; its length is
    /// recorded now and checked against the format's limits.
    pub fn add_file(&mut self, name: &str, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path).map_err(|e| Error::from_path(e, path))?;
        self.insert(ArchiveEntry {
            name: name.to_string(),
            source: EntrySource::File {
                path: path.to_path_buf(),
                size: metadata.len(),
            },
        })
    }

    /// Add (or replace) an entry backed by an in-memory buffer.
    pub fn add_bytes(&mut self, name: &str, data: Vec<u8>) -> Result<()> {
        self.insert(ArchiveEntry {
            name: name.to_string(),
            source: EntrySource::Bytes(data),
        })
    }

    /// Validate then append `entry`; an entry with the same name is replaced
    /// in place. On error the entry list is unchanged.
    fn insert(&mut self, entry: ArchiveEntry) -> Result<()> {
        F::validate_name(&entry.name)?;

        let size = entry.source.size();
        if size > F::MAX_ENTRY_SIZE {
            return Err(Error::EntryTooLarge {
                name: entry.name,
                size,
                max: F::MAX_ENTRY_SIZE,
            });
        }

        if let Some(index) = self.position(&entry.name) {
            tracing::debug!("Replacing {} entry {}", F::NAME, entry.name);
            self.entries[index] = entry;
            return Ok(());
        }

        if self.entries.len() >= F::MAX_ENTRIES {
            return Err(Error::TooManyEntries {
                count: self.entries.len() + 1,
            });
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Remove an entry from the list.
    ///
    /// # Errors
    /// [`Error::EntryNotFound`] if no entry has that name.
    pub fn remove(&mut self, name: &str) -> Result<ArchiveEntry> {
        let index = self
            .position(name)
            .ok_or_else(|| Error::EntryNotFound(name.to_string()))?;
        Ok(self.entries.remove(index))
    }

    /// Move the entry at `from` so it ends up at `to`.
    ///
    /// Returns false if either index is out of range.
    pub fn move_entry(&mut self, from: usize, to: usize) -> bool {
        if from >= self.entries.len() || to >= self.entries.len() {
            return false;
        }
        let entry = self.entries.remove(from);
        self.entries.insert(to, entry);
        true
    }

    /// Compute every payload offset of the archive about to be written.
    fn plan(&self) -> Result<(Vec<PlannedEntry>, u32)> {
        if self.entries.len() > F::MAX_ENTRIES {
            return Err(Error::TooManyEntries {
                count: self.entries.len(),
            });
        }
        let too_large = |size: u64| Error::DataTooLarge { what: F::NAME, size };

        let mut position = F::header_size(self.entries.len());
        let mut planned = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let size = entry.source.size();
            position += F::ENTRY_HEADER_SIZE;
            planned.push(PlannedEntry {
                name: entry.name.clone(),
                offset: u32::try_from(position).map_err(|_| too_large(position))?,
                size: u32::try_from(size).map_err(|_| Error::EntryTooLarge {
                    name: entry.name.clone(),
                    size,
                    max: F::MAX_ENTRY_SIZE,
                })?,
            });
            position += size;
        }
        let payload_end = u32::try_from(position).map_err(|_| too_large(position))?;
        Ok((planned, payload_end))
    }

    /// Write the whole archive to `writer`.
    pub fn save_to<W: Write + ?Sized>(&mut self, writer: &mut W) -> Result<()> {
        self.save_to_with_progress(writer, &|_| {})
    }

    /// Write the whole archive to `writer`, reporting each entry.
    ///
    /// Entries are written contiguously in list order. Each payload is read
    /// in full into one scratch buffer, sized to the largest entry, before it
    /// is written.
    pub fn save_to_with_progress<W: Write + ?Sized>(
        &mut self,
        writer: &mut W,
        progress: ProgressCallback,
    ) -> Result<()> {
        let total = self.entries.len();
        progress(&ArchiveProgress::new(ArchivePhase::Planning, 0, total));
        let (planned, payload_end) = self.plan()?;

        F::write_header(writer, &planned, payload_end)?;

        let largest = planned.iter().map(|p| p.size).max().unwrap_or(0);
        let mut scratch = Vec::with_capacity(largest as usize);
        for (i, (entry, plan)) in self.entries.iter().zip(&planned).enumerate() {
            progress(&ArchiveProgress::with_file(
                ArchivePhase::WritingEntries,
                i + 1,
                total,
                &entry.name,
            ));
            scratch.clear();
            read_source(&mut self.reader, &entry.source, &mut scratch)?;

            F::write_entry_header(writer, plan)?;
            writer.write_all(&scratch)?;
        }

        progress(&ArchiveProgress::new(ArchivePhase::WritingDirectory, total, total));
        F::write_directory(writer, &planned)?;

        progress(&ArchiveProgress::new(ArchivePhase::Complete, total, total));
        Ok(())
    }

    /// Encode the whole archive into a new buffer.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        self.save_to(&mut data)?;
        Ok(data)
    }

    /// Save the archive to `path` and open the result.
    ///
    /// The archive is written to a temporary file next to `path` and only
    /// moved over the destination once complete, so `path` may be the file
    /// this archive was opened from.
    pub fn save_file(&mut self, path: impl AsRef<Path>) -> Result<Archive<F, BufReader<File>>> {
        self.save_file_with_progress(path, &|_| {})
    }

    /// [`save_file`](Self::save_file) with a progress callback.
    pub fn save_file_with_progress(
        &mut self,
        path: impl AsRef<Path>,
        progress: ProgressCallback,
    ) -> Result<Archive<F, BufReader<File>>> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(temp.as_file_mut());
            self.save_to_with_progress(&mut writer, progress)?;
            writer.flush()?;
        }
        temp.persist(path).map_err(|e| Error::from(e.error))?;

        tracing::info!("Saved {} archive {} ({} entries)", F::NAME, path.display(), self.len());
        Archive::open_file(path)
    }
}

/// Append the full bytes of `source` to `buf`.
fn read_source<R: Read + Seek>(reader: &mut R, source: &EntrySource, buf: &mut Vec<u8>) -> Result<()> {
    match source {
        EntrySource::Archive { offset, size } => {
            reader.seek(SeekFrom::Start(*offset))?;
            buf.extend_from_slice(&read_payload(reader, *size)?);
        }
        EntrySource::File { path, size } => {
            let mut file = File::open(path).map_err(|e| Error::from_path(e, path))?;
            buf.extend_from_slice(&read_payload(&mut file, *size)?);
        }
        EntrySource::Bytes(data) => buf.extend_from_slice(data),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::RawFile;
    use pretty_assertions::assert_eq;

    fn gob_with(names: &[(&str, &[u8])]) -> GobArchive<Cursor<Vec<u8>>> {
        let mut archive = GobArchive::new();
        for (name, data) in names {
            archive.add_bytes(name, data.to_vec()).unwrap();
        }
        let bytes = archive.to_bytes().unwrap();
        GobArchive::from_bytes(bytes).unwrap()
    }

    #[test]
    fn test_add_remove_save_cycle() {
        let mut archive = GobArchive::new();
        let sources: Vec<(String, Vec<u8>)> = (0..6u8)
            .map(|i| (format!("ENTRY{i}.RAW"), vec![i; usize::from(i) * 7 + 1]))
            .collect();
        for (name, data) in &sources {
            archive.add_bytes(name, data.clone()).unwrap();
        }
        archive.remove("ENTRY1.RAW").unwrap();
        archive.remove("entry4.raw").unwrap();

        let mut reopened = GobArchive::from_bytes(archive.to_bytes().unwrap()).unwrap();
        let names: Vec<String> = reopened.entries().into_iter().map(|e| e.name).collect();
        assert_eq!(names, ["ENTRY0.RAW", "ENTRY2.RAW", "ENTRY3.RAW", "ENTRY5.RAW"]);

        for (name, data) in sources.iter().filter(|(n, _)| names.contains(n)) {
            assert_eq!(&reopened.extract(name).unwrap(), data);
        }
    }

    #[test]
    fn test_entries_are_contiguous_after_save() {
        let mut archive = gob_with(&[("A.RAW", b"aaa"), ("B.RAW", b"bb"), ("C.RAW", b"c")]);
        archive.move_entry(2, 0);
        let reopened = GobArchive::from_bytes(archive.to_bytes().unwrap()).unwrap();
        let entries = reopened.entries();
        assert_eq!(entries[0].name, "C.RAW");
        for pair in entries.windows(2) {
            assert_eq!(pair[0].offset.unwrap() + pair[0].size, pair[1].offset.unwrap());
        }
    }

    #[test]
    fn test_duplicate_name_replaces_in_place() {
        let mut archive = gob_with(&[("A.RAW", b"old"), ("B.RAW", b"b")]);
        archive.add_bytes("a.raw", b"new!".to_vec()).unwrap();
        assert_eq!(archive.len(), 2);
        assert_eq!(archive.entries()[0].name, "a.raw");
        assert_eq!(archive.entries()[0].offset, None);
        assert_eq!(archive.extract("A.RAW").unwrap(), b"new!");
    }

    #[test]
    fn test_nested_archive_extracts_as_raw() {
        let inner = gob_with(&[("A.RAW", b"a")]).to_bytes().unwrap();
        let mut archive = gob_with(&[("INNER.GOB", inner.as_slice())]);

        let any = archive.extract_any("INNER.GOB").unwrap();
        assert_eq!(any, AnyResource::Raw(RawFile::new(inner.clone())));

        let mut nested = GobArchive::from_bytes(inner).unwrap();
        assert_eq!(nested.extract("A.RAW").unwrap(), b"a");
    }

    #[test]
    fn test_missing_entry() {
        let mut archive = gob_with(&[("A.RAW", b"a")]);
        let err = archive.extract("NOPE.RAW").unwrap_err();
        assert!(err.is_not_found());
        assert!(archive.remove("NOPE.RAW").unwrap_err().is_not_found());
    }

    #[test]
    fn test_invalid_name_leaves_archive_unchanged() {
        let mut archive = gob_with(&[("A.RAW", b"a")]);
        let err = archive
            .add_bytes("MUCH_TOO_LONG.RAW", vec![1])
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Capacity);
        assert_eq!(archive.len(), 1);
    }

    #[test]
    fn test_add_file_is_read_at_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("boom.raw");
        std::fs::write(&path, b"payload").unwrap();

        let mut archive = GobArchive::new();
        archive.add_file("BOOM.RAW", &path).unwrap();
        assert_eq!(archive.entry("boom.raw").unwrap().size, 7);

        let gob_path = dir.path().join("TEST.GOB");
        let mut saved = archive.save_file(&gob_path).unwrap();
        assert_eq!(saved.extract("BOOM.RAW").unwrap(), b"payload");
    }

    #[test]
    fn test_add_missing_file() {
        let mut archive = GobArchive::new();
        let err = archive
            .add_file("X.RAW", "/definitely/not/here.raw")
            .unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)));
        assert!(archive.is_empty());
    }

    #[test]
    fn test_save_over_source_file() {
        let dir = tempfile::tempdir().unwrap();
        let gob_path = dir.path().join("SELF.GOB");
        gob_with(&[("A.RAW", b"first"), ("B.RAW", b"second")])
            .save_file(&gob_path)
            .unwrap();

        let mut archive = GobArchive::open_file(&gob_path).unwrap();
        archive.remove("A.RAW").unwrap();
        archive.add_bytes("C.RAW", b"third".to_vec()).unwrap();
        let mut saved = archive.save_file(&gob_path).unwrap();

        assert_eq!(saved.len(), 2);
        assert_eq!(saved.extract("B.RAW").unwrap(), b"second");
        assert_eq!(saved.extract("C.RAW").unwrap(), b"third");
    }

    #[test]
    fn test_progress_reports_each_entry() {
        use std::cell::RefCell;

        let mut archive = gob_with(&[("A.RAW", b"a"), ("B.RAW", b"b")]);
        let seen = RefCell::new(Vec::new());
        archive
            .save_to_with_progress(&mut Vec::new(), &|p| {
                seen.borrow_mut().push((p.phase, p.current_file.clone()));
            })
            .unwrap();

        let seen = seen.into_inner();
        assert_eq!(seen.first().unwrap().0, ArchivePhase::Planning);
        assert_eq!(seen[1], (ArchivePhase::WritingEntries, Some("A.RAW".to_string())));
        assert_eq!(seen.last().unwrap().0, ArchivePhase::Complete);
    }

    #[test]
    fn test_extract_all_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut archive = gob_with(&[("A.RAW", b"a"), ("B.RAW", b"bb")]);
        let written = archive.extract_all(dir.path().join("out"), &|_| {}).unwrap();
        assert_eq!(written, 2);
        assert_eq!(std::fs::read(dir.path().join("out/B.RAW")).unwrap(), b"bb");
    }
}
