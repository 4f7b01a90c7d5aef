//! Resolving resources on disk and inside containers
//!
//! Two ways to find a resource:
//!
//! - A compound path such as `DARK/SOUNDS.GOB/BOOM1.VOC`, where a container
//!   file stands in for a directory ([`get_file_from_folder_or_container`]).
//! - A bare name looked up through a [`ResourceLocator`], which searches loose
//!   folders first and then containers, the way the game lets loose files
//!   override archive contents.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{detect_file_type_by_name, load_any, AnyResource, ResourceKind};
use crate::archive::{Archive, ArchiveFormat, Gob, Lfd};
use crate::error::{Error, Result};
use crate::formats::Loadable;

/// Load a `T` from a real file or from an entry inside a container.
///
/// A path naming an existing file is decoded directly. Otherwise the longest
/// leading part of the path that is an existing GOB or LFD file is opened and
/// the rest of the path is extracted from it.
///
/// # Errors
/// [`Error::FileNotFound`] if neither resolves, [`Error::EntryNotFound`] if
/// the container exists but lacks the entry.
pub fn get_file_from_folder_or_container<T: Loadable>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    if path.is_file() {
        return T::load_file(path);
    }
    let (container, kind, entry) = split_container_path(path)?;
    match kind {
        ResourceKind::Gob => extract_from::<Gob, T>(&container, &entry),
        _ => extract_from::<Lfd, T>(&container, &entry),
    }
}

/// Like [`get_file_from_folder_or_container`], choosing the codec from the
/// file or entry name.
pub fn get_any_from_folder_or_container(path: impl AsRef<Path>) -> Result<AnyResource> {
    let path = path.as_ref();
    if path.is_file() {
        let kind = detect_file_type_by_name(path).unwrap_or(ResourceKind::Raw);
        let file = File::open(path).map_err(|e| Error::from_path(e, path))?;
        let mut reader = BufReader::new(file);
        return load_any(kind, &mut reader);
    }
    let (container, kind, entry) = split_container_path(path)?;
    match kind {
        ResourceKind::Gob => Archive::<Gob, _>::open_file(&container)?.extract_any(&entry),
        _ => Archive::<Lfd, _>::open_file(&container)?.extract_any(&entry),
    }
}

fn extract_from<F: ArchiveFormat, T: Loadable>(container: &Path, entry: &str) -> Result<T> {
    Archive::<F, _>::open_file(container)?.extract_as::<T>(entry)
}

/// Split `path` at the longest existing container file.
fn split_container_path(path: &Path) -> Result<(PathBuf, ResourceKind, String)> {
    for ancestor in path.ancestors().skip(1) {
        let Some(kind) = detect_file_type_by_name(ancestor).filter(|k| k.is_container()) else {
            continue;
        };
        if !ancestor.is_file() {
            continue;
        }
        let Ok(rest) = path.strip_prefix(ancestor) else {
            continue;
        };
        let entry = rest
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        tracing::debug!("Resolved {} to {} in {}", path.display(), entry, ancestor.display());
        return Ok((ancestor.to_path_buf(), kind, entry));
    }
    Err(Error::FileNotFound(path.to_path_buf()))
}

/// Where a [`ResourceLocator`] should look.
///
/// Can be built in code or read from a TOML file:
///
/// ```toml
/// search_folders = ["mods/override", "DARK"]
/// containers = ["DARK/SOUNDS.GOB", "DARK/JEDISFX.LFD"]
/// ```
///
/// # Example
///
/// ```no_run
/// use dfformats::dispatch::{LocatorOptions, ResourceLocator};
///
/// let options = LocatorOptions::new()
///     .with_search_folder("DARK")
///     .with_container("DARK/SOUNDS.GOB");
/// let locator = ResourceLocator::new(options);
/// let boom = locator.load_any("BOOM1.VOC")?;
/// # Ok::<(), dfformats::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorOptions {
    /// Folders searched for loose files, in priority order.
    pub search_folders: Vec<PathBuf>,

    /// GOB and LFD archives searched after the folders, in priority order.
    pub containers: Vec<PathBuf>,

    /// Match loose file names regardless of case, as DOS did.
    /// Default: true
    pub case_insensitive: bool,
}

impl LocatorOptions {
    /// Create options with no search locations.
    #[must_use]
    pub fn new() -> Self {
        Self {
            search_folders: Vec::new(),
            containers: Vec::new(),
            case_insensitive: true,
        }
    }

    /// Append a loose-file folder.
    #[must_use]
    pub fn with_search_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.search_folders.push(folder.into());
        self
    }

    /// Append a container.
    #[must_use]
    pub fn with_container(mut self, container: impl Into<PathBuf>) -> Self {
        self.containers.push(container.into());
        self
    }

    /// Set whether loose file names match regardless of case.
    #[must_use]
    pub fn with_case_insensitive(mut self, enabled: bool) -> Self {
        self.case_insensitive = enabled;
        self
    }

    /// Parse options from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read options from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::from_path(e, path))?;
        Self::from_toml_str(&text)
    }
}

impl Default for LocatorOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Where a resource was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// A loose file.
    File(PathBuf),
    /// An entry of a container.
    Entry {
        container: PathBuf,
        kind: ResourceKind,
        name: String,
    },
}

/// Looks up bare resource names across folders and containers.
#[derive(Debug, Clone, Default)]
pub struct ResourceLocator {
    options: LocatorOptions,
}

impl ResourceLocator {
    #[must_use]
    pub fn new(options: LocatorOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub fn options(&self) -> &LocatorOptions {
        &self.options
    }

    /// Find `name`, checking every folder before any container.
    ///
    /// # Errors
    /// [`Error::FileNotFound`] if no location has it.
    pub fn find(&self, name: &str) -> Result<Location> {
        for folder in &self.options.search_folders {
            if let Some(path) = self.find_in_folder(folder, name)? {
                return Ok(Location::File(path));
            }
        }

        for container in &self.options.containers {
            let kind = detect_file_type_by_name(container)
                .filter(|k| k.is_container())
                .ok_or_else(|| Error::UnsupportedFormat {
                    format: "container",
                    message: format!("{} is not a GOB or LFD file", container.display()),
                })?;
            let found = match kind {
                ResourceKind::Gob => Archive::<Gob, _>::open_file(container)?.entry(name),
                _ => Archive::<Lfd, _>::open_file(container)?.entry(name),
            };
            if let Some(entry) = found {
                return Ok(Location::Entry {
                    container: container.clone(),
                    kind,
                    name: entry.name,
                });
            }
        }

        Err(Error::FileNotFound(PathBuf::from(name)))
    }

    fn find_in_folder(&self, folder: &Path, name: &str) -> Result<Option<PathBuf>> {
        let direct = folder.join(name);
        if direct.is_file() {
            return Ok(Some(direct));
        }
        if !self.options.case_insensitive || !folder.is_dir() {
            return Ok(None);
        }
        for entry in std::fs::read_dir(folder)? {
            let entry = entry?;
            if entry.file_name().to_string_lossy().eq_ignore_ascii_case(name)
                && entry.file_type()?.is_file()
            {
                return Ok(Some(entry.path()));
            }
        }
        Ok(None)
    }

    /// Raw bytes of `name`.
    pub fn read_bytes(&self, name: &str) -> Result<Vec<u8>> {
        match self.find(name)? {
            Location::File(path) => Ok(std::fs::read(path)?),
            Location::Entry {
                container,
                kind: ResourceKind::Gob,
                name,
            } => Archive::<Gob, _>::open_file(container)?.extract(&name),
            Location::Entry { container, name, .. } => {
                Archive::<Lfd, _>::open_file(container)?.extract(&name)
            }
        }
    }

    /// Decode `name` as `T`.
    pub fn load<T: Loadable>(&self, name: &str) -> Result<T> {
        T::load_bytes(&self.read_bytes(name)?)
    }

    /// Decode `name` with the codec its name selects.
    pub fn load_any(&self, name: &str) -> Result<AnyResource> {
        match self.find(name)? {
            Location::File(path) => {
                let kind = detect_file_type_by_name(&path).unwrap_or(ResourceKind::Raw);
                let file = File::open(&path).map_err(|e| Error::from_path(e, &path))?;
                load_any(kind, &mut BufReader::new(file))
            }
            Location::Entry {
                container,
                kind: ResourceKind::Gob,
                name,
            } => Archive::<Gob, _>::open_file(container)?.extract_any(&name),
            Location::Entry { container, name, .. } => {
                Archive::<Lfd, _>::open_file(container)?.extract_any(&name)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::GobArchive;
    use crate::formats::{RawFile, Savable, Wave};
    use pretty_assertions::assert_eq;

    fn write_gob(path: &Path, entries: &[(&str, Vec<u8>)]) {
        let mut gob = GobArchive::new();
        for (name, data) in entries {
            gob.add_bytes(name, data.clone()).unwrap();
        }
        gob.save_file(path).unwrap();
    }

    #[test]
    fn test_compound_path_reads_from_container() {
        let dir = tempfile::tempdir().unwrap();
        let wave = Wave::new(1, 11025, 8, vec![0x80; 32]);
        let gob = dir.path().join("SOUNDS.GOB");
        write_gob(&gob, &[("BEEP.WAV", wave.to_bytes().unwrap())]);

        let loaded: Wave = get_file_from_folder_or_container(gob.join("beep.wav")).unwrap();
        assert_eq!(loaded, wave);

        let any = get_any_from_folder_or_container(gob.join("BEEP.WAV")).unwrap();
        assert_eq!(any.kind(), ResourceKind::Wave);
    }

    #[test]
    fn test_real_file_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("NOTES.TXT");
        std::fs::write(&path, b"loose").unwrap();

        let raw: RawFile = get_file_from_folder_or_container(&path).unwrap();
        assert_eq!(raw.data, b"loose");
        assert_eq!(
            get_any_from_folder_or_container(&path).unwrap(),
            AnyResource::Raw(RawFile::new(b"loose".to_vec()))
        );
    }

    #[test]
    fn test_nothing_resolves() {
        let dir = tempfile::tempdir().unwrap();
        let err = get_any_from_folder_or_container(dir.path().join("NOPE.GOB/X.WAV")).unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)));
    }

    #[test]
    fn test_missing_entry_in_existing_container() {
        let dir = tempfile::tempdir().unwrap();
        let gob = dir.path().join("EMPTY.GOB");
        write_gob(&gob, &[]);
        let err = get_any_from_folder_or_container(gob.join("X.WAV")).unwrap_err();
        assert!(matches!(err, Error::EntryNotFound(_)));
    }

    #[test]
    fn test_locator_prefers_loose_files() {
        let dir = tempfile::tempdir().unwrap();
        let loose = dir.path().join("override");
        std::fs::create_dir(&loose).unwrap();
        std::fs::write(loose.join("shared.raw"), b"loose").unwrap();

        let gob = dir.path().join("DATA.GOB");
        write_gob(
            &gob,
            &[("SHARED.RAW", b"packed".to_vec()), ("ONLY.RAW", b"only".to_vec())],
        );

        let locator = ResourceLocator::new(
            LocatorOptions::new()
                .with_search_folder(&loose)
                .with_container(&gob),
        );

        assert_eq!(locator.read_bytes("SHARED.RAW").unwrap(), b"loose");
        assert_eq!(locator.read_bytes("only.raw").unwrap(), b"only");
        assert!(matches!(
            locator.find("ONLY.RAW").unwrap(),
            Location::Entry { kind: ResourceKind::Gob, .. }
        ));
        assert!(locator.find("MISSING.RAW").unwrap_err().is_not_found());
    }

    #[test]
    fn test_case_sensitive_locator() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("lower.raw"), b"x").unwrap();
        let locator = ResourceLocator::new(
            LocatorOptions::new()
                .with_search_folder(dir.path())
                .with_case_insensitive(false),
        );
        assert!(locator.find("lower.raw").is_ok());
        assert!(locator.find("LOWER.RAW").is_err());
    }

    #[test]
    fn test_options_from_toml() {
        let options = LocatorOptions::from_toml_str(
            r#"
            search_folders = ["override"]
            containers = ["DARK/SOUNDS.GOB", "DARK/JEDISFX.LFD"]
            "#,
        )
        .unwrap();
        assert_eq!(options.search_folders, vec![PathBuf::from("override")]);
        assert_eq!(options.containers.len(), 2);
        assert!(options.case_insensitive);
    }

    #[test]
    fn test_bad_toml() {
        let err = LocatorOptions::from_toml_str("containers = 5").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
