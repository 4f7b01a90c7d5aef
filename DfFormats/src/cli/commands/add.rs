//! CLI command for adding files to an archive

use std::path::{Path, PathBuf};

use super::{archive_kind, entry_name, save_archive};
use crate::archive::{Archive, ArchiveFormat, Gob, Lfd};
use crate::dispatch::ResourceKind;

pub fn execute(archive: &Path, files: &[PathBuf], quiet: bool) -> anyhow::Result<()> {
    match archive_kind(archive)? {
        ResourceKind::Lfd => add::<Lfd>(archive, files, quiet),
        _ => add::<Gob>(archive, files, quiet),
    }
}

fn add<F: ArchiveFormat>(path: &Path, files: &[PathBuf], quiet: bool) -> anyhow::Result<()> {
    let mut archive = Archive::<F, _>::open_file(path)?;

    for file in files {
        let name = entry_name(file)?;
        let replacing = archive.contains(name);
        archive.add_file(name, file)?;
        if !quiet {
            println!("{} {name}", if replacing { "~" } else { "+" });
        }
    }

    save_archive(&mut archive, path, quiet)
}
