//! CLI command for removing archive entries

use std::path::Path;

use super::{archive_kind, save_archive};
use crate::archive::{Archive, ArchiveFormat, Gob, Lfd};
use crate::dispatch::ResourceKind;

pub fn execute(archive: &Path, names: &[String], quiet: bool) -> anyhow::Result<()> {
    match archive_kind(archive)? {
        ResourceKind::Lfd => remove::<Lfd>(archive, names, quiet),
        _ => remove::<Gob>(archive, names, quiet),
    }
}

fn remove<F: ArchiveFormat>(path: &Path, names: &[String], quiet: bool) -> anyhow::Result<()> {
    let mut archive = Archive::<F, _>::open_file(path)?;

    // Every name must exist before anything is written
    for name in names {
        let removed = archive.remove(name)?;
        if !quiet {
            println!("- {}", removed.name);
        }
    }

    save_archive(&mut archive, path, quiet)
}
