//! CLI command for creating archives

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::{archive_kind, entry_name, save_archive};
use crate::archive::{Archive, ArchiveFormat, Gob, Lfd};
use crate::cli::progress::{print_step, DISK, LOOKING_GLASS};
use crate::dispatch::ResourceKind;

pub fn execute(destination: &Path, sources: &[PathBuf], quiet: bool) -> anyhow::Result<()> {
    match archive_kind(destination)? {
        ResourceKind::Lfd => create::<Lfd>(destination, sources, quiet),
        _ => create::<Gob>(destination, sources, quiet),
    }
}

fn create<F: ArchiveFormat>(destination: &Path, sources: &[PathBuf], quiet: bool) -> anyhow::Result<()> {
    if !quiet {
        print_step(1, 2, LOOKING_GLASS, "Collecting files...");
    }
    let files = collect_files(sources)?;

    let mut archive = Archive::<F, _>::new();
    for file in &files {
        let name = entry_name(file)?;
        if archive.contains(name) {
            tracing::warn!("{} replaces an earlier file named {}", file.display(), name);
        }
        archive.add_file(name, file)?;
    }

    if !quiet {
        print_step(
            2,
            2,
            DISK,
            &format!("Writing {} archive with {} entries...", F::NAME, archive.len()),
        );
    }
    save_archive(&mut archive, destination, quiet)
}

/// Expand directories into the files below them, sorted by name.
///
/// Archives are flat, so only the file name of each file is kept as the
/// entry name.
fn collect_files(sources: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for source in sources {
        if !source.is_dir() {
            files.push(source.clone());
            continue;
        }
        for entry in WalkDir::new(source).sort_by_file_name() {
            let entry = entry?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
    }
    Ok(files)
}
