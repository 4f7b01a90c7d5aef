//! CLI command for extracting archive entries

use std::path::{Path, PathBuf};
use std::time::Instant;

use super::{archive_kind, matches_glob};
use crate::archive::{Archive, ArchiveFormat, Gob, Lfd};
use crate::cli::progress::{print_done, print_step, simple_bar, update_bar, LOOKING_GLASS, PACKAGE};
use crate::dispatch::ResourceKind;

pub fn execute(
    source: &Path,
    destination: &Path,
    filter: Option<&str>,
    file: Option<&str>,
    quiet: bool,
) -> anyhow::Result<()> {
    match archive_kind(source)? {
        ResourceKind::Lfd => extract::<Lfd>(source, destination, filter, file, quiet),
        _ => extract::<Gob>(source, destination, filter, file, quiet),
    }
}

fn extract<F: ArchiveFormat>(
    source: &Path,
    destination: &Path,
    filter: Option<&str>,
    file: Option<&str>,
    quiet: bool,
) -> anyhow::Result<()> {
    let start = Instant::now();
    if !quiet {
        print_step(1, 2, LOOKING_GLASS, &format!("Reading {}...", source.display()));
    }
    let mut archive = Archive::<F, _>::open_file(source)?;

    // Single entry extraction
    if let Some(name) = file {
        let data = archive.extract(name)?;
        std::fs::create_dir_all(destination)?;
        let path = output_path(destination, name)?;
        std::fs::write(&path, data)?;
        if !quiet {
            println!("Extracted {}", path.display());
        }
        return Ok(());
    }

    // Filtered extraction
    if let Some(pattern) = filter {
        let matching: Vec<String> = archive
            .entries()
            .into_iter()
            .map(|e| e.name)
            .filter(|name| matches_glob(pattern, name))
            .collect();

        if matching.is_empty() {
            println!("No entries match pattern: {pattern}");
            return Ok(());
        }

        std::fs::create_dir_all(destination)?;
        let pb = (!quiet).then(|| {
            print_step(2, 2, PACKAGE, &format!("Extracting {} entries...", matching.len()));
            simple_bar(matching.len() as u64, "Extracting")
        });
        for name in &matching {
            let data = archive.extract(name)?;
            std::fs::write(output_path(destination, name)?, data)?;
            if let Some(pb) = &pb {
                pb.set_message(name.clone());
                pb.inc(1);
            }
        }
        if let Some(pb) = pb {
            pb.finish_and_clear();
            print_done(start.elapsed());
        }
        return Ok(());
    }

    // Full extraction
    if quiet {
        archive.extract_all(destination, &|_| {})?;
        return Ok(());
    }

    print_step(2, 2, PACKAGE, &format!("Extracting {} entries...", archive.len()));
    let pb = simple_bar(archive.len() as u64, "Extracting");
    let written = archive.extract_all(destination, &|progress| update_bar(&pb, progress))?;
    pb.finish_and_clear();

    println!("Extracted {written} entries to {}", destination.display());
    print_done(start.elapsed());
    Ok(())
}

/// Path inside `destination` for entry `name`, refusing names that would
/// leave it.
fn output_path(destination: &Path, name: &str) -> anyhow::Result<PathBuf> {
    let file_name = Path::new(name);
    if file_name.file_name() != Some(file_name.as_os_str()) {
        anyhow::bail!("Refusing to extract entry with unsafe name: {name}");
    }
    Ok(destination.join(file_name))
}
