//! CLI command for listing archive contents

use std::path::Path;

use super::{archive_kind, format_size, matches_glob};
use crate::archive::{Archive, ArchiveFormat, EntryInfo, Gob, Lfd};
use crate::dispatch::ResourceKind;

pub fn execute(
    source: &Path,
    detailed: bool,
    filter: Option<&str>,
    count: bool,
) -> anyhow::Result<()> {
    match archive_kind(source)? {
        ResourceKind::Lfd => list::<Lfd>(source, detailed, filter, count),
        _ => list::<Gob>(source, detailed, filter, count),
    }
}

fn list<F: ArchiveFormat>(
    source: &Path,
    detailed: bool,
    filter: Option<&str>,
    count: bool,
) -> anyhow::Result<()> {
    let archive = Archive::<F, _>::open_file(source)?;

    let entries: Vec<EntryInfo> = archive
        .entries()
        .into_iter()
        .filter(|e| filter.is_none_or(|pattern| matches_glob(pattern, &e.name)))
        .collect();

    if count {
        println!("{}", entries.len());
        return Ok(());
    }

    if !detailed {
        for entry in &entries {
            println!("{}", entry.name);
        }
        return Ok(());
    }

    println!("{:>10}  {:>10}  {:<14}  NAME", "OFFSET", "SIZE", "TYPE");
    for entry in &entries {
        let kind = F::entry_kind(&entry.name).unwrap_or(ResourceKind::Raw);
        let offset = entry
            .offset
            .map_or_else(|| "-".to_string(), |o| format!("{o:#x}"));
        println!(
            "{:>10}  {:>10}  {:<14}  {}",
            offset,
            format_size(entry.size),
            kind.display_name(),
            entry.name
        );
    }

    let total: u64 = entries.iter().map(|e| e.size).sum();
    println!();
    println!(
        "{} entries, {} total ({} archive)",
        entries.len(),
        format_size(total),
        F::NAME
    );
    Ok(())
}
