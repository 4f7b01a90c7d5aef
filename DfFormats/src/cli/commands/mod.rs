pub mod add;
pub mod convert;
pub mod create;
pub mod extract;
pub mod info;
pub mod list;
pub mod remove;

use std::io::{Read, Seek};
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Subcommand;

use super::progress::{print_done, simple_bar, update_bar};
use crate::archive::{Archive, ArchiveFormat};
use crate::dispatch::{detect_file_type_by_name, ResourceKind};

#[derive(Subcommand)]
pub enum Commands {
    /// List archive contents
    List {
        /// GOB or LFD file
        source: PathBuf,

        /// Show offsets, sizes and resource types
        #[arg(short, long)]
        detailed: bool,

        /// Only list entries matching glob pattern (e.g., "*.VOC")
        #[arg(long)]
        filter: Option<String>,

        /// Only show count of matching entries
        #[arg(short, long)]
        count: bool,
    },

    /// Extract entries from an archive
    Extract {
        /// GOB or LFD file
        source: PathBuf,

        /// Output directory
        destination: PathBuf,

        /// Only extract entries matching glob pattern
        #[arg(long)]
        filter: Option<String>,

        /// Extract a single entry
        #[arg(short, long)]
        file: Option<String>,

        /// Suppress progress output
        #[arg(short, long)]
        quiet: bool,
    },

    /// Add files to an existing archive, replacing entries of the same name
    Add {
        /// GOB or LFD file
        archive: PathBuf,

        /// Files to add; each is stored under its file name
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Suppress progress output
        #[arg(short, long)]
        quiet: bool,
    },

    /// Remove entries from an archive
    Remove {
        /// GOB or LFD file
        archive: PathBuf,

        /// Entry names to remove
        #[arg(required = true)]
        names: Vec<String>,

        /// Suppress progress output
        #[arg(short, long)]
        quiet: bool,
    },

    /// Create an archive; the format follows the output extension
    Create {
        /// Output GOB or LFD file
        destination: PathBuf,

        /// Files or directories to pack
        #[arg(required = true)]
        sources: Vec<PathBuf>,

        /// Suppress progress output
        #[arg(short, long)]
        quiet: bool,
    },

    /// Decode a resource and print a summary
    ///
    /// The path may name an entry inside an archive, e.g. `SOUNDS.GOB/BOOM1.VOC`.
    Info {
        /// Resource file, archive, or archive entry path
        path: PathBuf,
    },

    /// Convert between resource formats
    ///
    /// Supported: VOC -> WAV, GMD -> MID, MID -> GMD, PAL -> RGB, RGB -> PAL
    Convert {
        /// Source file (may be an archive entry path)
        source: PathBuf,

        /// Destination file
        destination: PathBuf,
    },
}

impl Commands {
    /// Execute the selected command.
    ///
    /// # Errors
    /// Returns an error if the underlying command fails.
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            Commands::List {
                source,
                detailed,
                filter,
                count,
            } => list::execute(source, *detailed, filter.as_deref(), *count),
            Commands::Extract {
                source,
                destination,
                filter,
                file,
                quiet,
            } => extract::execute(
                source,
                destination,
                filter.as_deref(),
                file.as_deref(),
                *quiet,
            ),
            Commands::Add {
                archive,
                files,
                quiet,
            } => add::execute(archive, files, *quiet),
            Commands::Remove {
                archive,
                names,
                quiet,
            } => remove::execute(archive, names, *quiet),
            Commands::Create {
                destination,
                sources,
                quiet,
            } => create::execute(destination, sources, *quiet),
            Commands::Info { path } => info::execute(path),
            Commands::Convert {
                source,
                destination,
            } => convert::execute(source, destination),
        }
    }
}

/// Archive format of `path`, from its extension.
fn archive_kind(path: &Path) -> anyhow::Result<ResourceKind> {
    match detect_file_type_by_name(path) {
        Some(kind) if kind.is_container() => Ok(kind),
        _ => anyhow::bail!(
            "{} is not a GOB or LFD archive (expected a .GOB or .LFD extension)",
            path.display()
        ),
    }
}

/// Entry name for a file added from disk.
fn entry_name(path: &Path) -> anyhow::Result<&str> {
    path.file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("Cannot derive an entry name from {}", path.display()))
}

/// Save `archive` to `path`, with a progress bar unless `quiet`.
fn save_archive<F: ArchiveFormat, R: Read + Seek>(
    archive: &mut Archive<F, R>,
    path: &Path,
    quiet: bool,
) -> anyhow::Result<()> {
    if quiet {
        archive.save_file(path)?;
        return Ok(());
    }

    let start = Instant::now();
    let pb = simple_bar(archive.len() as u64, "Writing");
    archive.save_file_with_progress(path, &|progress| update_bar(&pb, progress))?;
    pb.finish_and_clear();

    println!("Wrote {} ({} entries)", path.display(), archive.len());
    print_done(start.elapsed());
    Ok(())
}

/// Simple glob pattern matching (supports * and ?), ignoring ASCII case
fn matches_glob(pattern: &str, text: &str) -> bool {
    let pattern_chars: Vec<char> = pattern.chars().collect();
    let text_chars: Vec<char> = text.chars().collect();
    matches_glob_recursive(&pattern_chars, &text_chars, 0, 0)
}

fn matches_glob_recursive(pattern: &[char], text: &[char], pi: usize, ti: usize) -> bool {
    if pi == pattern.len() {
        return ti == text.len();
    }

    match pattern[pi] {
        '*' => (ti..=text.len()).any(|i| matches_glob_recursive(pattern, text, pi + 1, i)),
        '?' => ti < text.len() && matches_glob_recursive(pattern, text, pi + 1, ti + 1),
        c => {
            ti < text.len()
                && text[ti].eq_ignore_ascii_case(&c)
                && matches_glob_recursive(pattern, text, pi + 1, ti + 1)
        }
    }
}

/// Format byte size for human-readable output
fn format_size(bytes: u64) -> String {
    if bytes >= 1_048_576 {
        format!("{:.1}M", bytes as f64 / 1_048_576.0)
    } else if bytes >= 1024 {
        format!("{:.1}K", bytes as f64 / 1024.0)
    } else {
        format!("{bytes}")
    }
}
