//! # dfformats
//!
//! A pure-Rust library for the resource files of Star Wars: Dark Forces and
//! other LucasArts Landru-era games.
//!
//! ## Supported Formats
//!
//! - **GOB archives** - Dark Forces asset containers
//! - **LFD archives** - Landru resource files (`RMAP` + typed resources)
//! - **MIDI / GMD** - Standard MIDI files and the Dark Forces `MIDI` wrapper
//! - **WAV** - 44-byte-header PCM audio
//! - **VOC** - Creative Voice files (read-only, convertible to WAV)
//! - **PAL** - 256-colour VGA palettes
//!
//! ## Quick Start
//!
//! ### Working with Archives
//!
//! ```no_run
//! use dfformats::archive::GobArchive;
//!
//! let mut gob = GobArchive::open_file("SOUNDS.GOB")?;
//! println!("Found {} entries", gob.len());
//!
//! let voice = gob.extract("BOOM1.VOC")?;
//! gob.add_bytes("BOOM2.VOC", voice)?;
//! gob.save_file("SOUNDS.GOB")?;
//! # Ok::<(), dfformats::Error>(())
//! ```
//!
//! ### Loading Resources from Loose Files or Containers
//!
//! ```no_run
//! use dfformats::prelude::*;
//!
//! let voice: CreativeVoice = get_file_from_folder_or_container("DARK/SOUNDS.GOB/BOOM1.VOC")?;
//! voice.to_wave()?.save_file("boom1.wav")?;
//!
//! // Or let the file name pick the codec
//! let any = get_any_from_folder_or_container("DARK/SOUNDS.GOB/STALK-01.GMD")?;
//! println!("{}", any.kind());
//! # Ok::<(), dfformats::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` - Enables the `dfformats` command-line binary

pub mod archive;
pub mod binary;
pub mod dispatch;
pub mod error;
pub mod formats;

// Re-exports for convenience
pub use error::{Error, ErrorKind, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{Error, ErrorKind, Result};

    pub use crate::archive::{Archive, ArchiveFormat, GobArchive, LfdArchive};
    pub use crate::dispatch::{
        detect_file_type_by_name, get_any_from_folder_or_container,
        get_file_from_folder_or_container, load_any, AnyResource, LocatorOptions, ResourceKind,
        ResourceLocator,
    };
    pub use crate::formats::{
        CreativeVoice, DfGeneralMidi, DfPalette, Loadable, Midi, RawFile, Resource, Savable, Wave,
    };
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// CLI module (feature-gated)
#[cfg(feature = "cli")]
pub mod cli;
