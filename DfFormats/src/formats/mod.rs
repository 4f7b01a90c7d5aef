//! Codecs for the resources stored in Dark Forces archives
//!
//! Every codec implements [`Loadable`] and, unless the format is read-only,
//! [`Savable`].

pub mod chunk;
pub mod gmd;
pub mod midi;
pub mod palette;
pub mod raw;
pub mod resource;
pub mod voc;
pub mod wave;

pub use chunk::{Chunk, ChunkHeader};
pub use gmd::DfGeneralMidi;
pub use midi::{Division, Midi, MidiFormat};
pub use palette::{DfPalette, VgaColor};
pub use raw::RawFile;
pub use resource::{Loadable, Resource, Savable};
pub use voc::{CreativeVoice, VocBlock, VocCodec};
pub use wave::Wave;
