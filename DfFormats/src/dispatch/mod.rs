//! Resource type dispatch
//!
//! Maps file names and Landru resource types to codecs through one static
//! [`REGISTRY`], and decodes entries whose type is only known at run time
//! into an [`AnyResource`].

mod locator;

pub use locator::{
    get_any_from_folder_or_container, get_file_from_folder_or_container, Location, LocatorOptions,
    ResourceLocator,
};

use std::fmt;
use std::io::{Read, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::formats::{
    CreativeVoice, DfGeneralMidi, DfPalette, Loadable, Midi, RawFile, Savable, Wave,
};

/// Every resource type this crate knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Midi,
    GeneralMidi,
    Wave,
    CreativeVoice,
    DfPalette,
    /// Bytes of a type with no codec.
    Raw,
    Gob,
    Lfd,
}

impl ResourceKind {
    /// Whether a single resource of this kind can be decoded.
    #[must_use]
    pub const fn can_load(self) -> bool {
        !self.is_container()
    }

    /// Whether a single resource of this kind can be encoded.
    #[must_use]
    pub const fn can_save(self) -> bool {
        !matches!(self, Self::CreativeVoice | Self::Gob | Self::Lfd)
    }

    /// Whether this kind is an archive of other resources.
    #[must_use]
    pub const fn is_container(self) -> bool {
        matches!(self, Self::Gob | Self::Lfd)
    }

    /// Get display name for UI
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Midi => "MIDI",
            Self::GeneralMidi => "General MIDI",
            Self::Wave => "WAVE",
            Self::CreativeVoice => "Creative Voice",
            Self::DfPalette => "Palette",
            Self::Raw => "Raw",
            Self::Gob => "GOB",
            Self::Lfd => "LFD",
        }
    }

    /// Registry record of this kind.
    #[must_use]
    pub fn registration(self) -> Option<&'static Registration> {
        REGISTRY.iter().find(|r| r.kind == self)
    }

    /// Preferred file extension, upper case as the game stores them.
    #[must_use]
    pub fn extension(self) -> Option<&'static str> {
        self.registration().and_then(|r| r.extensions.first().copied())
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Decoder of one registered kind.
pub type Factory = fn(&mut dyn Read) -> Result<AnyResource>;

/// One entry of the dispatch table.
#[derive(Debug)]
pub struct Registration {
    pub kind: ResourceKind,
    /// File extensions without the dot, upper case.
    pub extensions: &'static [&'static str],
    /// Landru resource types used for this kind inside LFD archives.
    pub landru_types: &'static [&'static str],
    /// Decoder, for loadable kinds.
    pub factory: Option<Factory>,
}

fn load_as<T: Loadable + Into<AnyResource>>(reader: &mut dyn Read) -> Result<AnyResource> {
    Ok(T::load(reader)?.into())
}

/// The dispatch table, one entry per [`ResourceKind`].
pub static REGISTRY: &[Registration] = &[
    Registration {
        kind: ResourceKind::Midi,
        extensions: &["MID", "MIDI"],
        landru_types: &[],
        factory: Some(load_as::<Midi>),
    },
    Registration {
        kind: ResourceKind::GeneralMidi,
        extensions: &["GMD"],
        landru_types: &["GMID"],
        factory: Some(load_as::<DfGeneralMidi>),
    },
    Registration {
        kind: ResourceKind::Wave,
        extensions: &["WAV"],
        landru_types: &[],
        factory: Some(load_as::<Wave>),
    },
    Registration {
        kind: ResourceKind::CreativeVoice,
        extensions: &["VOC"],
        landru_types: &["VOIC"],
        factory: Some(load_as::<CreativeVoice>),
    },
    Registration {
        kind: ResourceKind::DfPalette,
        extensions: &["PAL"],
        landru_types: &[],
        factory: Some(load_as::<DfPalette>),
    },
    Registration {
        kind: ResourceKind::Raw,
        extensions: &[],
        landru_types: &[],
        factory: Some(load_as::<RawFile>),
    },
    Registration {
        kind: ResourceKind::Gob,
        extensions: &["GOB"],
        landru_types: &[],
        factory: None,
    },
    Registration {
        kind: ResourceKind::Lfd,
        extensions: &["LFD"],
        landru_types: &[],
        factory: None,
    },
];

/// Resource kind from a file name's extension, compared case-insensitively.
///
/// Returns `None` for names without an extension or with one no codec
/// claims; never fails.
#[must_use]
pub fn detect_file_type_by_name(path: impl AsRef<Path>) -> Option<ResourceKind> {
    let ext = path.as_ref().extension()?.to_str()?;
    REGISTRY
        .iter()
        .find(|r| r.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
        .map(|r| r.kind)
}

/// Resource kind from a Landru resource type (`VOIC`, `GMID`, ...).
#[must_use]
pub fn detect_file_type_by_landru_type(resource_type: &str) -> Option<ResourceKind> {
    REGISTRY
        .iter()
        .find(|r| r.landru_types.iter().any(|t| t.eq_ignore_ascii_case(resource_type)))
        .map(|r| r.kind)
}

/// Decode a resource of a kind chosen at run time.
///
/// # Errors
/// [`Error::LoadNotSupported`] for container kinds, which are opened with
/// [`Archive`](crate::archive::Archive) instead.
pub fn load_any(kind: ResourceKind, reader: &mut dyn Read) -> Result<AnyResource> {
    let factory = kind
        .registration()
        .and_then(|r| r.factory)
        .ok_or(Error::LoadNotSupported(kind))?;
    factory(reader)
}

/// A decoded resource of any registered kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnyResource {
    Midi(Midi),
    GeneralMidi(DfGeneralMidi),
    Wave(Wave),
    CreativeVoice(CreativeVoice),
    Palette(DfPalette),
    Raw(RawFile),
}

impl AnyResource {
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Midi(_) => ResourceKind::Midi,
            Self::GeneralMidi(_) => ResourceKind::GeneralMidi,
            Self::Wave(_) => ResourceKind::Wave,
            Self::CreativeVoice(_) => ResourceKind::CreativeVoice,
            Self::Palette(_) => ResourceKind::DfPalette,
            Self::Raw(_) => ResourceKind::Raw,
        }
    }

    #[must_use]
    pub fn can_save(&self) -> bool {
        self.kind().can_save()
    }

    /// Encode the resource.
    ///
    /// # Errors
    /// [`Error::SaveNotSupported`] for read-only kinds.
    pub fn save(&self, writer: &mut dyn Write) -> Result<()> {
        match self {
            Self::Midi(r) => r.save(writer),
            Self::GeneralMidi(r) => r.save(writer),
            Self::Wave(r) => r.save(writer),
            Self::Palette(r) => r.save(writer),
            Self::Raw(r) => r.save(writer),
            Self::CreativeVoice(_) => Err(Error::SaveNotSupported(self.kind())),
        }
    }

    /// Encode the resource into a new buffer.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        self.save(&mut data)?;
        Ok(data)
    }
}

macro_rules! impl_from_resource {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for AnyResource {
                fn from(resource: $ty) -> Self {
                    Self::$variant(resource)
                }
            }
        )*
    };
}

impl_from_resource!(
    Midi(Midi),
    GeneralMidi(DfGeneralMidi),
    Wave(Wave),
    CreativeVoice(CreativeVoice),
    Palette(DfPalette),
    Raw(RawFile),
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::Resource;

    #[test]
    fn test_detect_is_case_insensitive() {
        assert_eq!(detect_file_type_by_name("FOO.WAV"), Some(ResourceKind::Wave));
        assert_eq!(detect_file_type_by_name("foo.wav"), Some(ResourceKind::Wave));
        assert_eq!(detect_file_type_by_name("dir/Stalk.Gmd"), Some(ResourceKind::GeneralMidi));
        assert_eq!(detect_file_type_by_name("DARK.GOB"), Some(ResourceKind::Gob));
    }

    #[test]
    fn test_detect_unknown() {
        assert_eq!(detect_file_type_by_name("SECBASE.LEV"), None);
        assert_eq!(detect_file_type_by_name("README"), None);
        assert_eq!(detect_file_type_by_name(""), None);
        assert_eq!(detect_file_type_by_landru_type("DELT"), None);
    }

    #[test]
    fn test_landru_types() {
        assert_eq!(detect_file_type_by_landru_type("VOIC"), Some(ResourceKind::CreativeVoice));
        assert_eq!(detect_file_type_by_landru_type("gmid"), Some(ResourceKind::GeneralMidi));
    }

    #[test]
    fn test_registry_covers_every_kind() {
        for kind in [
            ResourceKind::Midi,
            ResourceKind::GeneralMidi,
            ResourceKind::Wave,
            ResourceKind::CreativeVoice,
            ResourceKind::DfPalette,
            ResourceKind::Raw,
            ResourceKind::Gob,
            ResourceKind::Lfd,
        ] {
            let registration = kind.registration().unwrap();
            assert_eq!(registration.factory.is_some(), kind.can_load(), "{kind}");
        }
    }

    #[test]
    fn test_capabilities_match_traits() {
        assert_eq!(Wave::CAN_SAVE, ResourceKind::Wave.can_save());
        assert!(!CreativeVoice::CAN_SAVE);
        assert!(Midi::CAN_LOAD && Midi::CAN_SAVE);
    }

    #[test]
    fn test_load_any_and_save() {
        let wave = Wave::new(1, 8000, 8, vec![128; 16]);
        let bytes = wave.to_bytes().unwrap();

        let any = load_any(ResourceKind::Wave, &mut bytes.as_slice()).unwrap();
        assert_eq!(any.kind(), ResourceKind::Wave);
        assert!(any.can_save());
        assert_eq!(any.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn test_read_only_kind_refuses_save() {
        let voc = AnyResource::CreativeVoice(CreativeVoice {
            version: 0x010A,
            blocks: Vec::new(),
        });
        assert!(!voc.can_save());
        assert!(matches!(
            voc.to_bytes(),
            Err(Error::SaveNotSupported(ResourceKind::CreativeVoice))
        ));
    }

    #[test]
    fn test_containers_are_not_single_resources() {
        assert!(matches!(
            load_any(ResourceKind::Gob, &mut &b"GOB\n"[..]),
            Err(Error::LoadNotSupported(ResourceKind::Gob))
        ));
    }
}
