//! Four-character chunk tags

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// A four-character tag such as `MThd`, `RIFF` or `MDpg`.
///
/// Stored as raw bytes so tags that are not valid ASCII still round-trip.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FourCc(pub [u8; 4]);

impl FourCc {
    pub const MTHD: FourCc = FourCc(*b"MThd");
    pub const MTRK: FourCc = FourCc(*b"MTrk");
    pub const MIDI: FourCc = FourCc(*b"MIDI");
    pub const RIFF: FourCc = FourCc(*b"RIFF");
    pub const WAVE: FourCc = FourCc(*b"WAVE");
    pub const FMT: FourCc = FourCc(*b"fmt ");
    pub const DATA: FourCc = FourCc(*b"data");

    #[must_use]
    pub const fn new(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl From<[u8; 4]> for FourCc {
    fn from(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }
}

impl PartialEq<[u8; 4]> for FourCc {
    fn eq(&self, other: &[u8; 4]) -> bool {
        &self.0 == other
    }
}

impl FromStr for FourCc {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes: [u8; 4] = s
            .as_bytes()
            .try_into()
            .map_err(|_| Error::InvalidEntryName(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            if b.is_ascii_graphic() || b == b' ' {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{b:02x}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCc(\"{self}\")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_escapes_unprintable() {
        assert_eq!(FourCc::MTHD.to_string(), "MThd");
        assert_eq!(FourCc(*b"GOB\n").to_string(), "GOB\\x0a");
    }

    #[test]
    fn test_parse() {
        assert_eq!("XTRA".parse::<FourCc>().unwrap(), FourCc(*b"XTRA"));
        assert!("TOOLONG".parse::<FourCc>().is_err());
    }
}
