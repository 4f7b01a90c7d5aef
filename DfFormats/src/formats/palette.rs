//! Dark Forces VGA palette (`.PAL`)
//!
//! 256 colours of three bytes each, red-green-blue, with 6-bit components
//! (0..=63) as the VGA DAC expects them. No header.

use std::io::{Read, Write};

use crate::dispatch::ResourceKind;
use crate::error::{Error, Result};
use crate::formats::resource::{Loadable, Resource, Savable};

/// Number of colours in a palette.
pub const PALETTE_COLORS: usize = 256;

/// Encoded size of a palette.
pub const PALETTE_SIZE: usize = PALETTE_COLORS * 3;

/// Largest 6-bit component value.
pub const MAX_COMPONENT: u8 = 63;

/// One palette colour in 6-bit components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VgaColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl VgaColor {
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Expand to 8-bit components, mapping 63 to 255.
    #[must_use]
    pub const fn to_rgb8(self) -> [u8; 3] {
        [expand(self.r), expand(self.g), expand(self.b)]
    }

    /// Reduce 8-bit components to the nearest lower 6-bit value.
    #[must_use]
    pub const fn from_rgb8(rgb: [u8; 3]) -> Self {
        Self::new(rgb[0] >> 2, rgb[1] >> 2, rgb[2] >> 2)
    }
}

const fn expand(component: u8) -> u8 {
    (component << 2) | (component >> 4)
}

/// A 256-colour palette.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DfPalette {
    pub colors: [VgaColor; PALETTE_COLORS],
}

impl Default for DfPalette {
    fn default() -> Self {
        Self {
            colors: [VgaColor::default(); PALETTE_COLORS],
        }
    }
}

impl DfPalette {
    /// Build a palette from 8-bit RGB triples.
    #[must_use]
    pub fn from_rgb8(rgb: &[[u8; 3]; PALETTE_COLORS]) -> Self {
        let mut palette = Self::default();
        for (color, src) in palette.colors.iter_mut().zip(rgb) {
            *color = VgaColor::from_rgb8(*src);
        }
        palette
    }

    /// The palette as 768 bytes of 8-bit RGB.
    #[must_use]
    pub fn to_rgb8(&self) -> Vec<u8> {
        self.colors.iter().flat_map(|c| c.to_rgb8()).collect()
    }
}

impl Resource for DfPalette {
    const KIND: ResourceKind = ResourceKind::DfPalette;
}

impl Loadable for DfPalette {
    fn load<R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let mut buf = [0u8; PALETTE_SIZE];
        reader.read_exact(&mut buf)?;

        if let Some(index) = buf.iter().position(|&c| c > MAX_COMPONENT) {
            return Err(Error::UnsupportedFormat {
                format: "PAL",
                message: format!(
                    "colour {} has component {} above the 6-bit range",
                    index / 3,
                    buf[index]
                ),
            });
        }

        let mut palette = Self::default();
        for (color, rgb) in palette.colors.iter_mut().zip(buf.chunks_exact(3)) {
            *color = VgaColor::new(rgb[0], rgb[1], rgb[2]);
        }
        Ok(palette)
    }
}

impl Savable for DfPalette {
    fn save<W: Write + ?Sized>(&self, writer: &mut W) -> Result<()> {
        let mut buf = Vec::with_capacity(PALETTE_SIZE);
        for color in &self.colors {
            buf.extend_from_slice(&[color.r, color.g, color.b]);
        }
        if let Some(&value) = buf.iter().find(|&&c| c > MAX_COMPONENT) {
            return Err(Error::ValueOutOfRange {
                what: "palette component",
                value: u64::from(value),
                max: u64::from(MAX_COMPONENT),
            });
        }
        writer.write_all(&buf)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> Vec<u8> {
        (0..PALETTE_SIZE).map(|i| (i % 64) as u8).collect()
    }

    #[test]
    fn test_round_trip() {
        let bytes = ramp();
        let palette = DfPalette::load_bytes(&bytes).unwrap();
        assert_eq!(palette.colors[1], VgaColor::new(3, 4, 5));
        assert_eq!(palette.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn test_component_expansion() {
        assert_eq!(VgaColor::new(0, 32, 63).to_rgb8(), [0, 130, 255]);
        assert_eq!(VgaColor::from_rgb8([255, 130, 3]), VgaColor::new(63, 32, 0));
    }

    #[test]
    fn test_eight_bit_data_is_rejected() {
        let mut bytes = ramp();
        bytes[10] = 200;
        assert!(matches!(
            DfPalette::load_bytes(&bytes),
            Err(Error::UnsupportedFormat { format: "PAL", .. })
        ));
    }

    #[test]
    fn test_out_of_range_component_is_not_saved() {
        let mut palette = DfPalette::default();
        palette.colors[5] = VgaColor::new(64, 100, 200);

        let mut out = Vec::new();
        let err = palette.save(&mut out).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Capacity);
        assert!(matches!(err, Error::ValueOutOfRange { value: 64, max: 63, .. }));
        assert!(out.is_empty());
    }

    #[test]
    fn test_short_palette() {
        assert!(matches!(
            DfPalette::load_bytes(&[0u8; 700]),
            Err(Error::UnexpectedEof)
        ));
    }
}
