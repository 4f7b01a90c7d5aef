//! CLI interface for format conversion

use std::path::Path;

use crate::cli::progress::{print_step, GEAR};
use crate::dispatch::get_file_from_folder_or_container;
use crate::formats::palette::{PALETTE_COLORS, PALETTE_SIZE};
use crate::formats::{CreativeVoice, DfGeneralMidi, DfPalette, Midi, Savable};

pub fn execute(source: &Path, destination: &Path) -> anyhow::Result<()> {
    let input = extension(source)
        .ok_or_else(|| anyhow::anyhow!("Cannot detect input format from source file extension"))?;
    let output = extension(destination).ok_or_else(|| {
        anyhow::anyhow!("Cannot detect output format from destination file extension")
    })?;

    print_step(
        1,
        1,
        GEAR,
        &format!(
            "Converting {} -> {}",
            input.to_uppercase(),
            output.to_uppercase()
        ),
    );

    match (input.as_str(), output.as_str()) {
        ("voc", "wav") => {
            let voice: CreativeVoice = get_file_from_folder_or_container(source)?;
            voice.to_wave()?.save_file(destination)?;
        }
        ("gmd", "mid" | "midi") => {
            let gmd: DfGeneralMidi = get_file_from_folder_or_container(source)?;
            if !gmd.cue_chunks().is_empty() {
                tracing::warn!(
                    "{} iMUSE cue chunks carried over into plain MIDI output",
                    gmd.cue_chunks().len()
                );
            }
            gmd.into_midi().save_file(destination)?;
        }
        ("mid" | "midi", "gmd") => {
            let midi: Midi = get_file_from_folder_or_container(source)?;
            DfGeneralMidi::new(midi).save_file(destination)?;
        }
        ("pal", "rgb") => {
            let palette: DfPalette = get_file_from_folder_or_container(source)?;
            std::fs::write(destination, palette.to_rgb8())?;
        }
        ("rgb", "pal") => {
            let data = std::fs::read(source)?;
            palette_from_rgb8(&data)?.save_file(destination)?;
        }
        _ => {
            anyhow::bail!(
                "Unsupported conversion: {input} -> {output}. \
                 Supported: voc -> wav, gmd -> mid, mid -> gmd, pal -> rgb, rgb -> pal"
            );
        }
    }

    println!("Wrote {}", destination.display());
    Ok(())
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|s| s.to_str())
        .map(str::to_lowercase)
}

/// Palette from a 768-byte 8-bit RGB dump.
fn palette_from_rgb8(data: &[u8]) -> anyhow::Result<DfPalette> {
    if data.len() != PALETTE_SIZE {
        anyhow::bail!(
            "RGB palette must be exactly {PALETTE_SIZE} bytes, found {}",
            data.len()
        );
    }
    let mut rgb = [[0u8; 3]; PALETTE_COLORS];
    for (color, chunk) in rgb.iter_mut().zip(data.chunks_exact(3)) {
        color.copy_from_slice(chunk);
    }
    Ok(DfPalette::from_rgb8(&rgb))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::{Loadable, Wave};

    #[test]
    fn test_rgb_palette_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let rgb_path = dir.path().join("game.rgb");
        let pal_path = dir.path().join("GAME.PAL");
        let mut rgb = vec![0u8; PALETTE_SIZE];
        rgb[3..6].copy_from_slice(&[0xFF, 0x82, 0x00]);
        std::fs::write(&rgb_path, &rgb).unwrap();

        execute(&rgb_path, &pal_path).unwrap();
        let palette = DfPalette::load_file(&pal_path).unwrap();
        assert_eq!(palette.colors[1].to_rgb8(), [0xFF, 0x82, 0x00]);
    }

    #[test]
    fn test_short_rgb_dump_rejected() {
        assert!(palette_from_rgb8(&[0; 10]).is_err());
    }

    #[test]
    fn test_unsupported_pair() {
        let dir = tempfile::tempdir().unwrap();
        let wav = dir.path().join("a.wav");
        Wave::new(1, 8000, 8, vec![0x80; 4]).save_file(&wav).unwrap();
        assert!(execute(&wav, &dir.path().join("a.voc")).is_err());
    }
}
