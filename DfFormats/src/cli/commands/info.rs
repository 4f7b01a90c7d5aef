//! CLI command for inspecting a resource

use std::path::Path;

use super::format_size;
use crate::archive::{Archive, ArchiveFormat, Gob, Lfd};
use crate::dispatch::{detect_file_type_by_name, get_any_from_folder_or_container, AnyResource, ResourceKind};
use crate::formats::{Division, Midi};

pub fn execute(path: &Path) -> anyhow::Result<()> {
    match detect_file_type_by_name(path) {
        Some(ResourceKind::Gob) if path.is_file() => archive_info::<Gob>(path),
        Some(ResourceKind::Lfd) if path.is_file() => archive_info::<Lfd>(path),
        _ => {
            let resource = get_any_from_folder_or_container(path)?;
            println!("{}: {}", path.display(), resource.kind());
            for line in describe(&resource) {
                println!("  {line}");
            }
            Ok(())
        }
    }
}

fn archive_info<F: ArchiveFormat>(path: &Path) -> anyhow::Result<()> {
    let archive = Archive::<F, _>::open_file(path)?;
    let entries = archive.entries();
    let total: u64 = entries.iter().map(|e| e.size).sum();

    println!("{}: {} archive", path.display(), F::NAME);
    println!("  Entries: {}", entries.len());
    println!("  Payload: {}", format_size(total));
    Ok(())
}

/// Summary lines for a decoded resource.
fn describe(resource: &AnyResource) -> Vec<String> {
    match resource {
        AnyResource::Midi(midi) => describe_midi(midi),
        AnyResource::GeneralMidi(gmd) => {
            let mut lines = describe_midi(&gmd.midi);
            lines.push(format!("iMUSE cues: {}", gmd.cue_chunks().len()));
            lines
        }
        AnyResource::Wave(wave) => vec![
            format!("Channels: {}", wave.channels),
            format!("Sample rate: {} Hz", wave.sample_rate),
            format!("Bits per sample: {}", wave.bits_per_sample),
            format!("Frames: {}", wave.frame_count()),
            format!("Duration: {:.3}s", wave.duration().as_secs_f64()),
        ],
        AnyResource::CreativeVoice(voc) => {
            let mut lines = vec![
                format!("Version: {}.{}", voc.version >> 8, voc.version & 0xFF),
                format!("Blocks: {}", voc.blocks.len()),
            ];
            match voc.format() {
                Some((rate, channels, codec)) => lines.push(format!(
                    "Sound: {rate} Hz, {channels} channel(s), {codec:?}"
                )),
                None => lines.push("Sound: none".to_string()),
            }
            lines
        }
        AnyResource::Palette(palette) => {
            let rgb = palette.colors[0].to_rgb8();
            vec![
                format!("Colors: {}", palette.colors.len()),
                format!("Color 0: #{:02X}{:02X}{:02X}", rgb[0], rgb[1], rgb[2]),
            ]
        }
        AnyResource::Raw(raw) => vec![format!("Size: {}", format_size(raw.data.len() as u64))],
    }
}

fn describe_midi(midi: &Midi) -> Vec<String> {
    let division = match midi.division {
        Division::TicksPerBeat(ticks) => format!("{ticks} ticks per beat"),
        Division::FramesPerSecond(raw) => format!("SMPTE {raw:#06x}"),
    };
    let mut lines = vec![
        format!("Format: {:?}", midi.format),
        format!("Division: {division}"),
        format!("Tracks: {}", midi.track_count()),
    ];
    for (tag, chunks) in &midi.extra_chunks {
        lines.push(format!("Extra chunk {tag}: {}", chunks.len()));
    }
    lines
}
