//! Human-readable module summary

use std::fmt::Write as _;

use xm_format::{CellView, FrequencyMode, XmModule};

/// Header fields and instrument names, plus every pattern when `patterns` is set
pub fn describe(module: &XmModule, patterns: bool) -> String {
    let mut out = String::new();
    // writing to a String cannot fail
    let _ = write_header(&mut out, module);
    let _ = write_instruments(&mut out, module);
    if patterns {
        let _ = write_patterns(&mut out, module);
    }
    out
}

fn write_header(out: &mut String, module: &XmModule) -> std::fmt::Result {
    let mode = match module.frequency_mode {
        FrequencyMode::Linear => "linear",
        FrequencyMode::Amiga => "amiga",
    };

    writeln!(out, "Title:       {}", module.name)?;
    if !module.tracker_name.is_empty() {
        writeln!(out, "Tracker:     {}", module.tracker_name)?;
    }
    writeln!(out, "Version:     {:#06x}", module.version)?;
    writeln!(out, "Channels:    {}", module.num_channels)?;
    writeln!(out, "Patterns:    {}", module.patterns.len())?;
    writeln!(out, "Instruments: {}", module.num_instruments)?;
    writeln!(out, "Length:      {} (restart {})", module.song_length, module.restart_position)?;
    writeln!(out, "Speed/BPM:   {}/{}", module.default_speed, module.default_bpm)?;
    writeln!(out, "Frequency:   {mode}")
}

fn write_instruments(out: &mut String, module: &XmModule) -> std::fmt::Result {
    writeln!(out)?;
    writeln!(out, "Instruments:")?;
    for (i, instrument) in module.instruments.iter().enumerate() {
        writeln!(
            out,
            "  {:02X} {:<22} {} sample(s)",
            i + 1,
            instrument.name,
            instrument.num_samples
        )?;
    }
    Ok(())
}

fn write_patterns(out: &mut String, module: &XmModule) -> std::fmt::Result {
    for position in 0..module.song_length {
        let (Some(index), Some(pattern)) = (module.pattern_index_at(position), module.pattern_at_order(position))
        else {
            continue;
        };

        writeln!(out)?;
        writeln!(out, "Position {position:02X} / pattern {index:02X} ({} rows)", pattern.notes.len())?;
        for (row, cells) in pattern.notes.iter().enumerate() {
            write!(out, "{row:02X} |")?;
            for cell in cells {
                write!(out, " {} |", CellView::from(cell))?;
            }
            writeln!(out)?;
        }
    }
    Ok(())
}
