use crate::anchor::SsdAnchor;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Write anchors as plain text, one `x y width height` line per anchor.
///
/// This is the same format the reference golden data files use, so an
/// exported set can be diffed directly against them.
pub fn write_anchors<W: Write>(writer: &mut W, anchors: &[SsdAnchor]) -> Result<()> {
    for anchor in anchors {
        writeln!(
            writer,
            "{} {} {} {}",
            anchor.x, anchor.y, anchor.width, anchor.height
        )?;
    }
    Ok(())
}

pub fn write_anchors_file(path: &Path, anchors: &[SsdAnchor]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create anchor file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    write_anchors(&mut writer, anchors)?;
    writer.flush().context("Failed to flush anchor file")?;
    Ok(())
}

/// Parse anchors from the text format. Blank lines are skipped; anything
/// else must be exactly four floats.
pub fn read_anchors<R: BufRead>(reader: R) -> Result<Vec<SsdAnchor>> {
    let mut anchors = Vec::new();
    for (line_number, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read line {}", line_number + 1))?;
        if line.trim().is_empty() {
            continue;
        }

        let values = line
            .split_whitespace()
            .map(|field| {
                field.parse::<f32>().with_context(|| {
                    format!("Invalid value '{}' on line {}", field, line_number + 1)
                })
            })
            .collect::<Result<Vec<f32>>>()?;
        anyhow::ensure!(
            values.len() == 4,
            "Expected 4 values on line {}, got {}",
            line_number + 1,
            values.len()
        );

        anchors.push(SsdAnchor::new(values[0], values[1], values[2], values[3]));
    }
    Ok(anchors)
}

pub fn read_anchors_file(path: &Path) -> Result<Vec<SsdAnchor>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open anchor file {}", path.display()))?;
    read_anchors(BufReader::new(file))
}
