//! Board model handed over by the host
//!
//! # Submodules
//! - `types` - Serde document types (vias, tracks, footprints, zones, outline)
//! - `spatial` - R-tree index over footprint bounding boxes

mod spatial;
mod types;

use anyhow::Context;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

pub use types::{
    from_mm, to_mm, ArcGeometry, BoardData, BoundingBox, FootprintData, NetCode, OutlineData,
    Point, TrackData, ViaData, ViaId, ZoneData, NM_PER_MM,
};

pub use spatial::{FootprintBox, FootprintIndex};

/// Read a board document from a JSON file
pub fn load_board<P: AsRef<Path>>(path: P) -> anyhow::Result<BoardData> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open board file {}", path.display()))?;
    let board: BoardData = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse board file {}", path.display()))?;
    log::debug!(
        "Loaded board {}: {} vias, {} tracks, {} footprints, {} zones, {} outline shapes",
        path.display(),
        board.vias.len(),
        board.tracks.len(),
        board.footprints.len(),
        board.zones.len(),
        board.outline.len()
    );
    Ok(board)
}

/// Write a board document as pretty-printed JSON
pub fn save_board<P: AsRef<Path>>(board: &BoardData, path: P) -> anyhow::Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("Failed to create board file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, board)
        .with_context(|| format!("Failed to write board file {}", path.display()))?;
    writer.flush()?;
    Ok(())
}
