use atlas_shared::MonsterLevels;

use crate::config::{CHUNK_TEXT_PADDING_PX, LINE_HEIGHT, MAX_FONT_PX, MIN_CHUNK_BOX_PX, MIN_FONT_PX};
use crate::surface::{ChunkLine, ChunkText, TextMeasure};
use crate::viewport::{ScreenPoint, ScreenSize};

/// On-screen size of a chunk box from two opposite projected corners,
/// rounded to whole pixels and never smaller than `MIN_CHUNK_BOX_PX`.
pub fn chunk_box_size(a: ScreenPoint, b: ScreenPoint) -> ScreenSize {
    ScreenSize::new(
        (b.x - a.x).abs().round().max(MIN_CHUNK_BOX_PX),
        (b.y - a.y).abs().round().max(MIN_CHUNK_BOX_PX),
    )
}

pub fn chunk_lines(names: &[String], levels: &MonsterLevels, boss_level: i64) -> Vec<ChunkLine> {
    names
        .iter()
        .map(|name| ChunkLine {
            name: name.clone(),
            boss: levels.is_boss(name, boss_level),
        })
        .collect()
}

/// Shrink-to-fit: the largest font in `MAX_FONT_PX..=MIN_FONT_PX` whose text
/// block fits inside the padded box, else a bare count.
pub fn fit_chunk_text<M>(size: ScreenSize, lines: Vec<ChunkLine>, measure: &mut M) -> ChunkText
where
    M: TextMeasure + ?Sized,
{
    let avail = ScreenSize::new(
        (size.width - CHUNK_TEXT_PADDING_PX).max(0.0),
        (size.height - CHUNK_TEXT_PADDING_PX).max(0.0),
    );
    for font_px in (MIN_FONT_PX..=MAX_FONT_PX).rev() {
        let block = measure.measure_block(&lines, font_px as f64, LINE_HEIGHT);
        if block.fits_within(avail) {
            return ChunkText::Lines { font_px, lines };
        }
    }
    ChunkText::Count(lines.len())
}

/// Inputs of the last layout of a box; an identical key skips re-layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutKey {
    pub width: f64,
    pub height: f64,
    pub content_hash: u32,
}
