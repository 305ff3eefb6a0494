use std::collections::HashMap;

use atlas_shared::Category;

use crate::viewport::{ScreenPoint, ScreenSize};

/// Opaque id of an element created on the rendering surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoxHandle(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkLine {
    pub name: String,
    pub boss: bool,
}

/// Rendered content of one chunk aggregate box.
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkText {
    Lines { font_px: u32, lines: Vec<ChunkLine> },
    /// Nothing fit even at the smallest font: show only the occupant count.
    Count(usize),
}

/// Text measurement capability supplied by the renderer.
pub trait TextMeasure {
    fn measure_block(&mut self, lines: &[ChunkLine], font_px: f64, line_height: f64) -> ScreenSize;
}

/// The label-element provider the engine draws through.
pub trait LabelSurface: TextMeasure {
    fn create_box(&mut self, center: ScreenPoint, size: ScreenSize) -> BoxHandle;
    fn update_box(&mut self, handle: BoxHandle, center: ScreenPoint, size: ScreenSize);
    fn set_chunk_text(&mut self, handle: BoxHandle, text: &ChunkText);
    /// Rendered size of a point label.
    fn measure_label(&mut self, text: &str, category: Category) -> ScreenSize;
    fn set_visible(&mut self, handle: BoxHandle, visible: bool);
    fn set_highlighted(&mut self, handle: BoxHandle, highlighted: bool);
    fn destroy(&mut self, handle: BoxHandle);
}

/// Fixed-advance text estimate for headless rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceMetrics {
    pub advance_ratio: f64,
}

impl Default for MonospaceMetrics {
    fn default() -> Self {
        Self { advance_ratio: 0.6 }
    }
}

impl MonospaceMetrics {
    pub fn line_width(&self, text: &str, font_px: f64) -> f64 {
        text.chars().count() as f64 * font_px * self.advance_ratio
    }

    pub fn label_size(&self, text: &str, category: Category) -> ScreenSize {
        let (font_px, height) = match category {
            Category::Town => (12.0, 24.0),
            Category::Poi | Category::Portal => (11.0, 14.0),
        };
        ScreenSize::new(self.line_width(text, font_px) + 6.0, height)
    }
}

impl TextMeasure for MonospaceMetrics {
    fn measure_block(&mut self, lines: &[ChunkLine], font_px: f64, line_height: f64) -> ScreenSize {
        let width = lines
            .iter()
            .map(|line| self.line_width(&line.name, font_px))
            .fold(0.0, f64::max);
        ScreenSize::new(width, lines.len() as f64 * font_px * line_height)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessBox {
    pub center: ScreenPoint,
    pub size: ScreenSize,
    pub text: Option<ChunkText>,
    pub visible: bool,
    pub highlighted: bool,
}

/// In-memory surface: records every element and measures with `MonospaceMetrics`.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    pub metrics: MonospaceMetrics,
    boxes: HashMap<BoxHandle, HeadlessBox>,
    next_id: u64,
    pub measure_calls: usize,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, handle: BoxHandle) -> Option<&HeadlessBox> {
        self.boxes.get(&handle)
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn visible_count(&self) -> usize {
        self.boxes.values().filter(|b| b.visible).count()
    }
}

impl TextMeasure for HeadlessSurface {
    fn measure_block(&mut self, lines: &[ChunkLine], font_px: f64, line_height: f64) -> ScreenSize {
        self.measure_calls += 1;
        self.metrics.measure_block(lines, font_px, line_height)
    }
}

impl LabelSurface for HeadlessSurface {
    fn create_box(&mut self, center: ScreenPoint, size: ScreenSize) -> BoxHandle {
        self.next_id += 1;
        let handle = BoxHandle(self.next_id);
        self.boxes.insert(
            handle,
            HeadlessBox {
                center,
                size,
                text: None,
                visible: true,
                highlighted: false,
            },
        );
        handle
    }

    fn update_box(&mut self, handle: BoxHandle, center: ScreenPoint, size: ScreenSize) {
        if let Some(b) = self.boxes.get_mut(&handle) {
            b.center = center;
            b.size = size;
        }
    }

    fn set_chunk_text(&mut self, handle: BoxHandle, text: &ChunkText) {
        if let Some(b) = self.boxes.get_mut(&handle) {
            b.text = Some(text.clone());
        }
    }

    fn measure_label(&mut self, text: &str, category: Category) -> ScreenSize {
        self.metrics.label_size(text, category)
    }

    fn set_visible(&mut self, handle: BoxHandle, visible: bool) {
        if let Some(b) = self.boxes.get_mut(&handle) {
            b.visible = visible;
        }
    }

    fn set_highlighted(&mut self, handle: BoxHandle, highlighted: bool) {
        if let Some(b) = self.boxes.get_mut(&handle) {
            b.highlighted = highlighted;
        }
    }

    fn destroy(&mut self, handle: BoxHandle) {
        self.boxes.remove(&handle);
    }
}
