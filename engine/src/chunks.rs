use std::collections::{HashMap, HashSet};

use atlas_shared::{CHUNK_SIZE, ChunkIndex, ChunkKey, MonsterLevels, content_hash};
use tracing::{debug, info, trace};

use crate::config::{CHUNK_WINDOW_PAD, EngineConfig};
use crate::label_layout::{LayoutKey, chunk_box_size, chunk_lines, fit_chunk_text};
use crate::search::{SearchFilter, passes};
use crate::surface::{BoxHandle, ChunkText, LabelSurface};
use crate::transform::CoordTransform;
use crate::viewport::{MapView, ScreenPoint, ScreenSize, ViewportPoint};

/// Inclusive range of chunk keys currently worth rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkWindow {
    pub cx0: i64,
    pub cy0: i64,
    pub cx1: i64,
    pub cy1: i64,
}

impl ChunkWindow {
    pub fn contains(&self, key: ChunkKey) -> bool {
        (self.cx0..=self.cx1).contains(&key.cx) && (self.cy0..=self.cy1).contains(&key.cy)
    }

    /// Row-major, top row first.
    pub fn keys(&self) -> impl Iterator<Item = ChunkKey> + '_ {
        (self.cy0..=self.cy1)
            .flat_map(move |cy| (self.cx0..=self.cx1).map(move |cx| ChunkKey::new(cx, cy)))
    }
}

/// Chunks overlapping the two view corners plus one chunk of padding,
/// clamped to the world. `None` until the world size is known.
pub fn visible_chunk_window(
    transform: &CoordTransform,
    corners: (ViewportPoint, ViewportPoint),
) -> Option<ChunkWindow> {
    let (world_w, world_h) = transform.world_size()?;
    let max_cx = (world_w as i64).div_euclid(CHUNK_SIZE) - 1;
    let max_cy = (world_h as i64).div_euclid(CHUNK_SIZE) - 1;
    if max_cx < 0 || max_cy < 0 {
        return None;
    }

    let (ax, ay) = transform.to_world(corners.0);
    let (bx, by) = transform.to_world(corners.1);
    let (min_x, max_x) = (ax.min(bx), ax.max(bx));
    let (min_y, max_y) = (ay.min(by), ay.max(by));

    let lo = |v: i64, max: i64| (v.div_euclid(CHUNK_SIZE) - CHUNK_WINDOW_PAD).clamp(0, max);
    let hi = |v: i64, max: i64| ((v - 1).div_euclid(CHUNK_SIZE) + CHUNK_WINDOW_PAD).clamp(0, max);

    let window = ChunkWindow {
        cx0: lo(min_x, max_cx),
        cy0: lo(min_y, max_cy),
        cx1: hi(max_x, max_cx),
        cy1: hi(max_y, max_cy),
    };
    Some(ChunkWindow {
        cx1: window.cx1.max(window.cx0),
        cy1: window.cy1.max(window.cy0),
        ..window
    })
}

/// Screen-space extent of one chunk at the current zoom.
pub fn chunk_screen_size<V>(transform: &CoordTransform, view: &V) -> ScreenSize
where
    V: MapView + ?Sized,
{
    let size = CHUNK_SIZE as f64;
    let p0 = view.project_to_screen(transform.to_viewport(0.0, 0.0));
    let p1 = view.project_to_screen(transform.to_viewport(size, size));
    ScreenSize::new((p1.x - p0.x).abs(), (p1.y - p0.y).abs())
}

/// One rendered aggregate box.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkBox {
    pub key: ChunkKey,
    pub handle: BoxHandle,
    pub screen_center: ScreenPoint,
    pub screen_size: ScreenSize,
    pub rendered: Option<ChunkText>,
    layout: Option<LayoutKey>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChunkRefreshStats {
    pub visible: usize,
    pub created: usize,
    pub relaid: usize,
    pub destroyed: usize,
}

/// Level-of-detail aggregation of encounter names into per-chunk boxes.
///
/// Boxes live in a map keyed by chunk, so creation and pruning only touch
/// chunks in or leaving the visible window.
#[derive(Debug)]
pub struct ChunkAggregator {
    index: ChunkIndex,
    levels: MonsterLevels,
    boxes: HashMap<ChunkKey, ChunkBox>,
    enabled: bool,
    min_chunk_screen_px: f64,
    boss_level: i64,
}

impl ChunkAggregator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            index: ChunkIndex::default(),
            levels: MonsterLevels::default(),
            boxes: HashMap::new(),
            enabled: false,
            min_chunk_screen_px: config.min_chunk_screen_px,
            boss_level: config.boss_level,
        }
    }

    /// Replace the encounter data wholesale. Existing boxes are destroyed.
    pub fn set_data<S>(&mut self, index: ChunkIndex, levels: MonsterLevels, surface: &mut S)
    where
        S: LabelSurface + ?Sized,
    {
        self.clear(surface);
        info!(
            chunks = index.len(),
            levels = levels.len(),
            "loaded encounter index"
        );
        self.index = index;
        self.levels = levels;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn boxes(&self) -> impl Iterator<Item = &ChunkBox> {
        self.boxes.values()
    }

    pub fn get(&self, key: ChunkKey) -> Option<&ChunkBox> {
        self.boxes.get(&key)
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Sorted, duplicate-free occupants of a chunk, narrowed by the search.
    pub fn names_for_chunk(&self, key: ChunkKey, search: Option<&SearchFilter>) -> Vec<String> {
        self.index
            .names(key)
            .iter()
            .filter(|name| passes(search, name))
            .cloned()
            .collect()
    }

    /// Zoom in far enough for chunks to reach the minimum on-screen size.
    /// Returns whether a zoom change was requested.
    pub fn ensure_minimum_zoom<V>(
        &self,
        transform: &CoordTransform,
        search: Option<&SearchFilter>,
        view: &mut V,
    ) -> bool
    where
        V: MapView + ?Sized,
    {
        if !transform.is_ready() || search.is_some() {
            return false;
        }
        let footprint = chunk_screen_size(transform, &*view);
        let min = self.min_chunk_screen_px;
        if footprint.width >= min && footprint.height >= min {
            return false;
        }

        let zoom = view.zoom();
        let scale_needed = (min / footprint.width.max(1e-4)).max(min / footprint.height.max(1e-4));
        if !scale_needed.is_finite() || scale_needed <= 1.0 {
            return false;
        }

        let mut desired = view.scale_zoom(scale_needed, zoom);
        let snap = view.zoom_snap();
        if snap > 0.0 {
            desired = (desired / snap - 1e-9).ceil() * snap;
        }
        let max_zoom = view.max_zoom();
        let limited = if max_zoom.is_finite() {
            desired.min(max_zoom)
        } else {
            desired
        };
        if limited.is_nan() || limited <= zoom {
            return false;
        }

        info!(from = zoom, to = limited, "zooming in for chunk labels");
        view.set_zoom(limited);
        true
    }

    /// Bring the set of boxes in line with the current view.
    pub fn refresh<V, S>(
        &mut self,
        transform: &CoordTransform,
        search: Option<&SearchFilter>,
        view: &V,
        surface: &mut S,
    ) -> ChunkRefreshStats
    where
        V: MapView + ?Sized,
        S: LabelSurface + ?Sized,
    {
        if !transform.is_ready() {
            debug!("chunk refresh before world size is known");
            return ChunkRefreshStats::default();
        }
        if !self.enabled {
            return self.clear_with_stats(surface);
        }

        let footprint = chunk_screen_size(transform, view);
        let min = self.min_chunk_screen_px;
        if search.is_none() && (footprint.width < min || footprint.height < min) {
            return self.clear_with_stats(surface);
        }

        let Some(window) = visible_chunk_window(transform, view.visible_bounds()) else {
            return self.clear_with_stats(surface);
        };

        let mut stats = ChunkRefreshStats::default();
        let mut keep = HashSet::new();
        for key in window.keys() {
            let names = self.names_for_chunk(key, search);
            if names.is_empty() {
                continue;
            }
            keep.insert(key);

            let region = key.bounds();
            let a = view.project_to_screen(transform.to_viewport(region.left() as f64, region.top() as f64));
            let b = view.project_to_screen(
                transform.to_viewport(region.right() as f64, region.bottom() as f64),
            );
            let center = ScreenPoint::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0);
            let size = chunk_box_size(a, b);

            let chunk_box = self.boxes.entry(key).or_insert_with(|| {
                stats.created += 1;
                trace!(%key, "chunk box created");
                ChunkBox {
                    key,
                    handle: surface.create_box(center, size),
                    screen_center: center,
                    screen_size: size,
                    rendered: None,
                    layout: None,
                }
            });
            chunk_box.screen_center = center;
            chunk_box.screen_size = size;
            surface.update_box(chunk_box.handle, center, size);

            let layout = LayoutKey {
                width: size.width,
                height: size.height,
                content_hash: content_hash(&names),
            };
            if chunk_box.layout == Some(layout) {
                continue;
            }
            let lines = chunk_lines(&names, &self.levels, self.boss_level);
            let text = fit_chunk_text(size, lines, surface);
            surface.set_chunk_text(chunk_box.handle, &text);
            chunk_box.rendered = Some(text);
            chunk_box.layout = Some(layout);
            stats.relaid += 1;
        }

        let stale: Vec<ChunkKey> = self
            .boxes
            .keys()
            .filter(|key| !keep.contains(key))
            .copied()
            .collect();
        for key in stale {
            if let Some(chunk_box) = self.boxes.remove(&key) {
                surface.destroy(chunk_box.handle);
                stats.destroyed += 1;
            }
        }

        stats.visible = self.boxes.len();
        debug!(
            visible = stats.visible,
            created = stats.created,
            relaid = stats.relaid,
            destroyed = stats.destroyed,
            "chunk refresh"
        );
        stats
    }

    /// Destroy every box.
    pub fn clear<S>(&mut self, surface: &mut S)
    where
        S: LabelSurface + ?Sized,
    {
        for (_, chunk_box) in self.boxes.drain() {
            surface.destroy(chunk_box.handle);
        }
    }

    fn clear_with_stats<S>(&mut self, surface: &mut S) -> ChunkRefreshStats
    where
        S: LabelSurface + ?Sized,
    {
        let destroyed = self.boxes.len();
        self.clear(surface);
        ChunkRefreshStats {
            destroyed,
            ..ChunkRefreshStats::default()
        }
    }
}
