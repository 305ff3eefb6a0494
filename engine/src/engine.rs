use std::collections::{BTreeSet, HashMap};

use atlas_shared::{Annotation, AnnotationId, Category, ChunkIndex, MonsterLevels};
use tracing::{debug, info, warn};

use crate::chunks::{ChunkAggregator, ChunkRefreshStats};
use crate::config::{EngineConfig, MATCH_BONUS};
use crate::scheduler::RefreshScheduler;
use crate::search::SearchFilter;
use crate::spatial::{LabelBox, Resolution, resolve};
use crate::surface::{BoxHandle, LabelSurface};
use crate::transform::CoordTransform;
use crate::viewport::{MapView, ScreenPoint, ScreenSize};

/// Everything the engine renders, already parsed.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub annotations: Vec<Annotation>,
    pub encounters: ChunkIndex,
    pub levels: MonsterLevels,
}

#[derive(Debug, Clone)]
struct PlacedLabel {
    annotation: Annotation,
    handle: BoxHandle,
    size: ScreenSize,
    matched: bool,
}

impl PlacedLabel {
    fn priority_score(&self) -> u32 {
        self.annotation.base_priority + if self.matched { MATCH_BONUS } else { 0 }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub chunks: ChunkRefreshStats,
    pub labels_visible: usize,
    pub labels_hidden: usize,
}

/// Owns all layout state for one map: world transform, loaded data, chunk
/// boxes, search, category toggles and the refresh debounce.
///
/// The host forwards its events (`on_viewport_change`, `on_zoom_settled`,
/// timer expiry via `tick`) and user actions; every call that renders takes
/// the view and surface explicitly.
#[derive(Debug)]
pub struct LayoutEngine {
    config: EngineConfig,
    transform: CoordTransform,
    chunks: ChunkAggregator,
    labels: Vec<PlacedLabel>,
    hidden_categories: BTreeSet<Category>,
    search: Option<SearchFilter>,
    scheduler: RefreshScheduler,
    awaiting_zoom: bool,
    visibility: HashMap<AnnotationId, bool>,
}

impl LayoutEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            transform: CoordTransform::default(),
            chunks: ChunkAggregator::new(&config),
            labels: Vec::new(),
            hidden_categories: BTreeSet::new(),
            search: None,
            scheduler: RefreshScheduler::new(config.refresh_debounce_ms),
            awaiting_zoom: false,
            visibility: HashMap::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn transform(&self) -> &CoordTransform {
        &self.transform
    }

    pub fn chunks(&self) -> &ChunkAggregator {
        &self.chunks
    }

    pub fn search(&self) -> Option<&SearchFilter> {
        self.search.as_ref()
    }

    pub fn awaiting_zoom(&self) -> bool {
        self.awaiting_zoom
    }

    pub fn next_deadline(&self) -> Option<f64> {
        self.scheduler.next_deadline()
    }

    /// Visibility of a label after the last pass; `None` for unknown ids.
    pub fn is_label_visible(&self, id: AnnotationId) -> Option<bool> {
        self.visibility.get(&id).copied()
    }

    pub fn label_handle(&self, id: AnnotationId) -> Option<BoxHandle> {
        self.labels
            .iter()
            .find(|l| l.annotation.id == id)
            .map(|l| l.handle)
    }

    pub fn is_category_visible(&self, category: Category) -> bool {
        !self.hidden_categories.contains(&category)
    }

    /// Called once the world image dimensions are known.
    pub fn set_world_size(&mut self, width: f64, height: f64) {
        self.transform = CoordTransform::finalize(width, height, self.config.invert_y);
        info!(width, height, invert_y = self.config.invert_y, "world size set");
    }

    /// Replace all data. Previous label and chunk elements are destroyed.
    pub fn load<V, S>(&mut self, dataset: Dataset, view: &V, surface: &mut S) -> PassSummary
    where
        V: MapView + ?Sized,
        S: LabelSurface + ?Sized,
    {
        for label in self.labels.drain(..) {
            surface.destroy(label.handle);
        }
        self.visibility.clear();

        let Dataset {
            annotations,
            encounters,
            levels,
        } = dataset;
        self.chunks.set_data(encounters, levels, surface);

        let total = annotations.len();
        let annotations: Vec<Annotation> = annotations
            .into_iter()
            .filter(|a| a.world_x.is_finite() && a.world_y.is_finite())
            .collect();
        if annotations.len() < total {
            warn!(
                dropped = total - annotations.len(),
                "dropped annotations with non-finite coordinates"
            );
        }

        self.labels = annotations
            .into_iter()
            .map(|annotation| {
                let size = surface.measure_label(&annotation.text, annotation.category);
                let handle = surface.create_box(ScreenPoint::new(0.0, 0.0), size);
                surface.set_visible(handle, false);
                let matched = self
                    .search
                    .as_ref()
                    .is_some_and(|f| f.is_match(&annotation.text));
                surface.set_highlighted(handle, matched);
                PlacedLabel {
                    annotation,
                    handle,
                    size,
                    matched,
                }
            })
            .collect();
        info!(labels = self.labels.len(), "loaded annotations");

        self.refresh_now(view, surface)
    }

    /// Pan, zoom or resize happened. Starts (or restarts) the debounce.
    pub fn on_viewport_change(&mut self, now: f64) {
        self.scheduler.notify(now);
    }

    /// Timer expiry. Runs a pass if the debounce deadline has passed.
    pub fn tick<V, S>(&mut self, now: f64, view: &V, surface: &mut S) -> Option<PassSummary>
    where
        V: MapView + ?Sized,
        S: LabelSurface + ?Sized,
    {
        if !self.scheduler.poll(now) {
            return None;
        }
        Some(self.run_pass(view, surface))
    }

    /// A zoom change the engine requested has been applied by the host.
    pub fn on_zoom_settled<V, S>(&mut self, view: &V, surface: &mut S) -> Option<PassSummary>
    where
        V: MapView + ?Sized,
        S: LabelSurface + ?Sized,
    {
        if !std::mem::take(&mut self.awaiting_zoom) {
            return None;
        }
        Some(self.refresh_now(view, surface))
    }

    /// Toggle chunk aggregation. Turning it on may first request a zoom-in,
    /// in which case boxes appear once the zoom settles.
    pub fn set_aggregation<V, S>(&mut self, enabled: bool, view: &mut V, surface: &mut S) -> PassSummary
    where
        V: MapView + ?Sized,
        S: LabelSurface + ?Sized,
    {
        self.chunks.set_enabled(enabled);
        self.awaiting_zoom = false;
        if enabled
            && self
                .chunks
                .ensure_minimum_zoom(&self.transform, self.search.as_ref(), view)
        {
            self.awaiting_zoom = true;
            self.scheduler.cancel();
            let (labels_visible, labels_hidden) = self.resolve_labels(&*view, surface);
            return PassSummary {
                chunks: ChunkRefreshStats::default(),
                labels_visible,
                labels_hidden,
            };
        }
        self.refresh_now(&*view, surface)
    }

    pub fn set_category_visible<V, S>(
        &mut self,
        category: Category,
        visible: bool,
        view: &V,
        surface: &mut S,
    ) -> PassSummary
    where
        V: MapView + ?Sized,
        S: LabelSurface + ?Sized,
    {
        if visible {
            self.hidden_categories.remove(&category);
        } else {
            self.hidden_categories.insert(category);
        }
        self.refresh_now(view, surface)
    }

    /// Apply a new free-text search and re-render immediately.
    pub fn set_search<V, S>(&mut self, query: &str, view: &V, surface: &mut S) -> PassSummary
    where
        V: MapView + ?Sized,
        S: LabelSurface + ?Sized,
    {
        self.search = SearchFilter::compile(query);
        debug!(query = self.search.as_ref().map(SearchFilter::query), "search changed");
        for label in &mut self.labels {
            let matched = self
                .search
                .as_ref()
                .is_some_and(|f| f.is_match(&label.annotation.text));
            if matched != label.matched {
                surface.set_highlighted(label.handle, matched);
            }
            label.matched = matched;
        }
        self.refresh_now(view, surface)
    }

    /// Immediate pass, superseding any pending debounced one.
    pub fn refresh_now<V, S>(&mut self, view: &V, surface: &mut S) -> PassSummary
    where
        V: MapView + ?Sized,
        S: LabelSurface + ?Sized,
    {
        self.scheduler.cancel();
        self.run_pass(view, surface)
    }

    fn run_pass<V, S>(&mut self, view: &V, surface: &mut S) -> PassSummary
    where
        V: MapView + ?Sized,
        S: LabelSurface + ?Sized,
    {
        if !self.transform.is_ready() {
            debug!("refresh before world size is known");
            return PassSummary::default();
        }
        // A completed chunk refresh supersedes any zoom the host never confirmed.
        if std::mem::take(&mut self.awaiting_zoom) {
            debug!("pending zoom request consumed by refresh");
        }
        let chunks = self
            .chunks
            .refresh(&self.transform, self.search.as_ref(), view, surface);
        let (labels_visible, labels_hidden) = self.resolve_labels(view, surface);
        PassSummary {
            chunks,
            labels_visible,
            labels_hidden,
        }
    }

    /// Position every point label and decide which ones are shown.
    fn resolve_labels<V, S>(&mut self, view: &V, surface: &mut S) -> (usize, usize)
    where
        V: MapView + ?Sized,
        S: LabelSurface + ?Sized,
    {
        if !self.transform.is_ready() {
            return (0, 0);
        }
        let searching = self.search.is_some();
        let mut order: Vec<usize> = Vec::with_capacity(self.labels.len());
        let mut filtered_out = 0;

        for (idx, label) in self.labels.iter().enumerate() {
            let shown = self.is_category_visible(label.annotation.category)
                && (!searching || label.matched);
            if !shown {
                surface.set_visible(label.handle, false);
                self.visibility.insert(label.annotation.id, false);
                filtered_out += 1;
                continue;
            }
            order.push(idx);
        }

        // Total order: category priority, then load order.
        order.sort_by_key(|&idx| {
            let a = &self.labels[idx].annotation;
            (std::cmp::Reverse(a.base_priority), a.id)
        });

        let candidates: Vec<LabelBox> = order
            .iter()
            .map(|&idx| {
                let label = &self.labels[idx];
                let a = &label.annotation;
                let p = view.project_to_screen(self.transform.to_viewport(a.world_x, a.world_y));
                surface.update_box(
                    label.handle,
                    ScreenPoint::new(p.x + label.size.width / 2.0, p.y + label.size.height / 2.0),
                    label.size,
                );
                LabelBox {
                    annotation_id: a.id,
                    screen_x: p.x,
                    screen_y: p.y,
                    width: label.size.width,
                    height: label.size.height,
                    priority_score: label.priority_score(),
                }
            })
            .collect();

        let Resolution { visible, hidden } = resolve(view.size(), &candidates);
        let handles: HashMap<AnnotationId, BoxHandle> = order
            .iter()
            .map(|&idx| (self.labels[idx].annotation.id, self.labels[idx].handle))
            .collect();
        for (ids, shown) in [(&visible, true), (&hidden, false)] {
            for id in ids {
                if let Some(&handle) = handles.get(id) {
                    surface.set_visible(handle, shown);
                }
                self.visibility.insert(*id, shown);
            }
        }

        debug!(
            visible = visible.len(),
            collided = hidden.len(),
            filtered_out,
            "label collision pass"
        );
        (visible.len(), hidden.len() + filtered_out)
    }
}
