mod config;
mod data;

use std::time::Duration;

use atlas_engine::{
    Clock, EngineConfig, FlatViewport, HeadlessSurface, LayoutEngine, MapView, PassSummary,
    SystemClock,
};
use atlas_shared::{Category, ChunkKey, ELITE_RADIUS};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

/// One scripted user gesture.
#[derive(Debug, Clone, Copy)]
enum Gesture {
    Pan(f64, f64),
    ZoomBy(f64),
    Resize(f64, f64),
}

const SCRIPT: &[Gesture] = &[
    Gesture::ZoomBy(1.0),
    Gesture::Pan(40.0, 0.0),
    Gesture::Pan(40.0, 10.0),
    Gesture::Pan(40.0, 20.0),
    Gesture::ZoomBy(1.0),
    Gesture::Pan(-120.0, -60.0),
    Gesture::Resize(1024.0, 768.0),
    Gesture::ZoomBy(-1.0),
    Gesture::Pan(0.0, 80.0),
];

fn apply(view: &mut FlatViewport, gesture: Gesture) {
    match gesture {
        Gesture::Pan(dx, dy) => view.pan(dx, dy),
        Gesture::ZoomBy(step) => {
            let zoom = view.zoom() + step;
            view.set_zoom(zoom);
        }
        Gesture::Resize(width, height) => view.resize(width, height),
    }
}

fn log_pass(label: &str, summary: &PassSummary) {
    info!(
        pass = label,
        chunks = summary.chunks.visible,
        chunks_created = summary.chunks.created,
        chunks_relaid = summary.chunks.relaid,
        labels_visible = summary.labels_visible,
        labels_hidden = summary.labels_hidden,
        "layout pass"
    );
}

/// Sleep until the pending debounce deadline, then run the pass.
async fn settle(
    engine: &mut LayoutEngine,
    clock: &SystemClock,
    view: &FlatViewport,
    surface: &mut HeadlessSurface,
) -> Option<PassSummary> {
    let mut last = None;
    while let Some(deadline) = engine.next_deadline() {
        let wait_ms = (deadline - clock.now_ms()).max(0.0);
        tokio::time::sleep(Duration::from_secs_f64(wait_ms / 1000.0)).await;
        if let Some(summary) = engine.tick(clock.now_ms(), view, surface) {
            last = Some(summary);
        }
    }
    last
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let (world_width, world_height) = match config::world_size() {
        Ok(size) => size,
        Err(e) => {
            error!(error = %e, "invalid world size");
            return;
        }
    };
    let (view_width, view_height) = match config::view_size() {
        Ok(size) => size,
        Err(e) => {
            error!(error = %e, "invalid view size");
            return;
        }
    };

    let data_dir = config::data_dir();
    info!(data_dir = %data_dir.display(), "loading data");
    let loaded = match data::load(&data_dir).await {
        Ok(loaded) => loaded,
        Err(e) => {
            error!(error = %e, "failed to load data");
            return;
        }
    };

    let engine_config = EngineConfig::from_env();
    debug!(?engine_config, "engine config");
    let mut engine = LayoutEngine::new(engine_config);
    engine.set_world_size(world_width, world_height);

    let mut view = FlatViewport::new(view_width, view_height);
    let corner_a = engine.transform().to_viewport(0.0, 0.0);
    let corner_b = engine.transform().to_viewport(world_width, world_height);
    let fit = view.fit_bounds(corner_a, corner_b);
    view.set_zoom_limits(fit - config::ZOOM_OUT_EXTRA, fit + config::ZOOM_IN_EXTRA);
    info!(fit_zoom = fit, "view fitted to world");

    for category in Category::ALL {
        let count = loaded
            .dataset
            .annotations
            .iter()
            .filter(|a| a.category == category)
            .count();
        info!(category = category.as_str(), count, "annotations by category");
    }

    let mut surface = HeadlessSurface::new();
    let first_town = loaded.dataset.annotations.first().cloned();
    let summary = engine.load(loaded.dataset, &view, &mut surface);
    log_pass("load", &summary);

    if let Some(town) = first_town {
        view.center_on(engine.transform().to_viewport(town.world_x, town.world_y));
        info!(town = %town.text, "centred on first label");
        if let Some(key) = ChunkKey::containing(town.world_x, town.world_y) {
            let area = key.neighbourhood_bounds(ELITE_RADIUS);
            info!(
                chunk = %key,
                left = area.left(),
                top = area.top(),
                width = area.width(),
                height = area.height(),
                "elite area around first label"
            );
        }
    }

    let summary = engine.set_aggregation(true, &mut view, &mut surface);
    log_pass("aggregation on", &summary);
    // FlatViewport applies zoom synchronously, so the zoom has already settled.
    if let Some(summary) = engine.on_zoom_settled(&view, &mut surface) {
        log_pass("zoom settled", &summary);
    }

    let clock = SystemClock::default();
    let mut passes = 0usize;
    for gesture in SCRIPT {
        apply(&mut view, *gesture);
        engine.on_viewport_change(clock.now_ms());
        tokio::time::sleep(Duration::from_millis(config::FRAME_MS)).await;
        if let Some(summary) = engine.tick(clock.now_ms(), &view, &mut surface) {
            passes += 1;
            log_pass("gesture", &summary);
        }
    }
    if let Some(summary) = settle(&mut engine, &clock, &view, &mut surface).await {
        passes += 1;
        log_pass("settled", &summary);
    }
    info!(gestures = SCRIPT.len(), passes, "gesture burst finished");

    if let Some(query) = config::search_query() {
        let summary = engine.set_search(&query, &view, &mut surface);
        log_pass("search", &summary);
    }

    info!(
        boxes = surface.len(),
        visible = surface.visible_count(),
        chunk_boxes = engine.chunks().len(),
        skipped_records = loaded.skipped,
        zoom = view.zoom(),
        "simulation finished"
    );
}
