/// A point in the host map's projected space (`y` grows upward).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportPoint {
    pub x: f64,
    pub y: f64,
}

impl ViewportPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A pixel position relative to the top-left of the visible map container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenSize {
    pub width: f64,
    pub height: f64,
}

impl ScreenSize {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn fits_within(&self, other: ScreenSize) -> bool {
        self.width <= other.width && self.height <= other.height
    }
}

/// What the engine needs from the host pan/zoom map widget.
pub trait MapView {
    fn project_to_screen(&self, point: ViewportPoint) -> ScreenPoint;

    /// The two opposite corners of the visible area in projected space.
    /// Corner order is not guaranteed.
    fn visible_bounds(&self) -> (ViewportPoint, ViewportPoint);

    fn size(&self) -> ScreenSize;
    fn zoom(&self) -> f64;

    /// Request a zoom change. The host may clamp it and may apply it
    /// asynchronously; it reports completion through `on_zoom_settled`.
    fn set_zoom(&mut self, zoom: f64);

    fn min_zoom(&self) -> f64;
    fn max_zoom(&self) -> f64;

    /// Zoom granularity, or `0.0` for continuous zoom.
    fn zoom_snap(&self) -> f64 {
        0.0
    }

    /// The zoom at which everything appears `scale` times larger than at `from_zoom`.
    fn scale_zoom(&self, scale: f64, from_zoom: f64) -> f64 {
        from_zoom + scale.log2()
    }
}

/// Pan/zoom over a flat projected plane, `scale = 2^zoom` pixels per unit.
/// Zoom changes apply synchronously.
#[derive(Debug, Clone)]
pub struct FlatViewport {
    pub offset_x: f64,
    pub offset_y: f64,
    zoom: f64,
    min_zoom: f64,
    max_zoom: f64,
    zoom_snap: f64,
    width: f64,
    height: f64,
}

const DEFAULT_MIN_ZOOM: f64 = -8.0;
const DEFAULT_MAX_ZOOM: f64 = 8.0;

impl FlatViewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 0.0,
            zoom: 0.0,
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            zoom_snap: 1.0,
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    pub fn with_zoom_snap(mut self, snap: f64) -> Self {
        self.zoom_snap = snap.max(0.0);
        self
    }

    pub fn scale(&self) -> f64 {
        self.zoom.exp2()
    }

    pub fn set_zoom_limits(&mut self, min_zoom: f64, max_zoom: f64) {
        self.min_zoom = min_zoom.min(max_zoom);
        self.max_zoom = max_zoom.max(min_zoom);
        self.zoom = self.zoom.clamp(self.min_zoom, self.max_zoom);
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width.max(0.0);
        self.height = height.max(0.0);
    }

    /// Convert screen coordinates back to projected space.
    pub fn screen_to_viewport(&self, sx: f64, sy: f64) -> ViewportPoint {
        let scale = self.scale();
        ViewportPoint::new((sx - self.offset_x) / scale, -(sy - self.offset_y) / scale)
    }

    fn limit_zoom(&self, zoom: f64) -> f64 {
        let zoom = if self.zoom_snap > 0.0 {
            (zoom / self.zoom_snap).round() * self.zoom_snap
        } else {
            zoom
        };
        zoom.clamp(self.min_zoom, self.max_zoom)
    }

    /// Zoom so the projected point under `(screen_x, screen_y)` stays fixed.
    pub fn zoom_at(&mut self, zoom: f64, screen_x: f64, screen_y: f64) {
        let new_zoom = self.limit_zoom(zoom);
        let ratio = (new_zoom - self.zoom).exp2();

        self.offset_x = screen_x - (screen_x - self.offset_x) * ratio;
        self.offset_y = screen_y - (screen_y - self.offset_y) * ratio;
        self.zoom = new_zoom;
    }

    /// Pan by screen-space delta.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.offset_x += dx;
        self.offset_y += dy;
    }

    /// Centre on a projected point at the current zoom.
    pub fn center_on(&mut self, point: ViewportPoint) {
        let scale = self.scale();
        self.offset_x = self.width / 2.0 - point.x * scale;
        self.offset_y = self.height / 2.0 + point.y * scale;
    }

    /// Fit the given projected rectangle inside the view, snapping the zoom
    /// down so nothing is cropped. Returns the chosen zoom.
    pub fn fit_bounds(&mut self, a: ViewportPoint, b: ViewportPoint) -> f64 {
        let span_x = (a.x - b.x).abs();
        let span_y = (a.y - b.y).abs();
        if span_x <= 0.0 || span_y <= 0.0 || self.width <= 0.0 || self.height <= 0.0 {
            return self.zoom;
        }

        let fit = (self.width / span_x).min(self.height / span_y).log2();
        let fit = if self.zoom_snap > 0.0 {
            (fit / self.zoom_snap).floor() * self.zoom_snap
        } else {
            fit
        };
        self.zoom = fit.clamp(self.min_zoom, self.max_zoom);
        self.center_on(ViewportPoint::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0));
        self.zoom
    }
}

impl MapView for FlatViewport {
    fn project_to_screen(&self, point: ViewportPoint) -> ScreenPoint {
        let scale = self.scale();
        ScreenPoint::new(
            point.x * scale + self.offset_x,
            -point.y * scale + self.offset_y,
        )
    }

    fn visible_bounds(&self) -> (ViewportPoint, ViewportPoint) {
        (
            self.screen_to_viewport(0.0, 0.0),
            self.screen_to_viewport(self.width, self.height),
        )
    }

    fn size(&self) -> ScreenSize {
        ScreenSize::new(self.width, self.height)
    }

    fn zoom(&self) -> f64 {
        self.zoom
    }

    fn set_zoom(&mut self, zoom: f64) {
        self.zoom_at(zoom, self.width / 2.0, self.height / 2.0);
    }

    fn min_zoom(&self) -> f64 {
        self.min_zoom
    }

    fn max_zoom(&self) -> f64 {
        self.max_zoom
    }

    fn zoom_snap(&self) -> f64 {
        self.zoom_snap
    }
}
