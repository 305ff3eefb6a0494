use std::path::PathBuf;

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_WORLD_WIDTH: f64 = 4096.0;
pub const DEFAULT_WORLD_HEIGHT: f64 = 6144.0;
pub const DEFAULT_VIEW_WIDTH: f64 = 1280.0;
pub const DEFAULT_VIEW_HEIGHT: f64 = 800.0;

// Zoom range around the fit-to-world zoom.
pub const ZOOM_OUT_EXTRA: f64 = 3.0;
pub const ZOOM_IN_EXTRA: f64 = 6.0;

pub const FRAME_MS: u64 = 16;

pub fn data_dir() -> PathBuf {
    std::env::var("ATLAS_DATA_DIR")
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

pub fn world_size() -> Result<(f64, f64), String> {
    Ok((
        dimension("ATLAS_WORLD_WIDTH", DEFAULT_WORLD_WIDTH)?,
        dimension("ATLAS_WORLD_HEIGHT", DEFAULT_WORLD_HEIGHT)?,
    ))
}

pub fn view_size() -> Result<(f64, f64), String> {
    Ok((
        dimension("ATLAS_VIEW_WIDTH", DEFAULT_VIEW_WIDTH)?,
        dimension("ATLAS_VIEW_HEIGHT", DEFAULT_VIEW_HEIGHT)?,
    ))
}

/// Optional search applied after the scripted gestures.
pub fn search_query() -> Option<String> {
    std::env::var("ATLAS_SEARCH")
        .ok()
        .filter(|value| !value.trim().is_empty())
}

/// Unset falls back to `default`; a set but unusable value is an error.
fn dimension(name: &str, default: f64) -> Result<f64, String> {
    let Ok(raw) = std::env::var(name) else {
        return Ok(default);
    };
    raw.trim()
        .parse::<f64>()
        .map_err(|e| format!("{name}={raw:?}: {e}"))
        .and_then(|value| {
            if value.is_finite() && value > 0.0 {
                Ok(value)
            } else {
                Err(format!("{name}={raw:?}: must be a positive number"))
            }
        })
}
