pub use atlas_shared::{BOSS_LEVEL, CHUNK_SIZE};

pub const MIN_CHUNK_SCREEN_PX: f64 = 26.0; // below this, chunk stacks are unreadable
pub const CHUNK_WINDOW_PAD: i64 = 1; // extra chunks around the view to avoid edge pop-in
pub const MIN_CHUNK_BOX_PX: f64 = 8.0;
pub const CHUNK_TEXT_PADDING_PX: f64 = 4.0;
pub const MAX_FONT_PX: u32 = 16;
pub const MIN_FONT_PX: u32 = 8;
pub const LINE_HEIGHT: f64 = 1.05;

pub const COLLISION_CELL_PX: f64 = 28.0;
pub const MATCH_BONUS: u32 = 100;

pub const REFRESH_DEBOUNCE_MS: f64 = 120.0;
pub const INVERT_Y: bool = true;

/// Tunables read once at engine construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    pub refresh_debounce_ms: f64,
    pub min_chunk_screen_px: f64,
    pub boss_level: i64,
    pub invert_y: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            refresh_debounce_ms: REFRESH_DEBOUNCE_MS,
            min_chunk_screen_px: MIN_CHUNK_SCREEN_PX,
            boss_level: BOSS_LEVEL,
            invert_y: INVERT_Y,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            refresh_debounce_ms: positive_f64("ATLAS_REFRESH_DEBOUNCE_MS")
                .unwrap_or(defaults.refresh_debounce_ms),
            min_chunk_screen_px: positive_f64("ATLAS_MIN_CHUNK_SCREEN_PX")
                .unwrap_or(defaults.min_chunk_screen_px),
            boss_level: std::env::var("ATLAS_BOSS_LEVEL")
                .ok()
                .and_then(|value| value.trim().parse::<i64>().ok())
                .filter(|value| *value > 0)
                .unwrap_or(defaults.boss_level),
            invert_y: flag("ATLAS_INVERT_Y").unwrap_or(defaults.invert_y),
        }
    }
}

fn positive_f64(name: &str) -> Option<f64> {
    std::env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite() && *value > 0.0)
}

fn flag(name: &str) -> Option<bool> {
    let value = std::env::var(name).ok()?;
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARS: [&str; 4] = [
        "ATLAS_REFRESH_DEBOUNCE_MS",
        "ATLAS_MIN_CHUNK_SCREEN_PX",
        "ATLAS_BOSS_LEVEL",
        "ATLAS_INVERT_Y",
    ];

    #[test]
    fn from_env_defaults_when_unset() {
        temp_env::with_vars_unset(VARS, || {
            assert_eq!(EngineConfig::from_env(), EngineConfig::default());
        });
    }

    #[test]
    fn from_env_reads_overrides() {
        temp_env::with_vars(
            [
                ("ATLAS_REFRESH_DEBOUNCE_MS", Some("250")),
                ("ATLAS_MIN_CHUNK_SCREEN_PX", Some("40.5")),
                ("ATLAS_BOSS_LEVEL", Some("90")),
                ("ATLAS_INVERT_Y", Some("off")),
            ],
            || {
                let config = EngineConfig::from_env();
                assert_eq!(config.refresh_debounce_ms, 250.0);
                assert_eq!(config.min_chunk_screen_px, 40.5);
                assert_eq!(config.boss_level, 90);
                assert!(!config.invert_y);
            },
        );
    }

    #[test]
    fn from_env_ignores_invalid_values() {
        temp_env::with_vars(
            [
                ("ATLAS_REFRESH_DEBOUNCE_MS", Some("-5")),
                ("ATLAS_MIN_CHUNK_SCREEN_PX", Some("wide")),
                ("ATLAS_BOSS_LEVEL", Some("0")),
                ("ATLAS_INVERT_Y", Some("maybe")),
            ],
            || {
                assert_eq!(EngineConfig::from_env(), EngineConfig::default());
            },
        );
    }
}
