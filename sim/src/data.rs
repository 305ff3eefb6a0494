use std::path::Path;

use atlas_engine::Dataset;
use atlas_shared::records::{
    parse_caves, parse_encounters, parse_monster_levels, parse_points, parse_portals,
};
use atlas_shared::{Category, number_annotations};
use serde_json::Value;
use tracing::{info, warn};

pub const TOWNS_FILE: &str = "towns.json";
pub const PORTALS_FILE: &str = "portals.json";
pub const ENCOUNTERS_FILE: &str = "encounters.json";
pub const CAVES_FILE: &str = "caves.json";
pub const POIS_FILE: &str = "poi.json";
pub const MONSTER_LEVELS_FILE: &str = "monster_levels.json";

/// Raw JSON per source file. `None` when the file is absent.
#[derive(Debug, Clone, Default)]
pub struct Sources {
    pub towns: Option<Value>,
    pub portals: Option<Value>,
    pub encounters: Option<Value>,
    pub caves: Option<Value>,
    pub pois: Option<Value>,
    pub monster_levels: Option<Value>,
}

#[derive(Debug, Clone, Default)]
pub struct LoadedData {
    pub dataset: Dataset,
    pub skipped: usize,
}

/// Missing files load as `None`; unreadable or invalid files are errors.
pub async fn read_json(path: &Path) -> Result<Option<Value>, String> {
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(format!("failed to read {}: {e}", path.display())),
    };
    serde_json::from_str(&text)
        .map(Some)
        .map_err(|e| format!("invalid JSON in {}: {e}", path.display()))
}

pub async fn load(dir: &Path) -> Result<LoadedData, String> {
    let sources = Sources {
        towns: read_json(&dir.join(TOWNS_FILE)).await?,
        portals: read_json(&dir.join(PORTALS_FILE)).await?,
        encounters: read_json(&dir.join(ENCOUNTERS_FILE)).await?,
        caves: read_json(&dir.join(CAVES_FILE)).await?,
        pois: read_json(&dir.join(POIS_FILE)).await?,
        monster_levels: read_json(&dir.join(MONSTER_LEVELS_FILE)).await?,
    };
    Ok(assemble(&sources))
}

fn report_skipped(source: &str, count: usize) -> usize {
    if count > 0 {
        warn!(source, skipped = count, "skipped malformed records");
    }
    count
}

pub fn assemble(sources: &Sources) -> LoadedData {
    let null = Value::Null;
    let towns = parse_points(sources.towns.as_ref().unwrap_or(&null));
    let portals = parse_portals(sources.portals.as_ref().unwrap_or(&null));
    let pois = parse_points(sources.pois.as_ref().unwrap_or(&null));
    let caves = parse_caves(sources.caves.as_ref().unwrap_or(&null));
    let encounters = parse_encounters(sources.encounters.as_ref().unwrap_or(&null));
    let levels = parse_monster_levels(sources.monster_levels.as_ref().unwrap_or(&null));

    let skipped = report_skipped(TOWNS_FILE, towns.skipped)
        + report_skipped(PORTALS_FILE, portals.skipped)
        + report_skipped(POIS_FILE, pois.skipped)
        + report_skipped(CAVES_FILE, caves.skipped)
        + report_skipped(ENCOUNTERS_FILE, encounters.skipped)
        + report_skipped(MONSTER_LEVELS_FILE, levels.skipped);

    let annotations = number_annotations([
        (Category::Town, towns.value),
        (Category::Portal, portals.labels),
        (Category::Poi, pois.value),
    ]);
    info!(
        annotations = annotations.len(),
        portal_links = portals.links.len(),
        cave_links = caves.value.len(),
        encounter_chunks = encounters.value.len(),
        "data assembled"
    );

    LoadedData {
        dataset: Dataset {
            annotations,
            encounters: encounters.value,
            levels: levels.value,
        },
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use atlas_shared::{AnnotationId, ChunkKey};
    use serde_json::json;

    use super::*;

    #[test]
    fn assemble_numbers_towns_then_portals_then_pois() {
        let sources = Sources {
            towns: Some(json!([{"name": "Ragni", "x": 10, "y": 20}])),
            portals: Some(json!([
                {"name": "Gate", "x": 1, "y": 2},
                {"from": {"x": 0, "y": 0}, "to": {"x": 5, "y": 5}, "dir": "one"}
            ])),
            pois: Some(json!([{"name": "Well", "x": 3, "y": 4}, {"name": "Broken"}])),
            ..Sources::default()
        };
        let loaded = assemble(&sources);
        let names: Vec<(&str, Category)> = loaded
            .dataset
            .annotations
            .iter()
            .map(|a| (a.text.as_str(), a.category))
            .collect();
        assert_eq!(
            names,
            vec![
                ("Ragni", Category::Town),
                ("Gate", Category::Portal),
                ("Well", Category::Poi)
            ]
        );
        assert_eq!(loaded.dataset.annotations[2].id, AnnotationId(2));
        assert_eq!(loaded.skipped, 1, "only the nameless POI is skipped");
    }

    #[test]
    fn assemble_tolerates_missing_sources() {
        let loaded = assemble(&Sources::default());
        assert!(loaded.dataset.annotations.is_empty());
        assert!(loaded.dataset.encounters.is_empty());
        assert!(loaded.dataset.levels.is_empty());
        assert_eq!(loaded.skipped, 0);
    }

    #[test]
    fn assemble_reads_encounters_levels_and_wrapped_caves() {
        let sources = Sources {
            encounters: Some(json!({"0,0": ["Slime", "Slime"], "bad": ["Wolf"]})),
            monster_levels: Some(json!({"Slime": "3", "Dragon": 110})),
            caves: Some(json!({"items": [{"entry": {"x": 1, "y": 1}, "exit": {"x": 2, "y": 2}}]})),
            ..Sources::default()
        };
        let loaded = assemble(&sources);
        assert_eq!(loaded.dataset.encounters.names(ChunkKey::new(0, 0)), ["Slime"]);
        assert_eq!(loaded.dataset.levels.level("dragon"), Some(110));
        assert_eq!(loaded.skipped, 1, "the unparsable chunk key");
    }

    #[tokio::test]
    async fn missing_file_reads_as_none() {
        let path = std::env::temp_dir().join("atlas-sim-definitely-missing.json");
        assert_eq!(read_json(&path).await, Ok(None));
    }

    #[tokio::test]
    async fn invalid_json_is_an_error() {
        let path = std::env::temp_dir().join(format!("atlas-sim-invalid-{}.json", std::process::id()));
        tokio::fs::write(&path, "{ not json").await.expect("write fixture");
        let result = read_json(&path).await;
        let _ = tokio::fs::remove_file(&path).await;
        let err = result.expect_err("invalid JSON");
        assert!(err.starts_with("invalid JSON"), "{err}");
    }

    #[tokio::test]
    async fn load_reads_a_data_directory() {
        let dir = std::env::temp_dir().join(format!("atlas-sim-data-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.expect("create dir");
        tokio::fs::write(dir.join(TOWNS_FILE), r#"[{"name": "Ragni", "x": 1, "y": 2}]"#)
            .await
            .expect("write towns");
        tokio::fs::write(dir.join(ENCOUNTERS_FILE), r#"{"3,4": ["Bat"]}"#)
            .await
            .expect("write encounters");
        let loaded = load(&dir).await;
        let _ = tokio::fs::remove_dir_all(&dir).await;

        let loaded = loaded.expect("load");
        assert_eq!(loaded.dataset.annotations.len(), 1);
        assert_eq!(loaded.dataset.encounters.names(ChunkKey::new(3, 4)), ["Bat"]);
    }
}
