//! Raw JSON record parsing at the data-loading boundary.
//!
//! Every parser is lenient: a malformed entry is counted in `skipped` and the
//! rest of the batch still loads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::annotation::PointRecord;
use crate::chunk::{ChunkIndex, ChunkKey};
use crate::levels::MonsterLevels;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Parsed<T> {
    pub value: T,
    pub skipped: usize,
}

/// A two-ended transport link in world space, in one canonical shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortalLink {
    pub a: [f64; 2],
    pub b: [f64; 2],
    #[serde(default)]
    pub one_way: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PortalData {
    pub links: Vec<PortalLink>,
    pub labels: Vec<PointRecord>,
    pub skipped: usize,
}

fn finite(value: Option<&Value>) -> Option<f64> {
    value.and_then(Value::as_f64).filter(|v| v.is_finite())
}

fn xy(value: Option<&Value>) -> Option<[f64; 2]> {
    let obj = value?.as_object()?;
    Some([finite(obj.get("x"))?, finite(obj.get("y"))?])
}

fn as_array(value: &Value) -> &[Value] {
    value.as_array().map(Vec::as_slice).unwrap_or(&[])
}

/// `{name, x, y}` with a non-empty name and finite coordinates.
pub fn point_record(item: &Value) -> Option<PointRecord> {
    let obj = item.as_object()?;
    let name = obj.get("name")?.as_str()?;
    if name.trim().is_empty() {
        return None;
    }
    Some(PointRecord {
        name: name.to_string(),
        x: finite(obj.get("x"))?,
        y: finite(obj.get("y"))?,
    })
}

/// Town / point-of-interest lists. A non-array source loads as empty.
pub fn parse_points(value: &Value) -> Parsed<Vec<PointRecord>> {
    let mut out: Parsed<Vec<PointRecord>> = Parsed::default();
    for item in as_array(value) {
        match point_record(item) {
            Some(record) => out.value.push(record),
            None => out.skipped += 1,
        }
    }
    out
}

/// Accepts `entry/exit`, `from/to`, `a/b` and flat `x1/y1/x2/y2` shapes.
pub fn portal_link(item: &Value) -> Option<PortalLink> {
    let obj = item.as_object()?;
    let pair = [("entry", "exit"), ("from", "to"), ("a", "b")]
        .into_iter()
        .find_map(|(first, second)| Some((xy(obj.get(first))?, xy(obj.get(second))?)));
    let (a, b) = match pair {
        Some(pair) => pair,
        None => (
            [finite(obj.get("x1"))?, finite(obj.get("y1"))?],
            [finite(obj.get("x2"))?, finite(obj.get("y2"))?],
        ),
    };
    let one_way = obj.get("dir").and_then(Value::as_str) == Some("one");
    Some(PortalLink { a, b, one_way })
}

/// Portal sources mix links and standalone labels in one list.
pub fn parse_portals(value: &Value) -> PortalData {
    let mut out = PortalData::default();
    for item in as_array(value) {
        if let Some(link) = portal_link(item) {
            out.links.push(link);
        } else if let Some(label) = point_record(item) {
            out.labels.push(label);
        } else {
            out.skipped += 1;
        }
    }
    out
}

/// Caves arrive either as a bare array or wrapped in `{ "items": [...] }`.
pub fn parse_caves(value: &Value) -> Parsed<Vec<PortalLink>> {
    let items = match value.get("items") {
        Some(items) => as_array(items),
        None => as_array(value),
    };
    let mut out: Parsed<Vec<PortalLink>> = Parsed::default();
    for item in items {
        let link = item.as_object().and_then(|obj| {
            Some(PortalLink {
                a: xy(obj.get("entry"))?,
                b: xy(obj.get("exit"))?,
                one_way: false,
            })
        });
        match link {
            Some(link) => out.value.push(link),
            None => out.skipped += 1,
        }
    }
    out
}

/// `"cx,cy" -> [names]`. Bad keys, non-list values and non-string names are skipped.
pub fn parse_encounters(value: &Value) -> Parsed<ChunkIndex> {
    let Some(obj) = value.as_object() else {
        return Parsed::default();
    };
    let mut skipped = 0;
    let mut lists = Vec::with_capacity(obj.len());
    for (raw_key, names) in obj {
        let (Ok(key), Some(names)) = (raw_key.parse::<ChunkKey>(), names.as_array()) else {
            skipped += 1;
            continue;
        };
        let mut kept = Vec::with_capacity(names.len());
        for name in names {
            match name.as_str().filter(|n| !n.trim().is_empty()) {
                Some(name) => kept.push(name.to_string()),
                None => skipped += 1,
            }
        }
        lists.push((key, kept));
    }
    Parsed {
        value: ChunkIndex::from_lists(lists),
        skipped,
    }
}

/// `name -> level`. Levels may be numbers or numeric strings.
pub fn parse_monster_levels(value: &Value) -> Parsed<MonsterLevels> {
    let Some(obj) = value.as_object() else {
        return Parsed::default();
    };
    let mut skipped = 0;
    let mut pairs = Vec::with_capacity(obj.len());
    for (name, level) in obj {
        let level = match level {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|l| l.is_finite());
        match level {
            Some(level) if !name.trim().is_empty() => pairs.push((name, level.round() as i64)),
            _ => skipped += 1,
        }
    }
    Parsed {
        value: MonsterLevels::from_pairs(pairs),
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parse_points_skips_malformed_entries() {
        let parsed = parse_points(&json!([
            {"name": "Ragni", "x": 10, "y": 20.5},
            {"name": "NoCoords"},
            {"x": 1, "y": 2},
            {"name": "", "x": 1, "y": 2},
            {"name": "Text", "x": "1", "y": 2},
            7
        ]));
        assert_eq!(parsed.value.len(), 1);
        assert_eq!(parsed.value[0].name, "Ragni");
        assert_eq!(parsed.value[0].y, 20.5);
        assert_eq!(parsed.skipped, 5);
    }

    #[test]
    fn parse_points_non_array_is_empty() {
        let parsed = parse_points(&json!({"name": "x"}));
        assert!(parsed.value.is_empty());
        assert_eq!(parsed.skipped, 0);
    }

    #[test]
    fn portal_shapes_normalize_to_one_link() {
        let shapes = [
            json!({"entry": {"x": 1, "y": 2}, "exit": {"x": 3, "y": 4}}),
            json!({"from": {"x": 1, "y": 2}, "to": {"x": 3, "y": 4}}),
            json!({"a": {"x": 1, "y": 2}, "b": {"x": 3, "y": 4}}),
            json!({"x1": 1, "y1": 2, "x2": 3, "y2": 4}),
        ];
        for shape in &shapes {
            let link = portal_link(shape).expect("shape should normalize");
            assert_eq!(link.a, [1.0, 2.0]);
            assert_eq!(link.b, [3.0, 4.0]);
            assert!(!link.one_way);
        }
    }

    #[test]
    fn parse_portals_splits_links_and_labels() {
        let data = parse_portals(&json!([
            {"from": {"x": 0, "y": 0}, "to": {"x": 5, "y": 5}, "dir": "one"},
            {"name": "Nether Gate", "x": 9, "y": 9},
            {"from": {"x": 0}, "to": {"x": 5, "y": 5}}
        ]));
        assert_eq!(data.links.len(), 1);
        assert!(data.links[0].one_way);
        assert_eq!(data.labels.len(), 1);
        assert_eq!(data.labels[0].name, "Nether Gate");
        assert_eq!(data.skipped, 1);
    }

    #[test]
    fn parse_caves_accepts_wrapped_items() {
        let cave = json!({"entry": {"x": 1, "y": 1}, "exit": {"x": 2, "y": 2}});
        assert_eq!(parse_caves(&json!([cave.clone()])).value.len(), 1);
        assert_eq!(parse_caves(&json!({"items": [cave]})).value.len(), 1);
        assert_eq!(parse_caves(&json!({"items": [{"entry": {}}]})).skipped, 1);
    }

    #[test]
    fn parse_encounters_builds_sorted_index() {
        let parsed = parse_encounters(&json!({
            "0,0": ["Slime", "Bat", "Slime"],
            "1,bad": ["Wolf"],
            "2,2": "Wolf",
            "3,3": ["Ghoul", 4]
        }));
        let index = parsed.value;
        assert_eq!(index.names(ChunkKey::new(0, 0)), ["Bat", "Slime"]);
        assert_eq!(index.names(ChunkKey::new(3, 3)), ["Ghoul"]);
        assert!(index.names(ChunkKey::new(1, 1)).is_empty());
        assert_eq!(parsed.skipped, 3);
    }

    #[test]
    fn parse_monster_levels_accepts_numeric_strings() {
        let parsed = parse_monster_levels(&json!({
            "Ancient Golem": 120,
            "Slime": "3",
            "Broken": "lots",
            "Nothing": null
        }));
        assert_eq!(parsed.value.level("ancient golem"), Some(120));
        assert_eq!(parsed.value.level("slime"), Some(3));
        assert_eq!(parsed.value.len(), 2);
        assert_eq!(parsed.skipped, 2);
    }
}
