use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Town,
    Poi,
    Portal,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Town, Category::Poi, Category::Portal];

    /// Base placement priority. Towns outrank portals and points of interest.
    pub const fn base_priority(self) -> u32 {
        match self {
            Category::Town => 3,
            Category::Poi | Category::Portal => 2,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Category::Town => "town",
            Category::Poi => "poi",
            Category::Portal => "portal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnnotationId(pub u32);

/// A named point in world space, as delivered by the data sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointRecord {
    pub name: String,
    pub x: f64,
    pub y: f64,
}

/// A labelled point. Never mutated after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: AnnotationId,
    pub world_x: f64,
    pub world_y: f64,
    pub text: String,
    pub category: Category,
    pub base_priority: u32,
}

impl Annotation {
    pub fn new(id: AnnotationId, record: PointRecord, category: Category) -> Self {
        Self {
            id,
            world_x: record.x,
            world_y: record.y,
            text: record.name,
            category,
            base_priority: category.base_priority(),
        }
    }
}

/// Assigns sequential ids across several record batches, in the order given.
pub fn number_annotations<I>(batches: I) -> Vec<Annotation>
where
    I: IntoIterator<Item = (Category, Vec<PointRecord>)>,
{
    let mut out = Vec::new();
    for (category, records) in batches {
        for record in records {
            let id = AnnotationId(out.len() as u32);
            out.push(Annotation::new(id, record, category));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(name: &str, x: f64, y: f64) -> PointRecord {
        PointRecord {
            name: name.to_string(),
            x,
            y,
        }
    }

    #[test]
    fn towns_outrank_portals_and_pois() {
        assert!(Category::Town.base_priority() > Category::Portal.base_priority());
        assert_eq!(
            Category::Portal.base_priority(),
            Category::Poi.base_priority()
        );
        assert!(Category::ALL.iter().all(|c| c.base_priority() >= 2));
    }

    #[test]
    fn category_names_are_distinct() {
        let names: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
        assert_eq!(names, ["town", "poi", "portal"]);
    }

    #[test]
    fn number_annotations_is_sequential_across_batches() {
        let annotations = number_annotations([
            (Category::Town, vec![point("Ragni", 1.0, 2.0)]),
            (
                Category::Portal,
                vec![point("Gate", 3.0, 4.0), point("Rift", 5.0, 6.0)],
            ),
        ]);
        let ids: Vec<u32> = annotations.iter().map(|a| a.id.0).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(annotations[2].text, "Rift");
        assert_eq!(annotations[2].category, Category::Portal);
        assert_eq!(annotations[0].base_priority, 3);
    }

    #[test]
    fn category_serializes_lowercase() {
        let json = serde_json::to_string(&Category::Poi).expect("serialize category");
        assert_eq!(json, "\"poi\"");
    }
}
