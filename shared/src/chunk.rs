use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// World units per chunk side.
pub const CHUNK_SIZE: i64 = 16;

/// Chunks on each side of the centre chunk covered by an elite area (21×21 total).
pub const ELITE_RADIUS: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkKey {
    pub cx: i64,
    pub cy: i64,
}

impl ChunkKey {
    pub const fn new(cx: i64, cy: i64) -> Self {
        Self { cx, cy }
    }

    /// The chunk containing a world point. Returns `None` for non-finite input.
    pub fn containing(world_x: f64, world_y: f64) -> Option<Self> {
        if !world_x.is_finite() || !world_y.is_finite() {
            return None;
        }
        let size = CHUNK_SIZE as f64;
        Some(Self {
            cx: (world_x / size).floor() as i64,
            cy: (world_y / size).floor() as i64,
        })
    }

    /// World-space rectangle covered by this chunk.
    pub const fn bounds(self) -> Region {
        let x0 = self.cx * CHUNK_SIZE;
        let y0 = self.cy * CHUNK_SIZE;
        Region {
            start: [x0, y0],
            end: [x0 + CHUNK_SIZE, y0 + CHUNK_SIZE],
        }
    }

    /// World-space rectangle of the `(2r+1)²` chunks centred on this one.
    pub const fn neighbourhood_bounds(self, radius: i64) -> Region {
        Region {
            start: [
                (self.cx - radius) * CHUNK_SIZE,
                (self.cy - radius) * CHUNK_SIZE,
            ],
            end: [
                (self.cx + radius + 1) * CHUNK_SIZE,
                (self.cy + radius + 1) * CHUNK_SIZE,
            ],
        }
    }
}

impl fmt::Display for ChunkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.cx, self.cy)
    }
}

impl FromStr for ChunkKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (x, y) = s
            .split_once(',')
            .ok_or_else(|| format!("chunk key without comma: {s:?}"))?;
        let cx = x
            .trim()
            .parse::<i64>()
            .map_err(|e| format!("bad chunk x in {s:?}: {e}"))?;
        let cy = y
            .trim()
            .parse::<i64>()
            .map_err(|e| format!("bad chunk y in {s:?}: {e}"))?;
        Ok(Self { cx, cy })
    }
}

/// Axis-aligned rectangle in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub start: [i64; 2],
    pub end: [i64; 2],
}

impl Region {
    pub const fn left(&self) -> i64 {
        if self.start[0] < self.end[0] {
            self.start[0]
        } else {
            self.end[0]
        }
    }

    pub const fn right(&self) -> i64 {
        if self.start[0] > self.end[0] {
            self.start[0]
        } else {
            self.end[0]
        }
    }

    pub const fn top(&self) -> i64 {
        if self.start[1] < self.end[1] {
            self.start[1]
        } else {
            self.end[1]
        }
    }

    pub const fn bottom(&self) -> i64 {
        if self.start[1] > self.end[1] {
            self.start[1]
        } else {
            self.end[1]
        }
    }

    pub const fn width(&self) -> i64 {
        (self.end[0] - self.start[0]).abs()
    }

    pub const fn height(&self) -> i64 {
        (self.end[1] - self.start[1]).abs()
    }
}

/// Occupant names per chunk, deduplicated and sorted once at build time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkIndex {
    chunks: HashMap<ChunkKey, Vec<String>>,
}

impl ChunkIndex {
    /// Build from occupant lists keyed by chunk. Lists for the same key merge.
    pub fn from_lists<I, N>(lists: I) -> Self
    where
        I: IntoIterator<Item = (ChunkKey, N)>,
        N: IntoIterator<Item = String>,
    {
        let mut sets: HashMap<ChunkKey, BTreeSet<String>> = HashMap::new();
        for (key, names) in lists {
            sets.entry(key).or_default().extend(names);
        }
        Self::from_sets(sets)
    }

    /// Build from individual `(x, y, name)` occurrences in world space.
    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = (f64, f64, String)>,
    {
        let mut sets: HashMap<ChunkKey, BTreeSet<String>> = HashMap::new();
        for (x, y, name) in points {
            let Some(key) = ChunkKey::containing(x, y) else {
                continue;
            };
            sets.entry(key).or_default().insert(name);
        }
        Self::from_sets(sets)
    }

    fn from_sets(sets: HashMap<ChunkKey, BTreeSet<String>>) -> Self {
        let chunks = sets
            .into_iter()
            .filter(|(_, names)| !names.is_empty())
            .map(|(key, names)| (key, names.into_iter().collect()))
            .collect();
        Self { chunks }
    }

    /// Sorted, duplicate-free occupants. Empty for unknown chunks.
    pub fn names(&self, key: ChunkKey) -> &[String] {
        self.chunks.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// Stable hash of a name list, used to skip redundant re-layout.
pub fn content_hash<S: AsRef<str>>(names: &[S]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    for (i, name) in names.iter().enumerate() {
        if i > 0 {
            hasher.update(b"|");
        }
        hasher.update(name.as_ref().as_bytes());
    }
    hasher.finalize()
}
