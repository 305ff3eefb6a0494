pub mod annotation;
pub mod chunk;
pub mod levels;
pub mod records;

pub use annotation::*;
pub use chunk::{CHUNK_SIZE, ChunkIndex, ChunkKey, ELITE_RADIUS, Region, content_hash};
pub use levels::{BOSS_LEVEL, MonsterLevels};
