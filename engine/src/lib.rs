pub mod chunks;
pub mod config;
pub mod engine;
pub mod label_layout;
pub mod scheduler;
pub mod search;
pub mod spatial;
pub mod surface;
pub mod transform;
pub mod viewport;

pub use chunks::{ChunkAggregator, ChunkBox, ChunkRefreshStats, ChunkWindow};
pub use config::EngineConfig;
pub use engine::{Dataset, LayoutEngine, PassSummary};
pub use scheduler::{Clock, ManualClock, RefreshScheduler, SystemClock};
pub use search::SearchFilter;
pub use surface::{BoxHandle, ChunkText, HeadlessSurface, LabelSurface, TextMeasure};
pub use transform::CoordTransform;
pub use viewport::{FlatViewport, MapView, ScreenPoint, ScreenSize, ViewportPoint};
