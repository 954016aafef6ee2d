//! Chunk-keyed highlight cache, edge-visibility reduction, scanning, and line emission.
#![forbid(unsafe_code)]

pub mod block;
pub mod cache;
pub mod chunk;
pub mod color;
pub mod edge;
pub mod render;
pub mod scan;

pub use block::SpatialBlock;
pub use cache::{CacheState, CacheStats, SpatialCache};
pub use chunk::ChunkRecord;
pub use color::Color;
pub use edge::{EdgeMask, FACE_EDGES, NeighborFlags, visible_edges};
pub use render::{LineBatch, LineSegment, LineSink, RenderPass, RenderView};
pub use scan::scan_chunk;
