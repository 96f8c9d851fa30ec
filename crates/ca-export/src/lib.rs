//! Export collaborators for charart: glyph rasterization, MP4 recording,
//! image snapshots.

pub mod exporter;
pub mod muxer;
pub mod rasterizer;
pub mod snapshot;

pub use exporter::MediaExporter;
pub use muxer::Mp4Muxer;
pub use rasterizer::FontGlyphRenderer;
