//! Configuration, types, and shared structures for charart.
//!
//! This crate holds everything the conversion core and its collaborators
//! agree on: frames, glyph ramps, configuration, errors and the
//! collaborator traits.

pub mod charset;
pub mod config;
pub mod error;
pub mod frame;
pub mod resize;
pub mod traits;

pub use charset::{GlyphRamp, GlyphSelector};
pub use config::{ArtConfig, RenderMode};
pub use error::CoreError;
pub use frame::FrameBuffer;
