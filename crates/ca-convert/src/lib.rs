//! Cœur de conversion : quantification, cache de stamps, échantillonnage,
//! composition et boucle de frames.
//!
//! Les structures construites au démarrage ([`quantizer::Quantizer`],
//! [`stamp::StampCache`]) sont immuables ; seules les commandes de dessin
//! et le canvas vivent par frame.

pub mod compositor;
pub mod driver;
pub mod quantizer;
pub mod sampler;
pub mod stamp;

pub use compositor::Compositor;
pub use driver::{Driver, DriverState, StopReason};
pub use quantizer::{ColorKey, Palette, Quantizer};
pub use sampler::{DrawCommand, FrameSampler};
pub use stamp::{StampCache, StampKey};
