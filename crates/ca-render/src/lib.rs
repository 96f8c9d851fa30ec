//! Display collaborators for charart.
//!
//! Terminal display (converted canvas next to the source preview), key
//! controls, headless progress display, FPS tracking.

pub mod canvas;
pub mod controls;
pub mod display;
pub mod fps;
pub mod headless;
pub mod ui;

pub use controls::KeyControls;
pub use display::TerminalDisplay;
pub use headless::HeadlessDisplay;
