//! Capture collaborators for charart: still image, video file, camera,
//! soundtrack playback.

pub mod audio;
pub mod ffmpeg;
pub mod image;
pub mod video;

pub use audio::AudioPlayback;
pub use ffmpeg::{FfmpegInput, StreamInfo};
pub use image::ImageSource;
pub use video::VideoSource;
