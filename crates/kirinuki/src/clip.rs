//! Trimming a downloaded recording into a screen clip and a webcam clip.

mod crop;
mod probe;
mod render;
mod timestamp;

pub use crop::{CropLayout, CropRegion};
pub use probe::{probe_duration, video_duration, FfprobeProber};
pub use render::{ClipOutputs, ClipRenderer};
pub use timestamp::Timestamp;
