//! Diff rendering

pub mod color;
pub mod font;
pub mod frame;
pub mod paint;
pub mod raster;

pub use color::{ColorTier, Rgba, TierColors};
pub use frame::{badge_label, frame_commands, render_diff, render_frame, DiffFrames};
pub use paint::PaintCommand;
pub use raster::{decode_background, rasterize, to_rgba_image};

// Frames are plain tiny-skia pixmaps
pub use tiny_skia::Pixmap;
