//! Paint command set for diff frames

use crate::collector::Rect;
use crate::rendering::color::Rgba;

#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    /// Opaque or translucent filled rectangle
    FillRect { rect: Rect, rgba: Rgba },
    /// Rectangle outline; `dash` is `[on, off]` in device pixels
    StrokeRect {
        rect: Rect,
        rgba: Rgba,
        width: f64,
        dash: Option<[f64; 2]>,
    },
    /// Bitmap text; `y` is the baseline, `size` the font size in device pixels
    Text {
        x: f64,
        y: f64,
        size: f64,
        text: String,
        rgba: Rgba,
    },
}

impl PaintCommand {
    pub fn rect(&self) -> Option<Rect> {
        match self {
            PaintCommand::FillRect { rect, .. } | PaintCommand::StrokeRect { rect, .. } => {
                Some(*rect)
            }
            PaintCommand::Text { .. } => None,
        }
    }
}
