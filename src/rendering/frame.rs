//! Before/after frame construction
//!
//! Both frames share one recipe: the screenshot, a score badge in the top-left
//! corner, then one outline per shifted element colored by that shift's own
//! value. The "after" frame outlines current rects with a solid stroke, the
//! "before" frame outlines previous rects with a dashed one.

use tiny_skia::Pixmap;

use crate::collector::{Rect, ShiftReport};
use crate::rendering::color::{ColorTier, Rgba};
use crate::rendering::paint::PaintCommand;
use crate::rendering::raster::rasterize;
use crate::{Error, Result};

/// Badge size in CSS pixels
pub const BADGE_WIDTH: f64 = 110.0;
pub const BADGE_HEIGHT: f64 = 36.0;
/// Badge text pen position (baseline) in CSS pixels
pub const BADGE_TEXT_X: f64 = 8.0;
pub const BADGE_TEXT_BASELINE: f64 = 24.0;
pub const BADGE_FONT_SIZE: f64 = 18.0;
/// Outline width in CSS pixels
pub const OUTLINE_WIDTH: f64 = 2.0;
/// Dash pattern of the "before" frame in CSS pixels
pub const DASH_ON: f64 = 5.0;
pub const DASH_OFF: f64 = 3.0;

/// The two frames of a diff, in animation order
#[derive(Debug, Clone)]
pub struct DiffFrames {
    /// Current rects, solid outlines
    pub after: Pixmap,
    /// Previous rects, dashed outlines
    pub before: Pixmap,
}

impl DiffFrames {
    pub fn in_order(&self) -> [&Pixmap; 2] {
        [&self.after, &self.before]
    }
}

/// Badge label for a score, three decimals with exact ties rounded up
pub fn badge_label(score: f64) -> String {
    format!("CLS: {}", three_decimals(score))
}

// `{:.3}` rounds exact ties to even. An exact tie at three decimals is a
// multiple of 1/2000 that a double can hold, i.e. an odd multiple of 1/16;
// those are rounded away from zero instead.
fn three_decimals(value: f64) -> String {
    let sixteenths = value * 16.0;
    if value.is_finite() && sixteenths.fract() == 0.0 && sixteenths % 2.0 != 0.0 {
        let thousandths = (value * 1000.0).round();
        format!("{:.3}", thousandths / 1000.0)
    } else {
        format!("{:.3}", value)
    }
}

fn check_scale(scale: f64) -> Result<()> {
    if !scale.is_finite() || scale < 1.0 {
        return Err(Error::ConfigError(format!("scale factor must be >= 1, got {}", scale)));
    }
    Ok(())
}

/// Paint commands for one frame, in device pixels
pub fn frame_commands(
    rects: &[Rect],
    values: &[f64],
    score: f64,
    scale: f64,
    dashed: bool,
) -> Result<Vec<PaintCommand>> {
    check_scale(scale)?;
    if rects.len() != values.len() {
        return Err(Error::Integrity(format!(
            "{} rects but {} shift values",
            rects.len(),
            values.len()
        )));
    }

    let mut cmds = Vec::with_capacity(2 + rects.len() * 2);
    cmds.push(PaintCommand::FillRect {
        rect: Rect::new(0.0, 0.0, BADGE_WIDTH, BADGE_HEIGHT).scaled(scale),
        rgba: ColorTier::for_score(score).colors().solid,
    });
    cmds.push(PaintCommand::Text {
        x: BADGE_TEXT_X * scale,
        y: BADGE_TEXT_BASELINE * scale,
        size: BADGE_FONT_SIZE * scale,
        text: badge_label(score),
        rgba: Rgba::WHITE,
    });

    let dash = dashed.then(|| [DASH_ON * scale, DASH_OFF * scale]);
    for (rect, value) in rects.iter().zip(values) {
        let colors = ColorTier::for_score(*value).colors();
        let rect = rect.scaled(scale);
        // stroke first, then fill, as a canvas would
        cmds.push(PaintCommand::StrokeRect {
            rect,
            rgba: colors.stroke,
            width: OUTLINE_WIDTH * scale,
            dash,
        });
        cmds.push(PaintCommand::FillRect { rect, rgba: colors.fill });
    }
    Ok(cmds)
}

/// Render one frame onto a fresh copy of `background`
pub fn render_frame(
    background: &Pixmap,
    rects: &[Rect],
    values: &[f64],
    score: f64,
    scale: f64,
    dashed: bool,
) -> Result<Pixmap> {
    let cmds = frame_commands(rects, values, score, scale, dashed)?;
    rasterize(background, &cmds)
}

/// Render the after/before pair for a report
pub fn render_diff(background: &Pixmap, report: &ShiftReport, scale: f64) -> Result<DiffFrames> {
    let values = report.values();
    let after = render_frame(
        background,
        &report.current_rects(),
        &values,
        report.cumulative_score,
        scale,
        false,
    )?;
    let before = render_frame(
        background,
        &report.previous_rects(),
        &values,
        report.cumulative_score,
        scale,
        true,
    )?;
    Ok(DiffFrames { after, before })
}
