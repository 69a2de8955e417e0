//! Rasterizer: executes paint commands over a copy of the background

use log::debug;
use tiny_skia::{
    ColorU8, FillRule, Paint, PathBuilder, Pixmap, Rect as SkiaRect, Stroke, StrokeDash, Transform,
};

use crate::collector::Rect;
use crate::rendering::color::Rgba;
use crate::rendering::font;
use crate::rendering::paint::PaintCommand;
use crate::{Error, Result};

/// Decode a PNG/JPEG screenshot into a premultiplied pixmap
pub fn decode_background(bytes: &[u8]) -> Result<Pixmap> {
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut pixmap = Pixmap::new(width, height)
        .ok_or_else(|| {
            Error::RenderError(format!("Invalid background size {}x{}", width, height))
        })?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(rgba.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Ok(pixmap)
}

/// Convert a pixmap back to straight RGBA for encoders
pub fn to_rgba_image(pixmap: &Pixmap) -> Result<image::RgbaImage> {
    let mut data = Vec::with_capacity(pixmap.data().len());
    for p in pixmap.pixels() {
        let c = p.demultiply();
        data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    image::RgbaImage::from_raw(pixmap.width(), pixmap.height(), data)
        .ok_or_else(|| Error::RenderError("Pixel buffer does not match frame size".into()))
}

/// Paint `commands` in order onto a fresh copy of `background`
pub fn rasterize(background: &Pixmap, commands: &[PaintCommand]) -> Result<Pixmap> {
    let mut pixmap = background.clone();
    for cmd in commands {
        match cmd {
            PaintCommand::FillRect { rect, rgba } => fill_rect(&mut pixmap, rect, *rgba, true),
            PaintCommand::StrokeRect { rect, rgba, width, dash } => {
                stroke_rect(&mut pixmap, rect, *rgba, *width, *dash)?
            }
            PaintCommand::Text { x, y, size, text, rgba } => {
                draw_text(&mut pixmap, *x, *y, *size, text, *rgba)
            }
        }
    }
    Ok(pixmap)
}

fn paint_for(rgba: Rgba, anti_alias: bool) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(rgba.r, rgba.g, rgba.b, rgba.a);
    paint.anti_alias = anti_alias;
    paint
}

// Zero-sized rects are valid (a zero-width rect strokes as a line, like a
// canvas would); negative or non-finite sizes are not.
fn skia_rect(rect: &Rect) -> Option<SkiaRect> {
    SkiaRect::from_xywh(
        rect.x as f32,
        rect.y as f32,
        rect.width as f32,
        rect.height as f32,
    )
}

fn fill_rect(pixmap: &mut Pixmap, rect: &Rect, rgba: Rgba, anti_alias: bool) {
    match skia_rect(rect) {
        Some(r) => pixmap.fill_rect(r, &paint_for(rgba, anti_alias), Transform::identity(), None),
        None => debug!("skipping fill of invalid rect {:?}", rect),
    }
}

fn stroke_rect(
    pixmap: &mut Pixmap,
    rect: &Rect,
    rgba: Rgba,
    width: f64,
    dash: Option<[f64; 2]>,
) -> Result<()> {
    let Some(r) = skia_rect(rect) else {
        debug!("skipping stroke of invalid rect {:?}", rect);
        return Ok(());
    };
    let path = PathBuilder::from_rect(r);

    let mut stroke = Stroke {
        width: width as f32,
        ..Default::default()
    };
    if let Some([on, off]) = dash {
        let pattern = StrokeDash::new(vec![on as f32, off as f32], 0.0).ok_or_else(|| {
            Error::RenderError(format!("Invalid dash pattern [{}, {}]", on, off))
        })?;
        stroke.dash = Some(pattern);
    }
    pixmap.stroke_path(&path, &paint_for(rgba, true), &stroke, Transform::identity(), None);
    Ok(())
}

fn draw_text(pixmap: &mut Pixmap, x: f64, baseline: f64, size: f64, text: &str, rgba: Rgba) {
    let cell = font::cell_size(size);
    let top = baseline - cell * font::GLYPH_ROWS as f64;

    let mut builder = PathBuilder::new();
    for (col, row) in font::cells(text) {
        if let Some(r) = SkiaRect::from_xywh(
            (x + col as f64 * cell) as f32,
            (top + row as f64 * cell) as f32,
            cell as f32,
            cell as f32,
        ) {
            builder.push_rect(r);
        }
    }
    if let Some(path) = builder.finish() {
        let paint = paint_for(rgba, false);
        pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn white(width: u32, height: u32) -> Pixmap {
        let mut p = Pixmap::new(width, height).unwrap();
        p.fill(tiny_skia::Color::WHITE);
        p
    }

    fn pixel(p: &Pixmap, x: u32, y: u32) -> (u8, u8, u8, u8) {
        let c = p.pixel(x, y).unwrap().demultiply();
        (c.red(), c.green(), c.blue(), c.alpha())
    }

    #[test]
    fn rasterize_leaves_background_untouched() {
        let bg = white(32, 32);
        let cmds = vec![PaintCommand::FillRect {
            rect: Rect::new(0.0, 0.0, 8.0, 8.0),
            rgba: Rgba::new(255, 0, 0, 255),
        }];
        let out = rasterize(&bg, &cmds).unwrap();
        assert_eq!(pixel(&out, 2, 2), (255, 0, 0, 255));
        assert_eq!(pixel(&bg, 2, 2), (255, 255, 255, 255));
        assert_eq!(pixel(&out, 20, 20), (255, 255, 255, 255));
    }

    #[test]
    fn invalid_rects_are_skipped() {
        let bg = white(8, 8);
        let black = Rgba::new(0, 0, 0, 255);
        let cmds = vec![
            PaintCommand::FillRect {
                rect: Rect::new(1.0, 1.0, -3.0, 2.0),
                rgba: black,
            },
            PaintCommand::StrokeRect {
                rect: Rect::new(1.0, 1.0, 4.0, f64::NAN),
                rgba: black,
                width: 1.0,
                dash: None,
            },
        ];
        let out = rasterize(&bg, &cmds).unwrap();
        assert_eq!(out.data(), bg.data());
    }

    #[test]
    fn zero_width_rect_strokes_as_a_line() {
        let bg = white(8, 8);
        let cmds = vec![PaintCommand::StrokeRect {
            rect: Rect::new(1.0, 1.0, 0.0, 4.0),
            rgba: Rgba::new(0, 0, 0, 255),
            width: 1.0,
            dash: None,
        }];
        let out = rasterize(&bg, &cmds).unwrap();
        let (r, g, b, _) = pixel(&out, 1, 3);
        assert!(r < 255 && g < 255 && b < 255, "expected a dark line at x=1, got {:?}", (r, g, b));
        assert_eq!(pixel(&out, 6, 3), (255, 255, 255, 255));
        assert_eq!(pixel(&out, 1, 7), (255, 255, 255, 255));
    }

    #[test]
    fn text_draws_opaque_cells() {
        let bg = white(40, 20);
        let cmds = vec![PaintCommand::Text {
            x: 0.0,
            y: 14.0,
            size: 18.0,
            text: "L".into(),
            rgba: Rgba::new(0, 0, 0, 255),
        }];
        let out = rasterize(&bg, &cmds).unwrap();
        // left bar of the L, cell size 2px, top at y=0
        assert_eq!(pixel(&out, 0, 0), (0, 0, 0, 255));
        assert_eq!(pixel(&out, 9, 13), (0, 0, 0, 255));
        assert_eq!(pixel(&out, 9, 0), (255, 255, 255, 255));
    }

    #[test]
    fn round_trips_through_image_buffer() {
        let bg = white(4, 3);
        let img = to_rgba_image(&bg).unwrap();
        assert_eq!(img.dimensions(), (4, 3));
        assert_eq!(img.get_pixel(3, 2).0, [255, 255, 255, 255]);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode_background(b"not an image").is_err());
    }
}
