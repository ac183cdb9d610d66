// Copyright (c) 2026 rezky_nightky

use crate::cell::Cell;
use crate::color::{luminance, to_term_color, Rgb, Rgba};
use crate::frame::Frame;
use crate::runtime::ColorMode;
use crate::surface::Surface;

/// Pixels brighter than this are lit in mono mode.
const MONO_THRESHOLD: f32 = 0.35;

/// Upper bound on brush stamps per line, guards against absurd coordinates.
const MAX_LINE_STEPS: usize = 4096;

/// Raster surface backed by "half-block" pixels: every terminal cell holds two
/// vertically stacked pixels, and every pixel covers `scale` x `scale` canvas
/// units.
pub struct Canvas {
    cols: u16,
    rows: u16,
    px_w: usize,
    px_h: usize,
    scale: f32,
    pixels: Vec<[f32; 3]>,
    stamp: Vec<usize>,
}

fn to_channels(c: Rgb) -> [f32; 3] {
    [c.r as f32, c.g as f32, c.b as f32]
}

fn to_rgb(p: [f32; 3]) -> Rgb {
    let q = |v: f32| v.round().clamp(0.0, 255.0) as u8;
    Rgb::new(q(p[0]), q(p[1]), q(p[2]))
}

/// Pixel range `[start, end)` touched by the canvas span `[lo, hi)`.
/// A non-empty span always touches at least one pixel before clipping.
fn pixel_span(lo: f32, hi: f32, limit: usize) -> Option<(usize, usize)> {
    if !(hi > lo) || !lo.is_finite() || !hi.is_finite() {
        return None;
    }
    let start = lo.floor();
    let end = hi.ceil().max(start + 1.0);
    let start = start.max(0.0);
    let end = end.min(limit as f32);
    if end <= start {
        return None;
    }
    Some((start as usize, end as usize))
}

impl Canvas {
    pub fn new(cols: u16, rows: u16, scale: f32, bg: Rgb) -> Self {
        let mut canvas = Self {
            cols: 0,
            rows: 0,
            px_w: 0,
            px_h: 0,
            scale: scale.max(1.0),
            pixels: Vec::new(),
            stamp: Vec::new(),
        };
        canvas.resize(cols, rows, bg);
        canvas
    }

    pub fn resize(&mut self, cols: u16, rows: u16, bg: Rgb) {
        self.cols = cols;
        self.rows = rows;
        self.px_w = cols as usize;
        self.px_h = rows as usize * 2;
        self.pixels = vec![to_channels(bg); self.px_w * self.px_h];
    }

    #[cfg(test)]
    pub fn pixel(&self, px: usize, py: usize) -> Option<Rgb> {
        if px >= self.px_w || py >= self.px_h {
            return None;
        }
        Some(to_rgb(self.pixels[py * self.px_w + px]))
    }

    fn blend(&mut self, idx: usize, color: Rgba) {
        let a = color.a;
        let src = [color.r as f32, color.g as f32, color.b as f32];
        let dst = &mut self.pixels[idx];
        for (d, s) in dst.iter_mut().zip(src) {
            *d = *d * (1.0 - a) + s * a;
        }
    }

    fn blend_block(&mut self, xs: (usize, usize), ys: (usize, usize), color: Rgba) {
        for py in ys.0..ys.1 {
            for px in xs.0..xs.1 {
                self.blend(py * self.px_w + px, color);
            }
        }
    }

    /// Writes every cell of `frame` from the current pixels.
    pub fn present(&self, frame: &mut Frame, mode: ColorMode) {
        for row in 0..self.rows.min(frame.height) {
            for col in 0..self.cols.min(frame.width) {
                let x = col as usize;
                let y = row as usize * 2;
                let top = to_rgb(self.pixels[y * self.px_w + x]);
                let bottom = to_rgb(self.pixels[(y + 1) * self.px_w + x]);

                let cell = if mode == ColorMode::Mono {
                    let ch = match (
                        luminance(top) > MONO_THRESHOLD,
                        luminance(bottom) > MONO_THRESHOLD,
                    ) {
                        (true, true) => '█',
                        (true, false) => '▀',
                        (false, true) => '▄',
                        (false, false) => ' ',
                    };
                    Cell {
                        ch,
                        fg: None,
                        bg: None,
                    }
                } else {
                    Cell::pixel_pair(to_term_color(top, mode), to_term_color(bottom, mode))
                };
                frame.set(col, row, cell);
            }
        }
    }
}

impl Surface for Canvas {
    fn width(&self) -> f32 {
        self.px_w as f32 * self.scale
    }

    fn height(&self) -> f32 {
        self.px_h as f32 * self.scale
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba) {
        if color.a <= 0.0 {
            return;
        }
        let s = self.scale;
        let Some(xs) = pixel_span(x / s, (x + w) / s, self.px_w) else {
            return;
        };
        let Some(ys) = pixel_span(y / s, (y + h) / s, self.px_h) else {
            return;
        };
        self.blend_block(xs, ys, color);
    }

    fn stroke_line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, width: f32, color: Rgba) {
        if color.a <= 0.0 || ![x1, y1, x2, y2, width].iter().all(|v| v.is_finite()) {
            return;
        }
        let s = self.scale;
        let (ax, ay, bx, by) = (x1 / s, y1 / s, x2 / s, y2 / s);
        let half = (width / s).max(1.0) / 2.0;
        let steps = ((bx - ax).abs().max((by - ay).abs()).ceil() as usize).clamp(1, MAX_LINE_STEPS);

        let mut stamp = std::mem::take(&mut self.stamp);
        stamp.clear();
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let cx = ax + (bx - ax) * t;
            let cy = ay + (by - ay) * t;
            let (Some(xs), Some(ys)) = (
                pixel_span(cx - half, cx + half, self.px_w),
                pixel_span(cy - half, cy + half, self.px_h),
            ) else {
                continue;
            };
            for py in ys.0..ys.1 {
                stamp.extend((xs.0..xs.1).map(|px| py * self.px_w + px));
            }
        }
        stamp.sort_unstable();
        stamp.dedup();
        for &idx in &stamp {
            self.blend(idx, color);
        }
        self.stamp = stamp;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::WHITE;

    const BLACK: Rgb = Rgb::new(0, 0, 0);

    #[test]
    fn dimensions_follow_cells_and_scale() {
        let c = Canvas::new(10, 5, 4.0, BLACK);
        assert_eq!(c.width(), 40.0);
        assert_eq!(c.height(), 40.0);
    }

    #[test]
    fn opaque_full_fill_replaces_every_pixel() {
        let mut c = Canvas::new(3, 2, 2.0, BLACK);
        let (w, h) = (c.width(), c.height());
        c.fill_rect(0.0, 0.0, w, h, Rgb::new(10, 20, 30).with_alpha(1.0));
        for py in 0..4 {
            for px in 0..3 {
                assert_eq!(c.pixel(px, py), Some(Rgb::new(10, 20, 30)));
            }
        }
    }

    #[test]
    fn translucent_fill_blends_toward_source() {
        let mut c = Canvas::new(1, 1, 1.0, BLACK);
        c.fill_rect(0.0, 0.0, 1.0, 2.0, Rgb::new(200, 100, 0).with_alpha(0.5));
        assert_eq!(c.pixel(0, 0), Some(Rgb::new(100, 50, 0)));
        assert_eq!(c.pixel(0, 1), Some(Rgb::new(100, 50, 0)));
    }

    #[test]
    fn tiny_rect_touches_one_pixel_and_offscreen_rect_is_clipped() {
        let mut c = Canvas::new(4, 2, 4.0, BLACK);
        c.fill_rect(5.0, 5.0, 0.5, 0.5, WHITE.with_alpha(1.0));
        assert_eq!(c.pixel(1, 1), Some(WHITE));
        assert_eq!(c.pixel(0, 0), Some(BLACK));
        assert_eq!(c.pixel(2, 1), Some(BLACK));

        c.fill_rect(-100.0, -100.0, 10.0, 10.0, WHITE.with_alpha(1.0));
        c.fill_rect(1000.0, 0.0, 10.0, 10.0, WHITE.with_alpha(1.0));
        assert_eq!(c.pixel(0, 0), Some(BLACK));
    }

    #[test]
    fn vertical_line_lights_its_column_only() {
        let mut c = Canvas::new(5, 3, 1.0, BLACK);
        c.stroke_line(2.5, 0.0, 2.5, 6.0, 1.0, WHITE.with_alpha(1.0));
        for py in 0..6 {
            assert_eq!(c.pixel(2, py), Some(WHITE));
            assert_eq!(c.pixel(0, py), Some(BLACK));
            assert_eq!(c.pixel(4, py), Some(BLACK));
        }
    }

    #[test]
    fn translucent_line_blends_each_pixel_once() {
        let mut c = Canvas::new(8, 1, 1.0, BLACK);
        c.stroke_line(0.5, 0.5, 7.5, 0.5, 1.0, Rgb::new(200, 200, 200).with_alpha(0.5));
        assert_eq!(c.pixel(3, 0), Some(Rgb::new(100, 100, 100)));
    }

    #[test]
    fn present_packs_two_pixels_per_cell() {
        let mut c = Canvas::new(2, 1, 1.0, BLACK);
        c.fill_rect(0.0, 0.0, 2.0, 1.0, WHITE.with_alpha(1.0));
        let mut f = Frame::new(2, 1);
        c.present(&mut f, ColorMode::TrueColor);
        let cell = f.get(0, 0).unwrap();
        assert_eq!(cell.ch, crate::cell::HALF_BLOCK);
        assert_eq!(
            cell.fg,
            Some(crossterm::style::Color::Rgb {
                r: 255,
                g: 255,
                b: 255
            })
        );
        assert_eq!(cell.bg, Some(crossterm::style::Color::Rgb { r: 0, g: 0, b: 0 }));

        c.present(&mut f, ColorMode::Mono);
        assert_eq!(f.get(1, 0).unwrap().ch, '▀');
    }
}
