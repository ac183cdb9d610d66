// Copyright (c) 2026 rezky_nightky

//! The render target every scene component draws onto.
//!
//! Geometry is expressed in canvas units. Implementations clip anything that
//! falls outside `width() x height()`; drawing never fails.

use crate::color::Rgba;

pub trait Surface {
    fn width(&self) -> f32;
    fn height(&self) -> f32;
    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba);
    fn stroke_line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, width: f32, color: Rgba);
}
