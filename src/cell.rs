// Copyright (c) 2026 rezky_nightky

use crossterm::style::Color;

/// Upper half block: `fg` paints the top pixel, `bg` the bottom one.
pub const HALF_BLOCK: char = '▀';

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub fg: Option<Color>,
    pub bg: Option<Color>,
}

impl Cell {
    pub fn blank_with_bg(bg: Option<Color>) -> Self {
        Self { ch: ' ', fg: None, bg }
    }

    pub fn pixel_pair(top: Option<Color>, bottom: Option<Color>) -> Self {
        Self {
            ch: HALF_BLOCK,
            fg: top,
            bg: bottom,
        }
    }
}
