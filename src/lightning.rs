// Copyright (c) 2026 rezky_nightky

use std::f32::consts::FRAC_PI_4;

use rand::{rngs::StdRng, Rng};

use crate::color::WHITE;
use crate::rain::random_between;
use crate::surface::Surface;
use crate::thunder::Thunder;

const MIN_MAIN_SEGMENTS: usize = 3;
const MAX_MAIN_SEGMENTS: usize = 6;
const MAX_STEP_DRIFT: f32 = 50.0;
const BRANCH_CHANCE: f64 = 0.5;

const BOLT_ALPHA: f32 = 0.8;
const IMPACT_ALPHA: f32 = 0.5;
const IMPACT_WIDTH: f32 = 20.0;
const IMPACT_HEIGHT: f32 = 10.0;
const FLASH_ALPHA: f32 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SegmentKind {
    Main,
    Branch,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrikeSegment {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub width: f32,
    pub kind: SegmentKind,
}

/// One long-lived lightning source: idle with a countdown, or flashing with
/// intensity fading from 1 toward 0.
pub struct LightningController {
    width: f32,
    height: f32,

    active: bool,
    intensity: f32,
    duration: f32,
    fade_speed: f32,
    countdown: f32,
    auto_mode: bool,
    segments: Vec<StrikeSegment>,

    rng: StdRng,
    thunder: Box<dyn Thunder>,
}

impl LightningController {
    pub fn new(width: f32, height: f32, rng: StdRng, thunder: Box<dyn Thunder>) -> Self {
        let mut lc = Self {
            width,
            height,
            active: false,
            intensity: 0.0,
            duration: 0.0,
            fade_speed: 0.0,
            countdown: 0.0,
            auto_mode: true,
            segments: Vec::new(),
            rng,
            thunder,
        };
        lc.rearm();
        lc
    }

    #[cfg(test)]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[cfg(test)]
    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    pub fn auto_mode(&self) -> bool {
        self.auto_mode
    }

    #[cfg(test)]
    pub fn segments(&self) -> &[StrikeSegment] {
        &self.segments
    }

    pub fn set_bounds(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    /// Back to idle with fresh per-strike randomness and a new countdown.
    fn rearm(&mut self) {
        self.active = false;
        self.intensity = 0.0;
        self.duration = random_between(&mut self.rng, 50.0, 150.0);
        self.fade_speed = random_between(&mut self.rng, 0.02, 0.05);
        self.countdown = random_between(&mut self.rng, 300.0, 1000.0);
        self.segments.clear();
    }

    /// Starts a flash right now, whatever the current state.
    pub fn trigger(&mut self) {
        self.active = true;
        self.intensity = 1.0;
        self.generate_strike_path();
        tracing::debug!(
            segments = self.segments.len(),
            branches = self
                .segments
                .iter()
                .filter(|s| s.kind == SegmentKind::Branch)
                .count(),
            fade_speed = self.fade_speed,
            duration = self.duration,
            "lightning strike"
        );
        self.thunder.request_playback();
    }

    pub fn update(&mut self) {
        if self.active {
            self.intensity -= self.fade_speed;
            if self.intensity <= 0.0 {
                self.intensity = 0.0;
                self.active = false;
                self.segments.clear();
                if self.auto_mode {
                    self.rearm();
                }
            }
        } else if self.auto_mode {
            self.countdown -= 1.0;
            if self.countdown <= 0.0 {
                self.trigger();
            }
        }
    }

    /// Turning automatic mode off cancels any flash in progress. Turning it on
    /// resumes the existing countdown rather than starting a new one.
    pub fn set_auto_mode(&mut self, enabled: bool) {
        self.auto_mode = enabled;
        if !enabled {
            self.active = false;
            self.intensity = 0.0;
            self.segments.clear();
        }
        tracing::debug!(enabled, countdown = self.countdown, "lightning auto mode");
    }

    /// A random walk from the top edge to the bottom edge, with an occasional
    /// short branch hanging off each joint after the first.
    pub fn generate_strike_path(&mut self) {
        self.segments.clear();
        let count = self.rng.random_range(MIN_MAIN_SEGMENTS..=MAX_MAIN_SEGMENTS);
        let step_y = self.height / count as f32;

        let mut x = random_between(&mut self.rng, 0.0, self.width);
        let mut y = 0.0;
        for i in 0..count {
            let next_x = x + random_between(&mut self.rng, -MAX_STEP_DRIFT, MAX_STEP_DRIFT);
            let next_y = y + step_y;
            self.segments.push(StrikeSegment {
                x1: x,
                y1: y,
                x2: next_x,
                y2: next_y,
                width: random_between(&mut self.rng, 2.0, 4.0),
                kind: SegmentKind::Main,
            });

            if i > 0 && self.rng.random_bool(BRANCH_CHANCE) {
                let length = random_between(&mut self.rng, 20.0, 50.0);
                let angle = random_between(&mut self.rng, -FRAC_PI_4, FRAC_PI_4);
                self.segments.push(StrikeSegment {
                    x1: next_x,
                    y1: next_y,
                    x2: next_x + angle.sin() * length,
                    y2: next_y + angle.cos() * length,
                    width: random_between(&mut self.rng, 1.0, 2.0),
                    kind: SegmentKind::Branch,
                });
            }

            x = next_x;
            y = next_y;
        }
    }

    pub fn draw(&self, surface: &mut impl Surface) {
        if !self.active {
            return;
        }

        let bolt = WHITE.with_alpha(self.intensity * BOLT_ALPHA);
        for s in &self.segments {
            surface.stroke_line(s.x1, s.y1, s.x2, s.y2, s.width, bolt);
        }

        if let Some(s) = self.segments.last() {
            let impact = IMPACT_WIDTH * self.intensity;
            surface.fill_rect(
                s.x2 - impact / 2.0,
                s.y2 - IMPACT_HEIGHT / 2.0,
                impact,
                IMPACT_HEIGHT,
                WHITE.with_alpha(self.intensity * IMPACT_ALPHA),
            );
        }

        let (w, h) = (surface.width(), surface.height());
        surface.fill_rect(0.0, 0.0, w, h, WHITE.with_alpha(self.intensity * FLASH_ALPHA));
    }
}
