// Copyright (c) 2026 rezky_nightky

use rand::{rngs::StdRng, Rng};

use crate::config::StormSettings;
use crate::surface::Surface;

/// Canvas area covered by one droplet.
pub const DEFAULT_AREA_PER_DROPLET: f32 = 2000.0;

/// Edge of the virtual spawn grid, in canvas units.
pub const GRID_SIZE: f32 = 30.0;

/// Droplets fading below this opacity are respawned.
pub const MIN_OPACITY: f32 = 0.1;

/// Uniform sample in `[min, max)`, collapsing to `min` for empty ranges.
pub(crate) fn random_between(rng: &mut StdRng, min: f32, max: f32) -> f32 {
    if max > min {
        rng.random_range(min..max)
    } else {
        min
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Droplet {
    pub x: f32,
    pub y: f32,
    pub speed: f32,
    pub size: f32,
    pub opacity: f32,
    pub wind_variation: f32,
    pub angle: f32,
    pub life: f32,
}

impl Droplet {
    pub fn spawn(width: f32, max_size: u16, rng: &mut StdRng) -> Self {
        let mut d = Self {
            x: 0.0,
            y: 0.0,
            speed: 0.0,
            size: 0.0,
            opacity: 0.0,
            wind_variation: 0.0,
            angle: 0.0,
            life: 0.0,
        };
        d.reset(width, max_size, rng);
        d
    }

    /// Reinitialises every attribute in place. Horizontal position snaps to a
    /// random grid column; vertical start is one of the three grid rows just
    /// above the top edge, so `y` is always negative afterwards.
    pub fn reset(&mut self, width: f32, max_size: u16, rng: &mut StdRng) {
        let grid_x = random_between(rng, 0.0, width / GRID_SIZE).floor();
        let grid_y = random_between(rng, -3.0, 0.0).floor();

        self.x = grid_x * GRID_SIZE + random_between(rng, 0.0, GRID_SIZE);
        self.y = grid_y * GRID_SIZE + random_between(rng, 0.0, GRID_SIZE);

        self.speed = random_between(rng, 2.0, 4.0);
        self.size = random_between(rng, 1.0, f32::from(max_size.max(1)));
        self.opacity = random_between(rng, 0.3, 0.7);
        self.wind_variation = random_between(rng, -0.5, 0.5);
        self.angle = random_between(rng, -0.1, 0.1);
        self.life = random_between(rng, 0.9, 1.0);
    }

    /// Advances one frame. Returns true when the droplet left the canvas or
    /// faded out and was respawned.
    pub fn update(
        &mut self,
        settings: &StormSettings,
        width: f32,
        height: f32,
        rng: &mut StdRng,
    ) -> bool {
        self.y += self.speed * settings.rain_speed;
        self.x += (settings.wind_speed + self.wind_variation) + self.angle;
        self.opacity *= self.life;

        let gone = self.y > height || self.x < 0.0 || self.x > width || self.opacity < MIN_OPACITY;
        if gone {
            self.reset(width, settings.max_drop_size, rng);
        }
        gone
    }

    pub fn draw(&self, settings: &StormSettings, surface: &mut impl Surface) {
        surface.fill_rect(
            self.x,
            self.y,
            self.size,
            self.size,
            settings.rain_color.with_alpha(self.opacity),
        );
    }
}

/// Fixed-size population of droplets covering the canvas.
pub struct RainField {
    width: f32,
    height: f32,
    area_per_droplet: f32,
    droplets: Vec<Droplet>,
    rng: StdRng,
}

impl RainField {
    pub fn new(
        width: f32,
        height: f32,
        area_per_droplet: f32,
        settings: &StormSettings,
        rng: StdRng,
    ) -> Self {
        let mut field = Self {
            width,
            height,
            area_per_droplet: area_per_droplet.max(1.0),
            droplets: Vec::new(),
            rng,
        };
        field.repopulate(settings);
        field
    }

    pub fn target_count(width: f32, height: f32, area_per_droplet: f32) -> usize {
        let area = (width.max(0.0) * height.max(0.0)) as f64;
        (area / area_per_droplet.max(1.0) as f64).floor() as usize
    }

    pub fn len(&self) -> usize {
        self.droplets.len()
    }

    /// Recomputes the population for new canvas bounds.
    pub fn resize(&mut self, width: f32, height: f32, settings: &StormSettings) {
        self.width = width;
        self.height = height;
        self.repopulate(settings);
    }

    /// Throws away every droplet and spawns a fresh population.
    pub fn repopulate(&mut self, settings: &StormSettings) {
        let count = Self::target_count(self.width, self.height, self.area_per_droplet);
        let (width, max_size) = (self.width, settings.max_drop_size);
        let rng = &mut self.rng;
        self.droplets = (0..count)
            .map(|_| Droplet::spawn(width, max_size, rng))
            .collect();
        tracing::debug!(count, width, height = self.height, "rain population rebuilt");
    }

    /// Updates then draws each droplet in turn.
    pub fn step(&mut self, settings: &StormSettings, surface: &mut impl Surface) {
        for d in &mut self.droplets {
            d.update(settings, self.width, self.height, &mut self.rng);
            d.draw(settings, surface);
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::surface::recording::Recorder;

    fn field(width: f32, height: f32) -> RainField {
        RainField::new(
            width,
            height,
            DEFAULT_AREA_PER_DROPLET,
            &StormSettings::default(),
            StdRng::seed_from_u64(7),
        )
    }

    #[test]
    fn population_matches_canvas_area() {
        assert_eq!(RainField::target_count(800.0, 600.0, 2000.0), 240);
        assert_eq!(field(800.0, 600.0).len(), 240);
        assert_eq!(RainField::target_count(10.0, 10.0, 2000.0), 0);
    }

    #[test]
    fn resize_recomputes_population() {
        let mut f = field(800.0, 600.0);
        f.resize(400.0, 500.0, &StormSettings::default());
        assert_eq!(f.len(), 100);
    }

    #[test]
    fn spawned_droplets_start_above_the_canvas_within_ranges() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..500 {
            let d = Droplet::spawn(800.0, 5, &mut rng);
            assert!(d.y < 0.0 && d.y >= -90.0, "y = {}", d.y);
            assert!(d.x >= 0.0 && d.x < 800.0 + GRID_SIZE);
            assert!((2.0..4.0).contains(&d.speed));
            assert!((1.0..5.0).contains(&d.size));
            assert!((0.3..0.7).contains(&d.opacity));
            assert!((-0.5..0.5).contains(&d.wind_variation));
            assert!((-0.1..0.1).contains(&d.angle));
            assert!((0.9..1.0).contains(&d.life));
        }
    }

    #[test]
    fn opacity_stays_in_unit_interval_and_never_grows_without_respawn() {
        let settings = StormSettings::default();
        let mut rng = StdRng::seed_from_u64(3);
        let mut d = Droplet::spawn(800.0, 3, &mut rng);
        for _ in 0..2000 {
            let before = d.opacity;
            let respawned = d.update(&settings, 800.0, 600.0, &mut rng);
            assert!(d.opacity > 0.0 && d.opacity <= 1.0);
            if !respawned {
                assert!(d.opacity <= before);
            }
        }
    }

    #[test]
    fn droplet_past_the_bottom_respawns_above_the_top() {
        let settings = StormSettings::default();
        let mut rng = StdRng::seed_from_u64(11);
        let mut d = Droplet::spawn(800.0, 3, &mut rng);
        d.x = 400.0;
        d.y = 601.0;
        d.opacity = 0.9;
        d.life = 1.0;
        assert!(d.update(&settings, 800.0, 600.0, &mut rng));
        assert!(d.y < 0.0);
    }

    #[test]
    fn strong_wind_blows_droplets_off_the_side_and_respawns_them() {
        let settings = StormSettings {
            wind_speed: 1000.0,
            ..StormSettings::default()
        };
        let mut rng = StdRng::seed_from_u64(5);
        let mut d = Droplet::spawn(800.0, 3, &mut rng);
        d.x = 400.0;
        d.y = 10.0;
        assert!(d.update(&settings, 800.0, 600.0, &mut rng));
        assert!(d.y < 0.0);
    }

    #[test]
    fn population_is_constant_across_steps_with_changing_settings() {
        let mut f = field(800.0, 600.0);
        let mut surface = Recorder::new(800.0, 600.0);
        let mut settings = StormSettings::default();
        for i in 0..300 {
            settings.wind_speed = (i % 7) as f32 - 3.0;
            settings.rain_speed = (i % 5) as f32;
            settings.max_drop_size = 1 + (i % 10) as u16;
            f.step(&settings, &mut surface);
            assert_eq!(f.len(), 240);
        }
        assert_eq!(surface.rects().count(), 240 * 300);
    }

    #[test]
    fn draw_fills_a_square_in_rain_color_at_current_opacity() {
        let settings = StormSettings::default();
        let mut rng = StdRng::seed_from_u64(9);
        let d = Droplet::spawn(800.0, 3, &mut rng);
        let mut surface = Recorder::new(800.0, 600.0);
        d.draw(&settings, &mut surface);
        assert_eq!(
            surface.ops,
            vec![crate::surface::recording::DrawOp::Rect {
                x: d.x,
                y: d.y,
                w: d.size,
                h: d.size,
                color: settings.rain_color.with_alpha(d.opacity),
            }]
        );
    }
}
