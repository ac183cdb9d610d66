// Copyright (c) 2026 rezky_nightky

use rand::{rngs::StdRng, Rng as _, SeedableRng};

use crate::config::StormSettings;
use crate::lightning::LightningController;
use crate::rain::RainField;
use crate::surface::Surface;
use crate::thunder::Thunder;

/// Opacity of the per-frame background wash. Anything drawn earlier fades
/// toward the background over a few frames instead of vanishing at once.
pub const BACKGROUND_FADE_ALPHA: f32 = 0.1;

/// The whole scene: rain plus lightning, advanced one tick per frame.
pub struct Storm {
    pub rain: RainField,
    pub lightning: LightningController,
}

impl Storm {
    pub fn new(
        width: f32,
        height: f32,
        area_per_droplet: f32,
        settings: &StormSettings,
        thunder: Box<dyn Thunder>,
        seed: Option<u64>,
    ) -> Self {
        let mut root = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let rain_rng = StdRng::seed_from_u64(root.random());
        let lightning_rng = StdRng::seed_from_u64(root.random());

        Self {
            rain: RainField::new(width, height, area_per_droplet, settings, rain_rng),
            lightning: LightningController::new(width, height, lightning_rng, thunder),
        }
    }

    pub fn resize(&mut self, width: f32, height: f32, settings: &StormSettings) {
        self.rain.resize(width, height, settings);
        self.lightning.set_bounds(width, height);
    }

    pub fn trigger_lightning_now(&mut self) {
        self.lightning.trigger();
    }

    pub fn set_lightning_auto_mode(&mut self, enabled: bool) {
        self.lightning.set_auto_mode(enabled);
    }

    /// One frame: fade, lightning, then rain on top.
    pub fn tick(&mut self, settings: &StormSettings, surface: &mut impl Surface) {
        let (w, h) = (surface.width(), surface.height());
        surface.fill_rect(
            0.0,
            0.0,
            w,
            h,
            settings.background.with_alpha(BACKGROUND_FADE_ALPHA),
        );

        self.lightning.update();
        self.lightning.draw(surface);

        self.rain.step(settings, surface);
    }
}
