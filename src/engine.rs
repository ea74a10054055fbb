//! [`PlasmaEngine`]: the whole pipeline behind one frame-driven object.
//!
//! Setters only record the new configuration and mark the affected buffers
//! stale; the work happens in the next [`PlasmaEngine::render_frame`]:
//!
//!  1. Regenerate the scalar field if noise, warp, size or seed changed.
//!  2. Advance the palette animator to the current clock time.
//!  3. Look every field sample up in the animated palette.
//!
//! Invalid configuration never stops the animation: the engine logs a
//! warning, keeps its previous state and reports the error to the caller.

use std::time::Instant;

use bevy::log::{debug, error, warn};

use crate::{
    animator::{AnimationTiming, PaletteAnimator},
    color::Rgba8,
    compositor::{draw, draw_grayscale},
    fractal::{FractalField, FractalNoiseParams, Warp, WarpParams},
    generator::PlasmaError,
    noise::NoiseGenerator,
    options::PlasmaOptions,
    palette::PaletteStop,
};

/// Offset between the main and the warp noise seeds.
const WARP_SEED_OFFSET: u64 = 0x9e37_79b9;

/// Source of frame timestamps, in seconds.  Must never run backwards.
pub trait FrameClock {
    fn now(&mut self) -> f64;
}

/// Wall-clock time since construction.
#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl FrameClock for MonotonicClock {
    fn now(&mut self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Caller-driven clock: returns `time`, then advances it by `step`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ManualClock {
    pub time: f64,
    pub step: f64,
}

impl ManualClock {
    pub fn new(start: f64, step: f64) -> Self {
        Self { time: start, step }
    }
}

impl FrameClock for ManualClock {
    fn now(&mut self) -> f64 {
        let t = self.time;
        self.time += self.step;
        t
    }
}

/// Owns the noise generators, scalar field and palette animator.
pub struct PlasmaEngine<C: FrameClock = MonotonicClock> {
    options: PlasmaOptions,
    clock: C,
    noise: NoiseGenerator,
    warp_noise: NoiseGenerator,
    field: FractalField,
    animator: PaletteAnimator,
    field_dirty: bool,
}

impl PlasmaEngine<MonotonicClock> {
    /// Build an engine timed by the wall clock.
    pub fn new(options: PlasmaOptions, width: u32, height: u32) -> Result<Self, PlasmaError> {
        Self::with_clock(options, width, height, MonotonicClock::default())
    }
}

impl<C: FrameClock> PlasmaEngine<C> {
    /// Build an engine timed by `clock`.  `options` are sanitized first.
    pub fn with_clock(
        options: PlasmaOptions,
        width: u32,
        height: u32,
        clock: C,
    ) -> Result<Self, PlasmaError> {
        let options = options.sanitized();
        let field = FractalField::new(width, height, options.palette.size)?;
        let animator = PaletteAnimator::new(
            options.palette.stops.clone(),
            options.animation.clone(),
            options.palette.size,
            options.seed,
        )?;
        Ok(Self {
            noise: NoiseGenerator::new(options.seed, options.noise.octaves),
            warp_noise: NoiseGenerator::new(
                options.seed.wrapping_add(WARP_SEED_OFFSET),
                options.warp.octaves,
            ),
            options,
            clock,
            field,
            animator,
            field_dirty: true,
        })
    }

    // --- configuration ------------------------------------------------------

    /// Replace the fractal noise parameters; the field regenerates next frame.
    pub fn set_fractal_noise_params(&mut self, params: FractalNoiseParams) {
        let mut candidate = self.options.clone();
        candidate.noise = params;
        self.adopt(candidate, "noise");
        self.field_dirty = true;
    }

    /// Replace the domain-warp parameters; the field regenerates next frame.
    pub fn set_warp_params(&mut self, warp: WarpParams) {
        let mut candidate = self.options.clone();
        candidate.warp = warp;
        self.adopt(candidate, "warp");
        self.field_dirty = true;
    }

    /// Replace the palette stops.  An empty list is rejected and the current
    /// stops stay in use.
    pub fn set_palette_stops(&mut self, stops: Vec<PaletteStop>) -> Result<(), PlasmaError> {
        let mut candidate = self.options.clone();
        candidate.palette.stops = stops;
        if candidate.palette.stops.is_empty() {
            warn!("ignoring empty palette; keeping the current stops");
            return Err(PlasmaError::EmptyPalette);
        }
        self.animator.set_stops(candidate.sanitized().palette.stops)?;
        self.adopt(candidate, "palette stop");
        Ok(())
    }

    pub fn set_animation_timing(&mut self, timing: AnimationTiming) {
        let mut candidate = self.options.clone();
        candidate.animation = timing;
        self.adopt(candidate, "animation timing");
        self.animator.set_timing(self.options.animation.clone());
    }

    /// Change the palette length, which is also the field's index range.
    pub fn set_palette_size(&mut self, size: usize) -> Result<(), PlasmaError> {
        let mut candidate = self.options.clone();
        candidate.palette.size = size;
        let clamped = candidate.sanitized().palette.size;
        if clamped != size {
            warn!("palette size {size} out of range; clamped to {clamped}");
        }
        let size = clamped;
        if let Err(e) = self
            .field
            .set_output_range(size)
            .and_then(|()| self.animator.set_size(size))
        {
            warn!("ignoring palette size {size}: {e}");
            return Err(e);
        }
        self.options.palette.size = size;
        self.field_dirty = true;
        Ok(())
    }

    pub fn set_debug_grayscale(&mut self, enabled: bool) {
        self.options.debug_grayscale = enabled;
    }

    /// Apply a whole option tree at once.
    pub fn set_options(&mut self, options: PlasmaOptions) -> Result<(), PlasmaError> {
        let clean = options.sanitized();
        if clean != options {
            warn!("out-of-range options clamped");
        }
        let options = clean;
        if options.seed != self.options.seed {
            self.reseed(options.seed);
        }
        self.set_fractal_noise_params(options.noise.clone());
        self.set_warp_params(options.warp.clone());
        self.set_animation_timing(options.animation.clone());
        self.set_debug_grayscale(options.debug_grayscale);
        self.set_palette_size(options.palette.size)?;
        self.set_palette_stops(options.palette.stops)
    }

    /// Store `candidate` after clamping it, warning if anything in the
    /// `what` group had to change.  Returns whether clamping happened.
    fn adopt(&mut self, candidate: PlasmaOptions, what: &str) -> bool {
        let clean = candidate.sanitized();
        let clamped = clean != candidate;
        if clamped {
            warn!("out-of-range {what} parameters clamped into their valid ranges");
        }
        self.options = clean;
        clamped
    }

    /// Reallocate the scalar field; it is regenerated on the next frame.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), PlasmaError> {
        if width == self.field.width() && height == self.field.height() {
            return Ok(());
        }
        if let Err(e) = self.field.resize(width, height) {
            warn!(
                "ignoring resize to {width}×{height}: {e}; keeping {}×{}",
                self.field.width(),
                self.field.height()
            );
            return Err(e);
        }
        self.field_dirty = true;
        Ok(())
    }

    /// Switch every generator to a new root seed.
    pub fn reseed(&mut self, seed: u64) {
        self.options.seed = seed;
        self.animator.reseed(seed);
        self.field_dirty = true;
    }

    // --- per frame ----------------------------------------------------------

    /// Advance one tick using the engine's clock and draw into `target`
    /// (RGBA8, `width × height × 4` bytes).
    pub fn render_frame(&mut self, target: &mut [u8]) -> Result<(), PlasmaError> {
        let now = self.clock.now();
        self.render_frame_at(target, now)
    }

    /// Advance to the explicit timestamp `now` (seconds) and draw.
    pub fn render_frame_at(&mut self, target: &mut [u8], now: f64) -> Result<(), PlasmaError> {
        let expected = self.field.data().len() * 4;
        if target.len() != expected {
            return Err(PlasmaError::BufferSizeMismatch {
                expected,
                actual: target.len(),
            });
        }
        if self.field_dirty {
            self.regenerate_field();
        }
        let palette = self.animator.tick(now);
        if self.options.debug_grayscale {
            draw_grayscale(target, self.field.data(), self.field.output_range())
        } else {
            draw(target, self.field.data(), palette)
        }
    }

    fn regenerate_field(&mut self) {
        let o = &self.options;
        self.noise.configure(o.seed, o.noise.octaves);
        self.warp_noise
            .configure(o.seed.wrapping_add(WARP_SEED_OFFSET), o.warp.octaves);
        let warp = Warp {
            params: &o.warp,
            generator: &self.warp_noise,
        };
        match self.field.regenerate(&o.noise, &self.noise, Some(warp)) {
            Ok(()) => debug!(
                "regenerated {}×{} plasma field ({} octaves, seed {})",
                self.field.width(),
                self.field.height(),
                o.noise.octaves,
                o.seed
            ),
            Err(e) => error!("plasma field regeneration failed: {e}"),
        }
        self.field_dirty = false;
    }

    // --- accessors ----------------------------------------------------------

    pub fn options(&self) -> &PlasmaOptions {
        &self.options
    }

    pub fn width(&self) -> u32 {
        self.field.width()
    }

    pub fn height(&self) -> u32 {
        self.field.height()
    }

    pub fn field(&self) -> &FractalField {
        &self.field
    }

    pub fn animator(&self) -> &PaletteAnimator {
        &self.animator
    }

    /// Palette displayed by the last rendered frame.
    pub fn palette(&self) -> &[Rgba8] {
        self.animator.palette()
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }
}
