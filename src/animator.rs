//! Palette cross-fading and rotation.
//!
//! The animator alternates between two phases:
//!
//! ```text
//!   Constant ──(elapsed > transition_delay)──▶ Transitioning
//!      ▲                                           │
//!      └──────(elapsed > transition_duration)──────┘
//! ```
//!
//! Entering `Transitioning` renders a fresh `next` palette: the same stops
//! with their hues rotated by the next step of a golden-ratio sequence.
//! Leaving it swaps the `start` and `next` buffers in place, so no palette is
//! copied at the end of a transition.  Independently of the phase, the
//! displayed palette is rotated by `elapsed · rotation_speed · N / 256`
//! entries every frame.

use std::mem;

use bevy::log::{debug, error};
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    color::Rgba8,
    fractal::MAX_OUTPUT_RANGE,
    generator::PlasmaError,
    noise::modulo,
    palette::{PaletteStop, blend_palettes, recolor_stops, render_stops, rotate_palette},
};

/// Palette length that `rotation_speed` is expressed against.
pub const REFERENCE_PALETTE_LENGTH: f64 = 256.0;

/// `1 / φ`: successive hues stepped by this stay maximally far apart.
pub const GOLDEN_RATIO_CONJUGATE: f64 = 0.618_033_988_749_895;

/// Timing of rotation and cross-fades, in seconds.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AnimationTiming {
    /// Rotation in entries of a 256-entry palette per second.
    pub rotation_speed: f64,
    /// Time spent on a constant palette before the next cross-fade.
    pub transition_delay: f64,
    /// Length of one cross-fade.
    pub transition_duration: f64,
}

impl Default for AnimationTiming {
    fn default() -> Self {
        Self {
            rotation_speed: 12.0,
            transition_delay: 8.0,
            transition_duration: 3.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnimationPhase {
    /// Showing the start palette unmodified.
    Constant,
    /// Cross-fading from the start palette to the next one.
    Transitioning,
}

/// Owns the palette buffers and the transition / rotation state machine.
pub struct PaletteAnimator {
    stops: Vec<PaletteStop>,
    timing: AnimationTiming,
    size: usize,

    start_palette: Vec<Rgba8>,
    /// Empty until the first transition begins.
    next_palette: Vec<Rgba8>,
    transition_palette: Vec<Rgba8>,
    output: Vec<Rgba8>,

    phase: AnimationPhase,
    phase_start: Option<f64>,
    clock_start: Option<f64>,

    hue_origin: f64,
    /// Index into the golden-ratio hue sequence of the start palette.
    generation: u64,
    stops_dirty: bool,
}

impl PaletteAnimator {
    /// Build an animator showing `stops` unshifted as its first palette.
    ///
    /// `seed` picks the origin of the golden-ratio hue sequence used for
    /// later palettes.
    pub fn new(
        stops: Vec<PaletteStop>,
        timing: AnimationTiming,
        size: usize,
        seed: u64,
    ) -> Result<Self, PlasmaError> {
        validate_size(size)?;
        let mut start_palette = vec![[0; 4]; size];
        render_stops(&mut start_palette, &stops)?;
        let hue_origin = StdRng::seed_from_u64(seed).random::<f64>();
        Ok(Self {
            stops,
            timing,
            size,
            output: start_palette.clone(),
            transition_palette: vec![[0; 4]; size],
            start_palette,
            next_palette: Vec::new(),
            phase: AnimationPhase::Constant,
            phase_start: None,
            clock_start: None,
            hue_origin,
            generation: 0,
            stops_dirty: false,
        })
    }

    /// Replace the stop list; palettes are re-rendered on the next tick.
    ///
    /// An empty list is rejected and the current stops stay in use.
    pub fn set_stops(&mut self, stops: Vec<PaletteStop>) -> Result<(), PlasmaError> {
        if stops.is_empty() {
            return Err(PlasmaError::EmptyPalette);
        }
        self.stops = stops;
        self.stops_dirty = true;
        Ok(())
    }

    pub fn set_timing(&mut self, timing: AnimationTiming) {
        self.timing = timing;
    }

    /// Reallocate every palette buffer at `size` entries.
    pub fn set_size(&mut self, size: usize) -> Result<(), PlasmaError> {
        validate_size(size)?;
        if size != self.size {
            self.size = size;
            self.start_palette = vec![[0; 4]; size];
            if !self.next_palette.is_empty() {
                self.next_palette = vec![[0; 4]; size];
            }
            self.transition_palette = vec![[0; 4]; size];
            self.output = vec![[0; 4]; size];
            self.stops_dirty = true;
        }
        Ok(())
    }

    /// Reseed the hue sequence; takes effect at the next transition.
    pub fn reseed(&mut self, seed: u64) {
        self.hue_origin = StdRng::seed_from_u64(seed).random::<f64>();
    }

    /// Hue shift (in turns) of the `n`-th generated palette.  The first
    /// palette keeps the authored colours.
    pub fn hue_shift(&self, generation: u64) -> f64 {
        if generation == 0 {
            0.0
        } else {
            modulo(
                self.hue_origin + generation as f64 * GOLDEN_RATIO_CONJUGATE,
                1.0,
            )
        }
    }

    /// Advance to time `now` (seconds on a monotonic clock) and return the
    /// palette to display this frame.
    pub fn tick(&mut self, now: f64) -> &[Rgba8] {
        let clock_start = *self.clock_start.get_or_insert(now);
        let phase_start = *self.phase_start.get_or_insert(now);

        if self.stops_dirty {
            self.stops_dirty = false;
            self.render_generation(self.generation, false);
            if self.phase == AnimationPhase::Transitioning {
                self.render_generation(self.generation + 1, true);
            }
        }

        let elapsed = now - phase_start;
        match self.phase {
            AnimationPhase::Constant if elapsed > self.timing.transition_delay => {
                self.begin_transition(now);
            }
            AnimationPhase::Transitioning if elapsed > self.timing.transition_duration => {
                self.finish_transition(now);
            }
            _ => {}
        }

        let current: &[Rgba8] = match self.phase {
            AnimationPhase::Constant => &self.start_palette,
            AnimationPhase::Transitioning => {
                let alpha = self.transition_alpha(now);
                if let Err(e) = blend_palettes(
                    &mut self.transition_palette,
                    &self.start_palette,
                    &self.next_palette,
                    alpha,
                ) {
                    error!("palette cross-fade failed: {e}");
                }
                &self.transition_palette
            }
        };

        let offset = (now - clock_start) * self.timing.rotation_speed * self.size as f64
            / REFERENCE_PALETTE_LENGTH;
        if let Err(e) = rotate_palette(&mut self.output, current, offset) {
            error!("palette rotation failed: {e}");
        }
        &self.output
    }

    /// Cross-fade progress in `[0, 1]`; `0` outside a transition.
    pub fn transition_alpha(&self, now: f64) -> f64 {
        match (self.phase, self.phase_start) {
            (AnimationPhase::Transitioning, Some(start)) => {
                if self.timing.transition_duration <= 0.0 {
                    1.0
                } else {
                    ((now - start) / self.timing.transition_duration).clamp(0.0, 1.0)
                }
            }
            _ => 0.0,
        }
    }

    fn begin_transition(&mut self, now: f64) {
        if self.next_palette.len() != self.size {
            self.next_palette = vec![[0; 4]; self.size];
        }
        self.render_generation(self.generation + 1, true);
        self.phase = AnimationPhase::Transitioning;
        self.phase_start = Some(now);
        debug!(
            "palette transition {} started (hue shift {:.3})",
            self.generation + 1,
            self.hue_shift(self.generation + 1)
        );
    }

    fn finish_transition(&mut self, now: f64) {
        mem::swap(&mut self.start_palette, &mut self.next_palette);
        self.generation += 1;
        self.phase = AnimationPhase::Constant;
        self.phase_start = Some(now);
        debug!("palette transition {} finished", self.generation);
    }

    fn render_generation(&mut self, generation: u64, into_next: bool) {
        let shift = self.hue_shift(generation);
        let stops = if shift == 0.0 {
            self.stops.clone()
        } else {
            recolor_stops(&self.stops, shift)
        };
        let target = if into_next {
            &mut self.next_palette
        } else {
            &mut self.start_palette
        };
        if let Err(e) = render_stops(target, &stops) {
            error!("palette render failed: {e}");
        }
    }

    pub fn phase(&self) -> AnimationPhase {
        self.phase
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn timing(&self) -> &AnimationTiming {
        &self.timing
    }

    pub fn stops(&self) -> &[PaletteStop] {
        &self.stops
    }

    /// Number of completed transitions.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Palette returned by the last [`PaletteAnimator::tick`].
    pub fn palette(&self) -> &[Rgba8] {
        &self.output
    }

    pub fn start_palette(&self) -> &[Rgba8] {
        &self.start_palette
    }

    /// Empty until the first transition has begun.
    pub fn next_palette(&self) -> &[Rgba8] {
        &self.next_palette
    }
}

fn validate_size(size: usize) -> Result<(), PlasmaError> {
    if size == 0 || size > MAX_OUTPUT_RANGE {
        return Err(PlasmaError::InvalidPaletteSize {
            size,
            max: MAX_OUTPUT_RANGE,
        });
    }
    Ok(())
}
