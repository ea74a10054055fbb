//! `bevy_symbios_plasma`: animated, palette-cycled plasma fractals for Bevy.
//!
//! # Architecture
//! A seeded multi-octave [`NoiseGenerator`] feeds the fractal compositor,
//! which bakes a [`FractalField`] of palette indices once per configuration.
//! Each frame the [`PaletteAnimator`] rotates a cyclic palette rendered from
//! eased [`PaletteStop`]s and periodically cross-fades to a hue-shifted
//! sibling; the [`compositor`] then maps every field sample through it.
//!
//! [`PlasmaEngine`] wires those stages behind a small frame-driven API.
//! [`PlasmaTexture`] and [`SymbiosPlasmaPlugin`] put an engine on an entity
//! and repaint its images every `Update`.

pub mod animator;
pub mod color;
pub mod compositor;
pub mod easing;
pub mod engine;
pub mod fractal;
pub mod generator;
pub mod noise;
pub mod options;
pub mod palette;
pub mod texture;

pub use animator::{AnimationPhase, AnimationTiming, PaletteAnimator};
pub use color::{Color, Rgba8};
pub use easing::Easing;
pub use engine::{FrameClock, ManualClock, MonotonicClock, PlasmaEngine};
pub use fractal::{FractalField, FractalNoiseParams, WarpParams};
pub use generator::PlasmaError;
pub use noise::NoiseGenerator;
pub use options::{PaletteOptions, PlasmaOptions};
pub use palette::{PaletteStop, StopNoiseParams};
pub use texture::PlasmaTexture;

use bevy::prelude::*;

/// Bevy plugin: registers the per-frame plasma animation system.
pub struct SymbiosPlasmaPlugin;

impl Plugin for SymbiosPlasmaPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, texture::animate_plasma_textures);
    }
}
