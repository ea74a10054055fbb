//! The user-editable option tree.
//!
//! [`PlasmaOptions`] round-trips through serde for presets.  For shareable
//! permalinks it can also be patched one flat dotted path at a time with
//! [`PlasmaOptions::apply_param`], which is deliberately forgiving: a value
//! that does not parse falls back to the option's default and an
//! out-of-range number is clamped, each with a logged warning.  Only an
//! unknown path is an error.
//!
//! Stops use a compact `pos:#rrggbb[aa]:easing` list joined by `,` in the
//! flat form, e.g. `0:#140c3c:inOutSine,0.5:#ffbe3c:linear`.  Per-stop noise
//! is only carried by the serde form.

use std::str::FromStr;

use bevy::log::warn;

use crate::{
    animator::AnimationTiming,
    color::Color,
    easing::Easing,
    fractal::{FractalNoiseParams, WarpParams},
    generator::PlasmaError,
    palette::{PaletteStop, default_stops},
};

/// Inclusive numeric range of one option.
type Bounds<T> = (T, T);

const FREQUENCY: Bounds<f64> = (0.01, 64.0);
const AMPLITUDE: Bounds<f64> = (0.01, 16.0);
const GAIN: Bounds<f64> = (0.01, 1.0);
const LACUNARITY: Bounds<f64> = (1.0, 8.0);
const OCTAVES: Bounds<usize> = (1, 12);
const SLICE: Bounds<f64> = (-1.0e6, 1.0e6);
const WARP_STRENGTH: Bounds<f64> = (0.0, 4.0);
const WARP_OCTAVES: Bounds<usize> = (1, 8);
const PALETTE_SIZE: Bounds<usize> = (2, 8192);
const ROTATION_SPEED: Bounds<f64> = (-1024.0, 1024.0);
const TRANSITION_DELAY: Bounds<f64> = (0.0, 3600.0);
const TRANSITION_DURATION: Bounds<f64> = (0.0, 600.0);

/// Palette size and authored stops.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PaletteOptions {
    /// Number of palette entries (also the scalar field's index range).
    pub size: usize,
    pub stops: Vec<PaletteStop>,
}

impl Default for PaletteOptions {
    fn default() -> Self {
        Self {
            size: 512,
            stops: default_stops(),
        }
    }
}

/// Complete configuration of a [`crate::engine::PlasmaEngine`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PlasmaOptions {
    pub seed: u64,
    pub noise: FractalNoiseParams,
    pub warp: WarpParams,
    pub palette: PaletteOptions,
    pub animation: AnimationTiming,
    /// Show the raw scalar field as a grey ramp instead of the palette.
    pub debug_grayscale: bool,
}

impl Default for PlasmaOptions {
    fn default() -> Self {
        Self {
            seed: 1,
            noise: FractalNoiseParams::default(),
            warp: WarpParams::default(),
            palette: PaletteOptions::default(),
            animation: AnimationTiming::default(),
            debug_grayscale: false,
        }
    }
}

impl PlasmaOptions {
    /// Every path accepted by [`PlasmaOptions::apply_param`].
    pub const PATHS: [&'static str; 17] = [
        "seed",
        "noise.frequency",
        "noise.amplitude",
        "noise.gain",
        "noise.lacunarity",
        "noise.octaves",
        "noise.slice",
        "warp.enabled",
        "warp.strength",
        "warp.frequency",
        "warp.octaves",
        "palette.size",
        "palette.stops",
        "animation.rotation_speed",
        "animation.transition_delay",
        "animation.transition_duration",
        "debug_grayscale",
    ];

    /// Copy with every numeric field clamped into its range, stop positions
    /// clamped into `[0, 1]` and an empty stop list replaced by the defaults.
    pub fn sanitized(&self) -> Self {
        let mut o = self.clone();
        let noise = FractalNoiseParams::default();
        let warp = WarpParams::default();
        o.noise.frequency = clamp_f64(o.noise.frequency, FREQUENCY, noise.frequency);
        o.noise.amplitude = clamp_f64(o.noise.amplitude, AMPLITUDE, noise.amplitude);
        o.noise.gain = clamp_f64(o.noise.gain, GAIN, noise.gain);
        o.noise.lacunarity = clamp_f64(o.noise.lacunarity, LACUNARITY, noise.lacunarity);
        o.noise.octaves = o.noise.octaves.clamp(OCTAVES.0, OCTAVES.1);
        o.noise.slice = o
            .noise
            .slice
            .filter(|z| !z.is_nan())
            .map(|z| z.clamp(SLICE.0, SLICE.1));
        o.warp.strength = clamp_f64(o.warp.strength, WARP_STRENGTH, warp.strength);
        o.warp.frequency = clamp_f64(o.warp.frequency, FREQUENCY, warp.frequency);
        o.warp.octaves = o.warp.octaves.clamp(WARP_OCTAVES.0, WARP_OCTAVES.1);
        o.palette.size = o.palette.size.clamp(PALETTE_SIZE.0, PALETTE_SIZE.1);
        if o.palette.stops.is_empty() {
            o.palette.stops = default_stops();
        }
        for stop in &mut o.palette.stops {
            stop.pos = clamp_f64(stop.pos, (0.0, 1.0), 0.0);
        }
        let timing = AnimationTiming::default();
        o.animation.rotation_speed =
            clamp_f64(o.animation.rotation_speed, ROTATION_SPEED, timing.rotation_speed);
        o.animation.transition_delay =
            clamp_f64(o.animation.transition_delay, TRANSITION_DELAY, timing.transition_delay);
        o.animation.transition_duration = clamp_f64(
            o.animation.transition_duration,
            TRANSITION_DURATION,
            timing.transition_duration,
        );
        o
    }

    /// Set one option from its flat dotted `path` and string `value`.
    ///
    /// Returns [`PlasmaError::UnknownOption`] if `path` names no option;
    /// malformed values never fail (see the module docs).
    pub fn apply_param(&mut self, path: &str, value: &str) -> Result<(), PlasmaError> {
        let d = PlasmaOptions::default();
        match path {
            "seed" => self.seed = parse_or_default(path, value, d.seed),
            "noise.frequency" => {
                self.noise.frequency = parse_f64(path, value, d.noise.frequency, FREQUENCY)
            }
            "noise.amplitude" => {
                self.noise.amplitude = parse_f64(path, value, d.noise.amplitude, AMPLITUDE)
            }
            "noise.gain" => self.noise.gain = parse_f64(path, value, d.noise.gain, GAIN),
            "noise.lacunarity" => {
                self.noise.lacunarity = parse_f64(path, value, d.noise.lacunarity, LACUNARITY)
            }
            "noise.octaves" => {
                self.noise.octaves = parse_usize(path, value, d.noise.octaves, OCTAVES)
            }
            "noise.slice" => self.noise.slice = parse_slice(path, value),
            "warp.enabled" => self.warp.enabled = parse_bool(path, value, d.warp.enabled),
            "warp.strength" => {
                self.warp.strength = parse_f64(path, value, d.warp.strength, WARP_STRENGTH)
            }
            "warp.frequency" => {
                self.warp.frequency = parse_f64(path, value, d.warp.frequency, FREQUENCY)
            }
            "warp.octaves" => {
                self.warp.octaves = parse_usize(path, value, d.warp.octaves, WARP_OCTAVES)
            }
            "palette.size" => {
                self.palette.size = parse_usize(path, value, d.palette.size, PALETTE_SIZE)
            }
            "palette.stops" => self.palette.stops = parse_stops(value),
            "animation.rotation_speed" => {
                self.animation.rotation_speed =
                    parse_f64(path, value, d.animation.rotation_speed, ROTATION_SPEED)
            }
            "animation.transition_delay" => {
                self.animation.transition_delay =
                    parse_f64(path, value, d.animation.transition_delay, TRANSITION_DELAY)
            }
            "animation.transition_duration" => {
                self.animation.transition_duration = parse_f64(
                    path,
                    value,
                    d.animation.transition_duration,
                    TRANSITION_DURATION,
                )
            }
            "debug_grayscale" => {
                self.debug_grayscale = parse_bool(path, value, d.debug_grayscale)
            }
            _ => return Err(PlasmaError::UnknownOption(path.to_owned())),
        }
        Ok(())
    }

    /// Defaults patched by every `(path, value)` pair in order.
    pub fn from_params<'a, I>(params: I) -> Result<Self, PlasmaError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut options = PlasmaOptions::default();
        for (path, value) in params {
            options.apply_param(path, value)?;
        }
        Ok(options)
    }
}

/// Encode stops in the compact flat form read by `palette.stops`.
pub fn format_stops(stops: &[PaletteStop]) -> String {
    stops
        .iter()
        .map(|s| format!("{}:{}:{}", s.pos, s.color, s.easing))
        .collect::<Vec<_>>()
        .join(",")
}

// --- lenient parsers --------------------------------------------------------

fn clamp_f64(v: f64, (min, max): Bounds<f64>, fallback: f64) -> f64 {
    if v.is_nan() { fallback } else { v.clamp(min, max) }
}

/// Empty or `none` selects the flat field; anything else is a depth.
fn parse_slice(path: &str, value: &str) -> Option<f64> {
    match value.trim() {
        "" | "none" => None,
        v => match v.parse::<f64>() {
            Ok(z) if !z.is_nan() => Some(clamp_f64(z, SLICE, 0.0)),
            _ => {
                warn!("option {path}: \"{value}\" is not a depth, using the flat field");
                None
            }
        },
    }
}

fn parse_or_default<T>(path: &str, value: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display + Copy,
{
    value.trim().parse().unwrap_or_else(|_| {
        warn!("option {path}: cannot parse \"{value}\", using default {default}");
        default
    })
}

fn parse_f64(path: &str, value: &str, default: f64, bounds: Bounds<f64>) -> f64 {
    let v = parse_or_default(path, value, default);
    if !v.is_finite() {
        warn!("option {path}: \"{value}\" is not finite, using default {default}");
        return default;
    }
    let clamped = v.clamp(bounds.0, bounds.1);
    if clamped != v {
        warn!(
            "option {path}: {v} is outside [{}, {}], clamped to {clamped}",
            bounds.0, bounds.1
        );
    }
    clamped
}

fn parse_usize(path: &str, value: &str, default: usize, bounds: Bounds<usize>) -> usize {
    // Accept "6.0" style integers as produced by some serializers.
    let parsed = value
        .trim()
        .parse::<usize>()
        .ok()
        .or_else(|| {
            value
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f.round() as usize)
        });
    let Some(v) = parsed else {
        warn!("option {path}: cannot parse \"{value}\", using default {default}");
        return default;
    };
    let clamped = v.clamp(bounds.0, bounds.1);
    if clamped != v {
        warn!(
            "option {path}: {v} is outside [{}, {}], clamped to {clamped}",
            bounds.0, bounds.1
        );
    }
    clamped
}

fn parse_bool(path: &str, value: &str, default: bool) -> bool {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => true,
        "false" | "0" | "no" | "off" => false,
        _ => {
            warn!("option {path}: cannot parse \"{value}\" as a flag, using default {default}");
            default
        }
    }
}

fn parse_stop(entry: &str) -> Option<PaletteStop> {
    let mut parts = entry.trim().split(':');
    let pos = parts.next()?.trim().parse::<f64>().ok()?;
    if !pos.is_finite() {
        return None;
    }
    let color = parts.next()?.parse::<Color>().ok()?;
    // A missing easing is linear; an unknown one rejects the stop.
    let easing = match parts.next() {
        Some(name) => name.trim().parse::<Easing>().ok()?,
        None => Easing::Linear,
    };
    Some(PaletteStop::new(pos.clamp(0.0, 1.0), color, easing))
}

fn parse_stops(value: &str) -> Vec<PaletteStop> {
    let mut stops = Vec::new();
    for entry in value.split(',').filter(|e| !e.trim().is_empty()) {
        match parse_stop(entry) {
            Some(stop) => stops.push(stop),
            None => warn!("option palette.stops: skipping malformed stop \"{entry}\""),
        }
    }
    if stops.is_empty() {
        warn!("option palette.stops: no usable stops in \"{value}\", using defaults");
        return default_stops();
    }
    stops
}
