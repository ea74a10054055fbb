//! Fractal (multi-octave) noise compositing into a dense scalar field.
//!
//! Octave `i` is sampled at `freq = lacunarity^i` and weighted by
//! `amplitude · gain^i`.  The field generator maps the composite value to a
//! palette index and wraps it with a true modulo instead of clamping, so
//! strong amplitudes cycle through the palette rather than saturating at its
//! ends.

use rayon::prelude::*;

use crate::{
    generator::{PlasmaError, validate_dimensions},
    noise::{NoiseGenerator, modulo, normalize},
};

/// Largest palette a `u16` field can index.
pub const MAX_OUTPUT_RANGE: usize = u16::MAX as usize + 1;

/// How octaves combine into one fractal noise value.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FractalNoiseParams {
    /// Base spatial frequency in cycles across the longer image side.
    pub frequency: f64,
    /// Weight of the first octave.
    pub amplitude: f64,
    /// Per-octave amplitude multiplier (persistence).
    pub gain: f64,
    /// Per-octave frequency multiplier.
    pub lacunarity: f64,
    pub octaves: usize,
    /// Position along a third noise axis.  `None` samples the plain 2-D
    /// field; stepping `Some(z)` morphs the pattern through 3-D noise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slice: Option<f64>,
}

impl Default for FractalNoiseParams {
    fn default() -> Self {
        Self {
            frequency: 3.0,
            amplitude: 1.5,
            gain: 0.5,
            lacunarity: 2.0,
            octaves: 6,
            slice: None,
        }
    }
}

/// Domain warp: a secondary fractal field that displaces sample coordinates.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct WarpParams {
    pub enabled: bool,
    /// Displacement in normalised image units per unit of warp noise.
    pub strength: f64,
    pub frequency: f64,
    pub octaves: usize,
}

impl Default for WarpParams {
    fn default() -> Self {
        Self {
            enabled: false,
            strength: 0.2,
            frequency: 2.0,
            octaves: 3,
        }
    }
}

/// Sum `octaves` layers of `generator` at `(x, y)`.
///
/// Returns roughly `±amplitude / (1 − gain)` for `gain < 1`; callers must
/// tolerate overshoot.
#[inline]
pub fn composite(
    generator: &NoiseGenerator,
    x: f64,
    y: f64,
    octaves: usize,
    gain: f64,
    lacunarity: f64,
    amplitude: f64,
) -> f64 {
    let mut sum = 0.0;
    let mut amp = amplitude;
    let mut freq = 1.0;
    for octave in 0..octaves {
        sum += generator.sample(octave, x * freq, y * freq) * amp;
        amp *= gain;
        freq *= lacunarity;
    }
    sum
}

/// [`composite`] over 3-D noise at depth `z`; `z` is scaled per octave
/// like `x` and `y`.
#[inline]
pub fn composite3(
    generator: &NoiseGenerator,
    (x, y, z): (f64, f64, f64),
    octaves: usize,
    gain: f64,
    lacunarity: f64,
    amplitude: f64,
) -> f64 {
    let mut sum = 0.0;
    let mut amp = amplitude;
    let mut freq = 1.0;
    for octave in 0..octaves {
        sum += generator.sample3(octave, x * freq, y * freq, z * freq) * amp;
        amp *= gain;
        freq *= lacunarity;
    }
    sum
}

impl FractalNoiseParams {
    /// [`composite`] (or [`composite3`] at `slice`) with these parameters;
    /// `frequency` is not applied here.
    #[inline]
    pub fn composite(&self, generator: &NoiseGenerator, x: f64, y: f64) -> f64 {
        match self.slice {
            None => composite(
                generator,
                x,
                y,
                self.octaves,
                self.gain,
                self.lacunarity,
                self.amplitude,
            ),
            Some(z) => composite3(
                generator,
                (x, y, z),
                self.octaves,
                self.gain,
                self.lacunarity,
                self.amplitude,
            ),
        }
    }
}

/// Secondary generator plus parameters for domain warping.
pub struct Warp<'a> {
    pub params: &'a WarpParams,
    pub generator: &'a NoiseGenerator,
}

impl Warp<'_> {
    /// Offset `(u, v)` (normalised image coordinates) by the warp field.
    #[inline]
    fn displace(&self, u: f64, v: f64) -> (f64, f64) {
        let p = self.params;
        let wu = u * p.frequency;
        let wv = v * p.frequency;
        // Decorrelate the two axes by sampling the same field far apart.
        let du = composite(self.generator, wu, wv, p.octaves, 0.5, 2.0, 1.0);
        let dv = composite(self.generator, wu + 5.2, wv + 1.3, p.octaves, 0.5, 2.0, 1.0);
        (u + du * p.strength, v + dv * p.strength)
    }
}

/// Map a composite noise value to a palette index in `[0, range)`.
#[inline]
pub fn to_index(value: f64, range: usize) -> u16 {
    let r = range as f64;
    modulo((normalize(value) * r).floor(), r) as u16
}

/// Fill `buffer` (row-major, `width × height`) with wrapped palette indices.
///
/// Coordinates are normalised by `period = 1 / max(width, height)` so the
/// pattern keeps its aspect ratio, then scaled by `params.frequency`.
pub fn generate_field(
    buffer: &mut [u16],
    width: u32,
    height: u32,
    output_range: usize,
    params: &FractalNoiseParams,
    generator: &NoiseGenerator,
    warp: Option<Warp<'_>>,
) -> Result<(), PlasmaError> {
    validate_dimensions(width, height)?;
    validate_range(output_range)?;
    let w = width as usize;
    let expected = w * height as usize;
    if buffer.len() != expected {
        return Err(PlasmaError::BufferSizeMismatch {
            expected,
            actual: buffer.len(),
        });
    }

    let period = 1.0 / width.max(height) as f64;
    let warp = warp.filter(|w| w.params.enabled);

    buffer
        .par_chunks_mut(w)
        .enumerate()
        .for_each(|(y, row)| {
            let v = y as f64 * period;
            for (x, out) in row.iter_mut().enumerate() {
                let u = x as f64 * period;
                let (u, v) = match &warp {
                    Some(warp) => warp.displace(u, v),
                    None => (u, v),
                };
                let value = params.composite(generator, u * params.frequency, v * params.frequency);
                *out = to_index(value, output_range);
            }
        });
    Ok(())
}

fn validate_range(output_range: usize) -> Result<(), PlasmaError> {
    if output_range == 0 || output_range > MAX_OUTPUT_RANGE {
        return Err(PlasmaError::InvalidPaletteSize {
            size: output_range,
            max: MAX_OUTPUT_RANGE,
        });
    }
    Ok(())
}

/// Owned scalar field, regenerated wholesale on resize or option change.
#[derive(Clone, Debug)]
pub struct FractalField {
    width: u32,
    height: u32,
    output_range: usize,
    data: Vec<u16>,
}

impl FractalField {
    /// Allocate a zeroed field; call [`FractalField::regenerate`] to fill it.
    pub fn new(width: u32, height: u32, output_range: usize) -> Result<Self, PlasmaError> {
        validate_dimensions(width, height)?;
        validate_range(output_range)?;
        Ok(Self {
            width,
            height,
            output_range,
            data: vec![0; width as usize * height as usize],
        })
    }

    /// Reallocate for a new size; contents are zeroed until regenerated.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), PlasmaError> {
        validate_dimensions(width, height)?;
        self.width = width;
        self.height = height;
        self.data = vec![0; width as usize * height as usize];
        Ok(())
    }

    pub fn set_output_range(&mut self, output_range: usize) -> Result<(), PlasmaError> {
        validate_range(output_range)?;
        self.output_range = output_range;
        Ok(())
    }

    /// Recompute every sample.
    pub fn regenerate(
        &mut self,
        params: &FractalNoiseParams,
        generator: &NoiseGenerator,
        warp: Option<Warp<'_>>,
    ) -> Result<(), PlasmaError> {
        generate_field(
            &mut self.data,
            self.width,
            self.height,
            self.output_range,
            params,
            generator,
            warp,
        )
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn output_range(&self) -> usize {
        self.output_range
    }

    /// Row-major palette indices.
    pub fn data(&self) -> &[u16] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_octave_is_scaled_sample() {
        let generator = NoiseGenerator::new(3, 4);
        for (x, y) in [(0.3, 0.7), (1.9, -2.4), (10.25, 3.5)] {
            let expected = generator.sample(0, x, y) * 2.5;
            let got = composite(&generator, x, y, 1, 0.5, 2.0, 2.5);
            assert_eq!(got, expected);
        }
    }

    #[test]
    fn octaves_accumulate_with_gain_and_lacunarity() {
        let generator = NoiseGenerator::new(11, 3);
        let (x, y) = (0.41, 0.77);
        let expected = generator.sample(0, x, y)
            + generator.sample(1, x * 3.0, y * 3.0) * 0.25
            + generator.sample(2, x * 9.0, y * 9.0) * 0.0625;
        let got = composite(&generator, x, y, 3, 0.25, 3.0, 1.0);
        assert!((got - expected).abs() < 1e-12);
    }

    #[test]
    fn slice_switches_to_three_dimensional_noise() {
        let generator = NoiseGenerator::new(5, 1);
        let flat = FractalNoiseParams {
            octaves: 1,
            amplitude: 2.0,
            ..Default::default()
        };
        let (x, y) = (0.63, 1.42);
        assert_eq!(flat.composite(&generator, x, y), generator.sample(0, x, y) * 2.0);

        let at = |z| FractalNoiseParams {
            slice: Some(z),
            ..flat.clone()
        };
        assert_eq!(
            at(0.35).composite(&generator, x, y),
            generator.sample3(0, x, y, 0.35) * 2.0
        );
        let depths: Vec<f64> = [0.1, 0.6, 1.3]
            .iter()
            .map(|&z| at(z).composite(&generator, x, y))
            .collect();
        assert!(
            depths.windows(2).any(|w| w[0] != w[1]),
            "slice had no effect: {depths:?}"
        );
    }

    #[test]
    fn to_index_wraps_instead_of_clamping() {
        assert_eq!(to_index(-1.0, 256), 0);
        assert_eq!(to_index(0.0, 256), 128);
        // 1.0 maps to exactly `range`, which wraps to 0.
        assert_eq!(to_index(1.0, 256), 0);
        // Overshoot past +1 wraps around to the start of the palette.
        assert_eq!(to_index(1.5, 256), 64);
        // Overshoot past -1 wraps from the end.
        assert_eq!(to_index(-1.5, 256), 192);
    }

    #[test]
    fn field_values_are_valid_indices_and_deterministic() {
        let params = FractalNoiseParams {
            amplitude: 4.0,
            ..Default::default()
        };
        let generator = NoiseGenerator::new(5, params.octaves);
        let mut a = FractalField::new(48, 32, 200).unwrap();
        let mut b = FractalField::new(48, 32, 200).unwrap();
        a.regenerate(&params, &generator, None).unwrap();
        b.regenerate(&params, &generator, None).unwrap();
        assert!(a.data().iter().all(|&v| (v as usize) < 200));
        assert_eq!(a.data(), b.data());
        let first = a.data()[0];
        assert!(a.data().iter().any(|&v| v != first), "field is flat");
    }

    #[test]
    fn warp_changes_the_field() {
        let params = FractalNoiseParams::default();
        let generator = NoiseGenerator::new(5, params.octaves);
        let warp_params = WarpParams {
            enabled: true,
            strength: 0.5,
            ..Default::default()
        };
        let warp_generator = NoiseGenerator::new(6, warp_params.octaves);
        let mut plain = FractalField::new(32, 32, 256).unwrap();
        let mut warped = FractalField::new(32, 32, 256).unwrap();
        plain.regenerate(&params, &generator, None).unwrap();
        warped
            .regenerate(
                &params,
                &generator,
                Some(Warp {
                    params: &warp_params,
                    generator: &warp_generator,
                }),
            )
            .unwrap();
        assert_ne!(plain.data(), warped.data());

        // A disabled warp is ignored.
        let disabled = WarpParams::default();
        let mut unwarped = FractalField::new(32, 32, 256).unwrap();
        unwarped
            .regenerate(
                &params,
                &generator,
                Some(Warp {
                    params: &disabled,
                    generator: &warp_generator,
                }),
            )
            .unwrap();
        assert_eq!(plain.data(), unwarped.data());
    }

    #[test]
    fn rejects_bad_sizes() {
        assert!(FractalField::new(0, 10, 256).is_err());
        assert!(FractalField::new(10, 10, 0).is_err());
        assert!(FractalField::new(10, 10, MAX_OUTPUT_RANGE + 1).is_err());
        let generator = NoiseGenerator::new(1, 1);
        let mut short = vec![0u16; 3];
        let err = generate_field(
            &mut short,
            2,
            2,
            16,
            &FractalNoiseParams::default(),
            &generator,
            None,
        );
        assert!(matches!(
            err,
            Err(PlasmaError::BufferSizeMismatch {
                expected: 4,
                actual: 3
            })
        ));
    }
}
