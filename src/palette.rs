//! Cyclic palette synthesis from sparse gradient stops.
//!
//! The algorithm:
//!  1. Copy the stop list and stable-sort the copy by position.
//!  2. Walk adjacent pairs cyclically; the last stop pairs with the first
//!     across the `1 → 0` seam.
//!  3. Each pair covers `round(pos · N)` up to the next stop's index.  A
//!     segment of zero (or negative) width writes just its start colour.
//!  4. Entry `k` of a segment eases every channel from the start stop's colour
//!     towards the end stop's colour with the start stop's easing curve, then
//!     optionally perturbs its lightness with the stop's noise.
//!
//! Every write wraps with a true modulo, so stops near `1.0` and the seam
//! segment land on valid entries.  Coincident stops overwrite each other
//! rather than averaging.

use std::sync::OnceLock;

use crate::{
    color::{Color, Rgba8},
    easing::Easing,
    fractal::composite,
    generator::PlasmaError,
    noise::{NoiseGenerator, modulo, wrap_index},
};

/// Optional per-stop lightness noise for the segment starting at a stop.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct StopNoiseParams {
    /// Noise seed; when unset each stop seeds from its rank in the sorted
    /// stop list, so noisy stops never share a pattern by accident.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Maximum HSL lightness offset.
    pub amplitude: f64,
    /// Noise cycles across one segment.
    pub frequency: f64,
    pub octaves: usize,
    pub gain: f64,
    pub lacunarity: f64,
}

impl Default for StopNoiseParams {
    fn default() -> Self {
        Self {
            seed: None,
            amplitude: 0.15,
            frequency: 8.0,
            octaves: 3,
            gain: 0.5,
            lacunarity: 2.0,
        }
    }
}

/// One anchor of a cyclic gradient.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PaletteStop {
    /// Position on the palette circle, `[0, 1]` (0 and 1 coincide).
    pub pos: f64,
    pub color: Color,
    /// Curve used from this stop to the next one.
    #[serde(default)]
    pub easing: Easing,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub noise: Option<StopNoiseParams>,
}

impl PaletteStop {
    pub fn new(pos: f64, color: Color, easing: Easing) -> Self {
        Self {
            pos,
            color,
            easing,
            noise: None,
        }
    }

    pub fn with_noise(mut self, noise: StopNoiseParams) -> Self {
        self.noise = Some(noise);
        self
    }
}

/// The stops shown before any user configuration: a warm/cool four-stop loop.
pub fn default_stops() -> Vec<PaletteStop> {
    vec![
        PaletteStop::new(0.0, Color::rgb(20, 12, 60), Easing::InOutSine),
        PaletteStop::new(0.3, Color::rgb(220, 40, 110), Easing::OutQuad),
        PaletteStop::new(0.55, Color::rgb(255, 190, 60), Easing::InOutCubic),
        PaletteStop::new(0.8, Color::rgb(40, 170, 200), Easing::InOutSine),
    ]
}

/// Capability that perturbs a rendered colour given its position within the
/// segment (`0..1`).
pub trait LightnessNoise {
    fn apply_lightness_noise(&self, pos: f64, base: Color) -> Color;
}

/// Fractal-noise lightness perturbation built from [`StopNoiseParams`].
pub struct StopNoise {
    params: StopNoiseParams,
    generator: NoiseGenerator,
}

impl StopNoise {
    /// Noise for the stop at `rank` in position order.
    pub fn new(params: &StopNoiseParams, rank: usize) -> Self {
        let seed = params.seed.unwrap_or(rank as u64);
        Self {
            generator: NoiseGenerator::new(seed, params.octaves),
            params: params.clone(),
        }
    }
}

impl LightnessNoise for StopNoise {
    fn apply_lightness_noise(&self, pos: f64, base: Color) -> Color {
        let p = &self.params;
        if p.amplitude == 0.0 {
            return base;
        }
        let n = composite(
            &self.generator,
            pos * p.frequency,
            0.5,
            p.octaves,
            p.gain,
            p.lacunarity,
            1.0,
        );
        base.with_lightness_offset(n * p.amplitude)
    }
}

/// Render `stops` into every entry of `buffer`.
///
/// An empty `buffer` is a no-op.  The caller's stop order is left untouched;
/// sorting happens on a copy.
pub fn render_stops(buffer: &mut [Rgba8], stops: &[PaletteStop]) -> Result<(), PlasmaError> {
    let count = buffer.len();
    if count == 0 {
        return Ok(());
    }
    if stops.is_empty() {
        return Err(PlasmaError::EmptyPalette);
    }

    let mut sorted = stops.to_vec();
    sorted.sort_by(|a, b| a.pos.total_cmp(&b.pos));

    let n = sorted.len();
    let size = count as f64;
    for i in 0..n {
        let next = (i + 1) % n;
        let start = &sorted[i];
        let end = &sorted[next];

        let start_index = (start.pos * size).round() as i64;
        let end_index = (end.pos * size).round() as i64;
        let mut dist = end_index - start_index;
        if next == 0 {
            dist += count as i64;
        }

        if dist <= 0 {
            buffer[wrap_index(start_index, count)] = start.color.to_rgba8();
            continue;
        }

        let noise = start.noise.as_ref().map(|p| StopNoise::new(p, i));
        render_segment(
            buffer,
            start_index,
            dist as usize,
            start.color,
            end.color,
            start.easing,
            noise.as_ref().map(|n| n as &dyn LightnessNoise),
        );
    }
    Ok(())
}

/// Allocate and render a palette of `count` entries.
pub fn render_palette(count: usize, stops: &[PaletteStop]) -> Result<Vec<Rgba8>, PlasmaError> {
    let mut buffer = vec![[0; 4]; count];
    render_stops(&mut buffer, stops)?;
    Ok(buffer)
}

/// Ease `dist` entries from `from` towards `to`, starting at `start_index`.
///
/// Entry `k` receives `easing(k, from, to − from, dist)` per channel, so the
/// end colour itself is left for the next segment to write.
pub fn render_segment(
    buffer: &mut [Rgba8],
    start_index: i64,
    dist: usize,
    from: Color,
    to: Color,
    easing: Easing,
    noise: Option<&dyn LightnessNoise>,
) {
    let count = buffer.len();
    if count == 0 || dist == 0 {
        return;
    }
    let d = dist as f64;
    let channel = |t: f64, a: f64, b: f64| easing.ease(t, a, b - a, d);

    for k in 0..dist {
        let t = k as f64;
        let mut color = Color::from_f64(
            channel(t, from.r as f64, to.r as f64),
            channel(t, from.g as f64, to.g as f64),
            channel(t, from.b as f64, to.b as f64),
            channel(t, from.a as f64, to.a as f64),
        );
        if let Some(noise) = noise {
            color = noise.apply_lightness_noise(t / d, color);
        }
        buffer[wrap_index(start_index + k as i64, count)] = color.to_rgba8();
    }
}

/// Blend two stop lists index by index; positions, easings and noise come
/// from `a`.
pub fn blend_stops(
    a: &[PaletteStop],
    b: &[PaletteStop],
    alpha: f64,
) -> Result<Vec<PaletteStop>, PlasmaError> {
    if a.len() != b.len() {
        return Err(PlasmaError::PaletteLengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    Ok(a.iter()
        .zip(b)
        .map(|(sa, sb)| PaletteStop {
            color: sa.color.blend(sb.color, alpha),
            ..sa.clone()
        })
        .collect())
}

/// Rotate every stop's hue by `hue_shift` turns, keeping everything else.
pub fn recolor_stops(stops: &[PaletteStop], hue_shift: f64) -> Vec<PaletteStop> {
    stops
        .iter()
        .map(|s| PaletteStop {
            color: s.color.with_hue_shift(hue_shift),
            ..s.clone()
        })
        .collect()
}

/// Cross-fade two equally long palettes into `dst`.
pub fn blend_palettes(
    dst: &mut [Rgba8],
    a: &[Rgba8],
    b: &[Rgba8],
    alpha: f64,
) -> Result<(), PlasmaError> {
    if a.len() != b.len() {
        return Err(PlasmaError::PaletteLengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    if dst.len() != a.len() {
        return Err(PlasmaError::BufferSizeMismatch {
            expected: a.len(),
            actual: dst.len(),
        });
    }
    let t = alpha.clamp(0.0, 1.0);
    for ((out, pa), pb) in dst.iter_mut().zip(a).zip(b) {
        for c in 0..4 {
            let from = pa[c] as f64;
            out[c] = (from + (pb[c] as f64 - from) * t).round() as u8;
        }
    }
    Ok(())
}

/// Write `src` rotated by `offset` entries into `dst`:
/// `dst[i] = src[(i + round(offset)) mod N]`.
pub fn rotate_palette(dst: &mut [Rgba8], src: &[Rgba8], offset: f64) -> Result<(), PlasmaError> {
    if dst.len() != src.len() {
        return Err(PlasmaError::BufferSizeMismatch {
            expected: src.len(),
            actual: dst.len(),
        });
    }
    let n = src.len();
    if n == 0 {
        return Ok(());
    }
    let shift = modulo(offset, n as f64).round() as i64;
    for (i, out) in dst.iter_mut().enumerate() {
        *out = src[wrap_index(i as i64 + shift, n)];
    }
    Ok(())
}

/// Halve a palette with a 2-entry box filter.
///
/// Palette images are sRGB, so colour channels are decoded to linear light,
/// averaged and re-encoded; alpha is averaged directly.  Like a floor-halved
/// mip level, an odd trailing entry is dropped.  A single-entry palette is
/// returned unchanged.
pub fn downsample(palette: &[Rgba8]) -> Vec<Rgba8> {
    if palette.len() <= 1 {
        return palette.to_vec();
    }
    palette
        .chunks_exact(2)
        .map(|pair| {
            let [a, b] = [pair[0], pair[1]];
            let mut out = [0u8; 4];
            for c in 0..3 {
                out[c] = linear_to_srgb((srgb_to_linear(a[c]) + srgb_to_linear(b[c])) * 0.5);
            }
            out[3] = ((a[3] as u16 + b[3] as u16 + 1) / 2) as u8;
            out
        })
        .collect()
}

fn srgb_to_linear(v: u8) -> f64 {
    static LUT: OnceLock<[f64; 256]> = OnceLock::new();
    LUT.get_or_init(|| {
        std::array::from_fn(|i| {
            let c = i as f64 / 255.0;
            if c <= 0.04045 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        })
    })[v as usize]
}

fn linear_to_srgb(linear: f64) -> u8 {
    let l = linear.clamp(0.0, 1.0);
    let encoded = if l <= 0.003_130_8 {
        l * 12.92
    } else {
        1.055 * l.powf(1.0 / 2.4) - 0.055
    };
    (encoded * 255.0).round() as u8
}

/// All mip levels of a palette, from full size down to a single entry.
pub fn mip_chain(palette: &[Rgba8]) -> Vec<Vec<Rgba8>> {
    if palette.is_empty() {
        return Vec::new();
    }
    let mut levels = vec![palette.to_vec()];
    while let Some(last) = levels.last() {
        if last.len() <= 1 {
            break;
        }
        let next = downsample(last);
        levels.push(next);
    }
    levels
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: Color = Color::rgb(0, 100, 200);
    const B: Color = Color::rgb(200, 0, 100);

    fn lerp(a: u8, b: u8, t: f64) -> u8 {
        (a as f64 + (b as f64 - a as f64) * t).round() as u8
    }

    #[test]
    fn single_stop_fills_the_whole_circle() {
        let stops = [PaletteStop::new(0.0, A, Easing::InOutQuad)];
        let palette = render_palette(37, &stops).unwrap();
        assert!(palette.iter().all(|&p| p == A.to_rgba8()));
    }

    #[test]
    fn two_stops_render_both_segments() {
        let stops = [
            PaletteStop::new(0.0, A, Easing::Linear),
            PaletteStop::new(0.5, B, Easing::Linear),
        ];
        let palette = render_palette(100, &stops).unwrap();
        assert_eq!(palette[0], A.to_rgba8());
        assert_eq!(palette[50], B.to_rgba8());
        let t = 49.0 / 50.0;
        assert_eq!(
            palette[49],
            [lerp(A.r, B.r, t), lerp(A.g, B.g, t), lerp(A.b, B.b, t), 255]
        );
        assert_eq!(
            palette[99],
            [lerp(B.r, A.r, t), lerp(B.g, A.g, t), lerp(B.b, A.b, t), 255]
        );
    }

    #[test]
    fn unsorted_input_renders_like_sorted_input() {
        let sorted = [
            PaletteStop::new(0.1, A, Easing::OutCubic),
            PaletteStop::new(0.4, B, Easing::Linear),
            PaletteStop::new(0.9, Color::WHITE, Easing::InSine),
        ];
        let shuffled = [sorted[2].clone(), sorted[0].clone(), sorted[1].clone()];
        let before = shuffled.clone();
        assert_eq!(
            render_palette(64, &sorted).unwrap(),
            render_palette(64, &shuffled).unwrap()
        );
        assert_eq!(shuffled, before);
    }

    #[test]
    fn empty_buffer_is_noop_and_empty_stops_rejected() {
        let mut empty: [Rgba8; 0] = [];
        assert_eq!(render_stops(&mut empty, &[]), Ok(()));
        let mut buf = [[1u8; 4]; 4];
        assert_eq!(render_stops(&mut buf, &[]), Err(PlasmaError::EmptyPalette));
        assert_eq!(buf, [[1u8; 4]; 4]);
    }

    #[test]
    fn coincident_stops_write_start_colour_once() {
        let stops = [
            PaletteStop::new(0.25, A, Easing::Linear),
            PaletteStop::new(0.25, B, Easing::Linear),
        ];
        let palette = render_palette(8, &stops).unwrap();
        // The zero-width segment writes A at index 2, then the seam segment
        // from B sweeps the whole circle starting at the same index.
        assert_eq!(palette[2], B.to_rgba8());
        let t = 7.0 / 8.0;
        assert_eq!(
            palette[1],
            [lerp(B.r, A.r, t), lerp(B.g, A.g, t), lerp(B.b, A.b, t), 255]
        );
    }

    #[test]
    fn alpha_is_eased_then_scaled() {
        let stops = [
            PaletteStop::new(0.0, Color::rgba(0, 0, 0, 0.0), Easing::Linear),
            PaletteStop::new(0.5, Color::rgba(0, 0, 0, 1.0), Easing::Linear),
        ];
        let palette = render_palette(4, &stops).unwrap();
        assert_eq!(palette.iter().map(|p| p[3]).collect::<Vec<_>>(), [0, 128, 255, 128]);
    }

    #[test]
    fn stop_noise_perturbs_lightness() {
        let plain = [
            PaletteStop::new(0.0, Color::rgb(128, 60, 60), Easing::Linear),
            PaletteStop::new(0.5, Color::rgb(60, 60, 128), Easing::Linear),
        ];
        let mut noisy = plain.clone();
        noisy[0] = noisy[0].clone().with_noise(StopNoiseParams {
            amplitude: 0.3,
            ..Default::default()
        });
        let a = render_palette(128, &plain).unwrap();
        let b = render_palette(128, &noisy).unwrap();
        assert_ne!(a[..64], b[..64]);
        // Only the noisy stop's segment changes.
        assert_eq!(a[64..], b[64..]);
        assert_eq!(b, render_palette(128, &noisy).unwrap());

        let silent = StopNoise::new(
            &StopNoiseParams {
                amplitude: 0.0,
                ..Default::default()
            },
            0,
        );
        assert_eq!(silent.apply_lightness_noise(0.3, A), A);
    }

    #[test]
    fn unseeded_stop_noise_differs_per_stop() {
        let grey = Color::rgb(120, 120, 120);
        let noise = StopNoiseParams {
            amplitude: 0.3,
            ..Default::default()
        };
        let stops = [
            PaletteStop::new(0.0, grey, Easing::Linear).with_noise(noise.clone()),
            PaletteStop::new(0.5, grey, Easing::Linear).with_noise(noise.clone()),
        ];
        let p = render_palette(128, &stops).unwrap();
        assert_ne!(p[..64], p[64..], "both segments got the same noise");

        // An explicit shared seed reproduces the same pattern on both.
        let shared = StopNoiseParams {
            seed: Some(9),
            ..noise
        };
        let stops = stops.map(|s| s.with_noise(shared.clone()));
        let p = render_palette(128, &stops).unwrap();
        assert_eq!(p[..64], p[64..]);
    }

    #[test]
    fn blending_a_palette_with_itself_is_identity() {
        let p = render_palette(50, &default_stops()).unwrap();
        let mut out = vec![[0; 4]; 50];
        for alpha in [0.0, 1.0, 0.37] {
            blend_palettes(&mut out, &p, &p, alpha).unwrap();
            assert_eq!(out, p);
        }
    }

    #[test]
    fn blend_endpoints_select_each_side() {
        let a = render_palette(20, &[PaletteStop::new(0.0, A, Easing::Linear)]).unwrap();
        let b = render_palette(20, &[PaletteStop::new(0.0, B, Easing::Linear)]).unwrap();
        let mut out = vec![[0; 4]; 20];
        blend_palettes(&mut out, &a, &b, 0.0).unwrap();
        assert_eq!(out, a);
        blend_palettes(&mut out, &a, &b, 1.0).unwrap();
        assert_eq!(out, b);
    }

    #[test]
    fn mismatched_blends_are_errors() {
        let mut out = vec![[0; 4]; 3];
        assert_eq!(
            blend_palettes(&mut out, &[[0; 4]; 3], &[[0; 4]; 4], 0.5),
            Err(PlasmaError::PaletteLengthMismatch { left: 3, right: 4 })
        );
        let one = [PaletteStop::new(0.0, A, Easing::Linear)];
        assert!(blend_stops(&one, &default_stops(), 0.5).is_err());
        let blended = blend_stops(&one, &[PaletteStop::new(0.7, B, Easing::InBack)], 0.5).unwrap();
        assert_eq!(blended[0].pos, 0.0);
        assert_eq!(blended[0].color, A.blend(B, 0.5));
    }

    #[test]
    fn rotation_by_zero_or_length_is_identity() {
        let p = render_palette(30, &default_stops()).unwrap();
        let mut out = vec![[0; 4]; 30];
        rotate_palette(&mut out, &p, 0.0).unwrap();
        assert_eq!(out, p);
        rotate_palette(&mut out, &p, 30.0).unwrap();
        assert_eq!(out, p);
        rotate_palette(&mut out, &p, -60.0).unwrap();
        assert_eq!(out, p);
        rotate_palette(&mut out, &p, 1.0).unwrap();
        assert_eq!(out[0], p[1]);
        assert_eq!(out[29], p[0]);
    }

    #[test]
    fn recolor_keeps_shape() {
        let stops = default_stops();
        let shifted = recolor_stops(&stops, 0.25);
        assert_eq!(shifted.len(), stops.len());
        for (a, b) in stops.iter().zip(&shifted) {
            assert_eq!(a.pos, b.pos);
            assert_eq!(a.easing, b.easing);
        }
        assert_ne!(shifted[1].color, stops[1].color);
    }

    #[test]
    fn mip_chain_halves_down_to_one() {
        let p: Vec<Rgba8> = vec![
            [0, 0, 0, 255],
            [0, 10, 0, 255],
            [100, 0, 0, 0],
            [200, 0, 0, 255],
            [7, 7, 7, 7],
        ];
        let half = downsample(&p);
        assert_eq!(half, vec![[0, 5, 0, 255], [160, 0, 0, 128]]);
        let chain = mip_chain(&p);
        assert_eq!(chain.iter().map(Vec::len).collect::<Vec<_>>(), [5, 2, 1]);
        assert!(mip_chain(&[]).is_empty());
    }

    #[test]
    fn downsample_averages_in_linear_light() {
        let half = downsample(&[[0, 0, 0, 255], [255, 255, 255, 255]]);
        assert_eq!(half, vec![[188, 188, 188, 255]]);
        // Equal neighbours survive the sRGB round trip unchanged.
        for v in [0u8, 1, 17, 128, 200, 254, 255] {
            assert_eq!(downsample(&[[v, v, v, v]; 2]), vec![[v, v, v, v]], "value {v}");
        }
    }
}
