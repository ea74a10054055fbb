//! Colour model shared by the palette engine and animator.
//!
//! Palettes are stored as packed [`Rgba8`] entries; authored stop colours use
//! [`Color`], which keeps alpha as a float in `[0, 1]` so it can be eased like
//! the other channels before packing.

use std::fmt;
use std::str::FromStr;

/// One packed palette / pixel entry: `[r, g, b, a]`, each `0..=255`.
pub type Rgba8 = [u8; 4];

/// An sRGB colour with integer channels and fractional alpha.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// Opacity in `[0, 1]`.
    pub a: f32,
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Build a colour, clamping `a` into `[0, 1]`.
    pub fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self {
            r,
            g,
            b,
            a: clamp_alpha(a),
        }
    }

    /// Build a colour from unclamped float channels (`r/g/b` in `0..255`,
    /// `a` in `0..1`), rounding and clamping each to its range.
    pub fn from_f64(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self {
            r: channel(r),
            g: channel(g),
            b: channel(b),
            a: clamp_alpha(a as f32),
        }
    }

    /// Pack into an [`Rgba8`], scaling alpha to `0..=255`.
    #[inline]
    pub fn to_rgba8(self) -> Rgba8 {
        [self.r, self.g, self.b, channel(self.a as f64 * 255.0)]
    }

    /// Unpack an [`Rgba8`] entry.
    #[inline]
    pub fn from_rgba8(p: Rgba8) -> Self {
        Self {
            r: p[0],
            g: p[1],
            b: p[2],
            a: p[3] as f32 / 255.0,
        }
    }

    /// Linear RGBA blend: `alpha = 0` yields `self`, `alpha = 1` yields `other`.
    pub fn blend(self, other: Color, alpha: f64) -> Color {
        let t = alpha.clamp(0.0, 1.0);
        let mix = |a: f64, b: f64| a + (b - a) * t;
        Color::from_f64(
            mix(self.r as f64, other.r as f64),
            mix(self.g as f64, other.g as f64),
            mix(self.b as f64, other.b as f64),
            mix(self.a as f64, other.a as f64),
        )
    }

    /// Convert to HSL, each component in `[0, 1]` (hue as a fraction of a turn).
    pub fn to_hsl(self) -> (f64, f64, f64) {
        let r = self.r as f64 / 255.0;
        let g = self.g as f64 / 255.0;
        let b = self.b as f64 / 255.0;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (max + min) * 0.5;
        let delta = max - min;
        if delta <= f64::EPSILON {
            return (0.0, 0.0, l);
        }
        let s = if l > 0.5 {
            delta / (2.0 - max - min)
        } else {
            delta / (max + min)
        };
        let h = if max == r {
            (g - b) / delta + if g < b { 6.0 } else { 0.0 }
        } else if max == g {
            (b - r) / delta + 2.0
        } else {
            (r - g) / delta + 4.0
        };
        (h / 6.0, s, l)
    }

    /// Build a colour from HSL components in `[0, 1]`; hue wraps.
    pub fn from_hsl(h: f64, s: f64, l: f64, a: f32) -> Color {
        let h = h.rem_euclid(1.0);
        let s = s.clamp(0.0, 1.0);
        let l = l.clamp(0.0, 1.0);
        let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let (r1, g1, b1) = hue_sector(h * 6.0, c);
        let m = l - c * 0.5;
        Color::from_f64((r1 + m) * 255.0, (g1 + m) * 255.0, (b1 + m) * 255.0, a as f64)
    }

    /// Build a colour from HSV components in `[0, 1]`; hue wraps.
    pub fn from_hsv(h: f64, s: f64, v: f64, a: f32) -> Color {
        let h = h.rem_euclid(1.0);
        let s = s.clamp(0.0, 1.0);
        let v = v.clamp(0.0, 1.0);
        let c = v * s;
        let (r1, g1, b1) = hue_sector(h * 6.0, c);
        let m = v - c;
        Color::from_f64((r1 + m) * 255.0, (g1 + m) * 255.0, (b1 + m) * 255.0, a as f64)
    }

    /// Shift HSL lightness by `delta`, clamping the result into `[0, 1]`.
    pub fn with_lightness_offset(self, delta: f64) -> Color {
        let (h, s, l) = self.to_hsl();
        Color::from_hsl(h, s, l + delta, self.a)
    }

    /// Rotate the hue by `turns` (fraction of a full turn).
    pub fn with_hue_shift(self, turns: f64) -> Color {
        let (h, s, l) = self.to_hsl();
        Color::from_hsl(h + turns, s, l, self.a)
    }
}

/// Chroma split for one of the six hue sectors; `hp` is hue in `[0, 6)`.
fn hue_sector(hp: f64, c: f64) -> (f64, f64, f64) {
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    }
}

#[inline]
fn channel(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

#[inline]
fn clamp_alpha(a: f32) -> f32 {
    if a.is_nan() { 1.0 } else { a.clamp(0.0, 1.0) }
}

/// Error returned when parsing a `#rrggbb` / `#rrggbbaa` string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseColorError(pub String);

impl fmt::Display for ParseColorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid colour \"{}\" (expected #rrggbb or #rrggbbaa)", self.0)
    }
}

impl std::error::Error for ParseColorError {}

impl FromStr for Color {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseColorError(s.to_owned());
        let hex = s.trim().trim_start_matches('#');
        if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
            return Err(err());
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| err());
        let a = if hex.len() == 8 { byte(6)? } else { 255 };
        Ok(Color::from_rgba8([byte(0)?, byte(2)?, byte(4)?, a]))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, a] = self.to_rgba8();
        if a == 255 {
            write!(f, "#{r:02x}{g:02x}{b:02x}")
        } else {
            write!(f, "#{r:02x}{g:02x}{b:02x}{a:02x}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_endpoints_are_identity() {
        let a = Color::rgba(10, 200, 30, 0.25);
        let b = Color::rgba(250, 0, 128, 1.0);
        assert_eq!(a.blend(b, 0.0), a);
        assert_eq!(a.blend(b, 1.0), b);
        let mid = a.blend(b, 0.5);
        assert_eq!((mid.r, mid.g, mid.b), (130, 100, 79));
    }

    #[test]
    fn hsl_round_trip_preserves_colour() {
        for c in [
            Color::rgb(255, 0, 0),
            Color::rgb(12, 180, 90),
            Color::rgb(40, 40, 200),
            Color::rgb(128, 128, 128),
        ] {
            let (h, s, l) = c.to_hsl();
            let back = Color::from_hsl(h, s, l, c.a);
            assert!(
                (back.r as i32 - c.r as i32).abs() <= 1
                    && (back.g as i32 - c.g as i32).abs() <= 1
                    && (back.b as i32 - c.b as i32).abs() <= 1,
                "{c} -> ({h:.3}, {s:.3}, {l:.3}) -> {back}"
            );
        }
    }

    #[test]
    fn hsv_primary_hues() {
        assert_eq!(Color::from_hsv(0.0, 1.0, 1.0, 1.0), Color::rgb(255, 0, 0));
        assert_eq!(Color::from_hsv(1.0 / 3.0, 1.0, 1.0, 1.0), Color::rgb(0, 255, 0));
        assert_eq!(Color::from_hsv(2.0 / 3.0, 1.0, 1.0, 1.0), Color::rgb(0, 0, 255));
    }

    #[test]
    fn lightness_offset_clamps() {
        let c = Color::rgb(200, 100, 50);
        assert_eq!(c.with_lightness_offset(2.0), Color::WHITE);
        assert_eq!(c.with_lightness_offset(-2.0), Color::BLACK);
    }

    #[test]
    fn packs_alpha_to_byte() {
        assert_eq!(Color::rgba(1, 2, 3, 0.5).to_rgba8(), [1, 2, 3, 128]);
        assert_eq!(Color::rgba(1, 2, 3, 7.0).a, 1.0);
    }

    #[test]
    fn parses_hex() {
        assert_eq!("#ff8000".parse::<Color>(), Ok(Color::rgb(255, 128, 0)));
        assert_eq!("00000080".parse::<Color>().map(|c| c.to_rgba8()), Ok([0, 0, 0, 128]));
        assert!("#ff80".parse::<Color>().is_err());
        assert!("#gg0000".parse::<Color>().is_err());
        assert_eq!(Color::rgb(255, 128, 0).to_string(), "#ff8000");
    }
}
