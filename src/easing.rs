//! Penner-style easing curves used for palette gradients and animation timing.
//!
//! Every curve is exposed through [`Easing::ease`] with the classic
//! `(t, b, c, d)` signature: `t` is the elapsed position in `[0, d]`, `b` the
//! start value, `c` the total change and `d` the duration.  Internally each
//! variant is a normalised curve `f(p)` on `p = t / d` with `f(0) = 0` and
//! `f(1) = 1`, so the public form is simply `b + c · f(t / d)`.
//!
//! Back and elastic variants overshoot `[b, b + c]` between the endpoints.
//! Every curve still lands exactly on `b` at `t = 0` and on `b + c` at
//! `t = d`.

use std::f64::consts::{PI, TAU};
use std::fmt;
use std::str::FromStr;

/// A named easing curve.
///
/// Serialized (and parsed) by its camelCase preset name, e.g. `"inOutBounce"`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Easing {
    #[default]
    Linear,
    InQuad,
    OutQuad,
    InOutQuad,
    InCubic,
    OutCubic,
    InOutCubic,
    InQuart,
    OutQuart,
    InOutQuart,
    InQuint,
    OutQuint,
    InOutQuint,
    InSine,
    OutSine,
    InOutSine,
    InExpo,
    OutExpo,
    InOutExpo,
    InCirc,
    OutCirc,
    InOutCirc,
    InElastic,
    OutElastic,
    InOutElastic,
    InBack,
    OutBack,
    InOutBack,
    InBounce,
    OutBounce,
    InOutBounce,
    /// Two in-out sine steps: eases to `b + c / 2` at `d / 2`, then on to
    /// `b + c`, pausing at the midpoint.
    DoubleSinePulse,
    /// Counterpart of [`Easing::DoubleSinePulse`]: rushes through the start,
    /// midpoint and end, lingering around `d / 4` and `3d / 4`.
    DoubleSineWave,
    /// Exponential ease-in at twice the usual rate.
    InExpoDouble,
    /// Exponential ease-out at twice the usual rate.
    OutExpoDouble,
}

/// Error returned when a preset name does not match any [`Easing`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEasing(pub String);

impl fmt::Display for UnknownEasing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown easing function \"{}\"", self.0)
    }
}

impl std::error::Error for UnknownEasing {}

impl Easing {
    /// Every variant, in declaration order.
    pub const ALL: [Easing; 35] = [
        Easing::Linear,
        Easing::InQuad,
        Easing::OutQuad,
        Easing::InOutQuad,
        Easing::InCubic,
        Easing::OutCubic,
        Easing::InOutCubic,
        Easing::InQuart,
        Easing::OutQuart,
        Easing::InOutQuart,
        Easing::InQuint,
        Easing::OutQuint,
        Easing::InOutQuint,
        Easing::InSine,
        Easing::OutSine,
        Easing::InOutSine,
        Easing::InExpo,
        Easing::OutExpo,
        Easing::InOutExpo,
        Easing::InCirc,
        Easing::OutCirc,
        Easing::InOutCirc,
        Easing::InElastic,
        Easing::OutElastic,
        Easing::InOutElastic,
        Easing::InBack,
        Easing::OutBack,
        Easing::InOutBack,
        Easing::InBounce,
        Easing::OutBounce,
        Easing::InOutBounce,
        Easing::DoubleSinePulse,
        Easing::DoubleSineWave,
        Easing::InExpoDouble,
        Easing::OutExpoDouble,
    ];

    /// Evaluate the curve at elapsed position `t` of duration `d`, starting
    /// at `b` and changing by `c`.
    ///
    /// A non-positive `d` is treated as an already finished ease and yields
    /// `b + c`.
    #[inline]
    pub fn ease(self, t: f64, b: f64, c: f64, d: f64) -> f64 {
        if d <= 0.0 {
            return b + c;
        }
        b + c * self.curve(t / d)
    }

    /// The camelCase preset name.
    pub fn name(self) -> &'static str {
        match self {
            Easing::Linear => "linear",
            Easing::InQuad => "inQuad",
            Easing::OutQuad => "outQuad",
            Easing::InOutQuad => "inOutQuad",
            Easing::InCubic => "inCubic",
            Easing::OutCubic => "outCubic",
            Easing::InOutCubic => "inOutCubic",
            Easing::InQuart => "inQuart",
            Easing::OutQuart => "outQuart",
            Easing::InOutQuart => "inOutQuart",
            Easing::InQuint => "inQuint",
            Easing::OutQuint => "outQuint",
            Easing::InOutQuint => "inOutQuint",
            Easing::InSine => "inSine",
            Easing::OutSine => "outSine",
            Easing::InOutSine => "inOutSine",
            Easing::InExpo => "inExpo",
            Easing::OutExpo => "outExpo",
            Easing::InOutExpo => "inOutExpo",
            Easing::InCirc => "inCirc",
            Easing::OutCirc => "outCirc",
            Easing::InOutCirc => "inOutCirc",
            Easing::InElastic => "inElastic",
            Easing::OutElastic => "outElastic",
            Easing::InOutElastic => "inOutElastic",
            Easing::InBack => "inBack",
            Easing::OutBack => "outBack",
            Easing::InOutBack => "inOutBack",
            Easing::InBounce => "inBounce",
            Easing::OutBounce => "outBounce",
            Easing::InOutBounce => "inOutBounce",
            Easing::DoubleSinePulse => "doubleSinePulse",
            Easing::DoubleSineWave => "doubleSineWave",
            Easing::InExpoDouble => "inExpoDouble",
            Easing::OutExpoDouble => "outExpoDouble",
        }
    }

    /// Normalised curve on `p ∈ [0, 1]`.
    fn curve(self, p: f64) -> f64 {
        match self {
            Easing::Linear => p,
            Easing::InQuad => p * p,
            Easing::OutQuad => 1.0 - (1.0 - p) * (1.0 - p),
            Easing::InOutQuad => in_out_pow(p, 2),
            Easing::InCubic => p * p * p,
            Easing::OutCubic => 1.0 - (1.0 - p).powi(3),
            Easing::InOutCubic => in_out_pow(p, 3),
            Easing::InQuart => p.powi(4),
            Easing::OutQuart => 1.0 - (1.0 - p).powi(4),
            Easing::InOutQuart => in_out_pow(p, 4),
            Easing::InQuint => p.powi(5),
            Easing::OutQuint => 1.0 - (1.0 - p).powi(5),
            Easing::InOutQuint => in_out_pow(p, 5),
            Easing::InSine => 1.0 - (p * PI * 0.5).cos(),
            Easing::OutSine => (p * PI * 0.5).sin(),
            Easing::InOutSine => -((p * PI).cos() - 1.0) * 0.5,
            Easing::InExpo => in_expo(p, 10.0),
            Easing::OutExpo => out_expo(p, 10.0),
            Easing::InOutExpo => {
                if p <= 0.0 {
                    0.0
                } else if p >= 1.0 {
                    1.0
                } else if p < 0.5 {
                    2f64.powf(20.0 * p - 10.0) * 0.5
                } else {
                    (2.0 - 2f64.powf(-20.0 * p + 10.0)) * 0.5
                }
            }
            Easing::InCirc => 1.0 - (1.0 - p * p).max(0.0).sqrt(),
            Easing::OutCirc => (1.0 - (p - 1.0).powi(2)).max(0.0).sqrt(),
            Easing::InOutCirc => {
                if p < 0.5 {
                    (1.0 - (1.0 - (2.0 * p).powi(2)).max(0.0).sqrt()) * 0.5
                } else {
                    ((1.0 - (-2.0 * p + 2.0).powi(2)).max(0.0).sqrt() + 1.0) * 0.5
                }
            }
            Easing::InElastic => {
                if p <= 0.0 {
                    0.0
                } else if p >= 1.0 {
                    1.0
                } else {
                    -(2f64.powf(10.0 * p - 10.0)) * ((p * 10.0 - 10.75) * ELASTIC_C4).sin()
                }
            }
            Easing::OutElastic => {
                if p <= 0.0 {
                    0.0
                } else if p >= 1.0 {
                    1.0
                } else {
                    2f64.powf(-10.0 * p) * ((p * 10.0 - 0.75) * ELASTIC_C4).sin() + 1.0
                }
            }
            Easing::InOutElastic => {
                if p <= 0.0 {
                    0.0
                } else if p >= 1.0 {
                    1.0
                } else if p < 0.5 {
                    -(2f64.powf(20.0 * p - 10.0) * ((20.0 * p - 11.125) * ELASTIC_C5).sin()) * 0.5
                } else {
                    (2f64.powf(-20.0 * p + 10.0) * ((20.0 * p - 11.125) * ELASTIC_C5).sin()) * 0.5
                        + 1.0
                }
            }
            Easing::InBack => BACK_C3 * p * p * p - BACK_C1 * p * p,
            Easing::OutBack => {
                1.0 + BACK_C3 * (p - 1.0).powi(3) + BACK_C1 * (p - 1.0).powi(2)
            }
            Easing::InOutBack => {
                if p < 0.5 {
                    ((2.0 * p).powi(2) * ((BACK_C2 + 1.0) * 2.0 * p - BACK_C2)) * 0.5
                } else {
                    ((2.0 * p - 2.0).powi(2) * ((BACK_C2 + 1.0) * (p * 2.0 - 2.0) + BACK_C2)
                        + 2.0)
                        * 0.5
                }
            }
            Easing::InBounce => 1.0 - out_bounce(1.0 - p),
            Easing::OutBounce => out_bounce(p),
            Easing::InOutBounce => {
                if p < 0.5 {
                    (1.0 - out_bounce(1.0 - 2.0 * p)) * 0.5
                } else {
                    (1.0 + out_bounce(2.0 * p - 1.0)) * 0.5
                }
            }
            Easing::DoubleSinePulse => p - (p * 2.0 * TAU).sin() / (2.0 * TAU),
            Easing::DoubleSineWave => p + (p * 2.0 * TAU).sin() / (2.0 * TAU),
            Easing::InExpoDouble => in_expo(p, 20.0),
            Easing::OutExpoDouble => out_expo(p, 20.0),
        }
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Easing {
    type Err = UnknownEasing;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Easing::ALL
            .iter()
            .copied()
            .find(|e| e.name() == s)
            .ok_or_else(|| UnknownEasing(s.to_owned()))
    }
}

// --- curve helpers ----------------------------------------------------------

const BACK_C1: f64 = 1.70158;
const BACK_C2: f64 = BACK_C1 * 1.525;
const BACK_C3: f64 = BACK_C1 + 1.0;
const ELASTIC_C4: f64 = TAU / 3.0;
const ELASTIC_C5: f64 = TAU / 4.5;
const BOUNCE_N1: f64 = 7.5625;
const BOUNCE_D1: f64 = 2.75;

#[inline]
fn in_out_pow(p: f64, n: i32) -> f64 {
    if p < 0.5 {
        2f64.powi(n - 1) * p.powi(n)
    } else {
        1.0 - (-2.0 * p + 2.0).powi(n) * 0.5
    }
}

#[inline]
fn in_expo(p: f64, rate: f64) -> f64 {
    if p <= 0.0 {
        0.0
    } else {
        2f64.powf(rate * (p - 1.0))
    }
}

#[inline]
fn out_expo(p: f64, rate: f64) -> f64 {
    if p >= 1.0 {
        1.0
    } else {
        1.0 - 2f64.powf(-rate * p)
    }
}

fn out_bounce(p: f64) -> f64 {
    if p < 1.0 / BOUNCE_D1 {
        BOUNCE_N1 * p * p
    } else if p < 2.0 / BOUNCE_D1 {
        let p = p - 1.5 / BOUNCE_D1;
        BOUNCE_N1 * p * p + 0.75
    } else if p < 2.5 / BOUNCE_D1 {
        let p = p - 2.25 / BOUNCE_D1;
        BOUNCE_N1 * p * p + 0.9375
    } else {
        let p = p - 2.625 / BOUNCE_D1;
        BOUNCE_N1 * p * p + 0.984375
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn endpoints_hold_for_every_curve() {
        for easing in Easing::ALL {
            for (b, c, d) in [(0.0, 1.0, 1.0), (10.0, 245.0, 99.0), (200.0, -180.0, 7.0)] {
                let start = easing.ease(0.0, b, c, d);
                let end = easing.ease(d, b, c, d);
                assert!((start - b).abs() < EPS, "{easing}: ease(0) = {start}, expected {b}");
                assert!(
                    (end - (b + c)).abs() < EPS,
                    "{easing}: ease(d) = {end}, expected {}",
                    b + c
                );
            }
        }
    }

    #[test]
    fn double_sine_curves_are_monotonic_steps() {
        for easing in [Easing::DoubleSinePulse, Easing::DoubleSineWave] {
            assert!((easing.ease(99.0, 10.0, 200.0, 99.0) - 210.0).abs() < EPS);
            assert!((easing.ease(5.0, 3.0, 5.0, 10.0) - 5.5).abs() < EPS);
            let mut prev = easing.ease(0.0, 0.0, 1.0, 100.0);
            for i in 1..=100 {
                let v = easing.ease(i as f64, 0.0, 1.0, 100.0);
                assert!(v >= prev - EPS, "{easing} falls at {i}: {prev} -> {v}");
                prev = v;
            }
        }
    }

    #[test]
    fn linear_interpolates_midpoint() {
        assert!((Easing::Linear.ease(25.0, 0.0, 100.0, 50.0) - 50.0).abs() < EPS);
    }

    #[test]
    fn bounce_stays_within_range() {
        for i in 0..=100 {
            let v = Easing::OutBounce.ease(i as f64, 0.0, 1.0, 100.0);
            assert!((-EPS..=1.0 + EPS).contains(&v), "outBounce({i}) = {v}");
        }
    }

    #[test]
    fn back_overshoots() {
        let min = (1..100)
            .map(|i| Easing::InBack.ease(i as f64, 0.0, 1.0, 100.0))
            .fold(f64::INFINITY, f64::min);
        assert!(min < 0.0, "inBack should dip below its start value");
    }

    #[test]
    fn names_round_trip_through_from_str() {
        assert!(Easing::ALL.len() >= 30);
        for easing in Easing::ALL {
            assert_eq!(easing.name().parse::<Easing>(), Ok(easing));
        }
        assert_eq!("inOutBounce".parse::<Easing>(), Ok(Easing::InOutBounce));
        assert!("wobble".parse::<Easing>().is_err());
    }

    #[test]
    fn serde_uses_preset_names() {
        let json = serde_json::to_string(&Easing::InOutBounce).unwrap();
        assert_eq!(json, "\"inOutBounce\"");
        let back: Easing = serde_json::from_str("\"outExpoDouble\"").unwrap();
        assert_eq!(back, Easing::OutExpoDouble);
    }
}
