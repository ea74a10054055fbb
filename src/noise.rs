//! Seeded per-octave gradient noise.
//!
//! A [`NoiseGenerator`] owns one [`Perlin`] instance per octave.  The octave
//! seeds are drawn from a single [`StdRng`] stream seeded with the root seed,
//! so the seed of octave `i` depends only on `(root_seed, i)`.  Growing the
//! octave count therefore keeps every existing octave bit-identical and only
//! appends new ones; shrinking it simply truncates.

use noise::{NoiseFn, Perlin, Seedable};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Per-octave seeded Perlin noise sources derived from one root seed.
#[derive(Clone, Debug)]
pub struct NoiseGenerator {
    seed: u64,
    octaves: Vec<Perlin>,
}

impl NoiseGenerator {
    /// Create a generator with `octave_count` octaves derived from `seed`.
    pub fn new(seed: u64, octave_count: usize) -> Self {
        let mut generator = Self {
            seed,
            octaves: Vec::new(),
        };
        generator.configure(seed, octave_count);
        generator
    }

    /// Re-derive the octave sources for `seed` / `octave_count`.
    ///
    /// With an unchanged seed the existing octaves `0..min(old, new)` are kept
    /// as-is; only octaves past the old count are constructed.
    pub fn configure(&mut self, seed: u64, octave_count: usize) {
        if seed != self.seed {
            self.seed = seed;
            self.octaves.clear();
        }
        if octave_count <= self.octaves.len() {
            self.octaves.truncate(octave_count);
            return;
        }
        // Replay the stream past the octaves we already own.
        let mut rng = StdRng::seed_from_u64(seed);
        for _ in 0..self.octaves.len() {
            let _ = rng.random::<u32>();
        }
        let missing = octave_count - self.octaves.len();
        self.octaves
            .extend((0..missing).map(|_| Perlin::new(rng.random::<u32>())));
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn octave_count(&self) -> usize {
        self.octaves.len()
    }

    /// The Perlin seed backing `octave`, if that octave exists.
    pub fn octave_seed(&self, octave: usize) -> Option<u32> {
        self.octaves.get(octave).map(Perlin::seed)
    }

    /// Sample a single octave's 2-D gradient noise, clamped to `[-1, 1]`.
    ///
    /// Out-of-range octave indices sample as `0.0`.
    #[inline]
    pub fn sample(&self, octave: usize, x: f64, y: f64) -> f64 {
        self.octaves
            .get(octave)
            .map_or(0.0, |p| p.get([x, y]).clamp(-1.0, 1.0))
    }

    /// Sample a single octave's 3-D gradient noise, clamped to `[-1, 1]`.
    #[inline]
    pub fn sample3(&self, octave: usize, x: f64, y: f64, z: f64) -> f64 {
        self.octaves
            .get(octave)
            .map_or(0.0, |p| p.get([x, y, z]).clamp(-1.0, 1.0))
    }
}

/// True modulo: the result is always in `[0, n)` for positive `n`, also for
/// negative `a` (`modulo(-1.0, 4.0) == 3.0`).
#[inline]
pub fn modulo(a: f64, n: f64) -> f64 {
    let r = a.rem_euclid(n);
    // rem_euclid can round up to exactly `n` for tiny negative `a`.
    if r >= n { 0.0 } else { r }
}

/// Integer true modulo for ring-buffer indices; `n` must be positive.
#[inline]
pub fn wrap_index(i: i64, n: usize) -> usize {
    i.rem_euclid(n as i64) as usize
}

/// Map a raw noise sample from `[-1, 1]` to `[0, 1]`.
#[inline]
pub fn normalize(v: f64) -> f64 {
    v * 0.5 + 0.5
}
