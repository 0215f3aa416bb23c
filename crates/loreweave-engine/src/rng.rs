//! Seeded randomness for throttle rolls, target selection, and placement.
//!
//! Every probabilistic decision in the engine draws from one [`SimRng`]
//! owned by the tick driver, so a run is fully reproducible from its seed.
//! Probabilities are modulated per era through [`scaled_probability`], an
//! odds-ratio exponentiation that keeps results in `(0, 1)` for any
//! modifier.

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::IndexedRandom;

/// Scale a base probability by an odds-ratio exponent.
///
/// The base is converted to odds, raised to `modifier`, and converted back:
/// `p' = odds^m / (1 + odds^m)` with `odds = p / (1 - p)`. A modifier of
/// `1.0` is the identity; degenerate bases short-circuit so `0` and `1`
/// stay fixed points.
pub fn scaled_probability(base: f64, modifier: f64) -> f64 {
    if base <= 0.0 {
        return 0.0;
    }
    if base >= 1.0 {
        return 1.0;
    }
    let odds = base / (1.0 - base);
    let scaled = odds.powf(modifier);
    scaled / (1.0 + scaled)
}

/// The engine's seeded random source.
#[derive(Debug, Clone)]
pub struct SimRng {
    inner: SmallRng,
}

impl SimRng {
    /// Create a generator from a run seed.
    pub fn seed_from_u64(seed: u64) -> Self {
        Self {
            inner: SmallRng::seed_from_u64(seed),
        }
    }

    /// Bernoulli roll at the given chance, clamped to `[0, 1]`.
    pub fn roll(&mut self, chance: f64) -> bool {
        let p = if chance.is_finite() {
            chance.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.inner.random_bool(p)
    }

    /// Bernoulli roll at an era-modulated chance; see [`scaled_probability`].
    pub fn roll_scaled(&mut self, base: f64, modifier: f64) -> bool {
        self.roll(scaled_probability(base, modifier))
    }

    /// A uniform value in `[lo, hi)`.
    pub fn range(&mut self, lo: f64, hi: f64) -> f64 {
        if hi <= lo {
            return lo;
        }
        self.inner.random_range(lo..hi)
    }

    /// A uniform per-axis offset in `[-1, 1)`, used for spatial jitter.
    pub fn offset(&mut self) -> f64 {
        self.inner.random_range(-1.0..1.0)
    }

    /// A uniform index below `len`, or `None` for an empty collection.
    pub fn index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        Some(self.inner.random_range(0..len))
    }

    /// A uniformly chosen element of a slice.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        items.choose(&mut self.inner)
    }

    /// A weight-proportionally chosen element. Non-positive weights are
    /// treated as zero; returns `None` when no weight is positive.
    pub fn pick_weighted<'a, T>(&mut self, items: &'a [(T, f64)]) -> Option<&'a T> {
        let total: f64 = items.iter().map(|(_, w)| w.max(0.0)).sum();
        if total <= 0.0 {
            return None;
        }
        let mut remaining = self.range(0.0, total);
        for (item, weight) in items {
            let w = weight.max(0.0);
            if w <= 0.0 {
                continue;
            }
            if remaining < w {
                return Some(item);
            }
            remaining -= w;
        }
        items.last().map(|(item, _)| item)
    }
}
