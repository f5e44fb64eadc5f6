//! Seeded random source shared by every stochastic decision in the engine.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Deterministic random stream, threaded explicitly through the engine.
///
/// Two sources built from the same seed produce identical sequences, which is
/// what makes whole runs reproducible.
#[derive(Debug, Clone)]
pub struct RandomSource {
    seed: u64,
    rng: ChaCha8Rng,
}

impl RandomSource {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Pick a fresh seed from OS entropy. The seed is kept so the run can be replayed.
    pub fn from_entropy() -> Self {
        Self::from_seed(rand::random::<u64>())
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform double in `[lo, hi)`; returns `lo` for an empty range.
    pub fn get_double(&mut self, lo: f64, hi: f64) -> f64 {
        if lo < hi {
            self.rng.gen_range(lo..hi)
        } else {
            lo
        }
    }

    /// Uniform integer in `[lo, hi]`; returns `lo` when `hi < lo`.
    pub fn get_int(&mut self, lo: i32, hi: i32) -> i32 {
        if lo <= hi {
            self.rng.gen_range(lo..=hi)
        } else {
            lo
        }
    }

    /// Uniform index in `0..len`, or `None` for an empty collection.
    pub fn get_index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            None
        } else {
            Some(self.rng.gen_range(0..len))
        }
    }

    /// Bernoulli trial succeeding with probability `prob`.
    pub fn p(&mut self, prob: f64) -> bool {
        if prob >= 1.0 {
            return true;
        }
        if prob <= 0.0 {
            return false;
        }
        self.rng.gen::<f64>() < prob
    }

    /// Gaussian draw via the Box-Muller transform.
    pub fn get_rand_normal(&mut self, mean: f64, std_dev: f64) -> f64 {
        if std_dev <= 0.0 {
            return mean;
        }
        // 1 - [0, 1) keeps u1 away from zero so ln() stays finite
        let u1 = 1.0 - self.rng.gen::<f64>();
        let u2 = self.rng.gen::<f64>();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}
