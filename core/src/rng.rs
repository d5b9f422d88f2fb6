//! Deterministic random number generation for synthetic populations.
//!
//! RULE: Nothing in the generator may call any platform RNG.
//! All randomness flows through StreamRng instances derived from a
//! single master seed.
//!
//! Each attribute domain gets its own stream, seeded from
//! (master_seed XOR stream_index). This means:
//!   - Adding a new domain never changes existing domains' draws.
//!   - Each domain is fully reproducible in isolation.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

/// A named, deterministic RNG for a single attribute domain.
pub struct StreamRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl StreamRng {
    /// Create a stream from the master seed and a stable stream index.
    /// The index must never change once assigned.
    pub fn new(master_seed: u64, stream_index: u64) -> Self {
        let derived_seed = master_seed ^ (stream_index.wrapping_mul(0x9e37_79b9_7f4a_7c15));
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Roll a u64 in [0, n). Returns 0 when `n` is 0.
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        if n == 0 {
            return 0;
        }
        self.inner.next_u64() % n
    }

    /// Uniform float in [low, high).
    pub fn uniform(&mut self, low: f64, high: f64) -> f64 {
        low + (high - low) * self.next_f64()
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Log-normal draw with the given median and log-scale spread.
    pub fn log_normal(&mut self, median: f64, sigma: f64) -> f64 {
        // Box-Muller
        let u1 = self.next_f64().max(1e-12);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        median * (sigma * z).exp()
    }
}

/// All streams for one generated population.
pub struct RngBank {
    master_seed: u64,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn for_stream(&self, stream: Stream) -> StreamRng {
        StreamRng::new(self.master_seed, stream as u64).with_name(stream.name())
    }
}

/// Stable stream assignments.
/// NEVER reorder or remove entries; only append.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum Stream {
    Households  = 0,
    Demography  = 1,
    Labour      = 2,
    Business    = 3,
    Consumption = 4,
    Weights     = 5,
}

impl Stream {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Households  => "households",
            Self::Demography  => "demography",
            Self::Labour      => "labour",
            Self::Business    => "business",
            Self::Consumption => "consumption",
            Self::Weights     => "weights",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn streams_are_reproducible_and_independent() {
        let bank = RngBank::new(42);
        let draw = |stream: Stream| {
            let mut rng = bank.for_stream(stream);
            (0..5).map(|_| rng.next_u64_below(1000)).collect::<Vec<_>>()
        };
        let a = draw(Stream::Labour);
        let b = draw(Stream::Labour);
        let c = draw(Stream::Business);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
