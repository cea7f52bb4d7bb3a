//! 64-bit linear congruential generator with 48-bit output.
//!
//! This is the small reference generator used to cross-check runs between
//! implementations: `state' = A·state + 1 (mod 2^64)`, and each draw yields the
//! high 48 bits of the *pre-update* state divided by 2^48.
//!
//! It implements [`rand::RngCore`] so it can drive the generator anywhere a
//! [`rand::rngs::StdRng`] can. `next_u64` keeps only the high 48 bits of the
//! state, which makes `rng.random::<f64>()` return exactly the same value as
//! [`Lcg48::next_unit`].

use rand::{RngCore, SeedableRng};

const LCG_A: u64 = 0xF135_7AEA_2E62_A9C5;
const LCG_C: u64 = 0x0000_0000_0000_0001;
const LOW_BITS_MASK: u64 = !0xFFFF;
const TWO_POW_48: f64 = 281_474_976_710_656.0;

/// Deterministic 48-bit-output LCG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lcg48 {
    state: u64,
}

impl Lcg48 {
    /// Start from an explicit raw state.
    pub fn new(state: u64) -> Self {
        Self { state }
    }

    /// Current raw state.
    pub fn state(&self) -> u64 {
        self.state
    }

    /// Uniform draw in `[0, 1)` with 48 bits of resolution.
    pub fn next_unit(&mut self) -> f64 {
        let value = (self.state >> 16) as f64 / TWO_POW_48;
        self.advance();
        value
    }

    fn advance(&mut self) {
        self.state = LCG_A.wrapping_mul(self.state).wrapping_add(LCG_C);
    }
}

impl RngCore for Lcg48 {
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        let value = self.state & LOW_BITS_MASK;
        self.advance();
        value
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        rand::rand_core::impls::fill_bytes_via_next(self, dst)
    }
}

impl SeedableRng for Lcg48 {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u64::from_le_bytes(seed))
    }

    /// The raw state is the seed; no expansion step.
    fn seed_from_u64(state: u64) -> Self {
        Self::new(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_first_draw_from_zero_state_is_zero() {
        let mut rng = Lcg48::new(0);
        assert_eq!(rng.next_unit(), 0.0);
        assert_eq!(rng.state(), LCG_C);
    }

    #[test]
    fn test_seed_from_u64_is_raw_state() {
        assert_eq!(Lcg48::seed_from_u64(12345).state(), 12345);
        assert_eq!(
            Lcg48::from_seed(7u64.to_le_bytes()),
            Lcg48::seed_from_u64(7)
        );
    }

    #[test]
    fn test_random_f64_matches_next_unit() {
        let mut a = Lcg48::new(0xdead_beef);
        let mut b = a.clone();
        for _ in 0..1000 {
            let via_rand: f64 = a.random();
            assert_eq!(via_rand, b.next_unit());
        }
    }

    #[test]
    fn test_draws_stay_in_unit_interval() {
        let mut rng = Lcg48::new(42);
        for _ in 0..10_000 {
            let x = rng.next_unit();
            assert!((0.0..1.0).contains(&x));
        }
    }

    #[test]
    fn test_mean_near_half() {
        let mut rng = Lcg48::new(1);
        let n = 100_000;
        let mean = (0..n).map(|_| rng.next_unit()).sum::<f64>() / n as f64;
        assert!((mean - 0.5).abs() < 0.01, "mean = {mean}");
    }

    #[test]
    fn test_fill_bytes_fills_everything() {
        let mut rng = Lcg48::new(99);
        let mut buf = [0u8; 37];
        rng.fill_bytes(&mut buf);
        assert!(buf.iter().any(|&b| b != 0));
    }
}
