//! Opponent hand selection
//!
//! The resolver never calls an ambient RNG; it takes any [`HandDraw`].
//! [`SeededRng`] gives reproducible draws for replays and tests,
//! [`RngDraw`] adapts any `rand` generator for live play.

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

/// Source of uniformly distributed hand indices
pub trait HandDraw {
    /// Uniform value in `[0, bound)`. `bound` is always at least 1.
    fn draw(&mut self, bound: usize) -> usize;
}

impl<D: HandDraw + ?Sized> HandDraw for &mut D {
    fn draw(&mut self, bound: usize) -> usize {
        (**self).draw(bound)
    }
}

/// Seeded random number generator
///
/// Deterministic: same seed + nonce = same sequence
#[derive(Clone, Debug)]
pub struct SeededRng {
    state: u64,
}

impl SeededRng {
    /// Create a new RNG from a 32-byte seed and a nonce (e.g. a round counter)
    pub fn new(seed: &[u8; 32], nonce: u64) -> Self {
        let mut state = 0u64;
        for (i, chunk) in seed.chunks(8).enumerate() {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(chunk);
            state ^= u64::from_le_bytes(bytes).wrapping_add(i as u64);
        }
        state ^= nonce.wrapping_mul(0x517cc1b727220a95);

        // xorshift has a fixed point at zero
        if state == 0 {
            state = 0x9e3779b97f4a7c15;
        }

        let mut rng = Self { state };
        for _ in 0..8 {
            rng.next_u64();
        }
        rng
    }

    /// Generate next u64 (xorshift64*)
    pub fn next_u64(&mut self) -> u64 {
        self.state ^= self.state >> 12;
        self.state ^= self.state << 25;
        self.state ^= self.state >> 27;
        self.state.wrapping_mul(0x2545f4914f6cdd1d)
    }

    /// Generate a value in range [0, max), without modulo bias
    pub fn next_range(&mut self, max: u64) -> u64 {
        if max == 0 {
            return 0;
        }
        // largest multiple of `max` that fits; reject draws above it
        let zone = u64::MAX - (u64::MAX % max);
        loop {
            let value = self.next_u64();
            if value < zone {
                return value % max;
            }
        }
    }
}

impl HandDraw for SeededRng {
    fn draw(&mut self, bound: usize) -> usize {
        self.next_range(bound as u64) as usize
    }
}

/// Adapter for any `rand` generator
#[derive(Clone, Debug)]
pub struct RngDraw<R>(pub R);

impl<R: RngCore> HandDraw for RngDraw<R> {
    fn draw(&mut self, bound: usize) -> usize {
        self.0.gen_range(0..bound.max(1))
    }
}

/// Entropy-seeded draw for live play
pub type SystemDraw = RngDraw<StdRng>;

impl SystemDraw {
    pub fn from_entropy() -> Self {
        RngDraw(StdRng::from_entropy())
    }
}

/// Always returns the same hand, clamped into range. Test helper.
#[cfg(test)]
#[derive(Clone, Copy, Debug)]
pub(crate) struct FixedDraw(pub usize);

#[cfg(test)]
impl HandDraw for FixedDraw {
    fn draw(&mut self, bound: usize) -> usize {
        self.0.min(bound - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_determinism() {
        let seed = [42u8; 32];
        let mut r1 = SeededRng::new(&seed, 0);
        let mut r2 = SeededRng::new(&seed, 0);

        for _ in 0..100 {
            assert_eq!(r1.next_u64(), r2.next_u64());
        }
    }

    #[test]
    fn test_different_seeds() {
        let mut rng1 = SeededRng::new(&[1u8; 32], 0);
        let mut rng2 = SeededRng::new(&[2u8; 32], 0);

        let vals1: Vec<_> = (0..10).map(|_| rng1.next_u64()).collect();
        let vals2: Vec<_> = (0..10).map(|_| rng2.next_u64()).collect();

        assert_ne!(vals1, vals2);
    }

    #[test]
    fn test_different_nonce() {
        let seed = [42u8; 32];
        let mut rng1 = SeededRng::new(&seed, 0);
        let mut rng2 = SeededRng::new(&seed, 1);

        assert_ne!(rng1.next_u64(), rng2.next_u64());
    }

    #[test]
    fn test_zero_seed_still_moves() {
        let mut rng = SeededRng::new(&[0u8; 32], 0);
        let vals: Vec<_> = (0..4).map(|_| rng.next_u64()).collect();
        assert!(vals.iter().any(|v| *v != 0));
    }

    #[test]
    fn test_next_range() {
        let mut rng = SeededRng::new(&[42u8; 32], 0);

        for max in [1u64, 7, 10, 1000] {
            for _ in 0..100 {
                let val = rng.next_range(max);
                assert!(val < max, "next_range({}) returned {}", max, val);
            }
        }

        assert_eq!(rng.next_range(0), 0);
    }

    #[test]
    fn test_draw_covers_every_hand() {
        let mut rng = SeededRng::new(&[7u8; 32], 3);
        let mut counts = [0u32; 7];
        let samples = 7000;
        for _ in 0..samples {
            counts[rng.draw(7)] += 1;
        }
        // each bucket should sit near 1000
        for (hand, count) in counts.iter().enumerate() {
            assert!(
                (800..1200).contains(count),
                "hand {} drawn {} times out of {}",
                hand,
                count,
                samples
            );
        }
    }

    #[test]
    fn test_rng_adapter_in_range() {
        let mut draw = RngDraw(StdRng::seed_from_u64(9));
        for _ in 0..500 {
            assert!(draw.draw(7) < 7);
        }
        assert_eq!(draw.draw(1), 0);
    }

    #[test]
    fn test_fixed_draw_clamps() {
        assert_eq!(FixedDraw(0).draw(7), 0);
        assert_eq!(FixedDraw(9).draw(7), 6);
    }
}
