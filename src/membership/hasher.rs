//! Probe hash families
//!
//! A [`ProbeHasher`] turns one item into `hash_count` bit positions inside a
//! filter of `bit_count` bits. Add and check must walk the same sequence, so
//! the family is part of the filter's type.

use core::fmt::Debug;

use xxhash_rust::xxh3::xxh3_64_with_seed;

/// Derives the bit positions an item occupies in a membership filter
pub trait ProbeHasher: Clone + Debug + Default {
    /// Iterator over the `hash_count` positions, each in `0..bit_count`
    type Probes<'a>: Iterator<Item = u64>
    where
        Self: 'a;

    /// Positions for `item` in a filter of `bit_count` bits with `hash_count` probes
    ///
    /// `bit_count` must be non-zero.
    fn probes<'a>(&'a self, item: &'a [u8], bit_count: u64, hash_count: u32) -> Self::Probes<'a>;
}

const DEFAULT_SEED_1: u64 = 0;
const DEFAULT_SEED_2: u64 = 0x9e37_79b9_7f4a_7c15;

/// Double hashing over two independently seeded xxh3 digests
///
/// Position `i` is `(h1 + i * h2) mod bit_count`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Xxh3DoubleHasher {
    seed1: u64,
    seed2: u64,
}

impl Xxh3DoubleHasher {
    /// Hasher with explicit seeds; both sides of a pushdown must agree on them
    pub fn with_seeds(seed1: u64, seed2: u64) -> Self {
        Self { seed1, seed2 }
    }
}

impl Default for Xxh3DoubleHasher {
    fn default() -> Self {
        Self::with_seeds(DEFAULT_SEED_1, DEFAULT_SEED_2)
    }
}

/// Probe sequence produced by [`Xxh3DoubleHasher`]
#[derive(Clone, Debug)]
pub struct DoubleHashProbes {
    next: u64,
    step: u64,
    bit_count: u64,
    remaining: u32,
}

impl Iterator for DoubleHashProbes {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let current = self.next;
        // next < bit_count <= u32::MAX and step < bit_count, so no overflow
        self.next = (self.next + self.step) % self.bit_count;
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining as usize, Some(self.remaining as usize))
    }
}

impl ExactSizeIterator for DoubleHashProbes {}

impl ProbeHasher for Xxh3DoubleHasher {
    type Probes<'a> = DoubleHashProbes;

    fn probes<'a>(&'a self, item: &'a [u8], bit_count: u64, hash_count: u32) -> DoubleHashProbes {
        debug_assert!(bit_count > 0);
        let h1 = xxh3_64_with_seed(item, self.seed1);
        let h2 = xxh3_64_with_seed(item, self.seed2);
        let mut step = h2 % bit_count;
        if step == 0 && bit_count > 1 {
            step = 1;
        }
        DoubleHashProbes {
            next: h1 % bit_count,
            step,
            bit_count,
            remaining: hash_count,
        }
    }
}

/// Seeded multiplicative rolling hash, re-seeded with the probe index
///
/// Statistically weaker than [`Xxh3DoubleHasher`]. It exists so filters can
/// be checked by remote probe sides that still compute positions this way.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LegacyRollingHasher;

impl LegacyRollingHasher {
    /// One 32-bit hash of `item` under `seed`
    ///
    /// Bytes are sign-extended before mixing.
    pub fn hash(item: &[u8], seed: u32) -> u32 {
        let mut h = seed;
        for &byte in item {
            h ^= byte as i8 as i32 as u32;
            h = h.wrapping_mul(0x5bd1_e995);
            h ^= h >> 15;
        }
        h
    }
}

/// Probe sequence produced by [`LegacyRollingHasher`]
#[derive(Clone, Debug)]
pub struct LegacyProbes<'a> {
    item: &'a [u8],
    bit_count: u64,
    seed: u32,
    hash_count: u32,
}

impl Iterator for LegacyProbes<'_> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        if self.seed >= self.hash_count {
            return None;
        }
        let hash = LegacyRollingHasher::hash(self.item, self.seed);
        self.seed += 1;
        Some(u64::from(hash) % self.bit_count)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.hash_count - self.seed) as usize;
        (left, Some(left))
    }
}

impl ExactSizeIterator for LegacyProbes<'_> {}

impl ProbeHasher for LegacyRollingHasher {
    type Probes<'a> = LegacyProbes<'a>;

    fn probes<'a>(&'a self, item: &'a [u8], bit_count: u64, hash_count: u32) -> LegacyProbes<'a> {
        debug_assert!(bit_count > 0);
        LegacyProbes {
            item,
            bit_count,
            seed: 0,
            hash_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "std")]
    use std::vec::Vec;

    #[cfg(not(feature = "std"))]
    use alloc::vec::Vec;

    #[test]
    fn test_double_hash_in_range() {
        let hasher = Xxh3DoubleHasher::default();
        for bit_count in [1u64, 2, 7, 20, 96, 9_586] {
            let probes: Vec<u64> = hasher.probes(b"1|'a'", bit_count, 7).collect();
            assert_eq!(probes.len(), 7);
            assert!(probes.iter().all(|&p| p < bit_count));
        }
    }

    #[test]
    fn test_double_hash_deterministic() {
        let hasher = Xxh3DoubleHasher::default();
        let a: Vec<u64> = hasher.probes(b"key", 1000, 5).collect();
        let b: Vec<u64> = hasher.probes(b"key", 1000, 5).collect();
        assert_eq!(a, b);

        let other = Xxh3DoubleHasher::with_seeds(1, 2);
        let c: Vec<u64> = other.probes(b"key", 1000, 5).collect();
        assert_ne!(a, c);
    }

    #[test]
    fn test_double_hash_spreads_probes() {
        // With a prime bit count and a non-zero step every probe is distinct
        let hasher = Xxh3DoubleHasher::default();
        let mut probes: Vec<u64> = hasher.probes(b"spread", 101, 7).collect();
        probes.sort_unstable();
        probes.dedup();
        assert_eq!(probes.len(), 7);
    }

    #[test]
    fn test_legacy_hash_values() {
        // Empty input leaves the seed untouched
        assert_eq!(LegacyRollingHasher::hash(b"", 0), 0);
        assert_eq!(LegacyRollingHasher::hash(b"", 3), 3);

        // 'a' = 0x61: 0x61 * 0x5bd1e995 = 0x22_ca89_8175, truncated to 32 bits
        let h = 0xca89_8175u32;
        assert_eq!(LegacyRollingHasher::hash(b"a", 0), h ^ (h >> 15));
    }

    #[test]
    fn test_legacy_hash_sign_extends() {
        let high = LegacyRollingHasher::hash(&[0xff], 0);
        let expected = {
            let h = 0xffff_ffffu32.wrapping_mul(0x5bd1_e995);
            h ^ (h >> 15)
        };
        assert_eq!(high, expected);
    }

    #[test]
    fn test_legacy_probes_per_seed() {
        let hasher = LegacyRollingHasher;
        let probes: Vec<u64> = hasher.probes(b"abc", 20, 3).collect();
        let expected: Vec<u64> = (0..3)
            .map(|seed| u64::from(LegacyRollingHasher::hash(b"abc", seed)) % 20)
            .collect();
        assert_eq!(probes, expected);
    }
}
