//! Bloom filter for probabilistic set membership
//!
//! A Bloom filter is a space-efficient probabilistic data structure that tests
//! whether an element is a member of a set. False positives are possible, but
//! false negatives are not.
//!
//! Geometry is fixed at creation and bounded by the wire format: the bit count
//! must fit in 32 bits and the probe count in 8 bits.

use crate::error::FilterError;
use crate::math;
use crate::membership::hasher::{ProbeHasher, Xxh3DoubleHasher};
use crate::traits::{MembershipSketch, Sketch};

#[cfg(feature = "std")]
use std::vec::Vec;

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

/// Bloom filter over a byte-addressed bit vector
///
/// Bit `i` lives in byte `i / 8` at position `i % 8`.
///
/// # Example
///
/// ```
/// use bloomjoin::membership::MembershipFilter;
///
/// // Create filter for ~1000 items with 1% false positive rate
/// let mut filter = MembershipFilter::new(1000, 0.01);
///
/// filter.add("1|'a'");
/// filter.add("2|'b'");
///
/// assert!(filter.check("1|'a'"));   // true - definitely inserted
/// assert!(filter.check("2|'b'"));   // true - definitely inserted
/// assert!(!filter.check("3|'c'"));  // probably false (might be false positive)
/// ```
///
/// # False Positive Rate
///
/// The actual false positive rate depends on the number of items inserted.
/// If you insert more items than the expected capacity, the false positive
/// rate will increase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MembershipFilter<H: ProbeHasher = Xxh3DoubleHasher> {
    /// Bit array, `ceil(bit_count / 8)` bytes
    bits: Vec<u8>,
    /// Number of bits (m)
    bit_count: u32,
    /// Number of probes (k)
    hash_count: u8,
    /// Number of items inserted since creation or decode
    count: u64,
    hasher: H,
}

impl MembershipFilter {
    /// Create a new filter with expected capacity and false positive rate
    ///
    /// # Arguments
    ///
    /// * `expected_items` - Expected number of items to insert
    /// * `false_positive_rate` - Desired false positive rate (e.g., 0.01 for 1%)
    ///
    /// # Panics
    ///
    /// Panics if `expected_items` is 0, `false_positive_rate` is not in (0, 1),
    /// or the bit vector cannot be allocated. Use [`try_new`](Self::try_new)
    /// to get an error instead.
    pub fn new(expected_items: usize, false_positive_rate: f64) -> Self {
        match Self::try_new(expected_items, false_positive_rate) {
            Ok(filter) => filter,
            Err(err) => panic!("cannot create membership filter: {}", err),
        }
    }

    /// Fallible [`new`](Self::new)
    pub fn try_new(expected_items: usize, false_positive_rate: f64) -> Result<Self, FilterError> {
        Self::try_with_hasher(expected_items, false_positive_rate, Xxh3DoubleHasher::default())
    }
}

impl<H: ProbeHasher> MembershipFilter<H> {
    /// Create a filter sized for `expected_items` at `false_positive_rate`,
    /// probing with `hasher`
    ///
    /// `bit_count = ceil(-n * ln(p) / ln(2)^2)` and
    /// `hash_count = ceil((bit_count / n) * ln(2))`.
    pub fn try_with_hasher(
        expected_items: usize,
        false_positive_rate: f64,
        hasher: H,
    ) -> Result<Self, FilterError> {
        // Written to also reject NaN
        let rate_ok = false_positive_rate > 0.0 && false_positive_rate < 1.0;
        if expected_items == 0 || !rate_ok {
            return Err(FilterError::InvalidParameters {
                expected_items,
                false_positive_rate,
            });
        }

        let num_bits = math::optimal_bit_count(expected_items, false_positive_rate);
        let num_hashes = math::optimal_hash_count(num_bits, expected_items);
        if num_bits > u32::MAX as f64 || num_hashes > u8::MAX as f64 {
            return Err(FilterError::CapacityExceeded {
                bit_count: num_bits as u64,
                hash_count: num_hashes as u64,
            });
        }

        Self::try_with_params(num_bits as u32, num_hashes as u8, hasher)
    }

    /// Create an empty filter with explicit geometry
    pub fn try_with_params(bit_count: u32, hash_count: u8, hasher: H) -> Result<Self, FilterError> {
        if bit_count == 0 || hash_count == 0 {
            return Err(FilterError::EmptyGeometry {
                bit_count,
                hash_count,
            });
        }

        let bytes = byte_len(bit_count);
        let mut bits = Vec::new();
        bits.try_reserve_exact(bytes)
            .map_err(|_| FilterError::Allocation { bytes })?;
        bits.resize(bytes, 0);

        Ok(Self {
            bits,
            bit_count,
            hash_count,
            count: 0,
            hasher,
        })
    }

    /// Rebuild a filter from its geometry and raw bit vector
    ///
    /// The insert counter of the result starts at zero.
    pub fn from_parts(
        bit_count: u32,
        hash_count: u8,
        bits: Vec<u8>,
        hasher: H,
    ) -> Result<Self, FilterError> {
        if bit_count == 0 || hash_count == 0 {
            return Err(FilterError::EmptyGeometry {
                bit_count,
                hash_count,
            });
        }
        let expected = byte_len(bit_count);
        if bits.len() != expected {
            return Err(FilterError::BitsLength {
                expected,
                found: bits.len(),
            });
        }
        Ok(Self {
            bits,
            bit_count,
            hash_count,
            count: 0,
            hasher,
        })
    }

    /// Insert an item into the filter
    pub fn insert(&mut self, item: &[u8]) {
        self.count += 1;

        for bit_idx in self
            .hasher
            .probes(item, u64::from(self.bit_count), u32::from(self.hash_count))
        {
            let bit_idx = bit_idx as usize;
            self.bits[bit_idx / 8] |= 1u8 << (bit_idx % 8);
        }
    }

    /// Check if an item might be in the filter
    ///
    /// Returns `true` if the item might be in the set (possibly a false positive),
    /// or `false` if the item is definitely not in the set.
    pub fn contains(&self, item: &[u8]) -> bool {
        for bit_idx in self
            .hasher
            .probes(item, u64::from(self.bit_count), u32::from(self.hash_count))
        {
            let bit_idx = bit_idx as usize;
            if self.bits[bit_idx / 8] & (1u8 << (bit_idx % 8)) == 0 {
                return false;
            }
        }
        true
    }

    /// Insert a textual key
    pub fn add(&mut self, item: &str) {
        self.insert(item.as_bytes());
    }

    /// Check a textual key
    pub fn check(&self, item: &str) -> bool {
        self.contains(item.as_bytes())
    }

    /// Get the number of bits in the filter
    pub fn bit_count(&self) -> u32 {
        self.bit_count
    }

    /// Get the number of probes per item
    pub fn hash_count(&self) -> u8 {
        self.hash_count
    }

    /// Raw bit vector
    pub fn as_bytes(&self) -> &[u8] {
        &self.bits
    }

    /// Hash family used for probing
    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Get the number of bits set to 1
    pub fn bits_set(&self) -> usize {
        self.bits.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Estimate the current false positive rate
    ///
    /// This is based on the actual fill ratio of the filter.
    pub fn estimated_false_positive_rate(&self) -> f64 {
        let fill_ratio = self.bits_set() as f64 / f64::from(self.bit_count);
        math::powi(fill_ratio, i32::from(self.hash_count))
    }

    /// False positive rate predicted for `items` insertions:
    /// `(1 - e^(-k * n / m))^k`
    pub fn expected_false_positive_rate(&self, items: usize) -> f64 {
        let k = f64::from(self.hash_count);
        let m = f64::from(self.bit_count);
        math::powi(
            1.0 - math::exp(-k * items as f64 / m),
            i32::from(self.hash_count),
        )
    }

    /// Estimate the number of items in the filter
    ///
    /// Uses the fill ratio to estimate cardinality.
    pub fn estimated_count(&self) -> f64 {
        let bits_set = self.bits_set() as f64;
        let m = f64::from(self.bit_count);
        let k = f64::from(self.hash_count);

        if bits_set >= m {
            return f64::INFINITY;
        }

        // n ~ -m/k * ln(1 - X/m) where X is bits set
        -(m / k) * math::ln(1.0 - bits_set / m)
    }
}

/// Bytes needed to hold `bit_count` bits
pub(crate) fn byte_len(bit_count: u32) -> usize {
    (bit_count as usize).div_ceil(8)
}

impl<H: ProbeHasher> Sketch for MembershipFilter<H> {
    type Item = [u8];

    fn update(&mut self, item: &Self::Item) {
        self.insert(item);
    }

    fn merge(&mut self, other: &Self) -> Result<(), FilterError> {
        if self.bit_count != other.bit_count || self.hash_count != other.hash_count {
            return Err(FilterError::IncompatibleMerge {
                expected_bits: self.bit_count,
                expected_hashes: self.hash_count,
                found_bits: other.bit_count,
                found_hashes: other.hash_count,
            });
        }

        for (a, b) in self.bits.iter_mut().zip(other.bits.iter()) {
            *a |= *b;
        }
        self.count += other.count;

        Ok(())
    }

    fn clear(&mut self) {
        self.bits.fill(0);
        self.count = 0;
    }

    fn size_bytes(&self) -> usize {
        self.bits.len() + core::mem::size_of::<Self>()
    }

    fn count(&self) -> u64 {
        self.count
    }
}

impl<H: ProbeHasher> MembershipSketch for MembershipFilter<H> {
    fn contains(&self, item: &Self::Item) -> bool {
        self.contains(item)
    }

    fn false_positive_rate(&self) -> f64 {
        self.estimated_false_positive_rate()
    }

    fn len(&self) -> usize {
        self.count as usize
    }
}
