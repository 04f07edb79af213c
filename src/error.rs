//! Error types shared by the filter and its codec

use core::fmt;

/// Error constructing or combining a membership filter
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FilterError {
    /// Sizing inputs outside their valid domain
    #[error(
        "invalid filter parameters: expected_items={expected_items}, false_positive_rate={false_positive_rate}"
    )]
    InvalidParameters {
        expected_items: usize,
        false_positive_rate: f64,
    },
    /// Geometry does not fit the fixed-width metadata of the wire format
    #[error("filter geometry not encodable: bit_count={bit_count}, hash_count={hash_count}")]
    CapacityExceeded { bit_count: u64, hash_count: u64 },
    /// Zero bits or zero probes
    #[error("filter geometry must be non-zero: bit_count={bit_count}, hash_count={hash_count}")]
    EmptyGeometry { bit_count: u32, hash_count: u8 },
    /// Supplied bit vector does not match the bit count
    #[error("filter bit vector has {found} bytes, bit_count requires {expected}")]
    BitsLength { expected: usize, found: usize },
    /// Bit vector storage could not be obtained
    #[error("failed to allocate {bytes} bytes for filter bits")]
    Allocation { bytes: usize },
    /// Filters have different bit or probe counts
    #[error("incompatible filters: expected bits={expected_bits}, hashes={expected_hashes}, found bits={found_bits}, hashes={found_hashes}")]
    IncompatibleMerge {
        expected_bits: u32,
        expected_hashes: u8,
        found_bits: u32,
        found_hashes: u8,
    },
}

/// Part of an encoded filter a decode error points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    BitCount,
    HashCount,
    Bits,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::BitCount => f.write_str("bit_count"),
            Segment::HashCount => f.write_str("hash_count"),
            Segment::Bits => f.write_str("bits"),
        }
    }
}

/// Malformed encoded filter
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Shorter than the 10 metadata characters
    #[error("encoded filter too short: {len} characters, need at least 10")]
    TooShort { len: usize },
    /// Non-hex character inside a segment; `index` is relative to the whole input
    #[error("invalid hex character {character:?} in {segment} at index {index}")]
    InvalidHex {
        segment: Segment,
        character: char,
        index: usize,
    },
    /// Body length disagrees with the size field
    #[error("encoded filter body has {found} characters, size field implies {expected}")]
    LengthMismatch { expected: usize, found: usize },
    /// A metadata field decoded to zero
    #[error("encoded filter has zero {segment}")]
    ZeroField { segment: Segment },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "std")]
    #[test]
    fn test_display() {
        let err = DecodeError::InvalidHex {
            segment: Segment::HashCount,
            character: 'z',
            index: 9,
        };
        assert_eq!(
            err.to_string(),
            "invalid hex character 'z' in hash_count at index 9"
        );

        let err = FilterError::Allocation { bytes: 12 };
        assert_eq!(err.to_string(), "failed to allocate 12 bytes for filter bits");
    }
}
