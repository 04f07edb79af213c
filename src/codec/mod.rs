//! Hex text codec for membership filters
//!
//! The wire form is fixed-layout lowercase hex:
//!
//! ```text
//! <8 hex: bit_count><2 hex: hash_count><2 * ceil(bit_count / 8) hex: bits>
//! ```
//!
//! Bytes of the bit vector are written in order, each as two hex digits.
//! Decoding accepts either case and derives the body length from the size
//! field alone.
//!
//! The encoded filter rides at the end of the probe query text, after a
//! delimiter the query grammar does not otherwise use:
//!
//! ```
//! use bloomjoin::codec;
//! use bloomjoin::membership::MembershipFilter;
//!
//! let mut filter = MembershipFilter::new(2, 0.01);
//! filter.add("1|'a'");
//!
//! let query = codec::splice("SELECT id FROM t", '#', &filter);
//! let (base, decoded) = codec::split_query(&query, '#').unwrap();
//! assert_eq!(base, "SELECT id FROM t");
//! assert!(decoded.unwrap().check("1|'a'"));
//! ```

use crate::error::{DecodeError, Segment};
use crate::membership::{byte_len, MembershipFilter, ProbeHasher, Xxh3DoubleHasher};

#[cfg(feature = "std")]
use std::{format, string::String};

#[cfg(not(feature = "std"))]
use alloc::{format, string::String};

/// Characters taken by the `bit_count` and `hash_count` fields
pub const METADATA_LEN: usize = 10;

const BIT_COUNT_LEN: usize = 8;

/// Length of the encoding of a filter with `bit_count` bits
pub fn encoded_len(bit_count: u32) -> usize {
    METADATA_LEN + 2 * byte_len(bit_count)
}

/// Encode a filter as metadata followed by its bit vector, lowercase hex
pub fn encode<H: ProbeHasher>(filter: &MembershipFilter<H>) -> String {
    let mut out = String::with_capacity(encoded_len(filter.bit_count()));
    out.push_str(&format!(
        "{:08x}{:02x}",
        filter.bit_count(),
        filter.hash_count()
    ));
    out.push_str(&hex::encode(filter.as_bytes()));
    out
}

/// Decode a filter probed with the default hash family
pub fn decode(text: &str) -> Result<MembershipFilter, DecodeError> {
    decode_with_hasher(text, Xxh3DoubleHasher::default())
}

/// Decode a filter that will be probed with `hasher`
pub fn decode_with_hasher<H: ProbeHasher>(
    text: &str,
    hasher: H,
) -> Result<MembershipFilter<H>, DecodeError> {
    let bytes = text.as_bytes();
    if bytes.len() < METADATA_LEN {
        return Err(DecodeError::TooShort { len: bytes.len() });
    }

    let mut size = [0u8; 4];
    decode_segment(&bytes[..BIT_COUNT_LEN], &mut size, Segment::BitCount, 0)?;
    let bit_count = u32::from_be_bytes(size);

    let mut probes = [0u8; 1];
    decode_segment(
        &bytes[BIT_COUNT_LEN..METADATA_LEN],
        &mut probes,
        Segment::HashCount,
        BIT_COUNT_LEN,
    )?;
    let hash_count = probes[0];

    if bit_count == 0 {
        return Err(DecodeError::ZeroField {
            segment: Segment::BitCount,
        });
    }
    if hash_count == 0 {
        return Err(DecodeError::ZeroField {
            segment: Segment::HashCount,
        });
    }

    let body = &bytes[METADATA_LEN..];
    let expected = 2 * byte_len(bit_count);
    if body.len() != expected {
        return Err(DecodeError::LengthMismatch {
            expected,
            found: body.len(),
        });
    }

    let bits = hex::decode(body)
        .map_err(|err| hex_error(err, Segment::Bits, METADATA_LEN, expected, body.len()))?;

    MembershipFilter::from_parts(bit_count, hash_count, bits, hasher).map_err(|_| {
        DecodeError::LengthMismatch {
            expected,
            found: body.len(),
        }
    })
}

fn decode_segment(
    input: &[u8],
    out: &mut [u8],
    segment: Segment,
    offset: usize,
) -> Result<(), DecodeError> {
    hex::decode_to_slice(input, out)
        .map_err(|err| hex_error(err, segment, offset, 2 * out.len(), input.len()))
}

fn hex_error(
    err: hex::FromHexError,
    segment: Segment,
    offset: usize,
    expected: usize,
    found: usize,
) -> DecodeError {
    match err {
        hex::FromHexError::InvalidHexCharacter { c, index } => DecodeError::InvalidHex {
            segment,
            character: c,
            index: offset + index,
        },
        _ => DecodeError::LengthMismatch { expected, found },
    }
}

/// Append the encoded `filter` to `query`, separated by `delimiter`
pub fn splice<H: ProbeHasher>(query: &str, delimiter: char, filter: &MembershipFilter<H>) -> String {
    let encoded = encode(filter);
    let mut out = String::with_capacity(query.len() + delimiter.len_utf8() + encoded.len());
    out.push_str(query);
    out.push(delimiter);
    out.push_str(&encoded);
    out
}

/// Split a probe query into its base text and the filter spliced after the
/// last `delimiter`, if any
///
/// A malformed filter after the delimiter is an error, never ignored.
pub fn split_query(
    text: &str,
    delimiter: char,
) -> Result<(&str, Option<MembershipFilter>), DecodeError> {
    split_query_with_hasher(text, delimiter, Xxh3DoubleHasher::default())
}

/// [`split_query`] for filters probed with `hasher`
pub fn split_query_with_hasher<H: ProbeHasher>(
    text: &str,
    delimiter: char,
    hasher: H,
) -> Result<(&str, Option<MembershipFilter<H>>), DecodeError> {
    match text.rsplit_once(delimiter) {
        Some((base, encoded)) => Ok((base, Some(decode_with_hasher(encoded, hasher)?))),
        None => Ok((text, None)),
    }
}

#[cfg(feature = "serde")]
impl<H: ProbeHasher> serde::Serialize for MembershipFilter<H> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&encode(self))
    }
}

#[cfg(feature = "serde")]
impl<'de, H: ProbeHasher> serde::Deserialize<'de> for MembershipFilter<H> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let text = <String as serde::Deserialize>::deserialize(deserializer)?;
        decode_with_hasher(&text, H::default()).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::membership::LegacyRollingHasher;

    #[cfg(feature = "std")]
    use std::{string::ToString, vec::Vec};

    #[cfg(not(feature = "std"))]
    use alloc::{string::ToString, vec::Vec};

    #[test]
    fn test_encode_layout() {
        let mut filter = MembershipFilter::new(2, 0.01);
        filter.add("1|'a'");
        filter.add("2|'b'");

        let encoded = encode(&filter);
        assert_eq!(encoded.len(), 16);
        assert_eq!(encoded.len(), encoded_len(filter.bit_count()));
        assert_eq!(&encoded[..8], "00000014");
        assert_eq!(&encoded[8..10], "07");
        assert_eq!(&encoded[10..], hex::encode(filter.as_bytes()));
        assert!(encoded
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_encode_known_bits() {
        let filter = MembershipFilter::from_parts(
            12,
            3,
            Vec::from([0x0f, 0xa0]),
            Xxh3DoubleHasher::default(),
        )
        .unwrap();
        assert_eq!(encode(&filter), "0000000c030fa0");
    }

    #[test]
    fn test_round_trip() {
        let mut filter = MembershipFilter::new(1000, 0.01);
        for i in 0..1000 {
            filter.add(&i.to_string());
        }

        let decoded = decode(&encode(&filter)).unwrap();
        assert_eq!(decoded.bit_count(), filter.bit_count());
        assert_eq!(decoded.hash_count(), filter.hash_count());
        assert_eq!(decoded.as_bytes(), filter.as_bytes());
        for i in 0..1000 {
            assert!(decoded.check(&i.to_string()));
        }
    }

    #[test]
    fn test_decode_uppercase() {
        let filter = decode("0000000C030FA0").unwrap();
        assert_eq!(filter.bit_count(), 12);
        assert_eq!(filter.hash_count(), 3);
        assert_eq!(filter.as_bytes(), &[0x0f, 0xa0]);
    }

    #[test]
    fn test_decode_too_short() {
        assert_eq!(decode(""), Err(DecodeError::TooShort { len: 0 }));
        assert_eq!(decode("000000140"), Err(DecodeError::TooShort { len: 9 }));
    }

    #[test]
    fn test_decode_invalid_hex() {
        assert_eq!(
            decode("0000001g07000000").unwrap_err(),
            DecodeError::InvalidHex {
                segment: Segment::BitCount,
                character: 'g',
                index: 7,
            }
        );
        assert_eq!(
            decode("000000140x000000").unwrap_err(),
            DecodeError::InvalidHex {
                segment: Segment::HashCount,
                character: 'x',
                index: 9,
            }
        );
        assert_eq!(
            decode("0000001407000z00").unwrap_err(),
            DecodeError::InvalidHex {
                segment: Segment::Bits,
                character: 'z',
                index: 13,
            }
        );
    }

    #[test]
    fn test_decode_length_mismatch() {
        assert_eq!(
            decode("000000140700"),
            Err(DecodeError::LengthMismatch {
                expected: 6,
                found: 2
            })
        );
        assert_eq!(
            decode("00000014070000000000"),
            Err(DecodeError::LengthMismatch {
                expected: 6,
                found: 10
            })
        );
    }

    #[test]
    fn test_decode_zero_fields() {
        assert_eq!(
            decode("0000000007"),
            Err(DecodeError::ZeroField {
                segment: Segment::BitCount
            })
        );
        assert_eq!(
            decode("0000001400000000"),
            Err(DecodeError::ZeroField {
                segment: Segment::HashCount
            })
        );
    }

    #[test]
    fn test_decode_non_ascii() {
        assert!(matches!(
            decode("0000001407\u{e9}0000"),
            Err(DecodeError::InvalidHex {
                segment: Segment::Bits,
                ..
            })
        ));
    }

    #[test]
    fn test_splice_and_split() {
        let mut filter = MembershipFilter::new(10, 0.01);
        filter.add("42");

        let query = splice("SELECT * FROM remote", '#', &filter);
        assert_eq!(query.matches('#').count(), 1);
        assert!(query.starts_with("SELECT * FROM remote#"));

        let (base, decoded) = split_query(&query, '#').unwrap();
        assert_eq!(base, "SELECT * FROM remote");
        let decoded = decoded.unwrap();
        assert_eq!(decoded.as_bytes(), filter.as_bytes());
        assert!(decoded.check("42"));
    }

    #[test]
    fn test_split_without_filter() {
        let (base, filter) = split_query("SELECT 1", '#').unwrap();
        assert_eq!(base, "SELECT 1");
        assert!(filter.is_none());
    }

    #[test]
    fn test_split_malformed_filter() {
        assert_eq!(
            split_query("SELECT 1#zz", '#').unwrap_err(),
            DecodeError::TooShort { len: 2 }
        );
    }

    #[test]
    fn test_legacy_hasher_round_trip() {
        let mut filter =
            MembershipFilter::try_with_hasher(10, 0.01, LegacyRollingHasher).unwrap();
        filter.add("1|'a'");
        let decoded = decode_with_hasher(&encode(&filter), LegacyRollingHasher).unwrap();
        assert!(decoded.check("1|'a'"));
        assert_eq!(decoded.as_bytes(), filter.as_bytes());
    }
}
