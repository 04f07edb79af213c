//! Membership testing data structures
//!
//! This module provides the Bloom filter shipped to the remote probe side.
//! It trades a small probability of false positives for significant space
//! savings compared to an exact key set.
//!
//! # Example
//!
//! ```
//! use bloomjoin::membership::MembershipFilter;
//!
//! let mut filter = MembershipFilter::new(1000, 0.01);
//! filter.add("hello");
//! assert!(filter.check("hello"));
//! ```

mod bloom;
mod hasher;

pub(crate) use bloom::byte_len;
pub use bloom::MembershipFilter;
pub use hasher::{DoubleHashProbes, LegacyProbes, LegacyRollingHasher, ProbeHasher, Xxh3DoubleHasher};
