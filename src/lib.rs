//! # Bloomjoin
//!
//! Bloom-filter semi-join pushdown for scans whose probe side runs remotely.
//!
//! A scan with a local build side materializes that side once, summarizes the
//! rows' join keys in a Bloom filter, and ships the filter as hex text at the
//! end of the query sent to the remote system. The remote side drops rows that
//! miss the filter before they cross the boundary. The filter has no false
//! negatives; false positives are expected and bounded by the sizing target.
//!
//! ## Features
//!
//! - **Membership filter**: bit vector sized from expected items and target
//!   false-positive rate, probed through a pluggable hash family
//! - **Filter codec**: fixed-layout hex encoding, splice into and split out of
//!   query text
//! - **Pushdown scan**: exactly-once build-side drain, composite key rendering,
//!   filter construction and query rewrite, with rescan support
//!
//! ## Quick Start
//!
//! ```rust
//! use bloomjoin::prelude::*;
//!
//! let mut filter = MembershipFilter::new(2, 0.01);
//! filter.add("1|'a'");
//! filter.add("2|'b'");
//!
//! let encoded = bloomjoin::codec::encode(&filter);
//! assert_eq!(encoded.len(), 16);
//!
//! let decoded = bloomjoin::codec::decode(&encoded).unwrap();
//! assert!(decoded.check("1|'a'"));
//! ```
//!
//! ## Feature Flags
//!
//! Algorithm families (pick what you need):
//! - `membership` (default): Bloom filter and probe hash families
//! - `codec` (default): hex wire format and query splice helpers
//! - `pushdown` (default): the scan orchestrator; requires `std`
//! - `full`: Enable all algorithm families and `serde`
//!
//! Platform features:
//! - `std` (default): Standard library support
//! - `serde`: Enable serialization

#![cfg_attr(not(feature = "std"), no_std)]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[cfg(not(feature = "std"))]
extern crate alloc;

// Core traits always available
pub mod error;
pub mod traits;

mod math;

#[cfg(feature = "membership")]
#[cfg_attr(docsrs, doc(cfg(feature = "membership")))]
pub mod membership;

#[cfg(feature = "codec")]
#[cfg_attr(docsrs, doc(cfg(feature = "codec")))]
pub mod codec;

#[cfg(feature = "pushdown")]
#[cfg_attr(docsrs, doc(cfg(feature = "pushdown")))]
pub mod pushdown;

pub mod prelude {
    pub use crate::error::{DecodeError, FilterError};
    pub use crate::traits::*;

    #[cfg(feature = "membership")]
    pub use crate::membership::{LegacyRollingHasher, MembershipFilter, ProbeHasher, Xxh3DoubleHasher};

    #[cfg(feature = "pushdown")]
    pub use crate::pushdown::{
        ProbeSource, PushdownConfig, PushdownError, PushdownScan, RowProjector, RowSource,
    };
}

#[cfg(feature = "membership")]
pub use membership::MembershipFilter;

#[cfg(feature = "pushdown")]
pub use pushdown::PushdownScan;
