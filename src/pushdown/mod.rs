//! Semi-join filter pushdown for scans with a remote probe side
//!
//! A [`PushdownScan`] sits between a local build-side iterator and a remote
//! probe side. On the first tuple request it drains the build side once,
//! renders every row as a composite key, feeds the keys into a freshly sized
//! [`MembershipFilter`](crate::membership::MembershipFilter) and splices the
//! hex-encoded filter onto the probe query. The remote side can then drop
//! rows whose keys miss the filter before they cross the boundary.
//!
//! # Example
//!
//! ```
//! use bloomjoin::pushdown::{
//!     Datum, DatumProjector, ProbeSource, PushdownConfig, PushdownScan, Row, SourceError,
//!     VecRowSource,
//! };
//!
//! struct Remote {
//!     seen: Vec<String>,
//! }
//!
//! impl ProbeSource for Remote {
//!     type Row = Row;
//!
//!     fn next_row(&mut self, query: &str) -> Result<Option<Row>, SourceError> {
//!         self.seen.push(query.to_string());
//!         Ok(None)
//!     }
//!
//!     fn rescan(&mut self) -> Result<(), SourceError> {
//!         Ok(())
//!     }
//! }
//!
//! let build = VecRowSource::new(vec![
//!     Row::new(vec![Datum::Int32(1), Datum::text("a")]),
//!     Row::new(vec![Datum::Int32(2), Datum::text("b")]),
//! ]);
//! let mut scan = PushdownScan::new(
//!     Some(build),
//!     DatumProjector,
//!     Remote { seen: Vec::new() },
//!     "SELECT id, name FROM remote_t",
//!     PushdownConfig::default(),
//! )
//! .unwrap();
//!
//! assert!(scan.next().unwrap().is_none());
//! let outcome = scan.outcome().unwrap();
//! assert_eq!(outcome.key_listing, "1|'a',2|'b'");
//! assert!(scan.remote_query().starts_with("SELECT id, name FROM remote_t#00000014"));
//! ```

mod buffer;
mod config;
mod key;
mod scan;

pub use buffer::MaterializationBuffer;
pub use config::{
    ConfigError, FilterFailurePolicy, KeyFormat, NullPolicy, PushdownConfig,
    UnsupportedTypePolicy,
};
pub use key::{
    AttributeType, CompositeKey, Datum, DatumProjector, KeyEncoder, ProjectedAttribute, Row,
    RowProjector,
};
pub use scan::{MaterializationOutcome, MaterializationState, Phase, PushdownScan};

use crate::error::{DecodeError, FilterError};

/// Error reported by a build-side or probe-side collaborator
pub type SourceError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced by the pushdown orchestrator
#[derive(Debug, thiserror::Error)]
pub enum PushdownError {
    #[error(transparent)]
    Filter(#[from] FilterError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("build side failed: {0}")]
    BuildSide(#[source] SourceError),
    #[error("probe side failed: {0}")]
    ProbeSide(#[source] SourceError),
    #[error("failed to allocate materialization buffer for {rows} rows")]
    Allocation { rows: usize },
    /// A previous materialization failed; only a rescan clears this
    #[error("scan execution aborted by a failed materialization, rescan to retry")]
    Aborted,
}

/// Local row stream feeding the filter build
pub trait RowSource {
    type Row;

    /// Produce the next row, or `None` at end of stream
    fn next_row(&mut self) -> Result<Option<Self::Row>, SourceError>;

    /// Restart the stream from the beginning
    fn rescan(&mut self) -> Result<(), SourceError>;

    /// Release resources at the end of the execution
    fn end(&mut self) {}
}

/// Remote side that executes the (possibly rewritten) probe query
pub trait ProbeSource {
    type Row;

    /// Produce the next remote row for `query`, or `None` when exhausted
    ///
    /// `query` is identical across calls within one execution.
    fn next_row(&mut self, query: &str) -> Result<Option<Self::Row>, SourceError>;

    /// Restart the remote scan; the next call may carry a different query
    fn rescan(&mut self) -> Result<(), SourceError>;

    /// Release resources at the end of the execution
    fn end(&mut self) {}
}

/// In-memory build side over owned rows
#[derive(Clone, Debug, Default)]
pub struct VecRowSource<R> {
    rows: Vec<R>,
    position: usize,
}

impl<R> VecRowSource<R> {
    pub fn new(rows: Vec<R>) -> Self {
        Self { rows, position: 0 }
    }

    /// Rows handed out since the last rescan
    pub fn position(&self) -> usize {
        self.position
    }
}

impl<R: Clone> RowSource for VecRowSource<R> {
    type Row = R;

    fn next_row(&mut self) -> Result<Option<R>, SourceError> {
        let row = self.rows.get(self.position).cloned();
        if row.is_some() {
            self.position += 1;
        }
        Ok(row)
    }

    fn rescan(&mut self) -> Result<(), SourceError> {
        self.position = 0;
        Ok(())
    }
}
