//! Exactly-once materialization and filter splice for one scan execution

use crate::codec;
use crate::membership::{MembershipFilter, ProbeHasher, Xxh3DoubleHasher};

use super::buffer::MaterializationBuffer;
use super::config::{FilterFailurePolicy, PushdownConfig};
use super::key::{KeyEncoder, RowProjector};
use super::{ProbeSource, PushdownError, RowSource};

/// Where an execution stands with respect to the filter step
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Gate open; the next tuple request materializes
    Pending,
    /// Gate closed until rescan
    Materialized,
    /// Materialization failed; tuple requests error until rescan
    Failed,
}

/// Result of draining the build side and building the filter
#[derive(Clone, Debug)]
pub struct MaterializationOutcome<H: ProbeHasher = Xxh3DoubleHasher> {
    /// Rows captured from the build side
    pub rows: usize,
    /// Item count the filter was sized for
    pub sized_for: usize,
    pub filter: MembershipFilter<H>,
    /// Text appended after the query delimiter
    pub encoded: String,
    /// Composite keys in capture order, joined by the listing separator
    pub key_listing: String,
    /// Attributes left out of keys because their type has no rendering rule
    pub omitted_attributes: usize,
}

/// Per-execution state owned by a [`PushdownScan`]
#[derive(Debug)]
pub struct MaterializationState<R, H: ProbeHasher = Xxh3DoubleHasher> {
    phase: Phase,
    buffer: MaterializationBuffer<R>,
    outcome: Option<MaterializationOutcome<H>>,
}

impl<R, H: ProbeHasher> MaterializationState<R, H> {
    fn new() -> Self {
        Self {
            phase: Phase::Pending,
            buffer: MaterializationBuffer::default(),
            outcome: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether the gate has closed for this execution
    pub fn done(&self) -> bool {
        self.phase == Phase::Materialized
    }

    pub fn row_count(&self) -> usize {
        self.buffer.len()
    }

    pub fn rows(&self) -> &[R] {
        self.buffer.as_slice()
    }

    pub fn outcome(&self) -> Option<&MaterializationOutcome<H>> {
        self.outcome.as_ref()
    }

    fn reset(&mut self) {
        self.phase = Phase::Pending;
        self.buffer.clear();
        self.outcome = None;
    }
}

/// Scan whose probe side runs remotely, filtered by the build side's keys
///
/// The first call to [`next`](Self::next) drains the build side, builds a
/// membership filter over the rows' composite keys and appends the encoded
/// filter to the probe query. Later calls go straight to the probe side with
/// the rewritten query. Only [`rescan`](Self::rescan) reopens the gate.
pub struct PushdownScan<B, P, J, H = Xxh3DoubleHasher>
where
    B: RowSource,
    P: RowProjector<B::Row>,
    J: ProbeSource,
    H: ProbeHasher,
{
    build: Option<B>,
    projector: P,
    probe: J,
    hasher: H,
    config: PushdownConfig,
    /// Probe query as supplied, without any filter
    base_query: String,
    /// Query handed to the probe side
    remote_query: String,
    state: MaterializationState<B::Row, H>,
}

impl<B, P, J> PushdownScan<B, P, J>
where
    B: RowSource,
    P: RowProjector<B::Row>,
    J: ProbeSource,
{
    /// Create a scan probing with the default hash family
    ///
    /// A `None` build side disables the filter step.
    pub fn new(
        build: Option<B>,
        projector: P,
        probe: J,
        query: impl Into<String>,
        config: PushdownConfig,
    ) -> Result<Self, PushdownError> {
        Self::with_hasher(
            build,
            projector,
            probe,
            query,
            config,
            Xxh3DoubleHasher::default(),
        )
    }
}

impl<B, P, J, H> PushdownScan<B, P, J, H>
where
    B: RowSource,
    P: RowProjector<B::Row>,
    J: ProbeSource,
    H: ProbeHasher,
{
    pub fn with_hasher(
        build: Option<B>,
        projector: P,
        probe: J,
        query: impl Into<String>,
        config: PushdownConfig,
        hasher: H,
    ) -> Result<Self, PushdownError> {
        config.validate()?;
        let base_query = query.into();
        Ok(Self {
            build,
            projector,
            probe,
            hasher,
            config,
            remote_query: base_query.clone(),
            base_query,
            state: MaterializationState::new(),
        })
    }

    /// Fetch the next probe-side row, materializing the build side first if
    /// this execution has not done so yet
    pub fn next(&mut self) -> Result<Option<J::Row>, PushdownError> {
        self.ensure_materialized()?;
        self.probe
            .next_row(&self.remote_query)
            .map_err(PushdownError::ProbeSide)
    }

    /// Run the filter step unless the gate is already closed
    pub fn ensure_materialized(&mut self) -> Result<(), PushdownError> {
        match self.state.phase {
            Phase::Materialized => Ok(()),
            Phase::Failed => Err(PushdownError::Aborted),
            Phase::Pending => {
                let result = self.materialize();
                self.state.phase = match result {
                    Ok(()) => Phase::Materialized,
                    Err(_) => Phase::Failed,
                };
                result
            }
        }
    }

    #[tracing::instrument(level = "info", skip_all, fields(query = %self.base_query))]
    fn materialize(&mut self) -> Result<(), PushdownError> {
        let Some(build) = self.build.as_mut() else {
            tracing::info!("no build side, probing without a filter");
            return Ok(());
        };

        tracing::info!("materializing build side");
        let mut buffer = MaterializationBuffer::with_capacity(self.config.initial_capacity)?;
        while let Some(row) = build.next_row().map_err(PushdownError::BuildSide)? {
            buffer.push(row)?;
        }

        let rows = buffer.len();
        let sized_for = if rows == 0 {
            self.config.empty_build_floor
        } else {
            rows
        };

        let mut filter = match MembershipFilter::try_with_hasher(
            sized_for,
            self.config.false_positive_rate,
            self.hasher.clone(),
        ) {
            Ok(filter) => filter,
            Err(err) => {
                self.state.buffer = buffer;
                return match self.config.on_filter_error {
                    FilterFailurePolicy::Abort => Err(err.into()),
                    FilterFailurePolicy::Degrade => {
                        tracing::warn!(error = %err, rows, "filter unavailable, probing unfiltered");
                        Ok(())
                    }
                };
            }
        };
        tracing::info!(
            rows,
            sized_for,
            bit_count = filter.bit_count(),
            hash_count = filter.hash_count(),
            "sized membership filter"
        );

        let encoder = KeyEncoder::new(self.config.key_format, self.config.key_separator);
        let mut key_listing = String::new();
        let mut omitted_attributes = 0;
        for (idx, row) in buffer.iter().enumerate() {
            let key = encoder.encode(&self.projector.project(row));
            tracing::debug!(key = key.as_str(), "adding key to filter");
            filter.add(key.as_str());
            omitted_attributes += key.omitted();
            if idx > 0 {
                key_listing.push(self.config.listing_separator);
            }
            key_listing.push_str(key.as_str());
        }
        if omitted_attributes > 0 {
            tracing::warn!(
                omitted_attributes,
                "attributes of unsupported type left out of filter keys"
            );
        }

        let encoded = codec::encode(&filter);
        let mut remote_query =
            String::with_capacity(self.base_query.len() + 1 + encoded.len());
        remote_query.push_str(&self.base_query);
        remote_query.push(self.config.query_delimiter);
        remote_query.push_str(&encoded);
        self.remote_query = remote_query;

        tracing::info!(
            rows,
            encoded_len = encoded.len(),
            "spliced membership filter into probe query"
        );

        self.state.buffer = buffer;
        self.state.outcome = Some(MaterializationOutcome {
            rows,
            sized_for,
            filter,
            encoded,
            key_listing,
            omitted_attributes,
        });
        Ok(())
    }

    /// Start a new logical execution: discard materialized state, restore the
    /// unfiltered query and rescan both sides
    pub fn rescan(&mut self) -> Result<(), PushdownError> {
        self.state.reset();
        self.remote_query.clone_from(&self.base_query);
        self.probe.rescan().map_err(PushdownError::ProbeSide)?;
        if let Some(build) = self.build.as_mut() {
            build.rescan().map_err(PushdownError::BuildSide)?;
        }
        Ok(())
    }

    /// Tear the execution down, releasing both sides
    pub fn end(mut self) {
        self.probe.end();
        if let Some(build) = self.build.as_mut() {
            build.end();
        }
        self.state.reset();
    }

    /// Query the probe side sees; carries the filter once materialized
    pub fn remote_query(&self) -> &str {
        &self.remote_query
    }

    pub fn base_query(&self) -> &str {
        &self.base_query
    }

    pub fn is_materialized(&self) -> bool {
        self.state.done()
    }

    pub fn state(&self) -> &MaterializationState<B::Row, H> {
        &self.state
    }

    pub fn outcome(&self) -> Option<&MaterializationOutcome<H>> {
        self.state.outcome()
    }

    pub fn config(&self) -> &PushdownConfig {
        &self.config
    }

    pub fn probe(&self) -> &J {
        &self.probe
    }

    pub fn build(&self) -> Option<&B> {
        self.build.as_ref()
    }
}
