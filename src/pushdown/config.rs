//! Pushdown configuration
//!
//! Defaults reproduce the reference behavior: a 1% false-positive target, a
//! sizing floor of 10 rows for an empty build side, a 100-row initial buffer
//! and `#` between the probe query and the encoded filter.

/// What to do when the filter cannot be built after the build side drained
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FilterFailurePolicy {
    /// Fail the execution with the filter error
    #[default]
    Abort,
    /// Probe with the unfiltered query
    Degrade,
}

/// How a null attribute appears in a composite key
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum NullPolicy {
    /// Leave the value out but keep its position: every non-null attribute
    /// after position 0 is preceded by a separator, so `(NULL, 1)` renders
    /// `|1` and `(1, NULL)` renders `1`
    #[default]
    PositionalSeparator,
    /// Leave the attribute out, separator included
    Skip,
    /// Keep the position as an empty value, so `(1, NULL, 2)` renders `1||2`
    EmptyPlaceholder,
}

/// How an attribute of an unsupported type appears in a composite key
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum UnsupportedTypePolicy {
    /// Leave the attribute out and report it
    #[default]
    Omit,
    /// Use its output text unquoted
    RawText,
}

/// Rendering rules for composite keys
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct KeyFormat {
    /// Wrap character attributes in single quotes
    pub quote_strings: bool,
    pub nulls: NullPolicy,
    pub unsupported: UnsupportedTypePolicy,
}

impl Default for KeyFormat {
    fn default() -> Self {
        Self {
            quote_strings: true,
            nulls: NullPolicy::default(),
            unsupported: UnsupportedTypePolicy::default(),
        }
    }
}

/// Invalid pushdown configuration
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("false_positive_rate must be in (0, 1), got {0}")]
    FalsePositiveRate(f64),
    #[error("empty_build_floor must be positive")]
    ZeroFloor,
    #[error("initial_capacity must be positive")]
    ZeroCapacity,
    #[error("query_delimiter {0:?} collides with the hex alphabet of the encoded filter")]
    HexDelimiter(char),
    #[error("{first} and {second} must differ, both are {value:?}")]
    SeparatorCollision {
        first: &'static str,
        second: &'static str,
        value: char,
    },
}

/// Settings for one [`PushdownScan`](super::PushdownScan)
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PushdownConfig {
    /// Target false-positive probability used to size the filter
    pub false_positive_rate: f64,
    /// Item count the filter is sized for when the build side is empty
    pub empty_build_floor: usize,
    /// Rows reserved before the build side drains; grows by doubling
    pub initial_capacity: usize,
    /// Separates the probe query from the encoded filter
    pub query_delimiter: char,
    /// Separates attributes inside a composite key
    pub key_separator: char,
    /// Separates composite keys in the diagnostic listing
    pub listing_separator: char,
    pub key_format: KeyFormat,
    pub on_filter_error: FilterFailurePolicy,
}

impl Default for PushdownConfig {
    fn default() -> Self {
        Self {
            false_positive_rate: 0.01,
            empty_build_floor: 10,
            initial_capacity: 100,
            query_delimiter: '#',
            key_separator: '|',
            listing_separator: ',',
            key_format: KeyFormat::default(),
            on_filter_error: FilterFailurePolicy::default(),
        }
    }
}

impl PushdownConfig {
    pub fn with_false_positive_rate(mut self, rate: f64) -> Self {
        self.false_positive_rate = rate;
        self
    }

    pub fn with_empty_build_floor(mut self, floor: usize) -> Self {
        self.empty_build_floor = floor;
        self
    }

    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    pub fn with_query_delimiter(mut self, delimiter: char) -> Self {
        self.query_delimiter = delimiter;
        self
    }

    pub fn with_key_separator(mut self, separator: char) -> Self {
        self.key_separator = separator;
        self
    }

    pub fn with_listing_separator(mut self, separator: char) -> Self {
        self.listing_separator = separator;
        self
    }

    pub fn with_key_format(mut self, format: KeyFormat) -> Self {
        self.key_format = format;
        self
    }

    pub fn with_filter_failure_policy(mut self, policy: FilterFailurePolicy) -> Self {
        self.on_filter_error = policy;
        self
    }

    /// Check the settings before a scan starts
    pub fn validate(&self) -> Result<(), ConfigError> {
        let rate = self.false_positive_rate;
        if !(rate > 0.0 && rate < 1.0) {
            return Err(ConfigError::FalsePositiveRate(rate));
        }
        if self.empty_build_floor == 0 {
            return Err(ConfigError::ZeroFloor);
        }
        if self.initial_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.query_delimiter.is_ascii_hexdigit() {
            return Err(ConfigError::HexDelimiter(self.query_delimiter));
        }
        if self.key_separator == self.listing_separator {
            return Err(ConfigError::SeparatorCollision {
                first: "key_separator",
                second: "listing_separator",
                value: self.key_separator,
            });
        }
        Ok(())
    }
}
