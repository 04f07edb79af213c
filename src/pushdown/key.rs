//! Composite join keys
//!
//! A build-side row is projected into typed attribute text, then rendered as
//! one string: character values quoted, numeric values bare, attributes
//! joined with the key separator. The same string is what the remote side
//! must render for its own rows to test them against the filter.

use std::fmt;

use super::config::{KeyFormat, NullPolicy, UnsupportedTypePolicy};

/// Logical type of a projected attribute
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AttributeType {
    /// Character or string data
    Text,
    /// Exact numeric (decimal) in its output form
    Numeric,
    Int32,
    Float32,
    /// Anything without a rendering rule
    Other,
}

/// Output text of one non-null attribute plus its logical type
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectedAttribute {
    pub type_tag: AttributeType,
    pub text: String,
}

impl ProjectedAttribute {
    pub fn new(type_tag: AttributeType, text: impl Into<String>) -> Self {
        Self {
            type_tag,
            text: text.into(),
        }
    }
}

/// Turns a build-side row into typed attribute text, in projection order
///
/// `None` marks a null attribute.
pub trait RowProjector<R> {
    fn project(&self, row: &R) -> Vec<Option<ProjectedAttribute>>;
}

impl<R, F> RowProjector<R> for F
where
    F: Fn(&R) -> Vec<Option<ProjectedAttribute>>,
{
    fn project(&self, row: &R) -> Vec<Option<ProjectedAttribute>> {
        self(row)
    }
}

/// A single attribute value of a [`Row`]
#[derive(Clone, Debug, PartialEq)]
pub enum Datum {
    Null,
    Text(String),
    /// Exact numeric carried as its canonical decimal text
    Numeric(String),
    Int32(i32),
    Float32(f32),
    Other { type_name: String, text: String },
}

impl Datum {
    pub fn text(value: impl Into<String>) -> Self {
        Datum::Text(value.into())
    }

    pub fn numeric(value: impl Into<String>) -> Self {
        Datum::Numeric(value.into())
    }
}

/// Owned row of [`Datum`] values
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row {
    values: Vec<Datum>,
}

impl Row {
    pub fn new(values: Vec<Datum>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[Datum] {
        &self.values
    }
}

impl From<Vec<Datum>> for Row {
    fn from(values: Vec<Datum>) -> Self {
        Self::new(values)
    }
}

/// Projects [`Row`] values using their Rust display forms
#[derive(Clone, Copy, Debug, Default)]
pub struct DatumProjector;

impl RowProjector<Row> for DatumProjector {
    fn project(&self, row: &Row) -> Vec<Option<ProjectedAttribute>> {
        row.values
            .iter()
            .map(|datum| match datum {
                Datum::Null => None,
                Datum::Text(s) => Some(ProjectedAttribute::new(AttributeType::Text, s.as_str())),
                Datum::Numeric(s) => {
                    Some(ProjectedAttribute::new(AttributeType::Numeric, s.as_str()))
                }
                Datum::Int32(v) => Some(ProjectedAttribute::new(AttributeType::Int32, v.to_string())),
                Datum::Float32(v) => {
                    Some(ProjectedAttribute::new(AttributeType::Float32, v.to_string()))
                }
                Datum::Other { text, .. } => {
                    Some(ProjectedAttribute::new(AttributeType::Other, text.as_str()))
                }
            })
            .collect()
    }
}

/// Rendered key of one row
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompositeKey {
    text: String,
    omitted: usize,
}

impl CompositeKey {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Attributes dropped because their type has no rendering rule
    pub fn omitted(&self) -> usize {
        self.omitted
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Renders projected attributes into [`CompositeKey`]s
#[derive(Clone, Copy, Debug)]
pub struct KeyEncoder {
    format: KeyFormat,
    separator: char,
}

impl KeyEncoder {
    pub fn new(format: KeyFormat, separator: char) -> Self {
        Self { format, separator }
    }

    pub fn encode(&self, attributes: &[Option<ProjectedAttribute>]) -> CompositeKey {
        let mut text = String::new();
        let mut omitted = 0;
        let mut first = true;

        for (position, attribute) in attributes.iter().enumerate() {
            let Some(attribute) = attribute else {
                if self.format.nulls == NullPolicy::EmptyPlaceholder {
                    self.push_separator(&mut text, position, &mut first);
                }
                continue;
            };

            match attribute.type_tag {
                AttributeType::Text if self.format.quote_strings => {
                    self.push_separator(&mut text, position, &mut first);
                    text.push('\'');
                    text.push_str(&attribute.text);
                    text.push('\'');
                }
                AttributeType::Text
                | AttributeType::Numeric
                | AttributeType::Int32
                | AttributeType::Float32 => {
                    self.push_separator(&mut text, position, &mut first);
                    text.push_str(&attribute.text);
                }
                AttributeType::Other => match self.format.unsupported {
                    UnsupportedTypePolicy::Omit => {
                        tracing::debug!(position, "omitting attribute of unsupported type from key");
                        omitted += 1;
                    }
                    UnsupportedTypePolicy::RawText => {
                        self.push_separator(&mut text, position, &mut first);
                        text.push_str(&attribute.text);
                    }
                },
            }
        }

        CompositeKey { text, omitted }
    }

    fn push_separator(&self, text: &mut String, position: usize, first: &mut bool) {
        let needed = match self.format.nulls {
            NullPolicy::PositionalSeparator => position > 0,
            NullPolicy::Skip | NullPolicy::EmptyPlaceholder => !*first,
        };
        if needed {
            text.push(self.separator);
        }
        *first = false;
    }
}
