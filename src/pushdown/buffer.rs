//! Growable store for materialized build-side rows

use std::slice;

use super::PushdownError;

/// Owned rows captured from the build side, in arrival order
///
/// Starts at a fixed capacity and doubles when full. Growth goes through
/// `try_reserve_exact`, so running out of memory is an error rather than an
/// abort.
#[derive(Clone, Debug)]
pub struct MaterializationBuffer<R> {
    rows: Vec<R>,
}

impl<R> Default for MaterializationBuffer<R> {
    fn default() -> Self {
        Self { rows: Vec::new() }
    }
}

impl<R> MaterializationBuffer<R> {
    pub fn with_capacity(capacity: usize) -> Result<Self, PushdownError> {
        let mut rows = Vec::new();
        rows.try_reserve_exact(capacity)
            .map_err(|_| PushdownError::Allocation { rows: capacity })?;
        Ok(Self { rows })
    }

    pub fn push(&mut self, row: R) -> Result<(), PushdownError> {
        if self.rows.len() == self.rows.capacity() {
            let additional = self.rows.capacity().max(1);
            self.rows
                .try_reserve_exact(additional)
                .map_err(|_| PushdownError::Allocation {
                    rows: self.rows.len() + additional,
                })?;
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.rows.capacity()
    }

    pub fn as_slice(&self) -> &[R] {
        &self.rows
    }

    pub fn iter(&self) -> slice::Iter<'_, R> {
        self.rows.iter()
    }

    /// Drop every row and release the storage
    pub fn clear(&mut self) {
        self.rows = Vec::new();
    }
}

impl<'a, R> IntoIterator for &'a MaterializationBuffer<R> {
    type Item = &'a R;
    type IntoIter = slice::Iter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
