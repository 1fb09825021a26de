// Copyright 2025 Tellus Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Table type for Tellus - materialized operator results
//!
//! A `Table` is an ordered sequence of fixed-width rows with constant-time
//! random access by (row, column). All appends are accounted against a
//! shared [`MemoryTracker`]; exceeding the limit surfaces as
//! [`Error::MemoryExhausted`] and aborts the producing operator.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::error::{Error, Result};
use super::row::Row;
use super::value::Value;

/// Bytes accounted per table cell.
///
/// Heap payloads behind `Arc<str>` are shared between input and output
/// rows, so the slot size is the honest per-cell cost of a join result.
const CELL_SIZE: usize = std::mem::size_of::<Value>();

/// Memory accounting shared by all tables of one execution
///
/// Tracks reserved bytes against a fixed limit. Releases happen when
/// tables are dropped.
#[derive(Debug)]
pub struct MemoryTracker {
    limit: usize,
    used: AtomicUsize,
}

impl MemoryTracker {
    /// Create a tracker with the given byte limit
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            used: AtomicUsize::new(0),
        }
    }

    /// The configured limit in bytes
    #[inline]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Bytes currently reserved
    #[inline]
    pub fn used(&self) -> usize {
        self.used.load(Ordering::Relaxed)
    }

    /// Reserve `bytes`, failing when the limit would be exceeded
    pub fn try_reserve(&self, bytes: usize) -> Result<()> {
        let previous = self.used.fetch_add(bytes, Ordering::Relaxed);
        if previous + bytes > self.limit {
            self.used.fetch_sub(bytes, Ordering::Relaxed);
            return Err(Error::memory_exhausted(self.limit, bytes));
        }
        Ok(())
    }

    /// Return `bytes` to the tracker
    pub fn release(&self, bytes: usize) {
        self.used.fetch_sub(bytes, Ordering::Relaxed);
    }
}

/// An ordered, fixed-width collection of rows
///
/// Rows are appended at the tail; `at(row, col)` is constant time.
#[derive(Debug)]
pub struct Table {
    num_columns: usize,
    rows: Vec<Row>,
    memory: Arc<MemoryTracker>,
}

impl Table {
    /// Create an empty table with the given column count
    pub fn new(num_columns: usize, memory: Arc<MemoryTracker>) -> Self {
        Self {
            num_columns,
            rows: Vec::new(),
            memory,
        }
    }

    /// Number of columns
    #[inline]
    pub fn num_columns(&self) -> usize {
        self.num_columns
    }

    /// Number of rows
    #[inline]
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table has no rows
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Bytes accounted for one row of this table
    #[inline]
    fn row_bytes(&self) -> usize {
        self.num_columns * CELL_SIZE
    }

    /// Append a row at the tail
    ///
    /// Fails with `TableColumnsNotMatch` on a width mismatch and with
    /// `MemoryExhausted` when the tracker rejects the reservation.
    pub fn push_row(&mut self, row: Row) -> Result<()> {
        if row.len() != self.num_columns {
            return Err(Error::table_columns_not_match(self.num_columns, row.len()));
        }
        self.memory.try_reserve(self.row_bytes())?;
        self.rows.push(row);
        Ok(())
    }

    /// Get the value at (row, column)
    ///
    /// Panics when either index is out of bounds, like slice indexing.
    #[inline]
    pub fn at(&self, row: usize, col: usize) -> &Value {
        &self.rows[row][col]
    }

    /// Get a row by index
    #[inline]
    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    /// Iterate over the rows in order
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    /// The memory tracker this table reserves from
    #[inline]
    pub fn memory(&self) -> &Arc<MemoryTracker> {
        &self.memory
    }
}

impl std::ops::Index<usize> for Table {
    type Output = Row;

    #[inline]
    fn index(&self, index: usize) -> &Row {
        &self.rows[index]
    }
}

impl Drop for Table {
    fn drop(&mut self) {
        self.memory.release(self.rows.len() * self.row_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker(limit: usize) -> Arc<MemoryTracker> {
        Arc::new(MemoryTracker::new(limit))
    }

    #[test]
    fn test_push_and_access() {
        let mut table = Table::new(2, tracker(1024));
        table
            .push_row(Row::from_values(vec![Value::integer(1), Value::text("a")]))
            .unwrap();
        table
            .push_row(Row::from_values(vec![Value::integer(2), Value::text("b")]))
            .unwrap();

        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.num_columns(), 2);
        assert_eq!(table.at(0, 0), &Value::integer(1));
        assert_eq!(table.at(1, 1), &Value::text("b"));
    }

    #[test]
    fn test_width_mismatch() {
        let mut table = Table::new(2, tracker(1024));
        let err = table
            .push_row(Row::from_values(vec![Value::integer(1)]))
            .unwrap_err();
        assert_eq!(err, Error::table_columns_not_match(2, 1));
    }

    #[test]
    fn test_memory_exhausted() {
        let memory = tracker(3 * CELL_SIZE);
        let mut table = Table::new(1, memory.clone());
        for i in 0..3 {
            table
                .push_row(Row::from_values(vec![Value::integer(i)]))
                .unwrap();
        }
        let err = table
            .push_row(Row::from_values(vec![Value::integer(3)]))
            .unwrap_err();
        assert!(matches!(err, Error::MemoryExhausted { .. }));
        // The failed append must not leak reserved bytes.
        assert_eq!(memory.used(), 3 * CELL_SIZE);
    }

    #[test]
    fn test_drop_releases_memory() {
        let memory = tracker(1024);
        {
            let mut table = Table::new(2, memory.clone());
            table
                .push_row(Row::from_values(vec![Value::integer(1), Value::integer(2)]))
                .unwrap();
            assert!(memory.used() > 0);
        }
        assert_eq!(memory.used(), 0);
    }

    #[test]
    fn test_shared_tracker_accounts_both_tables() {
        let memory = tracker(4 * CELL_SIZE);
        let mut a = Table::new(1, memory.clone());
        let mut b = Table::new(1, memory.clone());
        a.push_row(Row::from_values(vec![Value::integer(1)])).unwrap();
        a.push_row(Row::from_values(vec![Value::integer(2)])).unwrap();
        b.push_row(Row::from_values(vec![Value::integer(3)])).unwrap();
        b.push_row(Row::from_values(vec![Value::integer(4)])).unwrap();
        assert!(b
            .push_row(Row::from_values(vec![Value::integer(5)]))
            .is_err());
    }
}
