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

//! Operator interface for query-plan nodes
//!
//! An operator is a node of a query-plan tree that produces a fully
//! materialized table when executed. The planner consults the remaining
//! methods (widths, estimates, cache key, variable map) without running
//! the operator.

use std::hash::Hasher;
use std::sync::Arc;

use rustc_hash::{FxHashSet, FxHasher};

use crate::core::{Result, Table, VariableMap};

/// A node of a query plan
///
/// Implementations are immutable after construction; the planner shares
/// them freely across plan candidates through `Arc`.
pub trait Operator: Send + Sync {
    /// Compute (or fetch) the fully materialized result
    fn result(&self) -> Result<Arc<Table>>;

    /// The mapping from variable to output column
    fn variable_columns(&self) -> VariableMap;

    /// Number of columns in the result
    fn result_width(&self) -> usize;

    /// Column indices the result is sorted on, outermost first
    fn result_sorted_on(&self) -> Vec<usize>;

    /// Estimated number of result rows
    fn size_estimate(&self) -> usize;

    /// Coarse cost hint for the planner
    fn cost_estimate(&self) -> usize;

    /// Estimated multiplicity of column `col`: the average number of
    /// occurrences of each distinct value
    fn multiplicity(&self, col: usize) -> f64;

    /// True when the operator is known to produce no rows without
    /// computing anything
    fn known_empty(&self) -> bool;

    /// Key identifying this operator's output for result caching. Two
    /// operators with equal keys produce semantically equal results.
    fn cache_key(&self) -> String;

    /// Human-readable description for plan output
    fn descriptor(&self) -> String;
}

/// Leaf operator over a pre-materialized table
///
/// Embedders hand the join a `ValuesOperator` per side when the inputs
/// come from outside the planner (and the test suites build their
/// fixtures with it).
pub struct ValuesOperator {
    table: Arc<Table>,
    variables: VariableMap,
    fingerprint: u64,
}

impl ValuesOperator {
    /// Create a leaf from a table and its variable mapping
    ///
    /// Every mapped column must exist in the table.
    pub fn new(table: Table, variables: VariableMap) -> Self {
        debug_assert!(
            variables.iter().all(|(_, c)| c.column < table.num_columns()),
            "variable map references a column outside the table"
        );
        let fingerprint = fingerprint_table(&table);
        Self {
            table: Arc::new(table),
            variables,
            fingerprint,
        }
    }

    /// The underlying table
    pub fn table(&self) -> &Arc<Table> {
        &self.table
    }

    fn distinct_count(&self, col: usize) -> usize {
        let mut seen = FxHashSet::default();
        for row in self.table.iter() {
            seen.insert(row[col].to_string());
        }
        seen.len()
    }
}

fn fingerprint_table(table: &Table) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write_usize(table.num_columns());
    for row in table.iter() {
        for value in row.iter() {
            hasher.write(value.to_string().as_bytes());
            hasher.write_u8(0x1f);
        }
        hasher.write_u8(0x1e);
    }
    hasher.finish()
}

impl Operator for ValuesOperator {
    fn result(&self) -> Result<Arc<Table>> {
        Ok(Arc::clone(&self.table))
    }

    fn variable_columns(&self) -> VariableMap {
        self.variables.clone()
    }

    fn result_width(&self) -> usize {
        self.table.num_columns()
    }

    fn result_sorted_on(&self) -> Vec<usize> {
        Vec::new()
    }

    fn size_estimate(&self) -> usize {
        self.table.num_rows()
    }

    fn cost_estimate(&self) -> usize {
        self.table.num_rows()
    }

    fn multiplicity(&self, col: usize) -> f64 {
        assert!(col < self.result_width(), "column {col} out of range");
        if self.table.is_empty() {
            return 1.0;
        }
        self.table.num_rows() as f64 / self.distinct_count(col) as f64
    }

    fn known_empty(&self) -> bool {
        self.table.is_empty()
    }

    fn cache_key(&self) -> String {
        format!(
            "Values\nrows: {}\ncols: {}\nfingerprint: {:016x}\n",
            self.table.num_rows(),
            self.table.num_columns(),
            self.fingerprint
        )
    }

    fn descriptor(&self) -> String {
        format!(
            "Values ({} x {})",
            self.table.num_rows(),
            self.table.num_columns()
        )
    }
}
