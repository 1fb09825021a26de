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

//! # Tellus - spatial distance joins for RDF query engines
//!
//! Tellus implements the core of a spatial distance join operator: given
//! two relational inputs that each carry a geographic point column, it
//! produces every pair of rows whose points lie within a configured
//! great-circle distance, and augments each output row with the computed
//! distance in meters.
//!
//! ## Key pieces
//!
//! - **Planner contract** - [`SpatialJoin`] is an immutable plan node.
//!   Children are attached one at a time via `add_child`, which returns a
//!   new node, so the planner can share partially built joins while
//!   exploring orders. Widths, estimates, cache keys and the
//!   variable-to-column map are available in every state.
//! - **Two algorithms** - a nested-loop baseline and an R-tree variant
//!   that indexes the smaller input and probes it with spherical bounding
//!   rectangles (correct across the antimeridian and at the poles). Both
//!   produce the same rows; candidates from the index are always
//!   re-verified with the exact distance.
//! - **Geometry kernel** - WKT point extraction, haversine great-circle
//!   distance, and the bounding-rectangle construction live in [`geo`].
//! - **Execution model** - children are fully materialized [`Table`]s
//!   allocated against a memory limit; cancellation is cooperative.
//!
//! ## Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use tellus::{
//!     ExecutionContext, MemoryTracker, Operator, Row, SpatialJoin, Table,
//!     Value, Variable, VariableColumn, VariableMap, ValuesOperator,
//! };
//!
//! fn side(var: &str, wkt: &str) -> Arc<dyn Operator> {
//!     let mut table = Table::new(1, Arc::new(MemoryTracker::new(1 << 20)));
//!     table
//!         .push_row(Row::from_values(vec![Value::text(wkt)]))
//!         .unwrap();
//!     let mut vars = VariableMap::new();
//!     vars.insert(Variable::new(var), VariableColumn::always_defined(0))
//!         .unwrap();
//!     Arc::new(ValuesOperator::new(table, vars))
//! }
//!
//! let ctx = Arc::new(ExecutionContext::new());
//! let join = SpatialJoin::try_new(
//!     ctx,
//!     Variable::new("?a"),
//!     "<max-distance-in-meters:5000>",
//!     Variable::new("?b"),
//! )
//! .unwrap();
//!
//! let join = join
//!     .add_child(side("?a", "\"POINT(7.83505 48.01267)\""), &Variable::new("?a"))
//!     .unwrap()
//!     .add_child(side("?b", "\"POINT(7.85298 47.99557)\""), &Variable::new("?b"))
//!     .unwrap();
//!
//! let result = join.compute_result().unwrap();
//! assert_eq!(result.num_rows(), 1);
//! // left point, right point, distance in meters
//! assert_eq!(result.num_columns(), 3);
//! ```
//!
//! ## Modules
//!
//! - [`core`] - values, rows, the memory-accounted table, variables, errors
//! - [`executor`] - the operator contract, the spatial join, the cache
//! - [`geo`] - WKT parsing, distance, spherical bounding rectangles

pub mod core;
pub mod executor;
pub mod geo;

// Re-export main types for convenience
pub use core::{
    Definedness, Error, MemoryTracker, Result, Row, Table, Value, Variable,
    VariableColumn, VariableMap,
};

pub use executor::{
    max_distance_predicate, parse_max_distance_predicate, CancellationHandle,
    ExecutionContext, Operator, ResultCache, SpatialJoin, SpatialJoinAlgorithm,
    ValuesOperator, DEFAULT_MEMORY_LIMIT, DISTANCE_VARIABLE,
};
