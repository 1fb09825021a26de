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

//! Spatial distance join operator
//!
//! Joins two inputs on their point-valued columns: a pair of rows is in
//! the result iff the great-circle distance between their points is at
//! most the configured maximum. Unlike an equi-join both point columns
//! survive into the output, and an extra trailing column can carry the
//! computed distance in meters.
//!
//! The node is created from the parsed join triple with both children
//! missing; the planner attaches them one at a time through
//! [`SpatialJoin::add_child`], which returns a new node so partially
//! built plans can be shared while join orders are explored.

use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::core::{
    Error, Result, Row, Table, Value, Variable, VariableColumn, VariableMap,
};
use crate::executor::context::{CancellationHandle, ExecutionContext};
use crate::executor::operator::Operator;
use crate::executor::operators::{bounding_box, nested_loop};
use crate::geo::{distance_meters, parse_wkt_point, text_between_quotes};

/// Name of the column carrying the computed distance. The surrounding
/// engine recognizes this marker and keeps it out of user-facing output
/// unless selected explicitly.
pub const DISTANCE_VARIABLE: &str = "?distOfTheTwoObjectsAddedInternally";

static MAX_DIST_PREDICATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^<max-distance-in-meters:([0-9]+)>$").expect("predicate pattern is valid")
});

/// Parse a join predicate of the exact form `<max-distance-in-meters:N>`
/// into the non-negative maximum distance in meters.
///
/// Any deviation fails: wrong case in the literal text, a sign, a decimal
/// point, trailing garbage inside or outside the angle brackets, or a
/// number beyond the signed 64-bit range.
pub fn parse_max_distance_predicate(predicate: &str) -> Result<i64> {
    let captures = MAX_DIST_PREDICATE.captures(predicate).ok_or_else(|| {
        Error::parse(format!(
            "'{predicate}' is not a max-distance join predicate"
        ))
    })?;
    captures[1].parse::<i64>().map_err(|_| {
        Error::parse(format!(
            "maximum distance in '{predicate}' does not fit into 64 bits"
        ))
    })
}

/// Format a maximum distance back into its predicate form.
pub fn max_distance_predicate(meters: i64) -> String {
    format!("<max-distance-in-meters:{meters}>")
}

/// Join algorithm, fixed when the plan is built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpatialJoinAlgorithm {
    /// Cross product with a distance filter, O(n*m)
    NestedLoop,
    /// R-tree over the smaller side, probed with spherical bounding
    /// rectangles, exact distance re-verified per candidate
    #[default]
    BoundingBox,
}

/// The spatial distance join plan node
///
/// Immutable after construction; attaching a child yields a new node
/// that shares the other side.
#[derive(Clone)]
pub struct SpatialJoin {
    ctx: Arc<ExecutionContext>,
    left_variable: Variable,
    right_variable: Variable,
    max_dist_m: i64,
    include_distance: bool,
    algorithm: SpatialJoinAlgorithm,
    child_left: Option<Arc<dyn Operator>>,
    child_right: Option<Arc<dyn Operator>>,
}

impl std::fmt::Debug for SpatialJoin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialJoin")
            .field("left_variable", &self.left_variable)
            .field("right_variable", &self.right_variable)
            .field("max_dist_m", &self.max_dist_m)
            .field("include_distance", &self.include_distance)
            .field("algorithm", &self.algorithm)
            .field("has_child_left", &self.child_left.is_some())
            .field("has_child_right", &self.child_right.is_some())
            .finish()
    }
}

impl SpatialJoin {
    /// Create a join node from the parsed triple. The children are named
    /// by the triple's variables and get attached later.
    pub fn try_new(
        ctx: Arc<ExecutionContext>,
        left_variable: Variable,
        predicate: &str,
        right_variable: Variable,
    ) -> Result<Self> {
        let max_dist_m = parse_max_distance_predicate(predicate)?;
        Ok(Self {
            ctx,
            left_variable,
            right_variable,
            max_dist_m,
            include_distance: true,
            algorithm: SpatialJoinAlgorithm::default(),
            child_left: None,
            child_right: None,
        })
    }

    /// Toggle the trailing distance column (on by default)
    pub fn with_include_distance(mut self, include: bool) -> Self {
        self.include_distance = include;
        self
    }

    /// Select the join algorithm
    pub fn with_algorithm(mut self, algorithm: SpatialJoinAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// The maximum distance in meters. Zero keeps only coincident points;
    /// there is no sentinel for unlimited.
    pub fn max_dist(&self) -> i64 {
        self.max_dist_m
    }

    /// The selected join algorithm
    pub fn algorithm(&self) -> SpatialJoinAlgorithm {
        self.algorithm
    }

    /// Whether the output carries the distance column
    pub fn include_distance(&self) -> bool {
        self.include_distance
    }

    /// The variable naming the left point column
    pub fn left_variable(&self) -> &Variable {
        &self.left_variable
    }

    /// The variable naming the right point column
    pub fn right_variable(&self) -> &Variable {
        &self.right_variable
    }

    /// Attach a child operator for one of the two join variables.
    ///
    /// Returns a new node with that slot filled; the receiver is left
    /// unchanged so the planner can keep exploring join orders with it.
    pub fn add_child(
        &self,
        child: Arc<dyn Operator>,
        variable: &Variable,
    ) -> Result<SpatialJoin> {
        let left = if *variable == self.left_variable {
            true
        } else if *variable == self.right_variable {
            false
        } else {
            return Err(Error::UnknownJoinVariable(variable.name().to_string()));
        };
        if !child.variable_columns().contains(variable) {
            return Err(Error::VariableNotInChild {
                variable: variable.name().to_string(),
            });
        }

        let mut next = self.clone();
        if left {
            next.child_left = Some(child);
        } else {
            next.child_right = Some(child);
        }
        Ok(next)
    }

    /// True once both children are attached
    pub fn is_constructed(&self) -> bool {
        self.child_left.is_some() && self.child_right.is_some()
    }

    /// Both children, failing on an incomplete node
    pub fn children(&self) -> Result<(&Arc<dyn Operator>, &Arc<dyn Operator>)> {
        match (&self.child_left, &self.child_right) {
            (Some(left), Some(right)) => Ok((left, right)),
            _ => Err(Error::MissingChild),
        }
    }

    /// Size estimate before any LIMIT is applied. This core applies no
    /// limits, so [`Operator::size_estimate`] forwards here.
    pub fn size_estimate_before_limit(&self) -> usize {
        match (&self.child_left, &self.child_right) {
            (Some(left), Some(right)) => {
                left.size_estimate().saturating_mul(right.size_estimate())
            }
            _ => 1,
        }
    }

    /// Compute the join result with the configured algorithm
    pub fn compute_result(&self) -> Result<Table> {
        let sides = JoinSides::prepare(self)?;
        match self.algorithm {
            SpatialJoinAlgorithm::NestedLoop => nested_loop::compute(&sides),
            SpatialJoinAlgorithm::BoundingBox => bounding_box::compute(&sides),
        }
    }
}

impl Operator for SpatialJoin {
    fn result(&self) -> Result<Arc<Table>> {
        self.compute_result().map(Arc::new)
    }

    fn variable_columns(&self) -> VariableMap {
        let mut map = VariableMap::new();
        match (&self.child_left, &self.child_right) {
            (None, None) => {
                // Advertise both unresolved variables so the planner keeps
                // pushing children at this node.
                map.set(
                    self.left_variable.clone(),
                    VariableColumn::possibly_undefined(0),
                );
                map.set(
                    self.right_variable.clone(),
                    VariableColumn::possibly_undefined(1),
                );
            }
            (Some(_), None) => {
                map.set(
                    self.right_variable.clone(),
                    VariableColumn::possibly_undefined(1),
                );
            }
            (None, Some(_)) => {
                map.set(
                    self.left_variable.clone(),
                    VariableColumn::possibly_undefined(0),
                );
            }
            (Some(left), Some(right)) => {
                let left_width = left.result_width();
                for (variable, column) in left.variable_columns().sorted_by_column() {
                    map.set(variable, column);
                }
                for (variable, column) in right.variable_columns().sorted_by_column() {
                    map.set(
                        variable,
                        VariableColumn {
                            column: left_width + column.column,
                            definedness: column.definedness,
                        },
                    );
                }
                if self.include_distance {
                    map.set(
                        Variable::new(DISTANCE_VARIABLE),
                        VariableColumn::always_defined(left_width + right.result_width()),
                    );
                }
            }
        }
        map
    }

    fn result_width(&self) -> usize {
        match (&self.child_left, &self.child_right) {
            (Some(left), Some(right)) => {
                // The join columns are not removed: both sides keep their
                // point column because the two positions differ.
                let children = left.result_width() + right.result_width();
                if self.include_distance {
                    children + 1
                } else {
                    children
                }
            }
            // With one child attached the dummy result holds only the
            // variable that is still unresolved; with none, both.
            (Some(_), None) | (None, Some(_)) => 1,
            (None, None) => 2,
        }
    }

    fn result_sorted_on(&self) -> Vec<usize> {
        // The R-tree algorithm cannot preserve any child ordering, so no
        // sort order is advertised in any case.
        Vec::new()
    }

    fn size_estimate(&self) -> usize {
        self.size_estimate_before_limit()
    }

    fn cost_estimate(&self) -> usize {
        let (Some(left), Some(right)) = (&self.child_left, &self.child_right) else {
            return 1;
        };
        let input = left.size_estimate().saturating_mul(right.size_estimate());
        match self.algorithm {
            SpatialJoinAlgorithm::NestedLoop => input.saturating_mul(input),
            SpatialJoinAlgorithm::BoundingBox => {
                input.saturating_mul((input as f64).ln() as usize)
            }
        }
    }

    fn multiplicity(&self, col: usize) -> f64 {
        assert!(col < self.result_width(), "column {col} out of range");
        let (Some(left), Some(right)) = (&self.child_left, &self.child_right) else {
            return 1.0;
        };

        if self.include_distance && col == self.result_width() - 1 {
            // Distances are effectively unique, even if only after a few
            // decimal places.
            return 1.0;
        }
        let left_width = left.result_width();
        let (child, child_col) = if col < left_width {
            (left, col)
        } else {
            (right, col - left_width)
        };
        let distinctness = child.size_estimate() as f64 / child.multiplicity(child_col);
        if distinctness <= 0.0 {
            return 1.0;
        }
        self.size_estimate() as f64 / distinctness
    }

    fn known_empty(&self) -> bool {
        self.child_left.as_ref().is_some_and(|c| c.known_empty())
            || self.child_right.as_ref().is_some_and(|c| c.known_empty())
    }

    fn cache_key(&self) -> String {
        match (&self.child_left, &self.child_right) {
            (Some(left), Some(right)) => format!(
                "SpatialJoin\nChild1:\n{}\nChild2:\n{}\nmaxDist: {}\n",
                left.cache_key(),
                right.cache_key(),
                self.max_dist_m
            ),
            _ => "incomplete SpatialJoin class".to_string(),
        }
    }

    fn descriptor(&self) -> String {
        format!(
            "SpatialJoin: {} max distance of {} to {}",
            self.left_variable, self.max_dist_m, self.right_variable
        )
    }
}

/// Everything the join algorithms need: both materialized inputs, the
/// resolved point columns, and the join parameters.
pub(crate) struct JoinSides<'a> {
    join: &'a SpatialJoin,
    pub left: Arc<Table>,
    pub right: Arc<Table>,
    pub left_col: usize,
    pub right_col: usize,
}

impl<'a> JoinSides<'a> {
    /// Materialize both children and resolve their point columns
    fn prepare(join: &'a SpatialJoin) -> Result<Self> {
        let (left_child, right_child) = join.children()?;
        let left_col = Self::join_column(left_child, &join.left_variable)?;
        let right_col = Self::join_column(right_child, &join.right_variable)?;
        Ok(Self {
            join,
            left: left_child.result()?,
            right: right_child.result()?,
            left_col,
            right_col,
        })
    }

    fn join_column(child: &Arc<dyn Operator>, variable: &Variable) -> Result<usize> {
        child
            .variable_columns()
            .get(variable)
            .map(|c| c.column)
            .ok_or_else(|| Error::VariableNotInChild {
                variable: variable.name().to_string(),
            })
    }

    /// The join's maximum distance in meters
    #[inline]
    pub fn max_dist(&self) -> i64 {
        self.join.max_dist_m
    }

    /// The cancellation handle to poll per outer loop iteration
    #[inline]
    pub fn cancellation(&self) -> &CancellationHandle {
        self.join.ctx.cancellation()
    }

    /// Extract the `(lon, lat)` point from a table cell
    pub fn point(&self, table: &Table, row: usize, col: usize) -> Result<(f64, f64)> {
        let value = table.at(row, col);
        let text = match value {
            Value::Text(text) => text,
            other => return Err(Error::PointColumnNotText(other.to_string())),
        };
        parse_wkt_point(text_between_quotes(text))
    }

    /// Exact distance in integer meters between a left and a right row
    pub fn distance_between(&self, row_left: usize, row_right: usize) -> Result<i64> {
        let p1 = self.point(&self.left, row_left, self.left_col)?;
        let p2 = self.point(&self.right, row_right, self.right_col)?;
        Ok(distance_meters(p1, p2))
    }

    /// Fresh output table with the width the planner advertised
    pub fn new_output(&self) -> Table {
        Table::new(
            self.join.result_width(),
            Arc::clone(self.join.ctx.memory()),
        )
    }

    /// Append one joined row: all left columns, all right columns, then
    /// the distance when the join is configured to carry it. This order
    /// matches `variable_columns()` of the same node.
    pub fn append_joined_row(
        &self,
        output: &mut Table,
        row_left: usize,
        row_right: usize,
        distance: i64,
    ) -> Result<()> {
        let mut row = Row::with_capacity(output.num_columns());
        row.extend_from(&self.left[row_left]);
        row.extend_from(&self.right[row_right]);
        if self.join.include_distance {
            row.push(Value::integer(distance));
        }
        output.push_row(row)
    }
}
