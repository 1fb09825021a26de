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

//! Baseline spatial join: cross product with a distance filter
//!
//! O(n*m) over the two materialized inputs. Kept as the reference
//! algorithm the R-tree variant must agree with, and as the fallback the
//! planner can select for tiny inputs.

use crate::core::{Result, Table};
use crate::executor::spatial_join::JoinSides;

/// Compute the join as a filtered cross product.
pub(crate) fn compute(sides: &JoinSides<'_>) -> Result<Table> {
    let mut output = sides.new_output();
    let max_dist = sides.max_dist();

    for row_left in 0..sides.left.num_rows() {
        sides.cancellation().check()?;
        for row_right in 0..sides.right.num_rows() {
            let distance = sides.distance_between(row_left, row_right)?;
            if distance <= max_dist {
                sides.append_joined_row(&mut output, row_left, row_right, distance)?;
            }
        }
    }
    Ok(output)
}
