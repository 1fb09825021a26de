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

//! R-tree accelerated spatial join
//!
//! Builds a static R-tree over the points of the smaller input, then
//! probes it with the spherical bounding rectangles of every point of
//! the other input. Rectangle hits are only candidates; the exact
//! great-circle distance decides membership.

use geo_index::rtree::sort::HilbertSort;
use geo_index::rtree::{RTreeBuilder, RTreeIndex};
use geo_types::Coord;

use crate::core::{Result, Table};
use crate::executor::spatial_join::JoinSides;
use crate::geo::bounding_rectangles;

/// R-tree node capacity.
const NODE_SIZE: u16 = 16;

/// Compute the join through the bounding-rectangle index.
pub(crate) fn compute(sides: &JoinSides<'_>) -> Result<Table> {
    // Index the smaller side; ties keep the left side as build side.
    let left_is_build = sides.left.num_rows() <= sides.right.num_rows();
    let (build, build_col, probe, probe_col) = if left_is_build {
        (&sides.left, sides.left_col, &sides.right, sides.right_col)
    } else {
        (&sides.right, sides.right_col, &sides.left, sides.left_col)
    };

    // Points are parsed once up front; a malformed cell aborts the join
    // before any index work happens.
    let mut build_points = Vec::with_capacity(build.num_rows());
    for row in 0..build.num_rows() {
        build_points.push(sides.point(build, row, build_col)?);
    }

    let mut builder =
        RTreeBuilder::<f64>::new_with_node_size(build.num_rows() as u32, NODE_SIZE);
    for &(lon, lat) in &build_points {
        builder.add(lon, lat, lon, lat);
    }
    // Data indices assigned by `add` are sequential, so a search hit maps
    // straight back to the build row.
    let rtree = builder.finish::<HilbertSort>();

    let mut output = sides.new_output();
    let max_dist = sides.max_dist();
    let mut candidates: Vec<u32> = Vec::new();

    for probe_row in 0..probe.num_rows() {
        sides.cancellation().check()?;
        let (lon, lat) = sides.point(probe, probe_row, probe_col)?;
        let rects = bounding_rectangles(Coord { x: lon, y: lat }, max_dist);

        candidates.clear();
        for rect in &rects {
            candidates.extend(rtree.search(
                rect.min().x,
                rect.min().y,
                rect.max().x,
                rect.max().y,
            ));
        }
        // A pair of wrapped rectangles shares no interior, but hits on the
        // shared boundary would arrive twice.
        candidates.sort_unstable();
        candidates.dedup();

        for &build_row in &candidates {
            let (row_left, row_right) = if left_is_build {
                (build_row as usize, probe_row)
            } else {
                (probe_row, build_row as usize)
            };
            let distance = sides.distance_between(row_left, row_right)?;
            if distance <= max_dist {
                sides.append_joined_row(&mut output, row_left, row_right, distance)?;
            }
        }
    }
    Ok(output)
}
