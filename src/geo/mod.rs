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

//! Geometry kernel for Tellus
//!
//! WKT point extraction, great-circle distance, and the spherical
//! bounding rectangles that drive the R-tree join.

pub mod bbox;
pub mod distance;
pub mod wkt;

pub use bbox::{bounding_rectangles, covered_by, BoundingRects};
pub use distance::{distance_meters, great_circle_distance_km};
pub use wkt::{parse_wkt_point, text_between_quotes};
