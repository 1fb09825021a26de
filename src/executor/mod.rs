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

//! Query execution for Tellus
//!
//! The operator interface, the spatial join node with its two
//! algorithms, the execution context, and the result cache.

pub mod cache;
pub mod context;
pub mod operator;
pub mod operators;
pub mod spatial_join;

pub use cache::ResultCache;
pub use context::{CancellationHandle, ExecutionContext, DEFAULT_MEMORY_LIMIT};
pub use operator::{Operator, ValuesOperator};
pub use spatial_join::{
    max_distance_predicate, parse_max_distance_predicate, SpatialJoin,
    SpatialJoinAlgorithm, DISTANCE_VARIABLE,
};
