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

//! Core types for Tellus
//!
//! Values, rows, the memory-accounted table, query variables, and the
//! crate-wide error type.

pub mod error;
pub mod row;
pub mod table;
pub mod value;
pub mod variable;

pub use error::{Error, Result};
pub use row::Row;
pub use table::{MemoryTracker, Table};
pub use value::Value;
pub use variable::{Definedness, Variable, VariableColumn, VariableMap};
