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

//! Query variables and the variable-to-column mapping
//!
//! Operators describe their output schema as a map from variable name to
//! column index plus definedness. Insertion order carries no meaning; the
//! map is canonicalized by column index when composed across operators.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::error::{Error, Result};

/// A named column placeholder from the query language, e.g. `?city`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Variable(Arc<str>);

impl Variable {
    /// Create a variable from its query-language spelling (`?name`)
    pub fn new(name: impl Into<String>) -> Self {
        Self(Arc::from(name.into().as_str()))
    }

    /// The variable's spelling, including the leading `?`
    #[inline]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Variable {
    fn from(name: &str) -> Self {
        Variable::new(name)
    }
}

/// Whether a column is guaranteed to hold a value in every row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Definedness {
    /// Every row holds a value in this column
    AlwaysDefined,
    /// Some rows may leave this column unbound
    PossiblyUndefined,
}

/// Column index and definedness for one variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableColumn {
    /// Zero-based column index in the operator's output
    pub column: usize,
    /// Definedness of the column
    pub definedness: Definedness,
}

impl VariableColumn {
    /// A column that is defined in every row
    pub fn always_defined(column: usize) -> Self {
        Self {
            column,
            definedness: Definedness::AlwaysDefined,
        }
    }

    /// A column that may be unbound in some rows
    pub fn possibly_undefined(column: usize) -> Self {
        Self {
            column,
            definedness: Definedness::PossiblyUndefined,
        }
    }
}

/// Mapping from variable to output column
///
/// Keys are unique; inserting a variable twice is an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableMap {
    inner: FxHashMap<Variable, VariableColumn>,
}

impl VariableMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a variable, failing if it is already present
    pub fn insert(&mut self, variable: Variable, column: VariableColumn) -> Result<()> {
        if self.inner.contains_key(&variable) {
            return Err(Error::DuplicateVariable(variable.name().to_string()));
        }
        self.inner.insert(variable, column);
        Ok(())
    }

    /// Insert or replace a variable
    ///
    /// Used when composing maps of child operators, where the composition
    /// rules already guarantee distinct keys.
    pub fn set(&mut self, variable: Variable, column: VariableColumn) {
        self.inner.insert(variable, column);
    }

    /// Look up a variable
    #[inline]
    pub fn get(&self, variable: &Variable) -> Option<&VariableColumn> {
        self.inner.get(variable)
    }

    /// Check whether a variable is present
    #[inline]
    pub fn contains(&self, variable: &Variable) -> bool {
        self.inner.contains_key(variable)
    }

    /// Number of variables
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Check whether the map is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterate in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = (&Variable, &VariableColumn)> {
        self.inner.iter()
    }

    /// Entries sorted by column index, the canonical order for composition
    pub fn sorted_by_column(&self) -> Vec<(Variable, VariableColumn)> {
        let mut entries: Vec<_> = self
            .inner
            .iter()
            .map(|(v, c)| (v.clone(), *c))
            .collect();
        entries.sort_by_key(|(_, c)| c.column);
        entries
    }
}
