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

//! Result cache keyed on operator cache keys
//!
//! Operators with equal cache keys produce semantically equal results,
//! so a computed table can be served to every plan node sharing the key.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::core::{Result, Table};
use crate::executor::operator::Operator;

/// Cache of computed operator results
#[derive(Default)]
pub struct ResultCache {
    inner: RwLock<FxHashMap<String, Arc<Table>>>,
}

impl ResultCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a result by cache key
    pub fn get(&self, key: &str) -> Option<Arc<Table>> {
        self.inner.read().get(key).cloned()
    }

    /// Store a result under a cache key
    pub fn insert(&self, key: String, table: Arc<Table>) {
        self.inner.write().insert(key, table);
    }

    /// Number of cached results
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Check whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Drop all cached results
    pub fn clear(&self) {
        self.inner.write().clear();
    }

    /// Serve `operator`'s result from the cache, computing and storing it
    /// on a miss. Errors are not cached.
    pub fn get_or_compute(&self, operator: &dyn Operator) -> Result<Arc<Table>> {
        let key = operator.cache_key();
        if let Some(table) = self.get(&key) {
            return Ok(table);
        }
        let table = operator.result()?;
        self.insert(key, Arc::clone(&table));
        Ok(table)
    }
}
