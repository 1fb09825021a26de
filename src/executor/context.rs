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

//! Execution context: memory accounting and cooperative cancellation
//!
//! One context is shared by all operators of a query. Cancellation is
//! cooperative; the join algorithms poll the handle once per outer loop
//! iteration and abandon their partial output when it fires.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::core::{Error, MemoryTracker, Result};

/// Default memory limit for intermediate results, in bytes.
pub const DEFAULT_MEMORY_LIMIT: usize = 100_000_000;

/// Handle for cancelling a query from another thread
#[derive(Debug, Clone, Default)]
pub struct CancellationHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancellationHandle {
    /// Create a fresh, uncancelled handle
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Check if cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Fail with [`Error::QueryCancelled`] if cancellation was requested
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::QueryCancelled)
        } else {
            Ok(())
        }
    }
}

/// Shared state for one query execution
#[derive(Debug)]
pub struct ExecutionContext {
    memory: Arc<MemoryTracker>,
    cancellation: CancellationHandle,
}

impl ExecutionContext {
    /// Create a context with the default memory limit
    pub fn new() -> Self {
        Self::with_memory_limit(DEFAULT_MEMORY_LIMIT)
    }

    /// Create a context with an explicit memory limit in bytes
    pub fn with_memory_limit(limit: usize) -> Self {
        Self {
            memory: Arc::new(MemoryTracker::new(limit)),
            cancellation: CancellationHandle::new(),
        }
    }

    /// The memory tracker intermediate tables reserve from
    #[inline]
    pub fn memory(&self) -> &Arc<MemoryTracker> {
        &self.memory
    }

    /// The cancellation handle polled by the join algorithms
    #[inline]
    pub fn cancellation(&self) -> &CancellationHandle {
        &self.cancellation
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}
