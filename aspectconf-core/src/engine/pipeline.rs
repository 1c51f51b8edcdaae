//! Ordered interceptor lists

use super::context::{GetContext, InvokeContext, SetContext};
use super::Engine;
use crate::error::Result;
use std::sync::Arc;

/// Interceptor run on every `get`
pub type GetInterceptor = Arc<dyn Fn(&Engine, &mut GetContext) -> Result<()> + Send + Sync>;

/// Interceptor run on every `set`
pub type SetInterceptor = Arc<dyn Fn(&Engine, &mut SetContext) -> Result<()> + Send + Sync>;

/// Handler chained under a method name
pub type MethodHandler = Arc<dyn Fn(&Engine, &mut InvokeContext) -> Result<()> + Send + Sync>;

/// Conventional pipeline orders
pub mod order {
    /// Vetoes such as write protection
    pub const VETO: i32 = -1_000_000;
    /// Transaction buffering, ahead of the value store
    pub const TRANSACTION: i32 = -100_000;
    /// Immediately before the terminal store write
    pub const BEFORE_STORE: i32 = -1;
    /// The terminal get/set
    pub const TERMINAL: i32 = 0;
    /// Immediately after the terminal store write
    pub const AFTER_STORE: i32 = 1;
    /// Post-commit notifications
    pub const NOTIFY: i32 = 1_000_000;
}

/// An (order, action) pair
pub struct InterceptorEntry<F> {
    pub order: i32,
    pub action: F,
}

/// Interceptors sorted ascending by order, ties kept in registration order
pub struct Pipeline<F> {
    entries: Vec<InterceptorEntry<F>>,
}

impl<F: Clone> Pipeline<F> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn insert(&mut self, order: i32, action: F) {
        let index = self.entries.partition_point(|e| e.order <= order);
        self.entries.insert(index, InterceptorEntry { order, action });
    }

    /// Copy of the actions, so the pipeline can run without holding a lock
    pub fn snapshot(&self) -> Vec<F> {
        self.entries.iter().map(|e| e.action.clone()).collect()
    }

    pub fn orders(&self) -> Vec<i32> {
        self.entries.iter().map(|e| e.order).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<F: Clone> Default for Pipeline<F> {
    fn default() -> Self {
        Self::new()
    }
}
