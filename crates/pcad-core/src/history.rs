//! Undo/redo history
//!
//! Snapshots are shared through `Arc`, so pushing or stepping the history
//! never copies a document and never touches one that was already recorded.

use std::sync::Arc;

/// Past, present and future snapshots of a value
#[derive(Debug)]
pub struct History<T> {
    past: Vec<Arc<T>>,
    present: Arc<T>,
    /// Next redo is the last element
    future: Vec<Arc<T>>,
    /// Maximum number of past snapshots (None = unbounded)
    limit: Option<usize>,
}

impl<T> Clone for History<T> {
    fn clone(&self) -> Self {
        Self {
            past: self.past.clone(),
            present: Arc::clone(&self.present),
            future: self.future.clone(),
            limit: self.limit,
        }
    }
}

impl<T> History<T> {
    /// Start a history with no past or future
    pub fn new(present: T) -> Self {
        Self {
            past: Vec::new(),
            present: Arc::new(present),
            future: Vec::new(),
            limit: None,
        }
    }

    /// Cap the number of past snapshots, dropping the oldest
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self.trim();
        self
    }

    fn trim(&mut self) {
        if let Some(limit) = self.limit
            && self.past.len() > limit
        {
            let excess = self.past.len() - limit;
            self.past.drain(..excess);
        }
    }

    pub fn present(&self) -> &T {
        &self.present
    }

    pub fn present_arc(&self) -> Arc<T> {
        Arc::clone(&self.present)
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn past_len(&self) -> usize {
        self.past.len()
    }

    pub fn future_len(&self) -> usize {
        self.future.len()
    }

    /// Record a new present. The redo branch is discarded.
    pub fn push(&self, value: T) -> Self {
        let mut past = self.past.clone();
        past.push(Arc::clone(&self.present));
        let mut next = Self {
            past,
            present: Arc::new(value),
            future: Vec::new(),
            limit: self.limit,
        };
        next.trim();
        next
    }

    /// Step back one snapshot, unchanged if there is no past
    pub fn undo(&self) -> Self {
        let mut next = self.clone();
        if let Some(previous) = next.past.pop() {
            let current = std::mem::replace(&mut next.present, previous);
            next.future.push(current);
        }
        next
    }

    /// Step forward one snapshot, unchanged if there is no future
    pub fn redo(&self) -> Self {
        let mut next = self.clone();
        if let Some(following) = next.future.pop() {
            let current = std::mem::replace(&mut next.present, following);
            next.past.push(current);
        }
        next
    }
}
