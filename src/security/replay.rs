//! Replay Guard
//!
//! Set of accepted move hashes. Bounded: once full, the oldest hash is
//! evicted to make room, so a move older than `capacity` accepted moves is
//! no longer recognized as a replay.

use std::collections::{HashSet, VecDeque};

use crate::core::hash::Hash;

/// Bounded set of accepted move hashes, evicted oldest-first.
#[derive(Clone, Debug)]
pub struct ReplayGuard {
    capacity: usize,
    seen: HashSet<Hash>,
    order: VecDeque<Hash>,
}

impl ReplayGuard {
    /// Create a guard holding at most `capacity` hashes (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            seen: HashSet::new(),
            order: VecDeque::new(),
        }
    }

    /// Whether a hash has been accepted and not yet evicted.
    pub fn contains(&self, hash: &Hash) -> bool {
        self.seen.contains(hash)
    }

    /// Remember a hash. Returns false if it was already present.
    pub fn insert(&mut self, hash: Hash) -> bool {
        if !self.seen.insert(hash) {
            return false;
        }
        self.order.push_back(hash);

        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
        true
    }

    /// Number of remembered hashes.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether nothing is remembered.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Maximum number of remembered hashes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.seen.clear();
        self.order.clear();
    }
}
