//! Bounded recency cache of recently published candidates.
//!
//! Eviction is by insertion order. A repeated `remember` does not refresh an
//! entry's position, so this approximates LRU without being LRU.

use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};

use trend_models::{Candidate, CandidateKey};

#[derive(Debug, Default)]
struct DedupState {
    order: VecDeque<CandidateKey>,
    members: HashSet<CandidateKey>,
}

impl DedupState {
    fn insert(&mut self, key: CandidateKey, capacity: usize) {
        if self.members.contains(&key) {
            return;
        }
        self.members.insert(key.clone());
        self.order.push_back(key);
        while self.order.len() > capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.members.remove(&oldest);
            }
        }
    }

    fn clear(&mut self) {
        self.order.clear();
        self.members.clear();
    }
}

/// Outcome of [`DedupCache::select`].
#[derive(Debug, Clone)]
pub struct Selection {
    pub candidate: Candidate,
    /// True when every pool member had been seen and the cache was reset
    pub cache_cleared: bool,
}

/// Process-wide dedup cache shared by all concurrent pipeline runs.
///
/// Every read-modify-write happens under one mutex, so two runs can never
/// pick the same unseen candidate.
#[derive(Debug)]
pub struct DedupCache {
    capacity: usize,
    state: Mutex<DedupState>,
}

impl DedupCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::new(DedupState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, DedupState> {
        // The state is consistent after every statement, so a poisoned lock is still usable.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lock().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn seen(&self, key: &CandidateKey) -> bool {
        self.lock().members.contains(key)
    }

    /// Insert `key`, evicting the oldest-inserted entries past capacity.
    pub fn remember(&self, key: CandidateKey) {
        self.lock().insert(key, self.capacity);
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Copy of the current key set, handed to providers as a hint.
    pub fn snapshot(&self) -> HashSet<CandidateKey> {
        self.lock().members.clone()
    }

    /// Choose one candidate from `pool` and remember it.
    ///
    /// `pick` receives the unseen candidates in pool order and returns an
    /// index into them. If nothing in `pool` is unseen the cache is cleared
    /// and `pick` chooses from the whole pool. `None` only for an empty pool.
    pub fn select<F>(&self, pool: &[Candidate], pick: F) -> Option<Selection>
    where
        F: FnOnce(&[Candidate]) -> usize,
    {
        if pool.is_empty() {
            return None;
        }

        let mut state = self.lock();
        let mut choices: Vec<Candidate> = pool
            .iter()
            .filter(|c| !state.members.contains(&c.key()))
            .cloned()
            .collect();

        let cache_cleared = choices.is_empty();
        if cache_cleared {
            state.clear();
            choices = pool.to_vec();
        }

        let index = pick(&choices).min(choices.len() - 1);
        let candidate = choices.swap_remove(index);
        state.insert(candidate.key(), self.capacity);

        Some(Selection {
            candidate,
            cache_cleared,
        })
    }
}
