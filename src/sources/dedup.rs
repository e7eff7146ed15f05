// Copyright 2026 Muvon Un Limited
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

use std::collections::HashSet;
use std::hash::Hash;

/// Keyed first-wins collector with a hard capacity.
///
/// Paginated analytics windows overlap at their edges, so the same
/// (keyword, url) row can arrive more than once. The first occurrence
/// wins; later duplicates and anything past the capacity are ignored.
pub struct DedupAccumulator<K, V> {
    seen: HashSet<K>,
    items: Vec<V>,
    capacity: usize,
}

impl<K: Eq + Hash, V> DedupAccumulator<K, V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            seen: HashSet::new(),
            items: Vec::new(),
            capacity,
        }
    }

    /// Insert unless the key was already seen or the accumulator is full.
    /// Returns whether the value was kept.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        if self.is_full() || !self.seen.insert(key) {
            return false;
        }
        self.items.push(value);
        true
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_items(self) -> Vec<V> {
        self.items
    }
}
