//! Episodic memory: stored exchanges and nearest-neighbour recall.
//!
//! Recall is a linear scan by cosine similarity between feature vectors. That
//! is fine for a session of a few thousand exchanges; beyond that an indexed
//! similarity structure should replace the scan.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::features::FeatureVector;

/// Response used when nothing can be recalled.
pub const DEFAULT_RECALL_FALLBACK: &str = "I'm pausing to reflect. The path is unclear.";

/// One accepted exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub prompt: String,
    pub response: String,
    pub features: FeatureVector,
    /// Milliseconds since the UNIX epoch.
    pub timestamp: u64,
}

/// The best match found by [`EpisodicMemory::recall`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Recollection<'a> {
    pub entry: &'a MemoryEntry,
    pub similarity: f64,
}

/// Append-only store of exchanges, optionally capped (oldest evicted first).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EpisodicMemory {
    entries: VecDeque<MemoryEntry>,
    capacity: Option<usize>,
}

impl EpisodicMemory {
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
        }
    }

    pub fn remember(&mut self, entry: MemoryEntry) {
        self.entries.push_back(entry);
        self.evict();
    }

    /// Change the cap, dropping the oldest entries that no longer fit.
    pub fn set_capacity(&mut self, capacity: Option<usize>) {
        self.capacity = capacity;
        self.evict();
    }

    fn evict(&mut self) {
        if let Some(cap) = self.capacity {
            while self.entries.len() > cap {
                self.entries.pop_front();
            }
        }
    }

    /// Most similar stored exchange. Entries whose vector dimension differs
    /// from the query are skipped; ties go to the older entry.
    pub fn recall(&self, query: &FeatureVector) -> Option<Recollection<'_>> {
        let mut best: Option<Recollection<'_>> = None;
        for entry in &self.entries {
            let Some(similarity) = query.cosine_similarity(&entry.features) else {
                continue;
            };
            if best.is_none_or(|b| similarity > b.similarity) {
                best = Some(Recollection { entry, similarity });
            }
        }
        best
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &MemoryEntry> {
        self.entries.iter()
    }
}
