// Copyright 2024 The Smartlog Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Tracks commit rewrites across factual refreshes.
//!
//! When the engine rewrites a commit (amend, rebase, split), the old hash
//! disappears and a new one takes its place. The tracker records those
//! `old -> new` identity edges by diffing consecutive factual snapshots, so
//! that a queued command which named a commit before it was rewritten can be
//! re-resolved to the identity that now represents "the same logical
//! commit".

use std::collections::{HashMap, HashSet};
use std::iter;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::commit::{CommitId, CommitRecord};
use crate::dag::CommitDag;

/// Successor map from an old commit identity to its newest known
/// replacement.
///
/// "No rewrite happened" and "rewrite not yet observed" are
/// indistinguishable; both resolve to the queried hash itself, which is the
/// safe default.
#[derive(Clone, Debug, Default)]
pub struct SuccessorTracker {
    /// Old hash to its immediate successor.
    edges: HashMap<CommitId, CommitId>,
    /// Old hash to the end of its successor chain. Rebuilt whenever edges
    /// change, so lookups never re-walk chains.
    resolved: HashMap<CommitId, CommitId>,
}

impl SuccessorTracker {
    pub fn new() -> Self {
        SuccessorTracker::default()
    }

    /// Number of known rewrite edges.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Whether no rewrite has been observed yet.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Compares the previous factual graph against a freshly fetched commit
    /// list and records every rewrite the refresh reveals: a hash that
    /// disappeared while a new commit declares it as a closest predecessor,
    /// and every explicit `successorInfo` edge.
    pub fn observe_fetch(&mut self, prev: &CommitDag, fresh: &[Arc<CommitRecord>]) {
        let fresh_hashes: HashSet<&CommitId> = fresh.iter().map(|record| &record.hash).collect();
        let mut changed = false;
        for record in fresh {
            for predecessor in &record.closest_predecessors {
                if prev.contains(predecessor) && !fresh_hashes.contains(predecessor) {
                    changed |= self.record(predecessor.clone(), record.hash.clone());
                }
            }
            if let Some(info) = &record.successor_info {
                changed |= self.record(record.hash.clone(), info.hash.clone());
            }
        }
        if changed {
            self.rebuild_resolved();
            debug!(edges = self.edges.len(), "successor map updated");
        }
    }

    /// Records `old -> new`, refusing self-edges and edges that would close
    /// a cycle. A cycle cannot come from well-formed engine output; if one
    /// shows up the edge is dropped and resolution falls back to identity.
    fn record(&mut self, old: CommitId, new: CommitId) -> bool {
        if old == new {
            return false;
        }
        if self.edges.get(&old) == Some(&new) {
            return false;
        }
        if self.reaches(&new, &old) {
            warn!(%old, %new, "discarding successor edge that would form a cycle");
            return false;
        }
        self.edges.insert(old, new);
        true
    }

    /// Whether `to` is reachable from `from` through recorded edges.
    fn reaches(&self, from: &CommitId, to: &CommitId) -> bool {
        let mut visited = HashSet::new();
        let mut current = from;
        loop {
            if current == to {
                return true;
            }
            if !visited.insert(current.clone()) {
                return false;
            }
            match self.edges.get(current) {
                Some(next) => current = next,
                None => return false,
            }
        }
    }

    fn rebuild_resolved(&mut self) {
        self.resolved.clear();
        for start in self.edges.keys() {
            if self.resolved.contains_key(start) {
                continue;
            }
            // Walk the chain once and memoize the fixpoint for every hash
            // on it. The visited set keeps a malformed map from looping;
            // such chains resolve to the last hash before the repeat.
            let mut chain = vec![];
            let mut seen = HashSet::new();
            let mut current = start.clone();
            let end = loop {
                if let Some(end) = self.resolved.get(&current) {
                    break end.clone();
                }
                if !seen.insert(current.clone()) {
                    break current;
                }
                chain.push(current.clone());
                match self.edges.get(&current) {
                    Some(next) => current = next.clone(),
                    None => break current,
                }
            };
            for hash in chain {
                self.resolved.insert(hash, end.clone());
            }
        }
    }

    /// The newest known identity for `hash`: the fixpoint of the successor
    /// chain, or `hash` itself when no rewrite has been observed.
    pub fn latest_successor(&self, hash: &CommitId) -> CommitId {
        self.resolved.get(hash).cloned().unwrap_or_else(|| hash.clone())
    }

    /// Whether a rewrite of `hash` has been observed.
    pub fn has_successor(&self, hash: &CommitId) -> bool {
        self.edges.contains_key(hash)
    }

    /// The chain from `hash` to its final identity, starting with `hash`
    /// itself. Finite even if the map is malformed.
    pub fn follow_successors<'a>(
        &'a self,
        hash: &CommitId,
    ) -> impl Iterator<Item = CommitId> + 'a {
        let mut visited = HashSet::new();
        let mut next = Some(hash.clone());
        iter::from_fn(move || {
            let current = next.take()?;
            if !visited.insert(current.clone()) {
                return None;
            }
            next = self.edges.get(&current).cloned();
            Some(current)
        })
    }
}
