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

//! The in-memory commit graph projection.
//!
//! A [`CommitDag`] is an immutable arena of commit records keyed by hash,
//! plus derived indices (children, heads, bookmarks) recomputed whenever
//! records are added or removed. "Mutation" produces a new dag sharing the
//! unchanged record allocations, so concurrent readers never observe a
//! half-updated graph.
//!
//! Lookups for unknown hashes return `None`/empty, never fail: commits
//! routinely reference hashes outside the loaded window and callers must
//! treat them as "not yet loaded".

#![allow(missing_docs)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use indexmap::IndexMap;
use smallvec::SmallVec;
use tracing::warn;

use crate::commit::{CommitId, CommitRecord, MillisSinceEpoch, Phase};
use crate::dag_walk;
use crate::object_id::{IdPrefix, PrefixResolution};
use crate::union_find::UnionFind;

/// Hash of the synthetic root inserted by [`CommitDag::force_connect`].
/// Deliberately not a valid engine hash.
pub const BOUNDARY_ROOT_HASH: &str = "(boundary)";

/// An immutable snapshot of the commit graph.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CommitDag {
    commits: IndexMap<CommitId, Arc<CommitRecord>>,
    children: HashMap<CommitId, SmallVec<[CommitId; 2]>>,
    bookmarks: HashMap<String, CommitId>,
    remote_bookmarks: HashMap<String, CommitId>,
    head: Option<CommitId>,
    /// Commits with no parents at all.
    roots: Vec<CommitId>,
    /// Commits with at least one parent outside the loaded window. Distinct
    /// from unknown hashes: these records are present, their parents are
    /// not.
    boundary: Vec<CommitId>,
}

impl CommitDag {
    /// An empty graph.
    pub fn new() -> Self {
        CommitDag::default()
    }

    /// Builds a graph from scratch out of the given records.
    pub fn from_records(records: impl IntoIterator<Item = Arc<CommitRecord>>) -> Self {
        let mut commits = IndexMap::new();
        for record in records {
            commits.insert(record.hash.clone(), record);
        }
        Self::derive_indices(commits)
    }

    /// Returns a new graph with `records` inserted, replacing any existing
    /// records with the same hash. Adding the same set twice yields a
    /// structurally equal graph.
    #[must_use]
    pub fn add(&self, records: impl IntoIterator<Item = Arc<CommitRecord>>) -> Self {
        let mut commits = self.commits.clone();
        for record in records {
            commits.insert(record.hash.clone(), record);
        }
        Self::derive_indices(commits)
    }

    /// Returns a new graph without the given hashes. Unknown hashes are
    /// ignored.
    #[must_use]
    pub fn remove(&self, hashes: &HashSet<CommitId>) -> Self {
        let commits = self
            .commits
            .iter()
            .filter(|(hash, _)| !hashes.contains(*hash))
            .map(|(hash, record)| (hash.clone(), record.clone()))
            .collect();
        Self::derive_indices(commits)
    }

    fn derive_indices(mut commits: IndexMap<CommitId, Arc<CommitRecord>>) -> Self {
        // The working copy's parent is unique. If the engine (or a preview
        // applier folding over stale data) reports several, the last one in
        // arena order wins.
        let head_ids: Vec<CommitId> = commits
            .values()
            .filter(|record| record.is_head)
            .map(|record| record.hash.clone())
            .collect();
        let head = head_ids.last().cloned();
        if head_ids.len() > 1 {
            warn!(
                heads = head_ids.len(),
                "multiple working-copy parents reported, keeping the last"
            );
            for stale in &head_ids[..head_ids.len() - 1] {
                let record = commits[stale].with_head(false);
                commits.insert(stale.clone(), Arc::new(record));
            }
        }

        let mut children: HashMap<CommitId, SmallVec<[CommitId; 2]>> = HashMap::new();
        let mut bookmarks = HashMap::new();
        let mut remote_bookmarks = HashMap::new();
        let mut roots = vec![];
        let mut boundary = vec![];
        for (hash, record) in &commits {
            let mut present_parents = 0;
            for parent in &record.parents {
                if commits.contains_key(parent) {
                    children.entry(parent.clone()).or_default().push(hash.clone());
                    present_parents += 1;
                }
            }
            if record.parents.is_empty() {
                roots.push(hash.clone());
            } else if present_parents < record.parents.len() {
                boundary.push(hash.clone());
            }
            for bookmark in &record.bookmarks {
                bookmarks.insert(bookmark.clone(), hash.clone());
            }
            for bookmark in &record.remote_bookmarks {
                remote_bookmarks.insert(bookmark.clone(), hash.clone());
            }
        }

        CommitDag {
            commits,
            children,
            bookmarks,
            remote_bookmarks,
            head,
            roots,
            boundary,
        }
    }

    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    pub fn get(&self, hash: &CommitId) -> Option<&Arc<CommitRecord>> {
        self.commits.get(hash)
    }

    pub fn contains(&self, hash: &CommitId) -> bool {
        self.commits.contains_key(hash)
    }

    /// Records in arena (fetch feed) order.
    pub fn commits(&self) -> impl Iterator<Item = &Arc<CommitRecord>> {
        self.commits.values()
    }

    /// Parent hashes as recorded, including hashes outside the loaded
    /// window. Empty for unknown commits.
    pub fn parents(&self, hash: &CommitId) -> &[CommitId] {
        self.get(hash)
            .map(|record| record.parents.as_slice())
            .unwrap_or_default()
    }

    /// Children within the loaded window. Empty for unknown commits.
    pub fn children(&self, hash: &CommitId) -> &[CommitId] {
        self.children
            .get(hash)
            .map(|ids| ids.as_slice())
            .unwrap_or_default()
    }

    fn present_parents(&self, hash: &CommitId) -> Vec<CommitId> {
        self.parents(hash)
            .iter()
            .filter(|parent| self.contains(parent))
            .cloned()
            .collect()
    }

    /// The working copy's parent, if the loaded window contains one.
    pub fn head_commit(&self) -> Option<&Arc<CommitRecord>> {
        self.head.as_ref().and_then(|head| self.get(head))
    }

    /// Commits with no parents at all.
    pub fn roots(&self) -> &[CommitId] {
        &self.roots
    }

    /// Commits whose recorded parents are (partly) outside the loaded
    /// window.
    pub fn boundary_commits(&self) -> &[CommitId] {
        &self.boundary
    }

    /// Heads of the graph, or of the `within` subset: commits that are not
    /// an ancestor of any other commit under consideration.
    pub fn heads(&self, within: Option<&HashSet<CommitId>>) -> HashSet<CommitId> {
        match within {
            None => self
                .commits
                .keys()
                .filter(|hash| self.children(hash).is_empty())
                .cloned()
                .collect(),
            Some(subset) => dag_walk::heads(
                subset.iter().filter(|hash| self.contains(hash)).cloned(),
                |hash| hash.clone(),
                |hash| {
                    self.present_parents(hash)
                        .into_iter()
                        .filter(|parent| subset.contains(parent))
                        .collect::<Vec<_>>()
                },
            ),
        }
    }

    /// All commits reachable from `start` through parent edges, including
    /// `start` itself. Restricting to `within` bounds the traversal (e.g.
    /// "within drafts"). Unknown hashes yield the empty set.
    pub fn ancestors(
        &self,
        start: &CommitId,
        within: Option<&HashSet<CommitId>>,
    ) -> HashSet<CommitId> {
        self.reachable(start, within, |hash| self.present_parents(hash))
    }

    /// All commits reachable from `start` through child edges, including
    /// `start` itself.
    pub fn descendants(
        &self,
        start: &CommitId,
        within: Option<&HashSet<CommitId>>,
    ) -> HashSet<CommitId> {
        self.reachable(start, within, |hash| self.children(hash).to_vec())
    }

    fn reachable(
        &self,
        start: &CommitId,
        within: Option<&HashSet<CommitId>>,
        neighbors: impl Fn(&CommitId) -> Vec<CommitId>,
    ) -> HashSet<CommitId> {
        if !self.contains(start) || within.is_some_and(|subset| !subset.contains(start)) {
            return HashSet::new();
        }
        dag_walk::dfs(
            [start.clone()],
            |hash| hash.clone(),
            |hash| {
                neighbors(hash)
                    .into_iter()
                    .filter(|next| within.map_or(true, |subset| subset.contains(next)))
                    .collect::<Vec<_>>()
            },
        )
        .collect()
    }

    /// Whether `a` is an ancestor of (or equal to) `b`. Used to forbid
    /// illegal rebase destinations.
    pub fn is_ancestor(&self, a: &CommitId, b: &CommitId) -> bool {
        if !self.contains(a) || !self.contains(b) {
            return false;
        }
        let mut work = vec![a.clone()];
        let mut visited = HashSet::new();
        while let Some(hash) = work.pop() {
            if hash == *b {
                return true;
            }
            if visited.insert(hash.clone()) {
                work.extend(self.children(&hash).iter().cloned());
            }
        }
        false
    }

    /// The subset of draft commits.
    pub fn draft_commits(&self) -> HashSet<CommitId> {
        self.commits
            .values()
            .filter(|record| record.is_draft())
            .map(|record| record.hash.clone())
            .collect()
    }

    /// Resolves a bookmark name, `.` (the working copy's parent), a full
    /// hash, or an unambiguous hash prefix. Unknown symbols resolve to
    /// `None`.
    pub fn resolve(&self, symbol: &str) -> Option<&Arc<CommitRecord>> {
        if symbol == "." {
            return self.head_commit();
        }
        if let Some(hash) = self.bookmarks.get(symbol) {
            return self.get(hash);
        }
        if let Some(hash) = self.remote_bookmarks.get(symbol) {
            return self.get(hash);
        }
        let full = CommitId::from(symbol);
        if let Some(record) = self.get(&full) {
            return Some(record);
        }
        let prefix = IdPrefix::new(symbol);
        let mut resolution = PrefixResolution::NoMatch;
        for hash in self.commits.keys() {
            if prefix.matches(hash) {
                resolution = resolution.plus(&PrefixResolution::SingleMatch(hash.clone()));
            }
        }
        resolution.single().and_then(|hash| self.get(&hash))
    }

    /// Commit hashes in the order a renderer should lay them out: every
    /// commit after its children, ties broken by fetch feed order.
    pub fn render_order(&self) -> Vec<CommitId> {
        let heads: Vec<CommitId> = self
            .commits
            .keys()
            .filter(|hash| self.children(hash).is_empty())
            .cloned()
            .collect();
        dag_walk::topo_order_reverse(heads, |hash| hash.clone(), |hash| {
            self.present_parents(hash)
        })
    }

    /// Returns a new graph with the working-copy flag moved to `target`.
    /// Unknown targets leave the graph unchanged.
    #[must_use]
    pub fn with_head_at(&self, target: &CommitId) -> Self {
        let Some(new_head) = self.get(target) else {
            return self.clone();
        };
        if new_head.is_head {
            return self.clone();
        }
        let mut updated: Vec<Arc<CommitRecord>> = vec![];
        if let Some(old_head) = self.head_commit() {
            updated.push(Arc::new(old_head.with_head(false)));
        }
        updated.push(Arc::new(new_head.with_head(true)));
        self.add(updated)
    }

    /// Whether `hash` is the synthetic root inserted by `force_connect`.
    pub fn is_boundary_root(hash: &CommitId) -> bool {
        hash.as_str() == BOUNDARY_ROOT_HASH
    }

    /// When the fetched window does not include every commit's true
    /// ancestor, the graph falls apart into disconnected islands. This
    /// synthesizes a single shared boundary root adopting every parentless
    /// component so the graph stays a single tree for layout purposes.
    #[must_use]
    pub fn force_connect(&self) -> Self {
        if self.commits.len() <= 1 {
            return self.clone();
        }
        let mut components = UnionFind::new();
        for (hash, record) in &self.commits {
            components.find(hash);
            for parent in &record.parents {
                if self.contains(parent) {
                    components.union(hash, parent);
                }
            }
        }
        let distinct: HashSet<CommitId> = self
            .commits
            .keys()
            .map(|hash| components.find(hash))
            .collect();
        if distinct.len() <= 1 {
            return self.clone();
        }

        let boundary_root = Arc::new(CommitRecord {
            hash: CommitId::from(BOUNDARY_ROOT_HASH),
            parents: vec![],
            phase: Phase::Public,
            is_head: false,
            bookmarks: vec![],
            remote_bookmarks: vec![],
            successor_info: None,
            closest_predecessors: vec![],
            title: String::new(),
            description: String::new(),
            date: MillisSinceEpoch(0),
            diff_id: None,
            preview: None,
        });
        let mut records = vec![boundary_root.clone()];
        for (hash, record) in &self.commits {
            if self.present_parents(hash).is_empty() {
                records.push(Arc::new(
                    record.with_parents(vec![boundary_root.hash.clone()]),
                ));
            } else {
                records.push(record.clone());
            }
        }
        Self::from_records(records)
    }
}
