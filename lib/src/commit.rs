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

#![allow(missing_docs)]

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::dag::CommitDag;
use crate::object_id::id_type;

id_type!(
    /// A commit identity as reported by the engine, or a synthetic
    /// placeholder during an optimistic-preview window.
    pub CommitId
);

/// Milliseconds since the UNIX epoch, as reported by the engine.
#[derive(Debug, PartialEq, Eq, Clone, Copy, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MillisSinceEpoch(pub i64);

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Public,
    Draft,
}

/// Present on a commit that has been rewritten and is obsolete. The commit
/// may still appear transiently until the next factual refresh; renderers
/// must treat it as dead.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct SuccessorInfo {
    pub hash: CommitId,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Marker attached to a commit by a preview applier, never present on
/// engine-reported records.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum CommitPreview {
    /// Hover preview: shown at the location a pending rebase would move it
    /// to.
    RebaseTarget,
    /// Optimistic state: a dispatched rebase is moving this commit.
    Rebasing,
    /// Optimistic state: a dispatched amend is rewriting this commit.
    Amending,
}

/// One commit as last reported by the external engine. Created wholesale on
/// each fetch response; there is no field-level mutation. The whole set is
/// replaced per fetch, but records are structurally reused across fetches
/// (see [`reuse_fetched_records`]) so identity-based caching downstream is
/// not invalidated needlessly.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRecord {
    pub hash: CommitId,
    #[serde(default)]
    pub parents: Vec<CommitId>,
    pub phase: Phase,
    #[serde(default)]
    pub is_head: bool,
    #[serde(default)]
    pub bookmarks: Vec<String>,
    #[serde(default)]
    pub remote_bookmarks: Vec<String>,
    #[serde(default)]
    pub successor_info: Option<SuccessorInfo>,
    #[serde(default)]
    pub closest_predecessors: Vec<CommitId>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub date: MillisSinceEpoch,
    #[serde(default)]
    pub diff_id: Option<String>,
    /// Set only by preview appliers.
    #[serde(skip)]
    pub preview: Option<CommitPreview>,
}

impl CommitRecord {
    pub fn is_public(&self) -> bool {
        self.phase == Phase::Public
    }

    pub fn is_draft(&self) -> bool {
        self.phase == Phase::Draft
    }

    /// Whether the engine considers this commit rewritten and dead.
    pub fn is_obsolete(&self) -> bool {
        self.successor_info.is_some()
    }

    /// Copy of this record reparented onto `parents`.
    pub fn with_parents(&self, parents: Vec<CommitId>) -> CommitRecord {
        CommitRecord {
            parents,
            ..self.clone()
        }
    }

    /// Copy of this record carrying a preview marker.
    pub fn with_preview(&self, preview: CommitPreview) -> CommitRecord {
        CommitRecord {
            preview: Some(preview),
            ..self.clone()
        }
    }

    /// Copy of this record with the working-copy flag set or cleared.
    pub fn with_head(&self, is_head: bool) -> CommitRecord {
        CommitRecord {
            is_head,
            ..self.clone()
        }
    }

    /// Copy of this record with a replaced commit message.
    pub fn with_message(&self, title: String, description: String) -> CommitRecord {
        CommitRecord {
            title,
            description,
            ..self.clone()
        }
    }
}

/// Maps freshly fetched records onto the previous factual graph, reusing the
/// shared record allocation wherever a commit is structurally unchanged.
/// Downstream caches keyed on record identity then survive a no-op refresh.
pub fn reuse_fetched_records(
    prev: &CommitDag,
    fresh: Vec<CommitRecord>,
) -> Vec<Arc<CommitRecord>> {
    fresh
        .into_iter()
        .map(|record| match prev.get(&record.hash) {
            Some(old) if **old == record => old.clone(),
            _ => Arc::new(record),
        })
        .collect()
}
