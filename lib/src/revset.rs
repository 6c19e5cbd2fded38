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

//! Commit references carried by not-yet-run commands.
//!
//! A command built now may run much later, after earlier queued commands
//! have rewritten the commits it names. Instead of a raw hash, commands
//! therefore carry a [`CommitRef`] that says *how* to turn the name into a
//! hash, and resolution happens at exactly one point: just before dispatch.

use crate::commit::CommitId;
use crate::successor::SuccessorTracker;

/// Prefix of synthetic placeholder hashes used during the
/// optimistic-preview window. Engine hashes are hex, so the prefix can
/// never collide.
pub const OPTIMISTIC_PREFIX: &str = "OPTIMISTIC:";

impl CommitId {
    /// Whether this is a synthetic optimistic placeholder rather than an
    /// engine-reported hash.
    pub fn is_optimistic(&self) -> bool {
        self.as_str().starts_with(OPTIMISTIC_PREFIX)
    }
}

/// A reference to a commit, resolved to a concrete hash just before the
/// command naming it is dispatched.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CommitRef {
    /// Re-resolve to the latest successor at dispatch time. This is the
    /// default: a queued command whose target was rewritten by an earlier
    /// queued command picks up the new identity.
    Succeedable(CommitId),
    /// Use the literal hash even if now obsolete (the user explicitly
    /// chose an obsolete commit).
    Exact(CommitId),
    /// A synthetic placeholder standing in for a real reference during the
    /// optimistic-preview window.
    Optimistic {
        /// The placeholder hash shown while the prediction is pending.
        fake: CommitId,
        /// The reference the placeholder stands in for.
        real: Box<CommitRef>,
    },
}

impl CommitRef {
    /// A reference that follows rewrites.
    pub fn succeedable(hash: CommitId) -> Self {
        CommitRef::Succeedable(hash)
    }

    /// A reference pinned to the literal hash.
    pub fn exact(hash: CommitId) -> Self {
        CommitRef::Exact(hash)
    }

    /// Wraps `real` behind a deterministic placeholder hash.
    pub fn optimistic(real: CommitRef) -> Self {
        let fake = CommitId::new(format!("{OPTIMISTIC_PREFIX}{}", real.target()));
        CommitRef::Optimistic {
            fake,
            real: Box::new(real),
        }
    }

    /// The hash as written, before any successor chasing. Usable for
    /// display and validation against the graph the reference was created
    /// from.
    pub fn target(&self) -> &CommitId {
        match self {
            CommitRef::Succeedable(hash) => hash,
            CommitRef::Exact(hash) => hash,
            CommitRef::Optimistic { real, .. } => real.target(),
        }
    }

    /// Resolves to the concrete hash to put on the command line. Must be
    /// called only at dispatch time; resolving earlier would bake in a
    /// stale identity.
    pub fn resolve(&self, successors: &SuccessorTracker) -> CommitId {
        match self {
            CommitRef::Succeedable(hash) => successors.latest_successor(hash),
            CommitRef::Exact(hash) => hash.clone(),
            CommitRef::Optimistic { real, .. } => real.resolve(successors),
        }
    }
}
