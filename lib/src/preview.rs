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

//! Computes what the UI should show right now.
//!
//! Composition is a pure function of the factual graph, the ordered queue
//! snapshot, and the optional hover preview. It holds no state of its own,
//! so re-running it on every input change is idempotent and cannot
//! accumulate drift.

use crate::dag::CommitDag;
use crate::operation::Operation;
use crate::queue::OperationQueue;
use crate::successor::SuccessorTracker;
use crate::working_copy::ChangedFile;

/// Folds every predicting queue entry's optimistic applier over the factual
/// graph, strictly in queue order: entry *i* predicts on top of entries
/// `0..i`, so a second queued rebase previews on top of the first rebase's
/// predicted result, not the stale factual state. A hover preview, if any,
/// is applied last; it is the only layer that disappears on mere
/// mouse-leave without a server round-trip.
pub fn compose_displayed_dag(
    factual: &CommitDag,
    queue: &OperationQueue,
    hover: Option<&dyn Operation>,
    successors: &SuccessorTracker,
) -> CommitDag {
    let mut dag = factual.clone();
    for entry in queue.applying() {
        dag = entry.operation().optimistic_dag(&dag, successors);
    }
    if let Some(operation) = hover {
        // A hover equal to an already queued operation is redundant;
        // applying it twice would double-predict.
        if !queue.contains_equivalent(operation) {
            dag = operation.preview_dag(&dag);
        }
    }
    dag
}

/// The uncommitted-changes counterpart of [`compose_displayed_dag`].
pub fn compose_displayed_changes(
    factual: &[ChangedFile],
    queue: &OperationQueue,
) -> Vec<ChangedFile> {
    let mut files = factual.to_vec();
    for entry in queue.applying() {
        files = entry.operation().optimistic_changes(&files);
    }
    files
}
