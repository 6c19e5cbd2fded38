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

use std::sync::Arc;

use crate::commit::{CommitId, CommitPreview};
use crate::dag::CommitDag;
use crate::operation::{OpArg, Operation, OperationError};
use crate::revset::CommitRef;
use crate::successor::SuccessorTracker;

/// Moves a draft commit (and implicitly its descendants) onto a new parent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RebaseOperation {
    source: CommitRef,
    destination: CommitRef,
}

impl RebaseOperation {
    /// Validates the move against `dag` and builds the operation with
    /// succeedable references, so that dispatch after earlier rewrites
    /// targets the surviving identities.
    pub fn new(
        dag: &CommitDag,
        source: CommitId,
        destination: CommitId,
    ) -> Result<Self, OperationError> {
        let record = dag
            .get(&source)
            .ok_or_else(|| OperationError::UnknownCommit(source.clone()))?;
        if record.is_public() {
            return Err(OperationError::ImmutableCommit(source));
        }
        if !dag.contains(&destination) {
            return Err(OperationError::UnknownCommit(destination));
        }
        if source == destination {
            return Err(OperationError::RebaseOntoSelf { commit: source });
        }
        if dag.is_ancestor(&source, &destination) {
            return Err(OperationError::RebaseOntoDescendant {
                commit: source,
                destination,
            });
        }
        Ok(RebaseOperation {
            source: CommitRef::succeedable(source),
            destination: CommitRef::succeedable(destination),
        })
    }

    /// Builds the operation from pre-validated references.
    pub fn from_refs(source: CommitRef, destination: CommitRef) -> Self {
        RebaseOperation {
            source,
            destination,
        }
    }

    fn apply(
        &self,
        dag: &CommitDag,
        source: &CommitId,
        destination: &CommitId,
        marker: CommitPreview,
    ) -> CommitDag {
        let Some(record) = dag.get(source) else {
            return dag.clone();
        };
        if !dag.contains(destination) || source == destination {
            return dag.clone();
        }
        // An earlier optimistic step may have rearranged the graph under
        // us; a move that became illegal degrades to "leave it where it
        // was" rather than producing a cyclic graph.
        if dag.is_ancestor(source, destination) {
            return dag.clone();
        }
        let mut moved = record.with_parents(vec![destination.clone()]);
        moved.preview = Some(marker);
        dag.add([Arc::new(moved)])
    }
}

impl Operation for RebaseOperation {
    fn name(&self) -> &'static str {
        "rebase"
    }

    fn args(&self) -> Vec<OpArg> {
        vec![
            OpArg::Flag("-s"),
            OpArg::Rev(self.source.clone()),
            OpArg::Flag("-d"),
            OpArg::Rev(self.destination.clone()),
        ]
    }

    fn preview_dag(&self, dag: &CommitDag) -> CommitDag {
        self.apply(
            dag,
            self.source.target(),
            self.destination.target(),
            CommitPreview::RebaseTarget,
        )
    }

    fn optimistic_dag(&self, dag: &CommitDag, successors: &SuccessorTracker) -> CommitDag {
        self.apply(
            dag,
            &self.source.resolve(successors),
            &self.destination.resolve(successors),
            CommitPreview::Rebasing,
        )
    }
}
