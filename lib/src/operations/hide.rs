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

use crate::commit::CommitId;
use crate::dag::CommitDag;
use crate::operation::{OpArg, Operation, OperationError};
use crate::revset::CommitRef;
use crate::successor::SuccessorTracker;

/// Hides a draft commit and its descendants from the graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HideOperation {
    target: CommitRef,
}

impl HideOperation {
    pub fn new(dag: &CommitDag, target: CommitId) -> Result<Self, OperationError> {
        let record = dag
            .get(&target)
            .ok_or_else(|| OperationError::UnknownCommit(target.clone()))?;
        if record.is_public() {
            return Err(OperationError::ImmutableCommit(target));
        }
        Ok(HideOperation {
            target: CommitRef::succeedable(target),
        })
    }

    fn apply(&self, dag: &CommitDag, target: &CommitId) -> CommitDag {
        if !dag.contains(target) {
            return dag.clone();
        }
        let hidden = dag.descendants(target, None);
        let head_hidden = dag
            .head_commit()
            .is_some_and(|head| hidden.contains(&head.hash));
        let mut result = dag.remove(&hidden);
        if head_hidden {
            // The working copy was on the hidden stack; the engine parks it
            // on the hidden commit's surviving parent.
            if let Some(parent) = dag
                .parents(target)
                .iter()
                .find(|parent| result.contains(parent))
            {
                result = result.with_head_at(parent);
            }
        }
        result
    }
}

impl Operation for HideOperation {
    fn name(&self) -> &'static str {
        "hide"
    }

    fn args(&self) -> Vec<OpArg> {
        vec![OpArg::Flag("-r"), OpArg::Rev(self.target.clone())]
    }

    fn preview_dag(&self, dag: &CommitDag) -> CommitDag {
        self.apply(dag, self.target.target())
    }

    fn optimistic_dag(&self, dag: &CommitDag, successors: &SuccessorTracker) -> CommitDag {
        self.apply(dag, &self.target.resolve(successors))
    }
}
