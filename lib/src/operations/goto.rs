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

/// Moves the working copy onto another commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GotoOperation {
    destination: CommitRef,
}

impl GotoOperation {
    pub fn new(dag: &CommitDag, destination: CommitId) -> Result<Self, OperationError> {
        if !dag.contains(&destination) {
            return Err(OperationError::UnknownCommit(destination));
        }
        Ok(GotoOperation {
            destination: CommitRef::succeedable(destination),
        })
    }
}

impl Operation for GotoOperation {
    fn name(&self) -> &'static str {
        "goto"
    }

    fn args(&self) -> Vec<OpArg> {
        vec![OpArg::Rev(self.destination.clone())]
    }

    fn preview_dag(&self, dag: &CommitDag) -> CommitDag {
        dag.with_head_at(self.destination.target())
    }

    fn optimistic_dag(&self, dag: &CommitDag, successors: &SuccessorTracker) -> CommitDag {
        dag.with_head_at(&self.destination.resolve(successors))
    }
}
