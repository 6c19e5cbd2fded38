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
use crate::working_copy::ChangedFile;

/// Absorbs the uncommitted changes into a draft commit, optionally
/// replacing its message.
///
/// The real amend produces a new hash; the optimistic applier keeps the old
/// hash with an in-progress marker until the next factual fetch reports the
/// rewrite.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AmendOperation {
    target: CommitRef,
    message: Option<String>,
}

impl AmendOperation {
    pub fn new(
        dag: &CommitDag,
        target: CommitId,
        message: Option<String>,
    ) -> Result<Self, OperationError> {
        let record = dag
            .get(&target)
            .ok_or_else(|| OperationError::UnknownCommit(target.clone()))?;
        if record.is_public() {
            return Err(OperationError::ImmutableCommit(target));
        }
        if message.as_ref().is_some_and(|message| message.trim().is_empty()) {
            return Err(OperationError::EmptyTitle);
        }
        Ok(AmendOperation {
            target: CommitRef::succeedable(target),
            message,
        })
    }

    /// Amends the working copy's parent.
    pub fn for_head(dag: &CommitDag, message: Option<String>) -> Result<Self, OperationError> {
        let head = dag.head_commit().ok_or(OperationError::NoWorkingCopy)?;
        Self::new(dag, head.hash.clone(), message)
    }

    fn apply(&self, dag: &CommitDag, target: &CommitId, marker: Option<CommitPreview>) -> CommitDag {
        let Some(record) = dag.get(target) else {
            return dag.clone();
        };
        let mut amended = match &self.message {
            Some(message) => {
                let (title, description) = split_message(message);
                record.with_message(title, description)
            }
            None => (**record).clone(),
        };
        amended.preview = marker;
        dag.add([Arc::new(amended)])
    }
}

/// First line is the title, the rest is the description.
fn split_message(message: &str) -> (String, String) {
    match message.split_once('\n') {
        Some((title, description)) => (title.to_owned(), description.trim_start().to_owned()),
        None => (message.to_owned(), String::new()),
    }
}

impl Operation for AmendOperation {
    fn name(&self) -> &'static str {
        "amend"
    }

    fn args(&self) -> Vec<OpArg> {
        let mut args = vec![OpArg::Flag("--rev"), OpArg::Rev(self.target.clone())];
        if let Some(message) = &self.message {
            args.push(OpArg::Flag("-m"));
            args.push(OpArg::Value(message.clone()));
        }
        args
    }

    fn preview_dag(&self, dag: &CommitDag) -> CommitDag {
        self.apply(dag, self.target.target(), None)
    }

    fn optimistic_dag(&self, dag: &CommitDag, successors: &SuccessorTracker) -> CommitDag {
        self.apply(
            dag,
            &self.target.resolve(successors),
            Some(CommitPreview::Amending),
        )
    }

    /// The amended changes are no longer uncommitted.
    fn optimistic_changes(&self, _files: &[ChangedFile]) -> Vec<ChangedFile> {
        vec![]
    }
}
