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

//! The protocol every mutating command implements.
//!
//! An [`Operation`] is a value describing one engine command: how to invoke
//! it, and pure appliers predicting its effect on the commit graph and on
//! the uncommitted file list. The appliers never run the command; they only
//! shape what the UI shows before ground truth arrives.

#![allow(missing_docs)]

use std::fmt::Debug;

use thiserror::Error;

use crate::commit::CommitId;
use crate::dag::CommitDag;
use crate::queue::QueueEntryId;
use crate::revset::CommitRef;
use crate::successor::SuccessorTracker;
use crate::working_copy::ChangedFile;

/// One argument of an engine command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OpArg {
    /// A literal flag such as `-s`.
    Flag(&'static str),
    /// A literal value such as a commit message.
    Value(String),
    /// A commit reference, resolved at dispatch time.
    Rev(CommitRef),
}

impl OpArg {
    fn resolve(&self, successors: &SuccessorTracker) -> String {
        match self {
            OpArg::Flag(flag) => (*flag).to_owned(),
            OpArg::Value(value) => value.clone(),
            OpArg::Rev(rev) => rev.resolve(successors).to_string(),
        }
    }
}

/// A mutating engine command plus its preview appliers.
///
/// `preview_dag` is used before the command runs, while the user is still
/// choosing to run it (e.g. a drag hover). `optimistic_dag` is used after
/// the command has been dispatched, to predict the result until the next
/// factual fetch confirms it; it additionally chases successors of its
/// hash arguments and marks in-progress commits.
///
/// Both appliers must degrade gracefully: when a referenced hash no longer
/// resolves in the graph being folded over, they return the graph
/// unchanged. A stale-but-valid preview beats a crashed composition.
pub trait Operation: Debug {
    /// The engine subcommand, e.g. `"rebase"`.
    fn name(&self) -> &'static str;

    /// Arguments after the subcommand, unresolved.
    fn args(&self) -> Vec<OpArg>;

    /// Predicted graph while the user is still choosing to run this.
    fn preview_dag(&self, dag: &CommitDag) -> CommitDag;

    /// Predicted graph after dispatch, until the next factual fetch.
    fn optimistic_dag(&self, dag: &CommitDag, successors: &SuccessorTracker) -> CommitDag;

    /// Predicted uncommitted file list after dispatch. Most operations
    /// leave it alone.
    fn optimistic_changes(&self, files: &[ChangedFile]) -> Vec<ChangedFile> {
        files.to_vec()
    }
}

/// Whether two operations describe the same command with the same
/// arguments. Used to collapse a redundant re-preview into an already
/// queued or previewed instance.
pub fn same_operation(a: &dyn Operation, b: &dyn Operation) -> bool {
    a.name() == b.name() && a.args() == b.args()
}

/// A fully resolved command line, ready to hand to the process-execution
/// collaborator. Produced at exactly one point: when the queue dispatches
/// the entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedCommand {
    /// The queue entry this command belongs to; exit events are routed
    /// back by this id.
    pub entry: QueueEntryId,
    /// Subcommand followed by resolved arguments.
    pub args: Vec<String>,
}

/// Resolves an operation into concrete command-line arguments. Succeedable
/// references pick up the latest successor known right now.
pub fn prepare_args(operation: &dyn Operation, successors: &SuccessorTracker) -> Vec<String> {
    let mut args = vec![operation.name().to_owned()];
    args.extend(operation.args().iter().map(|arg| arg.resolve(successors)));
    args
}

/// The process-execution collaborator. The model only requests spawns;
/// progress and exit come back through the queue's notify methods.
pub trait CommandDispatcher {
    /// Requests that `command` be spawned. Must not block.
    fn dispatch(&mut self, command: &PreparedCommand);
}

/// Rejection reasons for illegally constructed operations. Raised
/// synchronously at construction, never after enqueue.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OperationError {
    #[error("no commit {0} in the loaded graph")]
    UnknownCommit(CommitId),
    #[error("commit {0} is public and cannot be rewritten")]
    ImmutableCommit(CommitId),
    #[error("cannot rebase {commit} onto itself")]
    RebaseOntoSelf {
        /// The commit being moved.
        commit: CommitId,
    },
    #[error("cannot rebase {commit} onto its own descendant {destination}")]
    RebaseOntoDescendant {
        /// The commit being moved.
        commit: CommitId,
        /// The illegal destination.
        destination: CommitId,
    },
    #[error("there is no working copy in the loaded graph")]
    NoWorkingCopy,
    #[error("a commit title is required")]
    EmptyTitle,
    #[error("another commit is already being dragged")]
    DragInProgress,
    #[error("no drag is in progress")]
    NoDragInProgress,
}
