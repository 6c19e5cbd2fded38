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

use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use itertools::Itertools as _;
use smartlog_lib::commit::{
    CommitId, CommitRecord, MillisSinceEpoch, Phase, SuccessorInfo,
};
use smartlog_lib::dag::CommitDag;
use smartlog_lib::operation::{
    CommandDispatcher, OpArg, Operation, PreparedCommand,
};
use smartlog_lib::successor::SuccessorTracker;

/// Builder for one engine-reported commit record.
pub struct CommitRecordBuilder {
    record: CommitRecord,
}

impl CommitRecordBuilder {
    pub fn new(hash: &str) -> Self {
        CommitRecordBuilder {
            record: CommitRecord {
                hash: CommitId::from(hash),
                parents: vec![],
                phase: Phase::Draft,
                is_head: false,
                bookmarks: vec![],
                remote_bookmarks: vec![],
                successor_info: None,
                closest_predecessors: vec![],
                title: format!("commit {hash}"),
                description: String::new(),
                date: MillisSinceEpoch(1_700_000_000_000),
                diff_id: None,
                preview: None,
            },
        }
    }

    pub fn parents(mut self, parents: &[&str]) -> Self {
        self.record.parents = parents.iter().map(|hash| CommitId::from(*hash)).collect();
        self
    }

    pub fn public(mut self) -> Self {
        self.record.phase = Phase::Public;
        self
    }

    pub fn head(mut self) -> Self {
        self.record.is_head = true;
        self
    }

    pub fn bookmark(mut self, name: &str) -> Self {
        self.record.bookmarks.push(name.to_owned());
        self
    }

    pub fn remote_bookmark(mut self, name: &str) -> Self {
        self.record.remote_bookmarks.push(name.to_owned());
        self
    }

    pub fn title(mut self, title: &str) -> Self {
        self.record.title = title.to_owned();
        self
    }

    pub fn successor(mut self, hash: &str, kind: &str) -> Self {
        self.record.successor_info = Some(SuccessorInfo {
            hash: CommitId::from(hash),
            kind: kind.to_owned(),
        });
        self
    }

    pub fn predecessors(mut self, predecessors: &[&str]) -> Self {
        self.record.closest_predecessors = predecessors
            .iter()
            .map(|hash| CommitId::from(*hash))
            .collect();
        self
    }

    pub fn build(self) -> CommitRecord {
        self.record
    }
}

/// A draft commit with the given parents.
pub fn draft_commit(hash: &str, parents: &[&str]) -> CommitRecord {
    CommitRecordBuilder::new(hash).parents(parents).build()
}

/// A public commit with the given parents.
pub fn public_commit(hash: &str, parents: &[&str]) -> CommitRecord {
    CommitRecordBuilder::new(hash).parents(parents).public().build()
}

/// The standard test graph:
///
/// ```text
///  o D (working copy)
///  o B   o C
///   \   /
///    o A (public)
/// ```
pub fn sibling_graph() -> Vec<CommitRecord> {
    vec![
        public_commit("aaa", &[]),
        draft_commit("bbb", &["aaa"]),
        draft_commit("ccc", &["aaa"]),
        CommitRecordBuilder::new("ddd").parents(&["bbb"]).head().build(),
    ]
}

/// Hashes of a dag's commits in render order, for terse shape assertions.
pub fn shape(dag: &CommitDag) -> Vec<(String, Vec<String>)> {
    dag.render_order()
        .iter()
        .map(|hash| {
            let parents = dag
                .parents(hash)
                .iter()
                .map(|parent| parent.as_str().to_owned())
                .collect_vec();
            (hash.as_str().to_owned(), parents)
        })
        .collect_vec()
}

/// Shared log of every command a [`RecordingDispatcher`] was asked to
/// spawn.
#[derive(Clone, Default)]
pub struct CommandLog {
    commands: Rc<RefCell<Vec<PreparedCommand>>>,
}

impl CommandLog {
    pub fn commands(&self) -> Vec<PreparedCommand> {
        self.commands.borrow().clone()
    }

    pub fn args(&self) -> Vec<Vec<String>> {
        self.commands
            .borrow()
            .iter()
            .map(|command| command.args.clone())
            .collect_vec()
    }

    pub fn len(&self) -> usize {
        self.commands.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.borrow().is_empty()
    }
}

/// A dispatcher that records spawn requests instead of spawning anything.
pub struct RecordingDispatcher {
    log: CommandLog,
}

/// Builds a [`RecordingDispatcher`] and the log handle to inspect it
/// through.
pub fn recording_dispatcher() -> (Box<dyn CommandDispatcher>, CommandLog) {
    let log = CommandLog::default();
    let dispatcher = RecordingDispatcher { log: log.clone() };
    (Box::new(dispatcher), log)
}

impl CommandDispatcher for RecordingDispatcher {
    fn dispatch(&mut self, command: &PreparedCommand) {
        self.log.commands.borrow_mut().push(command.clone());
    }
}

/// An operation with configurable arguments and identity appliers, for
/// exercising the queue without graph semantics.
#[derive(Debug)]
pub struct StubOperation {
    name: &'static str,
    args: Vec<OpArg>,
}

impl StubOperation {
    pub fn new(name: &'static str, args: Vec<OpArg>) -> Self {
        StubOperation { name, args }
    }
}

impl Operation for StubOperation {
    fn name(&self) -> &'static str {
        self.name
    }

    fn args(&self) -> Vec<OpArg> {
        self.args.clone()
    }

    fn preview_dag(&self, dag: &CommitDag) -> CommitDag {
        dag.clone()
    }

    fn optimistic_dag(&self, dag: &CommitDag, _successors: &SuccessorTracker) -> CommitDag {
        dag.clone()
    }
}

/// Checks that every `test_*.rs` file in `test_dir` is declared as a
/// module in the test runner.
pub fn assert_no_forgotten_test_files(test_dir: &Path) {
    let runner = fs::read_to_string(test_dir.join("runner.rs")).unwrap();
    for entry in fs::read_dir(test_dir).unwrap() {
        let file_name = entry.unwrap().file_name();
        let file_name = file_name.to_str().unwrap();
        if let Some(name) = file_name.strip_suffix(".rs") {
            if name.starts_with("test_") {
                assert!(
                    runner.contains(&format!("mod {name};")),
                    "{file_name} is not declared in runner.rs"
                );
            }
        }
    }
}
